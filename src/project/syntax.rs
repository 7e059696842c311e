//! Syntax tree nodes as exposed by the compiler.

use serde::{Deserialize, Serialize};

use super::NodeId;

/// Byte span within a unit's effective text.
pub type Span = std::ops::Range<usize>;

/// Language keywords that can stand in for a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Keyword {
    This,
    Super,
    Other,
}

/// The capabilities of a syntax node.
///
/// Only the shapes the navigation core looks at are distinguished; everything
/// else is `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    /// A name reference or the name part of a declaration.
    Identifier { name: String },
    /// A language identifier such as `this` or `super`.
    Keyword { keyword: Keyword },
    /// A class declaration with its name and optional `extends` expression.
    ClassDecl { name: NodeId, base: Option<NodeId> },
    /// Any other declaration (function, variable, namespace, ...).
    Declaration { name: NodeId },
    /// A call, or a `new` expression when `is_new` is set.
    Call { is_new: bool },
    /// `left.right`
    MemberAccess { left: NodeId, right: NodeId },
    /// An `<fx:Style>` block compiled into a markup unit.
    StyleBlock,
    Other,
}

/// A node in a compiled syntax tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxNode {
    #[serde(flatten)]
    pub kind: NodeKind,
    pub span: Span,
    #[serde(default)]
    pub parent: Option<NodeId>,
    #[serde(default)]
    pub children: Vec<NodeId>,
}

impl SyntaxNode {
    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Identifier { name } => Some(name),
            _ => None,
        }
    }

    pub fn keyword(&self) -> Option<Keyword> {
        match self.kind {
            NodeKind::Keyword { keyword } => Some(keyword),
            _ => None,
        }
    }

    pub fn is_new_call(&self) -> bool {
        matches!(self.kind, NodeKind::Call { is_new: true })
    }

    /// The name expression of a declaration node.
    pub fn declared_name(&self) -> Option<NodeId> {
        match self.kind {
            NodeKind::ClassDecl { name, .. } | NodeKind::Declaration { name } => Some(name),
            _ => None,
        }
    }

    /// Name and base-class expressions of a class declaration.
    pub fn class_parts(&self) -> Option<(NodeId, Option<NodeId>)> {
        match self.kind {
            NodeKind::ClassDecl { name, base } => Some((name, base)),
            _ => None,
        }
    }

    pub fn member_access(&self) -> Option<(NodeId, NodeId)> {
        match self.kind {
            NodeKind::MemberAccess { left, right } => Some((left, right)),
            _ => None,
        }
    }

    pub fn is_style_block(&self) -> bool {
        matches!(self.kind, NodeKind::StyleBlock)
    }

    /// Whether the offset lies in this node, counting the position just past its end.
    pub fn covers(&self, offset: usize) -> bool {
        self.span.start <= offset && offset <= self.span.end
    }
}
