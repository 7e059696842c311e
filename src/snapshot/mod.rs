//! An in-memory project loaded from a JSON snapshot.
//!
//! The compiler front end exports what it knows about a project (units,
//! syntax trees, definitions and the bindings between them) as one JSON
//! document. `ProjectModel` answers `Project` queries from it.

#[cfg(any(test, feature = "test-support"))]
mod builder;
mod model;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::document::IncludeSplice;
use crate::project::{
    DefId, Definition, DocComment, MarkupDocument, NodeId, SyntaxNode, TagId, UnitId, UnitKind,
};

#[cfg(any(test, feature = "test-support"))]
pub use builder::SnapshotBuilder;
pub use model::{ProjectModel, SnapshotProvider};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    /// Catch-all project for files outside any configured project.
    #[serde(default)]
    pub fallback: bool,
    #[serde(default)]
    pub units: Vec<UnitSnapshot>,
    #[serde(default)]
    pub nodes: Vec<SyntaxNode>,
    #[serde(default)]
    pub definitions: Vec<Definition>,
    /// Identifier nodes and what they resolve to.
    #[serde(default)]
    pub bindings: Vec<NodeBinding>,
    /// Markup tag and attribute names and what they resolve to.
    #[serde(default)]
    pub tag_bindings: Vec<TagBinding>,
    #[serde(default)]
    pub overrides: Vec<OverrideLink>,
    #[serde(default)]
    pub includes: Vec<IncludeSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub path: PathBuf,
    pub kind: UnitKind,
    /// Effective text; read from `path` when absent.
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub ast: Option<NodeId>,
    #[serde(default)]
    pub scope: ScopeSnapshot,
    /// Class declared by a markup unit's root tag.
    #[serde(default)]
    pub root_definition: Option<DefId>,
    #[serde(default)]
    pub doc_comments: Vec<DocComment>,
    #[serde(default)]
    pub markup: Option<MarkupDocument>,
}

/// The file scope of a unit, or why the compiler could not compute it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScopeSnapshot {
    Ready {
        #[serde(default)]
        definitions: Vec<DefId>,
    },
    Failed {
        reason: String,
    },
}

impl Default for ScopeSnapshot {
    fn default() -> Self {
        ScopeSnapshot::Ready {
            definitions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeBinding {
    pub node: NodeId,
    pub definition: DefId,
}

/// A tag name binding, or an attribute name binding when `attribute` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagBinding {
    pub unit: UnitId,
    pub tag: TagId,
    #[serde(default)]
    pub attribute: Option<usize>,
    pub definition: DefId,
}

/// `function` overrides `overrides`, one level up the class hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideLink {
    pub function: DefId,
    pub overrides: DefId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeSnapshot {
    /// The included file.
    pub path: PathBuf,
    #[serde(flatten)]
    pub splice: IncludeSplice,
}
