//! The capability surface of the external ActionScript/MXML compiler.
//!
//! Parsing, scope construction and type resolution all live in the compiler.
//! This module describes what the navigation core needs to read from it:
//! - `Project` for one compiled project (units, trees, definitions, resolution)
//! - `ProjectProvider` for finding the project that owns a source file
//!
//! All handles (`UnitId`, `NodeId`, `DefId`, `TagId`) index into data owned by
//! the compiler and are only valid for the lifetime of one request.

mod definition;
mod doc_comment;
mod markup;
mod syntax;

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tower_lsp::lsp_types::{Location, Range};

use crate::document::IncludeSplice;
use crate::error::ScopeError;

pub use definition::{
    Definition, DefinitionKind, FunctionClassification, VariableClassification, Visibility,
};
pub use doc_comment::{DocComment, DocTag};
pub use markup::{
    MarkupAttribute, MarkupDocument, MarkupTag, TagRole, XmlName, ATTRIBUTE_ID, ATTRIBUTE_SOURCE,
};
pub use syntax::{Keyword, NodeKind, Span, SyntaxNode};

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

handle!(
    /// A compilation unit of a project.
    UnitId
);
handle!(
    /// A node in a compiled syntax tree.
    NodeId
);
handle!(
    /// A semantic definition. Equal handles mean the same entity.
    DefId
);
handle!(
    /// A tag in one markup document.
    TagId
);

/// What a compilation unit was produced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// An ActionScript source file.
    Script,
    /// An MXML source file.
    Markup,
    /// A definition loaded from a precompiled library.
    Compiled,
}

impl UnitKind {
    pub fn is_source(self) -> bool {
        matches!(self, UnitKind::Script | UnitKind::Markup)
    }
}

/// Read-only view of one compiled project.
pub trait Project: Send + Sync {
    /// Whether this is the catch-all project for files outside any configured project.
    fn is_fallback(&self) -> bool {
        false
    }

    /// Every compilation unit, in project order.
    fn units(&self) -> Vec<UnitId>;

    fn unit_for_path(&self, path: &Path) -> Option<UnitId>;

    fn unit_path(&self, unit: UnitId) -> Option<&Path>;

    fn unit_kind(&self, unit: UnitId) -> Option<UnitKind>;

    /// Top-level definitions of a unit. Computing them may fail.
    fn file_scope(&self, unit: UnitId) -> Result<Vec<DefId>, ScopeError>;

    /// The definition promised by a markup unit's root tag.
    fn root_definition(&self, unit: UnitId) -> Result<Option<DefId>, ScopeError>;

    fn ast(&self, unit: UnitId) -> Option<NodeId>;

    fn node(&self, node: NodeId) -> Option<&SyntaxNode>;

    fn definition(&self, def: DefId) -> Option<&Definition>;

    /// Structured documentation comments of a unit.
    fn doc_comments(&self, unit: UnitId) -> &[DocComment];

    fn markup(&self, unit: UnitId) -> Option<&MarkupDocument>;

    /// Resolve an identifier or expression node against its scope.
    fn resolve_node(&self, node: NodeId) -> Option<DefId>;

    /// The definition a markup tag name stands for.
    fn resolve_tag(&self, unit: UnitId, tag: TagId) -> Option<DefId>;

    /// The definition an attribute name on a markup tag stands for.
    fn resolve_attribute(&self, unit: UnitId, tag: TagId, attribute: usize) -> Option<DefId>;

    /// The function a function definition overrides, one level up.
    fn overridden_function(&self, def: DefId) -> Option<DefId>;

    /// Concrete declaration sites of a definition.
    fn locations(&self, def: DefId) -> Vec<Location>;

    /// How a file's text is spliced into the unit that includes it.
    fn include_splice(&self, path: &Path) -> Option<IncludeSplice>;

    /// Translate a byte span of a unit's file into an editor range.
    fn editor_range(&self, unit: UnitId, span: &Span) -> Option<Range>;
}

/// Finds the project that owns a source file.
pub trait ProjectProvider: Send + Sync {
    fn project_for_source(&self, path: &Path) -> Option<Arc<dyn Project>>;
}
