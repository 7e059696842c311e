//! Structured documentation comments (`/** ... */`).

use serde::{Deserialize, Serialize};

use super::Span;

/// One `@tag` of a documentation comment.
///
/// `line`/`column` point at the `@`; the tag never spans more than one line
/// when it is eligible for cross-reference lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocTag {
    /// Tag name without the `@`, e.g. `see`.
    pub name: String,
    /// Text following the tag name, including leading whitespace.
    pub description: String,
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl DocTag {
    /// Column where the description starts.
    pub fn description_column(&self) -> u32 {
        self.column + 1 + self.name.chars().count() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocComment {
    pub span: Span,
    #[serde(default)]
    pub tags: Vec<DocTag>,
}
