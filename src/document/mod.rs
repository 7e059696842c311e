//! Document text and position plumbing.
//!
//! This module provides:
//! - `LineIndex` for byte offset <-> LSP position conversion
//! - `IncludeSplice` for files spliced into another unit with `include`
//! - `DocumentStore` for the text of open editor documents

mod splice;
mod state;
mod text;

pub use splice::{IncludeSplice, OffsetCue};
pub use state::{Dialect, DocumentStore, SourceDocument};
pub use text::LineIndex;
