//! LSP protocol feature implementations.
//!
//! This module provides implementations for LSP features:
//! - Go to definition, including doc comment cross-references
//! - Rename across ActionScript and MXML documents

mod definition;
mod rename;

pub use definition::definition;
pub use rename::rename;
