//! Text of the documents the editor has open.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tower_lsp::lsp_types::Url;

use super::text::LineIndex;

/// Which of the two source languages a document is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// ActionScript.
    Script,
    /// MXML, which embeds ActionScript.
    Markup,
}

impl Dialect {
    pub fn from_path(path: &Path, markup_extensions: &[String]) -> Self {
        let is_markup = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| markup_extensions.iter().any(|m| m.eq_ignore_ascii_case(ext)));
        if is_markup {
            Dialect::Markup
        } else {
            Dialect::Script
        }
    }
}

/// The text a request is answered against.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub dialect: Dialect,
    pub line_index: LineIndex,
}

impl SourceDocument {
    pub fn new(path: PathBuf, dialect: Dialect, text: impl Into<Arc<str>>) -> Self {
        Self {
            path,
            dialect,
            line_index: LineIndex::new(text),
        }
    }
}

/// Thread-safe storage for open documents.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: DashMap<Url, LineIndex>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
        }
    }

    /// Open or replace a document's text.
    pub fn open(&self, uri: Url, text: String) {
        self.documents.insert(uri, LineIndex::new(text));
    }

    pub fn close(&self, uri: &Url) {
        self.documents.remove(uri);
    }

    /// The current text of a file URI: the editor's copy when open, else the file on disk.
    pub fn source(&self, uri: &Url, markup_extensions: &[String]) -> Option<SourceDocument> {
        let path = uri.to_file_path().ok()?;
        let dialect = Dialect::from_path(&path, markup_extensions);
        let line_index = match self.documents.get(uri) {
            Some(line_index) => line_index.clone(),
            None => match std::fs::read_to_string(&path) {
                Ok(text) => LineIndex::new(text),
                Err(err) => {
                    tracing::debug!(path = %path.display(), %err, "document is not readable");
                    return None;
                }
            },
        };
        Some(SourceDocument {
            path,
            dialect,
            line_index,
        })
    }
}
