//! Text utilities for position conversion.
//!
//! Offsets are byte offsets into UTF-8 text; LSP columns are UTF-16 code units.

use std::sync::Arc;

use tower_lsp::lsp_types::{Position, Range};

use crate::project::Span;

/// Pre-computed line starts for one document's text.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset where each line starts.
    line_starts: Vec<usize>,
    text: Arc<str>,
}

impl LineIndex {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        let text = text.into();
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { line_starts, text }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Byte range of a line, without its line terminator.
    fn line_bounds(&self, line: usize) -> Option<(usize, usize)> {
        let start = *self.line_starts.get(line)?;
        let end = match self.line_starts.get(line + 1) {
            Some(&next) => {
                let end = next - 1;
                if end > start && self.text.as_bytes()[end - 1] == b'\r' {
                    end - 1
                } else {
                    end
                }
            }
            None => self.text.len(),
        };
        Some((start, end))
    }

    /// Convert a byte offset to an LSP position. `None` past the end of the text.
    pub fn position(&self, offset: usize) -> Option<Position> {
        if offset > self.text.len() || !self.text.is_char_boundary(offset) {
            return None;
        }
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line - 1,
        };
        let start = self.line_starts[line];
        let character = self.text[start..offset]
            .chars()
            .map(|c| c.len_utf16() as u32)
            .sum();
        Some(Position::new(line as u32, character))
    }

    /// Convert an LSP position to a byte offset.
    ///
    /// Columns past the end of a line clamp to the line end; lines past the end
    /// of the text have no offset.
    pub fn offset(&self, position: Position) -> Option<usize> {
        let (start, end) = self.line_bounds(position.line as usize)?;
        let mut column = 0u32;
        for (i, c) in self.text[start..end].char_indices() {
            if column >= position.character {
                return Some(start + i);
            }
            column += c.len_utf16() as u32;
        }
        Some(end)
    }

    pub fn range(&self, span: &Span) -> Option<Range> {
        Some(Range::new(self.position(span.start)?, self.position(span.end)?))
    }
}
