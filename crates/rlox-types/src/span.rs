use serde::{Deserialize, Serialize};
use std::fmt;

/// Source location of a token or node.
///
/// Lines and columns are 1-based. `end_col` is the column of the last
/// character covered, so a one-character token has `col == end_col`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub line: u32,
    pub col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Span {
    pub fn new(line: u32, col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            line,
            col,
            end_line,
            end_col,
        }
    }

    /// A single-character span.
    pub fn at(line: u32, col: u32) -> Self {
        Self::new(line, col, line, col)
    }

    /// Span running from the start of `self` to the end of `other`.
    ///
    /// Used by the parser to cover a whole construct, so `other` is
    /// expected to come after `self` in the source.
    pub fn to(self, other: Span) -> Span {
        if (other.end_line, other.end_col) < (self.line, self.col) {
            return other.to(self);
        }
        Span::new(self.line, self.col, other.end_line, other.end_col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// A named piece of Lox source, kept around for diagnostics.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub source: String,
    /// Byte offset where each line begins.
    line_offsets: Vec<usize>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        let mut line_offsets = vec![0];
        line_offsets.extend(
            source
                .bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            name: name.into(),
            source,
            line_offsets,
        }
    }

    /// The text of a 1-based line, without its terminator.
    pub fn line(&self, line: u32) -> Option<&str> {
        let idx = (line as usize).checked_sub(1)?;
        let start = *self.line_offsets.get(idx)?;
        let end = match self.line_offsets.get(idx + 1) {
            Some(next) => next - 1,
            None => self.source.len(),
        };
        Some(self.source[start..end].trim_end_matches('\r'))
    }

    pub fn line_count(&self) -> usize {
        self.line_offsets.len()
    }
}
