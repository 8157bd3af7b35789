//! Error types for parsing and include resolution.

use std::path::PathBuf;

/// Malformed directive block. Aborts the cycle for the file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}, column {column}: {kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// Byte offset of the directive start.
    pub offset: usize,
    /// 1-based line of the directive start.
    pub line: usize,
    /// 1-based column (in characters) of the directive start.
    pub column: usize,
}

impl ParseError {
    /// Create an error located at `offset` within `text`.
    pub(crate) fn at(kind: ParseErrorKind, text: &str, offset: usize) -> Self {
        let before = &text[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;
        Self {
            kind,
            offset,
            line,
            column,
        }
    }
}

/// Kind of parse error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("unterminated directive block (expected `{close}`)")]
    Unterminated { close: String },
    #[error("line directive contains the block comment terminator `{close}`")]
    EmbeddedTerminator { close: String },
}

/// A directive references content that cannot be found.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("include file not found: '{include}' (resolved to {})", path.display())]
    NotFound {
        include: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("include depth exceeded maximum of {0}")]
    DepthExceeded(usize),
}
