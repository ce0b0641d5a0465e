//! Syntax diagnostics extracted from ERROR and MISSING nodes.

use std::fmt;

use text_size::TextRange;

use crate::base::Point;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// Bytes the lexer could not turn into any token.
    UnrecognizedInput,
    /// Tokens or nodes that did not fit the grammar and were skipped.
    UnexpectedInput,
    /// A token or node the parser assumed to be present.
    Missing { kind: String },
}

/// A syntax error recorded in a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub range: TextRange,
    pub start: Point,
    pub kind: SyntaxErrorKind,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, range: TextRange, start: Point) -> Self {
        let message = match &kind {
            SyntaxErrorKind::UnrecognizedInput => "unrecognized input".to_string(),
            SyntaxErrorKind::UnexpectedInput => "unexpected input".to_string(),
            SyntaxErrorKind::Missing { kind } => format!("missing {kind}"),
        };
        Self {
            message,
            range,
            start,
            kind,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self.kind, SyntaxErrorKind::Missing { .. })
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}",
            self.start.row + 1,
            self.start.column + 1,
            self.message
        )
    }
}

impl std::error::Error for SyntaxError {}
