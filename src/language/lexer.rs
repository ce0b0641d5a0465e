//! The lexer interface a language supplies to the parser.

use crate::grammar::Symbol;
use crate::table::TerminalSet;

/// Terminals the parser can accept at the current position.
#[derive(Debug, Clone, Copy)]
pub struct ValidSymbols<'a> {
    set: &'a TerminalSet,
}

impl<'a> ValidSymbols<'a> {
    pub fn new(set: &'a TerminalSet) -> Self {
        Self { set }
    }

    pub fn contains(&self, symbol: Symbol) -> bool {
        self.set.contains(symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = Symbol> + 'a {
        self.set.iter()
    }
}

/// The text at the lexer's position.
///
/// `text` is the longest valid UTF-8 prefix of `bytes`; it is empty when the
/// position starts an invalid sequence (the parser handles those itself).
#[derive(Debug, Clone, Copy)]
pub struct LexInput<'a> {
    pub(crate) bytes: &'a [u8],
    pub(crate) text: &'a str,
    pub(crate) offset: usize,
}

impl<'a> LexInput<'a> {
    pub fn new(bytes: &'a [u8], text: &'a str, offset: usize) -> Self {
        Self {
            bytes,
            text,
            offset,
        }
    }

    /// Remaining input bytes from the current position.
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Remaining valid UTF-8 text from the current position.
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Absolute byte offset of the current position.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_eof(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// One recognised token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme {
    pub symbol: Symbol,
    /// Token length in bytes.
    pub len: usize,
    /// Bytes examined past the end of the token.
    pub lookahead: usize,
}

impl Lexeme {
    pub fn new(symbol: Symbol, len: usize, lookahead: usize) -> Self {
        Self {
            symbol,
            len,
            lookahead,
        }
    }

    /// An unrecognised span; the parser turns it into an ERROR leaf.
    pub fn error(len: usize, lookahead: usize) -> Self {
        Self::new(Symbol::ERROR, len, lookahead)
    }
}

/// Context-sensitive tokenizer.
///
/// Called at a non-empty position with the terminals valid in the current
/// parse state. Implementations should prefer valid terminals, must return a
/// token of at least one byte, and must report how far past the token they
/// looked so incremental reparsing can invalidate the token when that region
/// changes.
pub trait Lex: Send + Sync {
    fn lex(&self, input: LexInput<'_>, valid: ValidSymbols<'_>) -> Lexeme;
}
