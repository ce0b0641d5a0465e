//! External scanner hook for context-sensitive tokens.
//!
//! A scanner instance is created per parser from the language's
//! [`ScannerFactory`] and dropped with the parser. Its state is an opaque byte
//! string of at most [`MAX_SCANNER_STATE_LEN`] bytes:
//!
//! - the empty string is the initial state and `deserialize(&[])` must reset to it;
//! - `deserialize(serialize(s))` must restore a state that serializes to the same bytes;
//! - before every scan the parser restores the state stored with the last
//!   external token of the stack version being lexed.

use super::lexer::{LexInput, ValidSymbols};
use crate::grammar::Symbol;

pub const MAX_SCANNER_STATE_LEN: usize = 1024;

/// Creates a fresh scanner in its initial state.
pub type ScannerFactory = fn() -> Box<dyn ExternalScanner>;

pub trait ExternalScanner: Send {
    /// Try to recognise one token at the cursor. On success set the result
    /// symbol, optionally mark the token end, and return `true`.
    fn scan(&mut self, cursor: &mut ScanCursor<'_>, valid: ValidSymbols<'_>) -> bool;

    fn serialize(&self, buffer: &mut Vec<u8>);

    fn deserialize(&mut self, buffer: &[u8]);
}

/// Character cursor handed to [`ExternalScanner::scan`].
///
/// The token always starts at the cursor's initial position; every byte the
/// scanner advances over before `mark_end` belongs to the token.
#[derive(Debug)]
pub struct ScanCursor<'a> {
    text: &'a str,
    position: usize,
    token_end: Option<usize>,
    furthest: usize,
    result: Option<Symbol>,
    offset: usize,
}

impl<'a> ScanCursor<'a> {
    pub(crate) fn new(input: LexInput<'a>) -> Self {
        Self {
            text: input.text(),
            position: 0,
            token_end: None,
            furthest: 0,
            result: None,
            offset: input.offset(),
        }
    }

    /// The current character, or `None` at the end of valid text.
    pub fn lookahead(&mut self) -> Option<char> {
        let c = self.text[self.position..].chars().next();
        if let Some(c) = c {
            self.furthest = self.furthest.max(self.position + c.len_utf8());
        }
        c
    }

    pub fn advance(&mut self) {
        if let Some(c) = self.text[self.position..].chars().next() {
            self.position += c.len_utf8();
            self.furthest = self.furthest.max(self.position);
        }
    }

    /// Fix the token end at the current position; later advances become lookahead.
    pub fn mark_end(&mut self) {
        self.token_end = Some(self.position);
    }

    pub fn set_result(&mut self, symbol: Symbol) {
        self.result = Some(symbol);
    }

    pub fn is_eof(&self) -> bool {
        self.position >= self.text.len()
    }

    /// Bytes consumed so far, relative to the token start.
    pub fn consumed(&self) -> usize {
        self.position
    }

    pub fn absolute_offset(&self) -> usize {
        self.offset + self.position
    }

    /// `(symbol, len, lookahead)` of a successful scan.
    pub(crate) fn finish(&self) -> Option<(Symbol, usize, usize)> {
        let symbol = self.result?;
        let len = self.token_end.unwrap_or(self.position);
        Some((symbol, len, self.furthest.saturating_sub(len)))
    }
}
