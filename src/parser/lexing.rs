//! Token production: source segmentation, the language lexer, the external
//! scanner and a per-parse token cache.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::base::Length;
use crate::grammar::Symbol;
use crate::language::{ExternalScanner, Language, LexInput, MAX_SCANNER_STATE_LEN, ScanCursor, ValidSymbols};
use crate::table::LexModeId;
use crate::tree::subtree::Subtree;

/// Input bytes split into maximal valid UTF-8 runs.
pub(crate) struct SourceText<'a> {
    bytes: &'a [u8],
    segments: Vec<(usize, &'a str)>,
}

impl<'a> SourceText<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        let mut segments = Vec::new();
        let mut offset = 0;
        while offset < bytes.len() {
            match std::str::from_utf8(&bytes[offset..]) {
                Ok(text) => {
                    segments.push((offset, text));
                    break;
                }
                Err(error) => {
                    let valid = error.valid_up_to();
                    if valid > 0 {
                        let text = std::str::from_utf8(&bytes[offset..offset + valid]).unwrap_or_default();
                        segments.push((offset, text));
                    }
                    let invalid = error.error_len().unwrap_or(bytes.len() - offset - valid);
                    offset += valid + invalid.max(1);
                }
            }
        }
        Self { bytes, segments }
    }

    pub(crate) fn len(&self) -> usize {
        self.bytes.len()
    }

    pub(crate) fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Lexer input at `offset`, or `None` when `offset` does not start valid text.
    pub(crate) fn input_at(&self, offset: usize) -> Option<LexInput<'a>> {
        let index = self.segments.partition_point(|(start, _)| *start <= offset);
        let (start, text) = *self.segments.get(index.checked_sub(1)?)?;
        let rest = text.get(offset - start..).filter(|rest| !rest.is_empty())?;
        Some(LexInput::new(&self.bytes[offset..], rest, offset))
    }

    /// Length of the invalid run starting at `offset`.
    pub(crate) fn invalid_len(&self, offset: usize) -> usize {
        let index = self.segments.partition_point(|(start, _)| *start <= offset);
        let next = self.segments.get(index).map_or(self.bytes.len(), |(start, _)| *start);
        next.saturating_sub(offset).max(1).min(self.bytes.len() - offset)
    }
}

/// The lookahead token of a stack version.
#[derive(Debug, Clone)]
pub(crate) struct Token {
    pub symbol: Symbol,
    /// `None` for the end of input.
    pub leaf: Option<Subtree>,
}

impl Token {
    pub(crate) fn end() -> Self {
        Self {
            symbol: Symbol::END,
            leaf: None,
        }
    }

    pub(crate) fn leaf(leaf: Subtree) -> Self {
        Self {
            symbol: leaf.symbol(),
            leaf: Some(leaf),
        }
    }

    /// Bytes from the token start through everything the lexer examined.
    pub(crate) fn examined_bytes(&self) -> u32 {
        self.leaf
            .as_ref()
            .map_or(0, |leaf| u32::from(leaf.size().bytes) + leaf.lookahead_bytes())
    }
}

type CacheKey = (usize, LexModeId, Option<Arc<[u8]>>);

pub(crate) struct TokenSource {
    scanner: Option<Box<dyn ExternalScanner>>,
    cache: FxHashMap<CacheKey, Token>,
    pub lexed: usize,
}

impl TokenSource {
    pub(crate) fn new(scanner: Option<Box<dyn ExternalScanner>>) -> Self {
        Self {
            scanner,
            cache: FxHashMap::default(),
            lexed: 0,
        }
    }

    pub(crate) fn into_scanner(self) -> Option<Box<dyn ExternalScanner>> {
        self.scanner
    }

    pub(crate) fn next_token(
        &mut self,
        language: &Language,
        source: &SourceText<'_>,
        position: Length,
        lex_mode: LexModeId,
        last_external: Option<&Arc<[u8]>>,
    ) -> Token {
        let offset = position.byte_len();
        if offset >= source.len() && self.scanner.is_none() {
            return Token::end();
        }
        let key = (offset, lex_mode, last_external.cloned());
        if let Some(token) = self.cache.get(&key) {
            return token.clone();
        }
        let token = self.lex(language, source, offset, lex_mode, last_external);
        self.lexed += 1;
        self.cache.insert(key, token.clone());
        token
    }

    fn lex(
        &mut self,
        language: &Language,
        source: &SourceText<'_>,
        offset: usize,
        lex_mode: LexModeId,
        last_external: Option<&Arc<[u8]>>,
    ) -> Token {
        if offset >= source.len() {
            // Scanners may still produce zero-width tokens at the end.
            let input = LexInput::new(&[], "", offset);
            return self
                .scan_external(language, input, lex_mode, last_external)
                .unwrap_or_else(Token::end);
        }
        let Some(input) = source.input_at(offset) else {
            let len = source.invalid_len(offset);
            let size = Length::of(&source.bytes()[offset..offset + len]);
            return Token::leaf(Subtree::leaf(language, Symbol::ERROR, size, 0, lex_mode));
        };
        let valid = language.parse_table().lex_mode_terminals(lex_mode);

        if let Some(token) = self.scan_external(language, input, lex_mode, last_external) {
            return token;
        }

        let lexeme = language.lexer().lex(input, ValidSymbols::new(valid));
        let text = input.text();
        let mut symbol = lexeme.symbol;
        let mut len = lexeme.len.min(text.len());
        while !text.is_char_boundary(len) {
            len += 1;
        }
        if len == 0 || (symbol != Symbol::ERROR && !language.symbols().is_terminal(symbol)) {
            symbol = Symbol::ERROR;
            len = text.chars().next().map_or(1, char::len_utf8);
        }
        let size = Length::of(&text.as_bytes()[..len]);
        let lookahead = lexeme.lookahead.min(source.len() - offset - len) as u32;
        tracing::trace!(
            offset,
            len,
            symbol = language.symbol_name(symbol),
            "lexed token"
        );
        Token::leaf(Subtree::leaf(language, symbol, size, lookahead, lex_mode))
    }

    fn scan_external(
        &mut self,
        language: &Language,
        input: LexInput<'_>,
        lex_mode: LexModeId,
        last_external: Option<&Arc<[u8]>>,
    ) -> Option<Token> {
        let scanner = self.scanner.as_mut()?;
        let valid = language.parse_table().lex_mode_terminals(lex_mode);
        let externals = language.external_tokens();
        if !externals.iter().any(|&symbol| valid.contains(symbol)) {
            return None;
        }

        let previous: &[u8] = last_external.map_or(&[][..], |state| &state[..]);
        scanner.deserialize(previous);
        let mut cursor = ScanCursor::new(input);
        let found = scanner
            .scan(&mut cursor, ValidSymbols::new(valid))
            .then(|| cursor.finish())
            .flatten()
            .filter(|(symbol, _, _)| externals.contains(symbol) && valid.contains(*symbol));

        let Some((symbol, len, lookahead)) = found else {
            scanner.deserialize(previous);
            return None;
        };

        let mut state = Vec::new();
        scanner.serialize(&mut state);
        if state.len() > MAX_SCANNER_STATE_LEN {
            tracing::warn!(
                len = state.len(),
                max = MAX_SCANNER_STATE_LEN,
                "external scanner state truncated"
            );
            state.truncate(MAX_SCANNER_STATE_LEN);
        }
        let len = len.min(input.text().len());
        let size = Length::of(&input.text().as_bytes()[..len]);
        tracing::trace!(
            offset = input.offset(),
            len,
            symbol = language.symbol_name(symbol),
            "scanned external token"
        );
        let leaf = Subtree::leaf(language, symbol, size, lookahead as u32, lex_mode)
            .with_external_state(Arc::from(state));
        Some(Token::leaf(leaf))
    }
}
