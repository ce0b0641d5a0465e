//! Logos-based lexer for Pluto
//!
//! Logos classifies the text at the current position; the valid terminal set
//! then decides what the classification means:
//!
//! - words become a keyword (or `boolean`) when that keyword is valid, and an
//!   identifier otherwise;
//! - newline runs become the statement separator when it is valid, and
//!   whitespace otherwise;
//! - operators use the longest valid literal, so `a++b` can still lex `+`
//!   when `++` cannot follow.

use logos::Logos;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::grammar::{GrammarError, Symbol, SymbolKind, SymbolTable};
use crate::language::{Lex, LexInput, Lexeme, ValidSymbols};

/// Raw token classes recognised by logos.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum RawToken {
    #[regex(r"[ \t\r]+")]
    Blank,

    #[regex(r"\n+")]
    Newlines,

    #[regex(r"#[^\n]*")]
    Comment,

    #[regex(r"/\*[^*]*\*+([^/*][^*]*\*+)*/")]
    BlockComment,

    #[regex(r"\\\r?\n")]
    LineContinuation,

    #[regex(r"[a-zA-Z_\u{a1}-\u{ffff}][a-zA-Z0-9_\u{a1}-\u{ffff}]*")]
    Word,

    #[regex(r"[0-9]+[eE][+-]?[0-9]+")]
    #[regex(r"[0-9]*\.[0-9]+[eE][+-]?[0-9]+")]
    #[regex(r"0[xX][0-9a-fA-F]+")]
    #[regex(r"0[bB][01]+")]
    #[regex(r"0[oO][0-7]+")]
    #[regex(r"[0-9]+n")]
    #[regex(r"[0-9]*\.[0-9]+")]
    #[regex(r"[0-9]+")]
    Number,

    #[regex(r#""([^"\\$]|\\.)*""#)]
    #[regex(r"'([^'\\]|\\.)*'")]
    String,

    #[regex(r"[-+*/%<>=!&|^~?:,()\[\]{}]")]
    Punctuation,
}

/// Pluto's context-sensitive tokenizer over the compiled symbol numbering.
#[derive(Debug)]
pub(super) struct PlutoLexer {
    identifier: Symbol,
    number: Symbol,
    string: Symbol,
    comment: Symbol,
    block_comment: Symbol,
    line_continuation: Symbol,
    separator: Symbol,
    whitespace: Symbol,
    keywords: FxHashMap<SmolStr, Symbol>,
    /// Punctuation literals, longest first.
    operators: Vec<(SmolStr, Symbol)>,
}

impl PlutoLexer {
    pub(super) fn new(symbols: &SymbolTable) -> Result<Self, GrammarError> {
        let token = |name: &str| {
            symbols
                .lookup(name, true)
                .filter(|&symbol| symbols.is_terminal(symbol))
                .ok_or_else(|| GrammarError::Lexer(format!("token '{name}' is not a terminal")))
        };

        let mut keywords = FxHashMap::default();
        let mut operators = Vec::new();
        for (symbol, info) in symbols.iter() {
            if info.kind != SymbolKind::Terminal || info.named {
                continue;
            }
            if info.name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                keywords.insert(info.name.clone(), symbol);
            } else {
                operators.push((info.name.clone(), symbol));
            }
        }
        operators.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let boolean = token("boolean")?;
        keywords.insert(SmolStr::new_static("true"), boolean);
        keywords.insert(SmolStr::new_static("false"), boolean);

        tracing::debug!(
            keywords = keywords.len(),
            operators = operators.len(),
            "built Pluto lexer"
        );

        Ok(Self {
            identifier: token("identifier")?,
            number: token("number")?,
            string: token("string")?,
            comment: token("comment")?,
            block_comment: token("block_comment")?,
            line_continuation: token("line_continuation")?,
            separator: token("_statement_separator")?,
            whitespace: token("_whitespace")?,
            keywords,
            operators,
        })
    }

    fn word(&self, text: &str, valid: ValidSymbols<'_>) -> Symbol {
        match self.keywords.get(text) {
            Some(&keyword) if valid.contains(keyword) => keyword,
            _ => self.identifier,
        }
    }

    /// Whitespace including newlines, used where no statement can end.
    fn blank_lines(&self, text: &str) -> Lexeme {
        let run = text
            .bytes()
            .take_while(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
            .count();
        Lexeme::new(self.whitespace, run, usize::from(run < text.len()))
    }

    /// Longest valid punctuation literal, falling back to the longest one.
    fn operator(&self, text: &str, valid: ValidSymbols<'_>) -> Option<(Symbol, usize, usize)> {
        let first = text.chars().next()?;
        let examined = self
            .operators
            .iter()
            .filter(|(literal, _)| literal.starts_with(first))
            .map(|(literal, _)| literal.len())
            .max()?
            .min(text.len());
        let mut candidates = self
            .operators
            .iter()
            .filter(|(literal, _)| text.starts_with(literal.as_str()));
        let longest = candidates.clone().next()?;
        let (literal, symbol) = candidates
            .find(|(_, symbol)| valid.contains(*symbol))
            .unwrap_or(longest);
        Some((*symbol, literal.len(), examined.saturating_sub(literal.len())))
    }
}

impl Lex for PlutoLexer {
    fn lex(&self, input: LexInput<'_>, valid: ValidSymbols<'_>) -> Lexeme {
        let text = input.text();
        let mut raw = RawToken::lexer(text);
        let Some(result) = raw.next() else {
            return Lexeme::error(1, 0);
        };
        let span = raw.span();
        let len = span.end;
        // Bytes after the token that logos had to look at to end it.
        let peek = usize::from(len < text.len());

        let symbol = match result {
            Ok(RawToken::Blank) => {
                if !valid.contains(self.separator) {
                    return self.blank_lines(text);
                }
                self.whitespace
            }
            Ok(RawToken::Newlines) => {
                if valid.contains(self.separator) {
                    self.separator
                } else {
                    return self.blank_lines(text);
                }
            }
            Ok(RawToken::Comment) => self.comment,
            Ok(RawToken::LineContinuation) => self.line_continuation,
            Ok(RawToken::Word) => self.word(&text[..len], valid),
            Ok(RawToken::Number) => {
                // `1e` and `0x` end a number only after looking two bytes ahead.
                return Lexeme::new(self.number, len, (text.len() - len).min(2));
            }
            Ok(RawToken::String) => self.string,
            Ok(RawToken::BlockComment) if valid.contains(self.block_comment) => self.block_comment,
            Ok(RawToken::BlockComment | RawToken::Punctuation) => {
                return match self.operator(text, valid) {
                    Some((symbol, len, lookahead)) => Lexeme::new(symbol, len, lookahead),
                    None => Lexeme::error(1, 0),
                };
            }
            Err(()) => {
                let len = text.chars().next().map_or(1, char::len_utf8);
                return Lexeme::error(len, span.end.saturating_sub(len));
            }
        };
        Lexeme::new(symbol, len, peek)
    }
}
