//! Toy languages exercising the engine through its public API.

use std::collections::HashMap;

use pluto_syntax::grammar::{
    Rule, SymbolKind, SymbolTable, choice, field, lit, optional, prec, prec_dynamic, prec_left,
    prec_right, repeat, seq, sym,
};
use pluto_syntax::{
    ExternalScanner, Grammar, GrammarError, Language, Lex, LexInput, Lexeme, ScanCursor, Symbol,
    ValidSymbols,
};

/// A small hand-written lexer driven by the grammar's symbol table.
///
/// Recognises `identifier` (with keywords taking priority when valid),
/// `number`, whitespace as `_space`, and every punctuation literal by longest
/// match. Tokens missing from the grammar are simply never produced.
#[derive(Debug)]
pub struct TestLexer {
    identifier: Option<Symbol>,
    number: Option<Symbol>,
    space: Option<Symbol>,
    keywords: HashMap<String, Symbol>,
    punctuation: Vec<(String, Symbol)>,
}

impl TestLexer {
    pub fn new(symbols: &SymbolTable) -> Result<Self, GrammarError> {
        let mut keywords = HashMap::new();
        let mut punctuation = Vec::new();
        for (symbol, info) in symbols.iter() {
            if info.kind != SymbolKind::Terminal || info.named {
                continue;
            }
            if info.name.chars().all(char::is_alphanumeric) {
                keywords.insert(info.name.to_string(), symbol);
            } else {
                punctuation.push((info.name.to_string(), symbol));
            }
        }
        punctuation.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()));
        Ok(Self {
            identifier: symbols.lookup("identifier", true),
            number: symbols.lookup("number", true),
            space: symbols.lookup("_space", true),
            keywords,
            punctuation,
        })
    }

    fn run(text: &str, accept: impl Fn(char) -> bool) -> (usize, usize) {
        let len = text.find(|c: char| !accept(c)).unwrap_or(text.len());
        (len, usize::from(len < text.len()))
    }
}

impl Lex for TestLexer {
    fn lex(&self, input: LexInput<'_>, valid: ValidSymbols<'_>) -> Lexeme {
        let text = input.text();
        let Some(first) = text.chars().next() else {
            return Lexeme::error(1, 0);
        };

        if first.is_whitespace() {
            if let Some(space) = self.space {
                let (len, lookahead) = Self::run(text, char::is_whitespace);
                return Lexeme::new(space, len, lookahead);
            }
        }
        if first.is_alphabetic() || first == '_' {
            let (len, lookahead) = Self::run(text, |c| c.is_alphanumeric() || c == '_');
            let keyword = self.keywords.get(&text[..len]).copied().filter(|k| valid.contains(*k));
            if let Some(symbol) = keyword.or(self.identifier) {
                return Lexeme::new(symbol, len, lookahead);
            }
        }
        if first.is_ascii_digit() {
            if let Some(number) = self.number {
                let (len, lookahead) = Self::run(text, |c| c.is_ascii_digit());
                return Lexeme::new(number, len, lookahead);
            }
        }
        let examined = self
            .punctuation
            .iter()
            .filter(|(literal, _)| literal.starts_with(first))
            .map(|(literal, _)| literal.len())
            .max()
            .unwrap_or(0)
            .min(text.len());
        match self.punctuation.iter().find(|(literal, _)| text.starts_with(literal.as_str())) {
            Some((literal, symbol)) => Lexeme::new(*symbol, literal.len(), examined - literal.len()),
            None => Lexeme::error(first.len_utf8(), 0),
        }
    }
}

fn binary(operators: &[&str]) -> Rule {
    seq([
        field("left", sym("_expression")),
        field("operator", choice(operators.iter().copied().map(lit))),
        field("right", sym("_expression")),
    ])
}

/// Statements terminated by `;`: assignments and expressions over `+ - * / ^`,
/// unary minus, calls and parentheses.
pub fn calc_grammar() -> Grammar {
    Grammar::builder("calc")
        .tokens(["identifier", "number", "_space"])
        .extras(["_space"])
        .word("identifier")
        .rule("program", repeat(sym("_statement")))
        .rule("_statement", choice([sym("assignment"), sym("expression_statement")]))
        .rule(
            "assignment",
            seq([
                field("left", sym("identifier")),
                lit("="),
                field("right", sym("_expression")),
                lit(";"),
            ]),
        )
        .rule("expression_statement", seq([sym("_expression"), lit(";")]))
        .rule(
            "_expression",
            choice([
                sym("binary"),
                sym("unary"),
                sym("call"),
                sym("parenthesized"),
                sym("identifier"),
                sym("number"),
            ]),
        )
        .rule(
            "binary",
            choice([
                prec_left(1, binary(&["+", "-"])),
                prec_left(2, binary(&["*", "/"])),
                prec_right(3, binary(&["^"])),
            ]),
        )
        .rule("unary", prec(4, seq([lit("-"), field("operand", sym("_expression"))])))
        .rule(
            "call",
            prec(
                5,
                seq([
                    field("function", sym("identifier")),
                    lit("("),
                    optional(seq([
                        sym("_expression"),
                        repeat(seq([lit(","), sym("_expression")])),
                    ])),
                    lit(")"),
                ]),
            ),
        )
        .rule("parenthesized", seq([lit("("), sym("_expression"), lit(")")]))
        .build()
        .unwrap()
}

pub fn calc() -> Language {
    Language::builder(calc_grammar()).build(TestLexer::new).unwrap()
}

/// The classic `a * b;` ambiguity: a pointer declaration or a product.
/// Declarations carry a dynamic precedence of 1.
pub fn ambiguous() -> Language {
    let grammar = Grammar::builder("ambiguous")
        .tokens(["identifier", "_space"])
        .extras(["_space"])
        .conflict(["type_name", "_expression"])
        .rule("program", repeat(sym("_statement")))
        .rule("_statement", choice([sym("declaration"), sym("expression_statement")]))
        .rule(
            "declaration",
            prec_dynamic(
                1,
                seq([
                    field("type", sym("type_name")),
                    optional(lit("*")),
                    field("name", sym("identifier")),
                    lit(";"),
                ]),
            ),
        )
        .rule("type_name", sym("identifier"))
        .rule("expression_statement", seq([sym("_expression"), lit(";")]))
        .rule("_expression", choice([sym("product"), sym("identifier")]))
        .rule("product", prec_left(1, seq([sym("_expression"), lit("*"), sym("_expression")])))
        .build()
        .unwrap();
    Language::builder(grammar).build(TestLexer::new).unwrap()
}

// ============================================================================
// Nested groups with an external scanner
// ============================================================================

// Symbol numbering puts named tokens first, then literals, then externals;
// `nested()` has two named tokens and no literals.
pub const OPEN: Symbol = Symbol::from_raw(3);
pub const CLOSE: Symbol = Symbol::from_raw(4);

/// Scans `(` and `)` as external tokens, tracking nesting depth as state.
/// A `)` is only recognised while a group is open.
#[derive(Debug, Default)]
pub struct DepthScanner {
    pub depth: u32,
}

impl ExternalScanner for DepthScanner {
    fn scan(&mut self, cursor: &mut ScanCursor<'_>, valid: ValidSymbols<'_>) -> bool {
        match cursor.lookahead() {
            Some('(') if valid.contains(OPEN) => {
                cursor.advance();
                cursor.set_result(OPEN);
                self.depth += 1;
                true
            }
            Some(')') if valid.contains(CLOSE) && self.depth > 0 => {
                cursor.advance();
                cursor.set_result(CLOSE);
                self.depth -= 1;
                true
            }
            _ => false,
        }
    }

    fn serialize(&self, buffer: &mut Vec<u8>) {
        if self.depth > 0 {
            buffer.extend_from_slice(&self.depth.to_le_bytes());
        }
    }

    fn deserialize(&mut self, buffer: &[u8]) {
        self.depth = buffer
            .try_into()
            .map(u32::from_le_bytes)
            .unwrap_or_default();
    }
}

fn depth_scanner() -> Box<dyn ExternalScanner> {
    Box::new(DepthScanner::default())
}

/// Words and parenthesised groups, with the parentheses scanned externally.
pub fn nested() -> Language {
    let grammar = Grammar::builder("nested")
        .tokens(["identifier", "_space"])
        .externals(["open", "close"])
        .extras(["_space"])
        .rule("document", repeat(sym("_item")))
        .rule("_item", choice([sym("identifier"), sym("group")]))
        .rule("group", seq([sym("open"), repeat(sym("_item")), sym("close")]))
        .build()
        .unwrap();
    Language::builder(grammar)
        .external_scanner(depth_scanner)
        .build(TestLexer::new)
        .unwrap()
}
