//! The language handle: compiled grammar, parse table, lexer and scanner hook.
//!
//! A [`Language`] is immutable and cheap to clone (it is a shared pointer), so
//! any number of parsers on any number of threads can use one handle at once.

mod lexer;
mod scanner;

use std::fmt;
use std::sync::Arc;

use smol_str::SmolStr;
use thiserror::Error;

use crate::grammar::{FieldId, Grammar, GrammarError, Symbol, SymbolKind, SymbolTable, SyntaxGrammar};
use crate::table::ParseTable;

pub use lexer::{Lex, LexInput, Lexeme, ValidSymbols};
pub use scanner::{ExternalScanner, MAX_SCANNER_STATE_LEN, ScanCursor, ScannerFactory};

/// Version of the table layout produced by this crate.
pub const LANGUAGE_VERSION: u32 = 15;
/// Oldest language version parsers still accept.
pub const MIN_COMPATIBLE_LANGUAGE_VERSION: u32 = 13;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LanguageError {
    #[error("incompatible language version {version}; supported range is {min}..={max}")]
    Version { version: u32, min: u32, max: u32 },
}

struct LanguageData {
    name: SmolStr,
    version: u32,
    grammar: SyntaxGrammar,
    table: ParseTable,
    lexer: Box<dyn Lex>,
    scanner: Option<ScannerFactory>,
}

/// Opaque, shareable handle to everything a parser needs for one language.
///
/// Two handles compare equal when they share the same underlying data.
#[derive(Clone)]
pub struct Language(Arc<LanguageData>);

impl PartialEq for Language {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Language {}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Language")
            .field("name", &self.0.name)
            .field("version", &self.0.version)
            .field("symbols", &self.0.grammar.symbols.len())
            .field("states", &self.0.table.state_count())
            .finish()
    }
}

impl Language {
    pub fn builder(grammar: Grammar) -> LanguageBuilder {
        LanguageBuilder::new(grammar)
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn version(&self) -> u32 {
        self.0.version
    }

    pub fn is_compatible(&self) -> bool {
        (MIN_COMPATIBLE_LANGUAGE_VERSION..=LANGUAGE_VERSION).contains(&self.0.version)
    }

    pub fn symbol_count(&self) -> usize {
        self.0.grammar.symbols.len()
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.0.grammar.symbols
    }

    pub fn symbol_name(&self, symbol: Symbol) -> &str {
        self.0.grammar.symbols.name(symbol)
    }

    /// Symbol id of a node kind, e.g. `("identifier", true)` or `("+", false)`.
    pub fn id_for_node_kind(&self, kind: &str, named: bool) -> Option<Symbol> {
        self.0.grammar.symbols.lookup(kind, named)
    }

    pub fn node_kind_is_named(&self, symbol: Symbol) -> bool {
        symbol == Symbol::ERROR
            || self
                .0
                .grammar
                .symbols
                .info(symbol)
                .is_some_and(|info| info.named)
    }

    pub fn node_kind_is_visible(&self, symbol: Symbol) -> bool {
        symbol == Symbol::ERROR
            || self
                .0
                .grammar
                .symbols
                .info(symbol)
                .is_some_and(|info| info.visible)
    }

    pub fn symbol_kind(&self, symbol: Symbol) -> Option<SymbolKind> {
        self.0.grammar.symbols.info(symbol).map(|info| info.kind)
    }

    pub fn field_count(&self) -> usize {
        self.0.grammar.symbols.field_count()
    }

    pub fn field_name_for_id(&self, field: FieldId) -> Option<&str> {
        self.0.grammar.symbols.field_name(field)
    }

    pub fn field_id_for_name(&self, name: &str) -> Option<FieldId> {
        self.0.grammar.symbols.field_id(name)
    }

    pub fn start_symbol(&self) -> Symbol {
        self.0.grammar.start
    }

    pub fn is_extra(&self, symbol: Symbol) -> bool {
        self.0.grammar.extras.contains(&symbol)
    }

    pub fn word_token(&self) -> Option<Symbol> {
        self.0.grammar.word
    }

    pub fn external_tokens(&self) -> &[Symbol] {
        &self.0.grammar.externals
    }

    pub fn parse_table(&self) -> &ParseTable {
        &self.0.table
    }

    pub fn has_external_scanner(&self) -> bool {
        self.0.scanner.is_some()
    }

    pub(crate) fn lexer(&self) -> &dyn Lex {
        self.0.lexer.as_ref()
    }

    pub(crate) fn create_scanner(&self) -> Option<Box<dyn ExternalScanner>> {
        self.0.scanner.map(|factory| factory())
    }
}

/// Compiles a [`Grammar`] and bundles it with its lexer into a [`Language`].
pub struct LanguageBuilder {
    grammar: Grammar,
    version: u32,
    scanner: Option<ScannerFactory>,
}

impl LanguageBuilder {
    pub fn new(grammar: Grammar) -> Self {
        Self {
            grammar,
            version: LANGUAGE_VERSION,
            scanner: None,
        }
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn external_scanner(mut self, factory: ScannerFactory) -> Self {
        self.scanner = Some(factory);
        self
    }

    /// Compile the grammar, build the parse table, then build the lexer from
    /// the final symbol numbering.
    pub fn build<L, F>(self, make_lexer: F) -> Result<Language, GrammarError>
    where
        L: Lex + 'static,
        F: FnOnce(&SymbolTable) -> Result<L, GrammarError>,
    {
        let grammar = self.grammar.compile()?;
        let lexer = make_lexer(&grammar.symbols)?;
        let table = ParseTable::build(&grammar);
        Ok(Language(Arc::new(LanguageData {
            name: grammar.name.clone(),
            version: self.version,
            grammar,
            table,
            lexer: Box::new(lexer),
            scanner: self.scanner,
        })))
    }
}
