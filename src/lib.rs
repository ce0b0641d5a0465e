//! # pluto-syntax
//!
//! A table-driven GLR parsing engine with incremental reparsing, and the Pluto
//! language built on it.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! pluto     → Pluto grammar + logos lexer, `pluto::language()`
//!   ↓
//! parser    → GLR driver: stacks, recovery, subtree reuse, batch parsing
//!   ↓
//! tree      → Persistent subtrees, nodes, cursors, edits, diagnostics, rowan export
//!   ↓
//! language  → Language handle: table + lexer + external scanner factory
//!   ↓
//! table     → LR(1) parse table generation with GLR conflicts
//!   ↓
//! grammar   → Rule DSL, validation, flattening into productions
//!   ↓
//! base      → Points, lengths, edits, line index
//! ```
//!
//! ## Example
//!
//! ```
//! use pluto_syntax::{InputEdit, Parser};
//!
//! let mut parser = Parser::new();
//! parser.set_language(&pluto_syntax::pluto::language()).unwrap();
//!
//! let old_text = b"x = 1\ny = 2\n";
//! let mut tree = parser.parse(old_text, None).unwrap();
//!
//! let edit = InputEdit::new(old_text, 4, 5, b"10");
//! let new_text = edit.apply(old_text, b"10");
//! tree.edit(&edit);
//! let new_tree = parser.parse(&new_text, Some(&tree)).unwrap();
//! assert_eq!(new_tree.root_node().byte_range(), 0..new_text.len());
//! ```

// ============================================================================
// MODULES (dependency order: base → grammar → table → language → tree → parser → pluto)
// ============================================================================

/// Foundation types: points, lengths, edits, line index
pub mod base;

/// Grammar rules and their compilation into productions
pub mod grammar;

/// LR(1) parse tables with GLR conflicts
pub mod table;

/// Language handle, lexer and external scanner interfaces
pub mod language;

/// Persistent syntax trees
pub mod tree;

/// GLR parser and incremental reparsing
pub mod parser;

/// The Pluto language
pub mod pluto;

// Re-export foundation types
pub use base::{InputEdit, Length, LineCol, LineIndex, MAX_TEXT_LEN, Point, TextRange, TextSize};

pub use grammar::{FieldId, Grammar, GrammarBuilder, GrammarError, Symbol};
pub use language::{
    ExternalScanner, LANGUAGE_VERSION, Language, LanguageBuilder, LanguageError, Lex, LexInput,
    Lexeme, MIN_COMPATIBLE_LANGUAGE_VERSION, ScanCursor, ValidSymbols,
};
pub use parser::{ParseStats, Parser, ParserConfig, parse_batch};
pub use tree::{Node, SyntaxError, SyntaxErrorKind, Tree, TreeCursor};
