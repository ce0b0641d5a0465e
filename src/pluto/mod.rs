//! The Pluto language.
//!
//! Pluto is a small shell-flavoured scripting language: newline-separated
//! statements (assignments, commands with space-separated arguments, `if`,
//! `while`, `for`, `function`), C-style expressions and optional type
//! annotations.
//!
//! ```
//! let language = pluto_syntax::pluto::language();
//! let mut parser = pluto_syntax::Parser::new();
//! parser.set_language(&language).unwrap();
//! let tree = parser.parse(b"total = price * 2\n", None).unwrap();
//! assert_eq!(tree.root_node().kind(), "source_file");
//! assert!(!tree.has_error());
//! ```

mod grammar;
mod lexer;

use std::sync::LazyLock;

use crate::grammar::GrammarError;
use crate::language::Language;

use lexer::PlutoLexer;

static LANGUAGE: LazyLock<Language> = LazyLock::new(|| match build() {
    Ok(language) => language,
    Err(error) => panic!("the built-in Pluto grammar is invalid: {error}"),
});

/// The process-wide Pluto language handle.
///
/// The grammar is compiled on the first call; every call returns a handle to
/// the same shared tables.
pub fn language() -> Language {
    LANGUAGE.clone()
}

/// Compile a fresh, independent copy of the Pluto language.
pub fn build() -> Result<Language, GrammarError> {
    Language::builder(grammar::grammar()?).build(PlutoLexer::new)
}
