//! Pluto language tests
//!
//! - Statement and expression shapes
//! - Lexer context sensitivity (keywords, separators, operators)
//! - Error recovery on broken scripts
//! - Incremental editing of scripts

pub mod tests_errors;
pub mod tests_expressions;
pub mod tests_statements;
