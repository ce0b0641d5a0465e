//! Engine tests over toy grammars
//!
//! - Deterministic and ambiguous (GLR) parsing
//! - Error recovery and containment
//! - Incremental reparsing and subtree reuse
//! - External scanners
//! - Randomised properties
//! - Sharing trees and languages across threads

pub mod tests_concurrency;
pub mod tests_external_scanner;
pub mod tests_glr;
pub mod tests_grammar;
pub mod tests_incremental;
