//! Foundation types shared by every layer of the engine.
//!
//! - [`Point`], [`Length`] - row/column positions and extents carried by subtrees
//! - [`InputEdit`] - a single text replacement described in bytes and points
//! - [`LineCol`], [`LineIndex`] - line/column conversion, including UTF-16 columns
//! - [`TextRange`], [`TextSize`] - byte offsets (re-exported from `text-size`)
//!
//! This module has NO dependencies on other modules of the crate.

mod edit;
mod line_index;
mod position;

pub use edit::InputEdit;
pub use line_index::{LineCol, LineIndex};
pub use position::{Length, MAX_TEXT_LEN, Point};

// Re-export text-size types for convenience
pub use text_size;
pub use text_size::{TextRange, TextSize};
