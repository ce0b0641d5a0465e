//! Parsing many independent documents in parallel.

use rayon::prelude::*;

use super::Parser;
use crate::language::Language;
use crate::tree::Tree;

/// Parse every input with `language`, one parser per worker thread.
///
/// Results are in input order. An entry is `None` only when the language is
/// incompatible with this crate.
pub fn parse_batch<T>(language: &Language, inputs: &[T]) -> Vec<Option<Tree>>
where
    T: AsRef<[u8]> + Sync,
{
    inputs
        .par_iter()
        .map_init(
            || {
                let mut parser = Parser::new();
                parser.set_language(language).ok().map(|()| parser)
            },
            |parser, input| parser.as_mut()?.parse(input.as_ref(), None),
        )
        .collect()
}
