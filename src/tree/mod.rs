//! Concrete syntax trees.
//!
//! A [`Tree`] owns a root [`Subtree`](subtree::Subtree) and the [`Language`]
//! it was parsed with. Subtrees are immutable and shared: cloning a tree,
//! editing it, or reparsing it never copies unaffected subtrees. All leaves,
//! trivia included, tile the input, so concatenating [`Tree::tokens`] yields
//! the parsed text.

mod cursor;
mod diagnostics;
mod edit;
mod green;
mod node;
pub(crate) mod pool;
pub(crate) mod subtree;

use std::fmt;

use rowan::GreenNode;
use text_size::TextRange;

use crate::base::{InputEdit, Length, Point};
use crate::grammar::Symbol;
use crate::language::Language;

pub use cursor::TreeCursor;
pub use diagnostics::{SyntaxError, SyntaxErrorKind};
pub use green::{Cst, CstElement, CstNode, CstToken};
pub use node::Node;

use subtree::Subtree;

/// An immutable syntax tree.
#[derive(Clone)]
pub struct Tree {
    root: Subtree,
    language: Language,
}

impl Tree {
    pub(crate) fn new(root: Subtree, language: Language) -> Self {
        Self { root, language }
    }

    pub(crate) fn root_subtree(&self) -> &Subtree {
        &self.root
    }

    pub fn root_node(&self) -> Node<'_> {
        Node::new(self, &self.root, Length::ZERO, None)
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn walk(&self) -> TreeCursor<'_> {
        self.root_node().walk()
    }

    pub fn has_error(&self) -> bool {
        self.root.has_error()
    }

    /// Adjust the tree for an edit of its source text so it can seed an
    /// incremental reparse. Subtrees the edit does not touch stay shared.
    pub fn edit(&mut self, edit: &InputEdit) {
        if !edit.is_well_formed() {
            tracing::warn!(?edit, "ignoring malformed edit");
            return;
        }
        self.root = edit::edit_subtree(&self.root, edit);
    }

    /// Every leaf in text order, including hidden trivia and zero-width
    /// MISSING tokens.
    pub fn tokens(&self) -> Tokens<'_> {
        Tokens {
            tree: self,
            stack: vec![(&self.root, Length::ZERO, None)],
        }
    }

    /// Ranges of `new` whose syntactic structure differs from `self`.
    ///
    /// `self` must be the edited tree that was passed to the reparse that
    /// produced `new`, so that both trees share one coordinate space. A token
    /// whose text changed but whose kind and extent did not is not reported.
    pub fn changed_ranges(&self, new: &Tree) -> Vec<TextRange> {
        let mut ranges: Vec<TextRange> = Vec::new();
        let mut stack = vec![(&self.root, Length::ZERO, &new.root, Length::ZERO)];

        while let Some((old, old_start, new, new_start)) = stack.pop() {
            if old.ptr_eq(new) && old_start.bytes == new_start.bytes && !old.has_changes() {
                continue;
            }
            let same_shape = old.symbol() == new.symbol()
                && old_start.bytes == new_start.bytes
                && old.size().bytes == new.size().bytes
                && old.is_leaf() == new.is_leaf();
            if same_shape && old.is_leaf() {
                if old.is_missing() == new.is_missing() {
                    continue;
                }
            } else if same_shape && old.children().len() == new.children().len() {
                let mut old_position = old_start;
                let mut new_position = new_start;
                let mut pairs = Vec::with_capacity(old.children().len());
                for (old_child, new_child) in old.children().iter().zip(new.children()) {
                    pairs.push((old_child, old_position, new_child, new_position));
                    old_position += old_child.size();
                    new_position += new_child.size();
                }
                stack.extend(pairs.into_iter().rev());
                continue;
            }
            let old_range = TextRange::at(old_start.bytes, old.size().bytes);
            let new_range = TextRange::at(new_start.bytes, new.size().bytes);
            ranges.push(old_range.cover(new_range));
        }

        ranges.sort_by_key(|range| (range.start(), range.end()));
        let mut merged: Vec<TextRange> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match merged.last_mut() {
                Some(last) if range.start() <= last.end() => *last = last.cover(range),
                _ => merged.push(range),
            }
        }
        merged
    }

    /// One diagnostic per outermost ERROR node and per MISSING token.
    pub fn errors(&self) -> Vec<SyntaxError> {
        let mut errors = Vec::new();
        let mut stack = vec![(&self.root, Length::ZERO)];
        while let Some((subtree, start)) = stack.pop() {
            if !subtree.has_error() {
                continue;
            }
            let range = TextRange::at(start.bytes, subtree.size().bytes);
            if subtree.is_error() {
                let kind = if subtree.is_leaf() {
                    SyntaxErrorKind::UnrecognizedInput
                } else {
                    SyntaxErrorKind::UnexpectedInput
                };
                errors.push(SyntaxError::new(kind, range, start.extent));
                continue;
            }
            if subtree.is_missing() {
                let kind = self.language.symbol_name(subtree.symbol()).to_string();
                errors.push(SyntaxError::new(
                    SyntaxErrorKind::Missing { kind },
                    range,
                    start.extent,
                ));
                continue;
            }
            let mut position = start;
            let mut children = Vec::with_capacity(subtree.children().len());
            for child in subtree.children() {
                children.push((child, position));
                position += child.size();
            }
            stack.extend(children.into_iter().rev());
        }
        errors
    }

    /// Lossless rowan export; `source` must be the text this tree was parsed from.
    pub fn to_green(&self, source: &[u8]) -> GreenNode {
        green::build_green(self, source)
    }

    /// Structural fingerprint: visible kinds, ranges and error flags in preorder.
    pub fn structure(&self) -> Vec<(Symbol, std::ops::Range<usize>, bool)> {
        let mut out = Vec::new();
        let mut stack = vec![self.root_node()];
        while let Some(node) = stack.pop() {
            out.push((node.kind_id(), node.byte_range(), node.is_missing()));
            let children: Vec<_> = node.children().collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{Tree {:?}}}", self.root_node().to_sexp())
    }
}

/// A leaf of a tree, with its position and kind (aliases applied).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'tree> {
    pub kind: &'tree str,
    pub symbol: Symbol,
    pub range: TextRange,
    pub start_position: Point,
    pub is_named: bool,
    pub is_extra: bool,
    pub is_missing: bool,
}

impl Token<'_> {
    pub fn is_error(&self) -> bool {
        self.symbol == Symbol::ERROR
    }

    pub fn byte_range(&self) -> std::ops::Range<usize> {
        usize::from(self.range.start())..usize::from(self.range.end())
    }

    pub fn text<'a>(&self, source: &'a [u8]) -> &'a [u8] {
        let range = self.byte_range();
        source.get(range).unwrap_or_default()
    }
}

pub struct Tokens<'tree> {
    tree: &'tree Tree,
    stack: Vec<(&'tree Subtree, Length, Option<Symbol>)>,
}

impl<'tree> Iterator for Tokens<'tree> {
    type Item = Token<'tree>;

    fn next(&mut self) -> Option<Token<'tree>> {
        let language = self.tree.language();
        while let Some((subtree, start, alias)) = self.stack.pop() {
            if subtree.is_leaf() {
                let symbol = alias.unwrap_or_else(|| subtree.symbol());
                return Some(Token {
                    kind: language.symbol_name(symbol),
                    symbol,
                    range: TextRange::at(start.bytes, subtree.size().bytes),
                    start_position: start.extent,
                    is_named: language.node_kind_is_named(symbol),
                    is_extra: subtree.is_extra(),
                    is_missing: subtree.is_missing(),
                });
            }
            let production = subtree
                .production()
                .and_then(|id| language.parse_table().production(id));
            let mut position = start;
            let mut structural = 0;
            let mut children = Vec::with_capacity(subtree.children().len());
            for child in subtree.children() {
                let alias = if child.is_extra() {
                    None
                } else {
                    structural += 1;
                    production.and_then(|p| p.alias(structural - 1))
                };
                children.push((child, position, alias));
                position += child.size();
            }
            self.stack.extend(children.into_iter().rev());
        }
        None
    }
}
