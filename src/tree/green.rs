//! Export to a rowan green tree.
//!
//! Raw rowan kinds are symbol ids of the source language. Every leaf becomes a
//! token, including hidden trivia, so the exported tree is lossless for valid
//! UTF-8 input. Hidden interior nodes are flattened away.

use rowan::{GreenNode, GreenNodeBuilder};

use super::Tree;
use super::subtree::Subtree;
use crate::grammar::Symbol;

/// rowan language tag for trees exported from any grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Cst {}

impl rowan::Language for Cst {
    type Kind = Symbol;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        Symbol::from_raw(raw.0)
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        rowan::SyntaxKind(kind.raw())
    }
}

pub type CstNode = rowan::SyntaxNode<Cst>;
pub type CstToken = rowan::SyntaxToken<Cst>;
pub type CstElement = rowan::SyntaxElement<Cst>;

enum Step<'tree> {
    Enter {
        subtree: &'tree Subtree,
        start: usize,
        alias: Option<Symbol>,
    },
    Exit,
}

pub(crate) fn build_green(tree: &Tree, source: &[u8]) -> GreenNode {
    let language = tree.language();
    let mut builder = GreenNodeBuilder::new();
    let mut stack = vec![Step::Enter {
        subtree: tree.root_subtree(),
        start: 0,
        alias: None,
    }];

    while let Some(step) = stack.pop() {
        let (subtree, start, alias) = match step {
            Step::Enter {
                subtree,
                start,
                alias,
            } => (subtree, start, alias),
            Step::Exit => {
                builder.finish_node();
                continue;
            }
        };
        let kind = rowan::SyntaxKind(alias.unwrap_or_else(|| subtree.symbol()).raw());

        if subtree.is_leaf() {
            let end = (start + subtree.size().byte_len()).min(source.len());
            let text = String::from_utf8_lossy(&source[start.min(end)..end]);
            builder.token(kind, &text);
            continue;
        }

        let visible = match alias {
            Some(alias) => language.node_kind_is_visible(alias),
            None => subtree.is_visible(),
        };
        if visible || std::ptr::eq(subtree, tree.root_subtree()) {
            builder.start_node(kind);
            stack.push(Step::Exit);
        }

        let production = subtree
            .production()
            .and_then(|id| language.parse_table().production(id));
        let mut entries = Vec::with_capacity(subtree.children().len());
        let mut position = start;
        let mut structural = 0;
        for child in subtree.children() {
            let alias = if child.is_extra() {
                None
            } else {
                structural += 1;
                production.and_then(|p| p.alias(structural - 1))
            };
            entries.push(Step::Enter {
                subtree: child,
                start: position,
                alias,
            });
            position += child.size().byte_len();
        }
        stack.extend(entries.into_iter().rev());
    }
    builder.finish()
}
