#![allow(clippy::unwrap_used)]

use pluto_syntax::{ExternalScanner, InputEdit, Parser};
use proptest::prelude::*;

use crate::helpers::languages::{CLOSE, DepthScanner, OPEN, nested};
use crate::helpers::{fingerprint, parse, token_text};

#[test]
fn test_external_symbols_follow_literals() {
    let language = nested();
    assert!(language.has_external_scanner());
    assert_eq!(language.external_tokens(), [OPEN, CLOSE]);
    assert_eq!(language.id_for_node_kind("open", true), Some(OPEN));
    assert_eq!(language.id_for_node_kind("close", true), Some(CLOSE));
}

#[test]
fn test_groups_nest() {
    let language = nested();
    let tree = parse(&language, b"a (b (c) d) e");
    assert!(!tree.has_error(), "{}", tree.root_node().to_sexp());
    assert_eq!(
        tree.root_node().to_sexp(),
        "(document (identifier) (group (open) (identifier) (group (open) (identifier) (close)) \
         (identifier) (close)) (identifier))"
    );
}

#[test]
fn test_scanner_state_is_stored_on_external_leaves() {
    let language = nested();
    let text = b"((x))";
    let tree = parse(&language, text);
    let externals: Vec<_> = tree
        .tokens()
        .filter(|token| token.symbol == OPEN || token.symbol == CLOSE)
        .map(|token| (token.symbol, token.byte_range()))
        .collect();
    assert_eq!(
        externals,
        [(OPEN, 0..1), (OPEN, 1..2), (CLOSE, 3..4), (CLOSE, 4..5)]
    );
}

#[test]
fn test_stray_close_is_unrecognized() {
    let language = nested();
    let text = b"a ) b";
    let tree = parse(&language, text);
    assert!(tree.has_error());
    assert_eq!(token_text(&tree, text), text);
    let error = tree.errors().into_iter().next().unwrap();
    assert_eq!(usize::from(error.range.start()), 2);
}

#[test]
fn test_unclosed_group_gets_missing_close() {
    let language = nested();
    let tree = parse(&language, b"(a");
    let errors = tree.errors();
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(errors[0].is_missing());
    assert_eq!(usize::from(errors[0].range.start()), 2);
}

#[test]
fn test_incremental_edit_inside_group() {
    let language = nested();
    let old_text = b"(a (b)) (c)";
    let mut parser = Parser::new();
    parser.set_language(&language).unwrap();
    let mut tree = parser.parse(old_text, None).unwrap();

    let edit = InputEdit::new(old_text, 4, 5, b"x (y)");
    let new_text = edit.apply(old_text, b"x (y)");
    tree.edit(&edit);
    let reparsed = parser.parse(&new_text, Some(&tree)).unwrap();
    assert!(!reparsed.has_error());
    assert_eq!(fingerprint(&reparsed), fingerprint(&parse(&language, &new_text)));
}

#[test]
fn test_initial_state_is_empty() {
    let mut scanner = DepthScanner { depth: 3 };
    scanner.deserialize(&[]);
    assert_eq!(scanner.depth, 0);
    let mut buffer = Vec::new();
    scanner.serialize(&mut buffer);
    assert!(buffer.is_empty());
}

proptest! {
    #[test]
    fn prop_scanner_state_round_trips(depth in 0u32..10_000) {
        let scanner = DepthScanner { depth };
        let mut first = Vec::new();
        scanner.serialize(&mut first);

        let mut restored = DepthScanner::default();
        restored.deserialize(&first);
        let mut second = Vec::new();
        restored.serialize(&mut second);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_balanced_groups_parse_cleanly(shape in "[()a ]{0,40}") {
        let language = nested();
        let mut depth = 0i32;
        let balanced = shape.chars().all(|c| {
            depth += match c { '(' => 1, ')' => -1, _ => 0 };
            depth >= 0
        }) && depth == 0;

        let tree = parse(&language, shape.as_bytes());
        prop_assert_eq!(tree.root_node().byte_range(), 0..shape.len());
        prop_assert_eq!(token_text(&tree, shape.as_bytes()), shape.as_bytes());
        if balanced {
            prop_assert!(!tree.has_error());
        }
    }
}
