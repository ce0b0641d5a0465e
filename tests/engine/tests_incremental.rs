#![allow(clippy::unwrap_used)]

use pluto_syntax::{InputEdit, Language, Parser, ParserConfig, Point, Tree};
use proptest::prelude::*;

use crate::helpers::languages::{ambiguous, calc};
use crate::helpers::{fingerprint, parse};

/// Apply one edit to `old_text`, reparse incrementally and return the edited
/// old tree, the new tree and the new text.
fn reparse(
    parser: &mut Parser,
    old_text: &[u8],
    old_tree: &Tree,
    start: usize,
    end: usize,
    replacement: &[u8],
) -> (Tree, Tree, Vec<u8>) {
    let edit = InputEdit::new(old_text, start, end, replacement);
    let new_text = edit.apply(old_text, replacement);
    let mut edited = old_tree.clone();
    edited.edit(&edit);
    let new_tree = parser.parse(&new_text, Some(&edited)).unwrap();
    (edited, new_tree, new_text)
}

fn parser_for(language: &Language) -> Parser {
    let mut parser = Parser::new();
    parser.set_language(language).unwrap();
    parser
}

#[test]
fn test_edit_marks_changes_and_shifts_positions() {
    let language = calc();
    let old_text = b"a = 1;\nb = 2;\n";
    let mut tree = parse(&language, old_text);
    let edit = InputEdit::new(old_text, 4, 5, b"100");
    tree.edit(&edit);

    let root = tree.root_node();
    assert!(root.has_changes());
    assert_eq!(root.end_byte(), old_text.len() + 2);
    let first = root.named_child(0).unwrap();
    let second = root.named_child(1).unwrap();
    assert!(first.has_changes());
    assert!(!second.has_changes());
    assert_eq!(second.start_byte(), 9);
    assert_eq!(second.start_position(), Point::new(1, 0));
}

#[test]
fn test_reparse_matches_fresh_parse_and_reuses() {
    let language = calc();
    let old_text = b"a = 1;\nb = (2 + 3) * 4;\nc = f(5);\nd = 6;\n";
    let mut parser = parser_for(&language);
    let old_tree = parser.parse(old_text, None).unwrap();

    let (_, new_tree, new_text) = reparse(&mut parser, old_text, &old_tree, 4, 5, b"x + y");
    assert!(parser.stats().reused_subtrees > 0);
    assert_eq!(fingerprint(&new_tree), fingerprint(&parse(&language, &new_text)));
    assert!(!new_tree.has_error());
}

#[test]
fn test_unchanged_subtrees_are_shared() {
    let language = calc();
    let old_text = b"a = 1;\nb = 2;\nc = 3;\n";
    let mut parser = parser_for(&language);
    let old_tree = parser.parse(old_text, None).unwrap();

    let (_, new_tree, _) = reparse(&mut parser, old_text, &old_tree, 4, 5, b"7");
    let old_last = old_tree.root_node().named_child(2).unwrap();
    let new_last = new_tree.root_node().named_child(2).unwrap();
    assert_eq!(old_last.id(), new_last.id());
    let old_first = old_tree.root_node().named_child(0).unwrap();
    let new_first = new_tree.root_node().named_child(0).unwrap();
    assert_ne!(old_first.id(), new_first.id());
}

#[test]
fn test_changed_ranges_cover_the_edit() {
    let language = calc();
    let old_text = b"a = 1;\nb = 2;\nc = 3;\n";
    let mut parser = parser_for(&language);
    let old_tree = parser.parse(old_text, None).unwrap();

    let (edited, new_tree, _) = reparse(&mut parser, old_text, &old_tree, 11, 12, b"g(2)");
    let ranges = edited.changed_ranges(&new_tree);
    assert!(!ranges.is_empty());
    for range in &ranges {
        assert!(usize::from(range.start()) >= 7, "{range:?}");
        assert!(usize::from(range.end()) <= 17, "{range:?}");
    }
}

#[test]
fn test_edit_that_changes_statement_kind() {
    let language = calc();
    let old_text = b"a = 1;\nb;\n";
    let mut parser = parser_for(&language);
    let old_tree = parser.parse(old_text, None).unwrap();
    assert_eq!(old_tree.root_node().named_child(1).unwrap().kind(), "expression_statement");

    let (_, new_tree, new_text) = reparse(&mut parser, old_text, &old_tree, 8, 8, b" = 2");
    assert_eq!(new_tree.root_node().named_child(1).unwrap().kind(), "assignment");
    assert_eq!(fingerprint(&new_tree), fingerprint(&parse(&language, &new_text)));
}

#[test]
fn test_edit_into_and_out_of_error() {
    let language = calc();
    let old_text = b"a = 1;\nb = 2;\nc = 3;\n";
    let mut parser = parser_for(&language);
    let old_tree = parser.parse(old_text, None).unwrap();

    let (_, broken, broken_text) = reparse(&mut parser, old_text, &old_tree, 11, 12, b"");
    assert!(broken.has_error());
    assert_eq!(broken.root_node().byte_range(), 0..broken_text.len());
    assert_eq!(fingerprint(&broken), fingerprint(&parse(&language, &broken_text)));

    let (_, fixed, fixed_text) = reparse(&mut parser, &broken_text, &broken, 11, 11, b"9");
    assert!(!fixed.has_error());
    assert_eq!(fingerprint(&fixed), fingerprint(&parse(&language, &fixed_text)));
}

#[test]
fn test_nodes_after_unrecognized_input_are_not_reused() {
    let language = calc();
    let text = b"a = 1 $;\nb = 2;\n";
    let old_tree = parse(&language, text);
    assert!(old_tree.has_error());

    let mut parser = parser_for(&language);
    let tree = parser.parse(text, Some(&old_tree)).unwrap();
    assert_eq!(fingerprint(&tree), fingerprint(&old_tree));
    let (_, tree, new_text) = reparse(&mut parser, text, &old_tree, 0, 0, b" ");
    assert_eq!(fingerprint(&tree), fingerprint(&parse(&language, &new_text)));
}

#[test]
fn test_reuse_can_be_disabled() {
    let language = calc();
    let old_text = b"a = 1;\nb = 2;\nc = 3;\n";
    let mut parser = Parser::with_config(ParserConfig::default().with_reuse_subtrees(false));
    parser.set_language(&language).unwrap();
    let old_tree = parser.parse(old_text, None).unwrap();

    let (_, new_tree, new_text) = reparse(&mut parser, old_text, &old_tree, 4, 5, b"8");
    assert_eq!(parser.stats().reused_subtrees, 0);
    assert_eq!(fingerprint(&new_tree), fingerprint(&parse(&language, &new_text)));
}

#[test]
fn test_tree_from_another_language_is_ignored() {
    let calc = calc();
    let other = ambiguous();
    let old_tree = parse(&other, b"a b;");

    let mut parser = parser_for(&calc);
    let tree = parser.parse(b"a;", Some(&old_tree)).unwrap();
    assert_eq!(parser.stats().reused_subtrees, 0);
    assert_eq!(tree.root_node().kind(), "program");
}

fn statement() -> impl Strategy<Value = String> {
    let operand = prop_oneof!["[a-e]", "[0-9]{1,3}", "[a-e]\\([0-9]\\)"];
    let operator = prop_oneof![Just("+"), Just("-"), Just("*"), Just("/"), Just("^")];
    (
        "[a-e]",
        proptest::collection::vec((operator, operand.clone()), 0..3),
        operand,
    )
        .prop_map(|(target, tail, head)| {
            let mut expression = head;
            for (operator, operand) in tail {
                expression.push_str(&format!(" {operator} {operand}"));
            }
            format!("{target} = {expression};\n")
        })
}

fn program() -> impl Strategy<Value = String> {
    proptest::collection::vec(statement(), 1..6).prop_map(|statements| statements.concat())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_incremental_equals_fresh(
        old_text in program(),
        replacement in program(),
        start in 0usize..200,
        len in 0usize..20,
    ) {
        let language = calc();
        let start = start.min(old_text.len());
        let end = (start + len).min(old_text.len());
        let mut parser = parser_for(&language);
        let old_tree = parser.parse(old_text.as_bytes(), None).unwrap();

        let (_, new_tree, new_text) =
            reparse(&mut parser, old_text.as_bytes(), &old_tree, start, end, replacement.as_bytes());
        prop_assert_eq!(new_tree.root_node().byte_range(), 0..new_text.len());
        prop_assert_eq!(fingerprint(&new_tree), fingerprint(&parse(&language, &new_text)));
    }

    #[test]
    fn prop_statement_boundary_edits_reuse(
        old_text in program(),
        replacement in statement(),
        index in 0usize..6,
    ) {
        let language = calc();
        let boundaries: Vec<usize> = std::iter::once(0)
            .chain(old_text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        let start = boundaries[index % boundaries.len()];
        let mut parser = parser_for(&language);
        let old_tree = parser.parse(old_text.as_bytes(), None).unwrap();

        let (_, new_tree, new_text) =
            reparse(&mut parser, old_text.as_bytes(), &old_tree, start, start, replacement.as_bytes());
        prop_assert!(!new_tree.has_error());
        prop_assert_eq!(fingerprint(&new_tree), fingerprint(&parse(&language, &new_text)));
    }
}
