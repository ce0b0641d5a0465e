#![allow(clippy::unwrap_used)]

use pluto_syntax::{SyntaxErrorKind, pluto};

use crate::helpers::{assert_well_nested, parse, token_text};

#[test]
fn test_unknown_character_is_contained() {
    let text = "x = 1\ny = 2 @\nz = 3\n";
    let tree = parse(&pluto::language(), text.as_bytes());
    assert!(tree.has_error());
    assert_well_nested(&tree);

    let errors = tree.errors();
    assert!(
        errors
            .iter()
            .any(|e| e.kind == SyntaxErrorKind::UnrecognizedInput && usize::from(e.range.start()) == 12),
        "{errors:?}"
    );

    let root = tree.root_node();
    let first = root.named_child(0).unwrap();
    assert_eq!(first.utf8_text(text.as_bytes()).unwrap(), "x = 1");
    assert!(!first.has_error());
    let last = root.named_children().last().unwrap();
    assert_eq!(last.kind(), "assignment");
    assert_eq!(last.utf8_text(text.as_bytes()).unwrap(), "z = 3");
    assert!(!last.has_error());
}

#[test]
fn test_missing_operand_at_end_of_input() {
    let text = "print a\ntotal = a +";
    let tree = parse(&pluto::language(), text.as_bytes());
    let errors = tree.errors();
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(errors[0].is_missing());
    assert_eq!(usize::from(errors[0].range.start()), text.len());

    let root = tree.root_node();
    assert!(!root.named_child(0).unwrap().has_error());
    let assignment = root.named_child(1).unwrap();
    assert_eq!(assignment.kind(), "assignment");
    let right = assignment.child_by_field_name("right").unwrap();
    assert!(right.child_by_field_name("right").unwrap().is_missing());
}

#[test]
fn test_unclosed_block_at_end_of_input() {
    let text = "x = 1\nwhile x {\n  x = x - 1\n";
    let tree = parse(&pluto::language(), text.as_bytes());
    assert!(tree.has_error());
    assert_eq!(tree.root_node().byte_range(), 0..text.len());
    assert_eq!(token_text(&tree, text.as_bytes()), text.as_bytes());
    assert!(!tree.root_node().named_child(0).unwrap().has_error());
}

#[test]
fn test_error_positions_are_line_based() {
    let text = "a = 1\nb = 2 @";
    let tree = parse(&pluto::language(), text.as_bytes());
    let error = tree
        .errors()
        .into_iter()
        .find(|e| e.kind == SyntaxErrorKind::UnrecognizedInput)
        .unwrap();
    assert_eq!(error.start.row, 1);
    assert_eq!(error.start.column, 6);
    assert!(error.to_string().starts_with("2:7:"), "{error}");
}

#[test]
fn test_stray_closing_brace() {
    let text = "}\nx = 1\n";
    let tree = parse(&pluto::language(), text.as_bytes());
    assert!(tree.has_error());
    assert_well_nested(&tree);
    assert_eq!(token_text(&tree, text.as_bytes()), text.as_bytes());
    let last = tree.root_node().named_children().last().unwrap();
    assert_eq!(last.kind(), "assignment");
}
