#![allow(clippy::unwrap_used)]

use pluto_syntax::Parser;
use rstest::rstest;

use crate::helpers::fixtures::CALC_PROGRAM;
use crate::helpers::languages::{ambiguous, calc};
use crate::helpers::{assert_well_nested, parse};

#[test]
fn test_calc_program_parses_cleanly() {
    let language = calc();
    let tree = parse(&language, CALC_PROGRAM.as_bytes());
    let root = tree.root_node();

    assert!(!tree.has_error(), "{}", root.to_sexp());
    assert_eq!(root.kind(), "program");
    assert_eq!(root.byte_range(), 0..CALC_PROGRAM.len());
    let kinds: Vec<_> = root.named_children().map(|n| n.kind()).collect();
    assert_eq!(kinds, ["assignment", "assignment", "expression_statement"]);
    assert_well_nested(&tree);
}

#[test]
fn test_assignment_fields() {
    let language = calc();
    let tree = parse(&language, b"x = 1 + 2 * 3;");
    assert_eq!(
        tree.root_node().to_sexp(),
        "(program (assignment left: (identifier) right: (binary left: (number) right: \
         (binary left: (number) right: (number)))))"
    );
}

#[rstest]
#[case::left_associative("a - b - c;", "(binary left: (binary left: (identifier) right: (identifier)) right: (identifier))")]
#[case::right_associative("a ^ b ^ c;", "(binary left: (identifier) right: (binary left: (identifier) right: (identifier)))")]
#[case::product_binds_tighter("a + b * c;", "(binary left: (identifier) right: (binary left: (identifier) right: (identifier)))")]
#[case::unary_binds_tighter("-a + b;", "(binary left: (unary operand: (identifier)) right: (identifier))")]
#[case::parentheses("(a + b) * c;", "(binary left: (parenthesized (binary left: (identifier) right: (identifier))) right: (identifier))")]
#[case::call("f(a, b + c);", "(call function: (identifier) (identifier) (binary left: (identifier) right: (identifier)))")]
fn test_precedence_and_associativity(#[case] text: &str, #[case] expected: &str) {
    let language = calc();
    let tree = parse(&language, text.as_bytes());
    let statement = tree.root_node().named_child(0).unwrap();
    assert_eq!(statement.kind(), "expression_statement");
    assert_eq!(statement.named_child(0).unwrap().to_sexp(), expected);
}

#[test]
fn test_operator_field_names_anonymous_token() {
    let language = calc();
    let text = b"a * b;";
    let tree = parse(&language, text);
    let binary = tree.root_node().named_child(0).unwrap().named_child(0).unwrap();
    let operator = binary.child_by_field_name("operator").unwrap();
    assert!(!operator.is_named());
    assert_eq!(operator.utf8_text(text).unwrap(), "*");
    assert_eq!(binary.field_name_for_child(1), Some("operator"));
}

#[test]
fn test_ambiguity_resolved_by_dynamic_precedence() {
    let language = ambiguous();
    let mut parser = Parser::new();
    parser.set_language(&language).unwrap();

    let tree = parser.parse(b"a * b;", None).unwrap();
    assert!(parser.stats().versions_created > 1);
    assert!(!tree.has_error());
    let statement = tree.root_node().named_child(0).unwrap();
    assert_eq!(statement.kind(), "declaration");
    assert_eq!(statement.child_by_field_name("type").unwrap().kind(), "type_name");
    assert_eq!(statement.byte_range(), 0..6);
}

#[test]
fn test_ambiguity_pruned_when_one_reading_fails() {
    let language = ambiguous();
    let mut parser = Parser::new();
    parser.set_language(&language).unwrap();

    let tree = parser.parse(b"a * b * c;", None).unwrap();
    assert!(!tree.has_error());
    let statement = tree.root_node().named_child(0).unwrap();
    assert_eq!(statement.kind(), "expression_statement");
    assert_eq!(statement.named_child(0).unwrap().kind(), "product");
}

#[test]
fn test_unambiguous_input_does_not_fork() {
    let language = ambiguous();
    let mut parser = Parser::new();
    parser.set_language(&language).unwrap();

    let tree = parser.parse(b"a b;", None).unwrap();
    assert_eq!(parser.stats().versions_created, 1);
    assert_eq!(tree.root_node().named_child(0).unwrap().kind(), "declaration");
}

#[test]
fn test_ambiguous_statements_in_sequence() {
    let language = ambiguous();
    let tree = parse(&language, b"a * b;\nc * d * e;\nf g;");
    assert!(!tree.has_error());
    let kinds: Vec<_> = tree.root_node().named_children().map(|n| n.kind()).collect();
    assert_eq!(kinds, ["declaration", "expression_statement", "declaration"]);
}

#[test]
fn test_version_cap_still_produces_a_tree() {
    let language = ambiguous();
    let config = pluto_syntax::ParserConfig::default().with_max_version_count(1);
    let mut parser = Parser::with_config(config);
    parser.set_language(&language).unwrap();

    let tree = parser.parse(b"a * b;", None).unwrap();
    assert_eq!(tree.root_node().byte_range(), 0..6);
    assert!(parser.stats().max_versions >= 1);
}

#[test]
fn test_cursor_walks_named_structure() {
    let language = calc();
    let tree = parse(&language, b"x = f(1);");
    let mut cursor = tree.walk();
    assert_eq!(cursor.node().unwrap().kind(), "program");
    assert!(cursor.goto_first_child());
    assert_eq!(cursor.node().unwrap().kind(), "assignment");
    assert!(cursor.goto_first_child());
    assert_eq!(cursor.field_name(), Some("left"));
    assert!(cursor.goto_next_sibling());
    assert!(cursor.goto_next_sibling());
    assert_eq!(cursor.field_name(), Some("right"));
    assert_eq!(cursor.node().unwrap().kind(), "call");
    assert!(cursor.goto_parent());
    assert_eq!(cursor.depth(), 1);
}
