#![allow(clippy::unwrap_used)]

use pluto_syntax::{Node, Tree, pluto};
use rstest::rstest;

use crate::helpers::parse;

fn sexp(text: &str) -> String {
    let tree = parse(&pluto::language(), text.as_bytes());
    assert!(!tree.has_error(), "{text:?} -> {}", tree.root_node().to_sexp());
    tree.root_node().to_sexp()
}

/// Right-hand side of the single assignment in `text`.
fn right_side<'t>(tree: &'t Tree, text: &str) -> Node<'t> {
    assert!(!tree.has_error(), "{text:?} -> {}", tree.root_node().to_sexp());
    let statement = tree.root_node().named_child(0).unwrap();
    assert_eq!(statement.kind(), "assignment", "{text:?}");
    statement.child_by_field_name("right").unwrap()
}

#[rstest]
#[case::conditional(
    "t = a ? b : c",
    "(source_file (assignment left: (identifier) right: (conditional_expression condition: (identifier) \
     consequence: (identifier) alternative: (identifier))))"
)]
#[case::conditional_argument(
    "echo (a ? b : c)",
    "(source_file (command name: (identifier) arguments: (argument_list (parenthesized_expression \
     (conditional_expression condition: (identifier) consequence: (identifier) alternative: (identifier))))))"
)]
#[case::concatenation(
    "x = a ++ b",
    "(source_file (assignment left: (identifier) right: (binary_operation left: (identifier) \
     operator: (operator) right: (identifier))))"
)]
#[case::string_concatenation(
    "s = 'it' ++ \"x\"",
    "(source_file (assignment left: (identifier) right: (binary_operation left: (string) \
     operator: (operator) right: (string))))"
)]
#[case::membership_chain(
    "ok = a in xs matches p",
    "(source_file (assignment left: (identifier) right: (binary_operation left: (binary_operation \
     left: (identifier) operator: (operator) right: (identifier)) operator: (operator) right: (identifier))))"
)]
#[case::postfix_increment(
    "x = i++",
    "(source_file (assignment left: (identifier) right: (postfix_operation operand: (identifier) \
     operator: (operator))))"
)]
#[case::postfix_question(
    "x = ok?",
    "(source_file (assignment left: (identifier) right: (postfix_operation operand: (identifier) \
     operator: (operator))))"
)]
#[case::keyword_unary(
    "x = typeof y",
    "(source_file (assignment left: (identifier) right: (unary_operation operator: (operator) \
     argument: (identifier))))"
)]
#[case::empty_array(
    "xs = []",
    "(source_file (assignment left: (identifier) right: (array_literal)))"
)]
#[case::trailing_comma(
    "xs = [1, 2,]",
    "(source_file (assignment left: (identifier) right: (array_literal (number) (number))))"
)]
#[case::empty_object(
    "o = {}",
    "(source_file (assignment left: (identifier) right: (object_literal)))"
)]
#[case::object_keys(
    "o = {\"k\": 1, [k]: true}",
    "(source_file (assignment left: (identifier) right: (object_literal (object_pair key: (string) \
     value: (number)) (object_pair key: (computed_property (identifier)) value: (boolean)))))"
)]
fn test_expression_shapes(#[case] text: &str, #[case] expected: &str) {
    assert_eq!(sexp(text), expected);
}

#[rstest]
fn test_binary_operators(
    #[values(
        "||", "&&", "==", "!=", "===", "!==", "<", ">", "<=", ">=", "|", "^", "&", "<<", ">>", ">>>",
        "+", "-", "*", "/", "%", "**", "++", "in", "matches"
    )]
    operator: &str,
) {
    let text = format!("x = a {operator} b");
    let tree = parse(&pluto::language(), text.as_bytes());
    let right = right_side(&tree, &text);
    assert_eq!(right.kind(), "binary_operation", "{text:?}");
    let token = right.child_by_field_name("operator").unwrap();
    assert_eq!(token.utf8_text(text.as_bytes()).unwrap(), operator);
    assert_eq!(right.byte_range(), 4..text.len());
}

#[rstest]
fn test_unary_operators(
    #[values("-", "+", "!", "~", "++", "--", "typeof ", "not ")] operator: &str,
) {
    let text = format!("x = {operator}y");
    let tree = parse(&pluto::language(), text.as_bytes());
    let right = right_side(&tree, &text);
    assert_eq!(right.kind(), "unary_operation", "{text:?}");
    let token = right.child_by_field_name("operator").unwrap();
    assert_eq!(token.utf8_text(text.as_bytes()).unwrap(), operator.trim_end());
}

#[rstest]
fn test_postfix_operators(#[values("++", "--", "?", "!")] operator: &str) {
    let text = format!("x = y{operator}");
    let tree = parse(&pluto::language(), text.as_bytes());
    let right = right_side(&tree, &text);
    assert_eq!(right.kind(), "postfix_operation", "{text:?}");
    assert_eq!(right.child_by_field_name("operand").unwrap().kind(), "identifier");
}

#[rstest]
#[case::same_level_is_left_associative("x = a - b + c", "+")]
#[case::multiplication_binds_tighter("x = a + b * c", "+")]
#[case::power_binds_tighter_than_multiplication("x = a * b ** c", "*")]
#[case::shift_below_addition("x = a << b + c", "<<")]
#[case::comparison_below_shift("x = a < b >> c", "<")]
#[case::membership_is_a_comparison("x = a < b in c", "in")]
#[case::bitwise_ladder("x = a | b ^ c & d", "|")]
fn test_outermost_operator(#[case] text: &str, #[case] outermost: &str) {
    let tree = parse(&pluto::language(), text.as_bytes());
    let right = right_side(&tree, text);
    let operator = right.child_by_field_name("operator").unwrap();
    assert_eq!(operator.utf8_text(text.as_bytes()).unwrap(), outermost, "{}", right.to_sexp());
}

#[rstest]
#[case::plain("n: number = 1", "identifier")]
#[case::generic("xs: Array<number> = []", "generic_type")]
#[case::union("v: number | string = 1", "union_type")]
#[case::array("xs: number[] = []", "array_type")]
#[case::function("f: (number, string) => boolean = g", "function_type")]
fn test_type_annotations(#[case] text: &str, #[case] kind: &str) {
    let tree = parse(&pluto::language(), text.as_bytes());
    assert!(!tree.has_error(), "{text:?} -> {}", tree.root_node().to_sexp());
    let annotation = tree
        .root_node()
        .named_child(0)
        .unwrap()
        .child_by_field_name("type")
        .unwrap();
    let expression = annotation.named_child(0).unwrap();
    assert_eq!(expression.kind(), "type_expression");
    assert_eq!(expression.named_child(0).unwrap().kind(), kind);
}
