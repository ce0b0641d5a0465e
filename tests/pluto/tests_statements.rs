#![allow(clippy::unwrap_used)]

use pluto_syntax::pluto;
use rstest::rstest;

use crate::helpers::fixtures::PLUTO_SCRIPT;
use crate::helpers::{assert_well_nested, parse};

fn sexp(text: &str) -> String {
    let tree = parse(&pluto::language(), text.as_bytes());
    assert!(!tree.has_error(), "{text:?} -> {}", tree.root_node().to_sexp());
    tree.root_node().to_sexp()
}

#[rstest]
#[case::assignment(
    "count = count - 1",
    "(source_file (assignment left: (identifier) right: (binary_operation left: (identifier) \
     operator: (operator) right: (number))))"
)]
#[case::typed_assignment(
    "name: string = \"pluto\"",
    "(source_file (assignment left: (identifier) type: (type_annotation (type_expression (identifier))) \
     right: (string)))"
)]
#[case::command(
    "echo \"hi\" 42",
    "(source_file (command name: (identifier) arguments: (argument_list (string) (number))))"
)]
#[case::bare_command("ls", "(source_file (command name: (identifier)))")]
#[case::array(
    "xs = [1, 2, 3]",
    "(source_file (assignment left: (identifier) right: (array_literal (number) (number) (number))))"
)]
#[case::object(
    "o = {a: 1}",
    "(source_file (assignment left: (identifier) right: (object_literal (object_pair key: (identifier) \
     value: (number)))))"
)]
#[case::unary(
    "x = -y",
    "(source_file (assignment left: (identifier) right: (unary_operation operator: (operator) \
     argument: (identifier))))"
)]
#[case::parenthesized(
    "x = (a + b) * c",
    "(source_file (assignment left: (identifier) right: (binary_operation left: (parenthesized_expression \
     (binary_operation left: (identifier) operator: (operator) right: (identifier))) operator: (operator) \
     right: (identifier))))"
)]
#[case::for_loop(
    "for i in items { print i }",
    "(source_file (for_loop variable: (identifier) iterable: (identifier) body: (block (command \
     name: (identifier) arguments: (argument_list (identifier))))))"
)]
#[case::if_else(
    "if x > 1 { y = 2 } else { y = 3 }",
    "(source_file (if_statement condition: (binary_operation left: (identifier) operator: (operator) \
     right: (number)) consequence: (block (assignment left: (identifier) right: (number))) \
     alternative: (block (assignment left: (identifier) right: (number)))))"
)]
fn test_statement_shapes(#[case] text: &str, #[case] expected: &str) {
    assert_eq!(sexp(text), expected);
}

#[rstest]
#[case::while_loop("while n < 10 {\n  n = n + 1\n}", "while_loop")]
#[case::function("function add(a: number, b = 1) -> number {\n  total = a + b\n}", "function_definition")]
#[case::block_comment("/* header */", "block_comment_statement")]
#[case::multiple_targets("a b = 1", "assignment")]
#[case::command_with_identifiers("greet alice bob", "command")]
#[case::empty_block("while ready {}", "while_loop")]
fn test_statement_kinds(#[case] text: &str, #[case] kind: &str) {
    let tree = parse(&pluto::language(), text.as_bytes());
    assert!(!tree.has_error(), "{text:?} -> {}", tree.root_node().to_sexp());
    let statement = tree.root_node().named_child(0).unwrap();
    assert_eq!(statement.kind(), kind);
    assert_eq!(statement.byte_range(), 0..text.len());
}

#[test]
fn test_operator_precedence() {
    let tree = parse(&pluto::language(), b"x = a || b && c == d + e * f");
    let right = tree.root_node().named_child(0).unwrap().child_by_field_name("right").unwrap();
    let text = b"x = a || b && c == d + e * f";
    assert_eq!(right.child_by_field_name("operator").unwrap().utf8_text(text).unwrap(), "||");
    let and = right.child_by_field_name("right").unwrap();
    assert_eq!(and.child_by_field_name("operator").unwrap().utf8_text(text).unwrap(), "&&");
    let equality = and.child_by_field_name("right").unwrap();
    assert_eq!(equality.child_by_field_name("operator").unwrap().utf8_text(text).unwrap(), "==");
}

#[test]
fn test_command_arguments_keep_identifiers() {
    let text = b"greet alice bob";
    let tree = parse(&pluto::language(), text);
    let command = tree.root_node().named_child(0).unwrap();
    let arguments = command.child_by_field_name("arguments").unwrap();
    let names: Vec<_> = arguments
        .named_children()
        .map(|n| n.utf8_text(text).unwrap())
        .collect();
    assert_eq!(names, ["alice", "bob"]);
}

#[test]
fn test_full_script() {
    let tree = parse(&pluto::language(), PLUTO_SCRIPT.as_bytes());
    let root = tree.root_node();
    assert!(!tree.has_error(), "{}", root.to_sexp());
    assert_eq!(root.byte_range(), 0..PLUTO_SCRIPT.len());
    let kinds: Vec<_> = root.named_children().map(|n| n.kind()).collect();
    assert_eq!(
        kinds,
        [
            "comment",
            "assignment",
            "assignment",
            "function_definition",
            "if_statement",
            "while_loop",
            "for_loop"
        ]
    );
    assert_well_nested(&tree);
}

#[test]
fn test_statements_on_separate_lines() {
    let text = "a = 1\n\nb = 2\n   \nprint a b\n";
    let tree = parse(&pluto::language(), text.as_bytes());
    assert!(!tree.has_error(), "{}", tree.root_node().to_sexp());
    let kinds: Vec<_> = tree.root_node().named_children().map(|n| n.kind()).collect();
    assert_eq!(kinds, ["assignment", "assignment", "command"]);
}

#[test]
fn test_line_continuation_joins_arguments() {
    let text = "echo a \\\n  b";
    let tree = parse(&pluto::language(), text.as_bytes());
    assert!(!tree.has_error(), "{}", tree.root_node().to_sexp());
    let command = tree.root_node().named_child(0).unwrap();
    assert_eq!(command.kind(), "command");
    assert_eq!(command.byte_range(), 0..text.len());
}
