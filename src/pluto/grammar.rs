//! The Pluto grammar as rule data.

use crate::grammar::{
    Grammar, GrammarError, Rule, alias, choice, field, lit, optional, prec, prec_dynamic, prec_left,
    prec_right, repeat, repeat1, seq, sym,
};

// Binding strength, weakest first.
const PREC_COMMAND: i32 = 1;
const PREC_ARGUMENT: i32 = 2;
const PREC_ASSIGNMENT: i32 = 5;
const PREC_CONDITIONAL: i32 = 7;
const PREC_LOGICAL_OR: i32 = 8;
const PREC_LOGICAL_AND: i32 = 9;
const PREC_EQUALITY: i32 = 10;
const PREC_COMPARISON: i32 = 11;
const PREC_BITWISE_OR: i32 = 12;
const PREC_BITWISE_XOR: i32 = 13;
const PREC_BITWISE_AND: i32 = 14;
const PREC_SHIFT: i32 = 15;
const PREC_ADD: i32 = 16;
const PREC_MULT: i32 = 17;
const PREC_POWER: i32 = 18;
const PREC_UNARY: i32 = 19;
const PREC_POSTFIX: i32 = 20;

/// Named tokens, in symbol order. The lexer produces every one of them.
pub(super) const TOKENS: [&str; 9] = [
    "identifier",
    "number",
    "string",
    "boolean",
    "comment",
    "block_comment",
    "line_continuation",
    "_statement_separator",
    "_whitespace",
];

/// `rule (separator rule)* separator?`
fn separated_by_newlines(rule: Rule) -> Rule {
    seq([
        rule.clone(),
        repeat(seq([sym("_statement_separator"), rule])),
        optional(sym("_statement_separator")),
    ])
}

/// Left-associative binary alternatives, one per operator.
fn binary(operators: &[&str], precedence: i32) -> Vec<Rule> {
    operators
        .iter()
        .map(|operator| {
            prec_left(
                precedence,
                seq([
                    field("left", sym("_expression")),
                    field("operator", alias(lit(operator), "operator", true)),
                    field("right", sym("_expression")),
                ]),
            )
        })
        .collect()
}

/// `item (',' item)*`
fn comma_separated(item: Rule) -> Rule {
    seq([item.clone(), repeat(seq([lit(","), item]))])
}

/// `statement | block`, the body of control flow.
fn body() -> Rule {
    choice([sym("block"), sym("_statement")])
}

pub(super) fn grammar() -> Result<Grammar, GrammarError> {
    let binary_operations: Vec<Rule> = [
        binary(&["||"], PREC_LOGICAL_OR),
        binary(&["&&"], PREC_LOGICAL_AND),
        binary(&["==", "!=", "===", "!=="], PREC_EQUALITY),
        binary(&["<", ">", "<=", ">="], PREC_COMPARISON),
        binary(&["|"], PREC_BITWISE_OR),
        binary(&["^"], PREC_BITWISE_XOR),
        binary(&["&"], PREC_BITWISE_AND),
        binary(&["<<", ">>", ">>>"], PREC_SHIFT),
        binary(&["+", "-"], PREC_ADD),
        binary(&["*", "/", "%"], PREC_MULT),
        binary(&["**"], PREC_POWER),
        binary(&["++"], PREC_ADD),
        binary(&["in"], PREC_COMPARISON),
        binary(&["matches"], PREC_COMPARISON),
    ]
    .into_iter()
    .flatten()
    .collect();

    Grammar::builder("pluto")
        .tokens(TOKENS)
        .extras(["_whitespace", "comment", "line_continuation"])
        .word("identifier")
        .conflict(["binary_operation", "postfix_operation"])
        .conflict(["binary_operation", "unary_operation", "postfix_operation"])
        .conflict(["argument_list", "_expression"])
        .conflict(["conditional_expression", "unary_operation", "postfix_operation"])
        .conflict(["conditional_expression", "binary_operation", "postfix_operation"])
        .conflict(["_statement", "if_statement"])
        .conflict(["assignment", "argument_list"])
        .conflict(["_expression"])
        .rule("source_file", separated_by_newlines(sym("_statement")))
        .rule("block_comment_statement", sym("block_comment"))
        .rule(
            "_statement",
            choice([
                sym("assignment"),
                sym("block_comment_statement"),
                prec_right(PREC_COMMAND, sym("command")),
                sym("if_statement"),
                sym("while_loop"),
                sym("for_loop"),
                sym("function_definition"),
            ]),
        )
        .rule(
            "assignment",
            prec_right(
                PREC_ASSIGNMENT,
                seq([
                    field("left", seq([sym("identifier"), repeat(seq([sym("identifier")]))])),
                    optional(field("type", sym("type_annotation"))),
                    lit("="),
                    field("right", sym("_expression")),
                ]),
            ),
        )
        .rule(
            "command",
            prec_left(
                PREC_COMMAND,
                seq([
                    field("name", sym("identifier")),
                    optional(field("arguments", sym("argument_list"))),
                ]),
            ),
        )
        .rule(
            "argument_list",
            prec(
                PREC_ARGUMENT,
                repeat1(choice([
                    sym("parenthesized_expression"),
                    sym("binary_operation"),
                    sym("string"),
                    sym("number"),
                    sym("boolean"),
                    prec_dynamic(-1, sym("identifier")),
                ])),
            ),
        )
        .rule(
            "conditional_expression",
            prec_right(
                PREC_CONDITIONAL,
                seq([
                    field("condition", sym("_expression")),
                    lit("?"),
                    field("consequence", sym("_expression")),
                    lit(":"),
                    field("alternative", sym("_expression")),
                ]),
            ),
        )
        .rule("binary_operation", choice(binary_operations))
        .rule(
            "_expression",
            choice([
                sym("conditional_expression"),
                sym("binary_operation"),
                sym("unary_operation"),
                sym("postfix_operation"),
                sym("parenthesized_expression"),
                sym("array_literal"),
                sym("object_literal"),
                sym("string"),
                sym("number"),
                sym("boolean"),
                sym("identifier"),
            ]),
        )
        .rule(
            "unary_operation",
            prec_right(
                PREC_UNARY,
                seq([
                    field(
                        "operator",
                        alias(
                            choice(["-", "+", "!", "~", "++", "--", "typeof", "not"].map(lit)),
                            "operator",
                            true,
                        ),
                    ),
                    field("argument", sym("_expression")),
                ]),
            ),
        )
        .rule(
            "postfix_operation",
            prec_left(
                PREC_POSTFIX,
                seq([
                    field("operand", sym("_expression")),
                    field(
                        "operator",
                        alias(choice(["++", "--", "?", "!"].map(lit)), "operator", true),
                    ),
                ]),
            ),
        )
        .rule(
            "parenthesized_expression",
            seq([lit("("), sym("_expression"), lit(")")]),
        )
        .rule(
            "array_literal",
            seq([
                lit("["),
                optional(seq([comma_separated(sym("_expression")), optional(lit(","))])),
                lit("]"),
            ]),
        )
        .rule(
            "object_literal",
            prec(
                2,
                seq([
                    lit("{"),
                    optional(seq([comma_separated(sym("object_pair")), optional(lit(","))])),
                    lit("}"),
                ]),
            ),
        )
        .rule(
            "object_pair",
            seq([
                field(
                    "key",
                    choice([sym("identifier"), sym("string"), sym("computed_property")]),
                ),
                lit(":"),
                field("value", sym("_expression")),
            ]),
        )
        .rule(
            "computed_property",
            seq([lit("["), sym("_expression"), lit("]")]),
        )
        .rule("type_annotation", seq([lit(":"), sym("type_expression")]))
        .rule(
            "type_expression",
            choice([
                sym("identifier"),
                sym("generic_type"),
                sym("union_type"),
                sym("array_type"),
                sym("function_type"),
            ]),
        )
        .rule(
            "generic_type",
            seq([
                sym("identifier"),
                lit("<"),
                comma_separated(sym("type_expression")),
                lit(">"),
            ]),
        )
        .rule(
            "union_type",
            prec_left(
                1,
                seq([
                    sym("type_expression"),
                    repeat1(seq([lit("|"), sym("type_expression")])),
                ]),
            ),
        )
        .rule(
            "array_type",
            prec(2, seq([sym("type_expression"), lit("["), lit("]")])),
        )
        .rule(
            "function_type",
            prec_right(
                0,
                seq([
                    lit("("),
                    optional(comma_separated(sym("type_expression"))),
                    lit(")"),
                    lit("=>"),
                    sym("type_expression"),
                ]),
            ),
        )
        .rule(
            "function_definition",
            seq([
                lit("function"),
                field("name", sym("identifier")),
                lit("("),
                optional(sym("parameter_list")),
                lit(")"),
                optional(seq([lit("->"), sym("type_expression")])),
                sym("block"),
            ]),
        )
        .rule("parameter_list", comma_separated(sym("parameter")))
        .rule(
            "parameter",
            seq([
                sym("identifier"),
                optional(sym("type_annotation")),
                optional(seq([lit("="), sym("_expression")])),
            ]),
        )
        .rule(
            "block",
            prec(
                1,
                seq([
                    lit("{"),
                    optional(sym("_statement_separator")),
                    optional(separated_by_newlines(sym("_statement"))),
                    lit("}"),
                ]),
            ),
        )
        .rule(
            "if_statement",
            prec_right(
                0,
                seq([
                    lit("if"),
                    field("condition", sym("_expression")),
                    field("consequence", body()),
                    optional(seq([
                        lit("else"),
                        field(
                            "alternative",
                            choice([sym("block"), sym("_statement"), sym("if_statement")]),
                        ),
                    ])),
                ]),
            ),
        )
        .rule(
            "while_loop",
            seq([
                lit("while"),
                field("condition", sym("_expression")),
                field("body", body()),
            ]),
        )
        .rule(
            "for_loop",
            seq([
                lit("for"),
                field("variable", sym("identifier")),
                lit("in"),
                field("iterable", sym("_expression")),
                field("body", body()),
            ]),
        )
        .build()
}
