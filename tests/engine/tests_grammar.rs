#![allow(clippy::unwrap_used)]

use pluto_syntax::grammar::{alias, lit, seq, sym};
use pluto_syntax::{Grammar, GrammarBuilder, GrammarError, Language};
use rstest::rstest;

use crate::helpers::languages::{TestLexer, ambiguous, calc, calc_grammar};

fn compile(builder: GrammarBuilder) -> Result<Language, GrammarError> {
    Language::builder(builder.build()?).build(TestLexer::new)
}

fn base() -> GrammarBuilder {
    Grammar::builder("g").tokens(["identifier", "_space"])
}

#[rstest]
#[case::no_rules(base(), "has no rules")]
#[case::duplicate_rule(
    base().rule("s", sym("identifier")).rule("s", lit("x")),
    "defined more than once"
)]
#[case::token_and_rule(
    base().rule("s", sym("identifier")).rule("identifier", lit("x")),
    "both as a token and as a rule"
)]
#[case::undefined_symbol(base().rule("s", sym("nowhere")), "undefined symbol 'nowhere'")]
#[case::extra_not_a_token(
    base().extras(["s"]).rule("s", sym("identifier")),
    "extra 's'"
)]
#[case::word_not_a_token(
    base().word("s").rule("s", sym("identifier")),
    "word token 's'"
)]
#[case::conflict_unknown_rule(
    base().conflict(["s", "t"]).rule("s", sym("identifier")),
    "unknown rule 't'"
)]
#[case::alias_over_sequence(
    base().rule("s", alias(seq([sym("identifier"), lit(";")]), "pair", true)),
    "alias 'pair'"
)]
fn test_invalid_grammars_are_rejected(#[case] builder: GrammarBuilder, #[case] message: &str) {
    let error = compile(builder).unwrap_err();
    assert!(error.to_string().contains(message), "{error}");
}

#[test]
fn test_grammar_data_is_inspectable() {
    let grammar = calc_grammar();
    assert_eq!(grammar.name(), "calc");
    assert_eq!(grammar.start_rule(), Some("program"));
    assert_eq!(grammar.word(), Some("identifier"));
    assert!(grammar.rule("binary").is_some());
    assert_eq!(grammar.extras().len(), 1);
    assert_eq!(grammar.extras()[0].as_str(), "_space");
}

#[test]
fn test_precedence_resolves_every_calc_conflict() {
    let language = calc();
    assert!(language.parse_table().conflicts().is_empty());
}

#[test]
fn test_declared_conflict_is_kept_for_glr() {
    let language = ambiguous();
    let type_name = language.id_for_node_kind("type_name", true).unwrap();
    let conflicts = language.parse_table().conflicts();
    assert!(!conflicts.is_empty());
    let conflict = conflicts
        .iter()
        .find(|conflict| conflict.symbols.contains(&type_name))
        .unwrap();
    assert!(conflict.expected);
    assert_eq!(conflict.actions.len(), 2);
}

#[test]
fn test_unreachable_rules_are_ignored() {
    let language = compile(
        base()
            .extras(["_space"])
            .rule("s", sym("identifier"))
            .rule("orphan", lit("never")),
    )
    .unwrap();
    assert!(language.id_for_node_kind("orphan", true).is_none());
    assert!(language.id_for_node_kind("never", false).is_none());
}

#[test]
fn test_field_and_symbol_metadata() {
    let language = calc();
    let left = language.field_id_for_name("left").unwrap();
    assert_eq!(language.field_name_for_id(left), Some("left"));
    assert!(language.field_id_for_name("nonexistent").is_none());

    let statement = language.id_for_node_kind("_statement", true).unwrap();
    assert!(!language.node_kind_is_visible(statement));
    let plus = language.id_for_node_kind("+", false).unwrap();
    assert!(language.node_kind_is_visible(plus));
    assert!(!language.node_kind_is_named(plus));
    assert_eq!(language.start_symbol(), language.id_for_node_kind("program", true).unwrap());
}
