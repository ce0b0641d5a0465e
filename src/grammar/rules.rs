//! Declarative grammar rules.
//!
//! Rules are plain data: a grammar is a list of named rules whose bodies are
//! built with the constructor functions below, e.g.
//!
//! ```
//! use pluto_syntax::grammar::{choice, field, lit, prec_left, seq, sym};
//!
//! let sum = prec_left(1, seq([field("left", sym("expr")), lit("+"), field("right", sym("expr"))]));
//! let expr = choice([sum, sym("number")]);
//! # let _ = expr;
//! ```

use smol_str::SmolStr;

/// Associativity used to break shift/reduce ties between equal precedences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Associativity {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Rule {
    /// Matches the empty string.
    Blank,
    /// An anonymous terminal matching exactly this text.
    String(SmolStr),
    /// A named token declared on the grammar, or another rule.
    Symbol(SmolStr),
    Seq(Vec<Rule>),
    Choice(Vec<Rule>),
    Repeat(Box<Rule>),
    Repeat1(Box<Rule>),
    Prec {
        value: i32,
        associativity: Option<Associativity>,
        content: Box<Rule>,
    },
    PrecDynamic {
        value: i32,
        content: Box<Rule>,
    },
    Field {
        name: SmolStr,
        content: Box<Rule>,
    },
    Alias {
        value: SmolStr,
        named: bool,
        content: Box<Rule>,
    },
}

impl Rule {
    /// Names of all rules and tokens referenced by this rule, in order.
    pub fn references(&self) -> Vec<&SmolStr> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a SmolStr>) {
        match self {
            Rule::Blank | Rule::String(_) => {}
            Rule::Symbol(name) => out.push(name),
            Rule::Seq(rules) | Rule::Choice(rules) => {
                for rule in rules {
                    rule.collect_references(out);
                }
            }
            Rule::Repeat(content)
            | Rule::Repeat1(content)
            | Rule::Prec { content, .. }
            | Rule::PrecDynamic { content, .. }
            | Rule::Field { content, .. }
            | Rule::Alias { content, .. } => content.collect_references(out),
        }
    }

    /// Literal terminals used by this rule, in order of first appearance.
    pub fn literals(&self) -> Vec<&SmolStr> {
        let mut out = Vec::new();
        self.collect_literals(&mut out);
        out
    }

    fn collect_literals<'a>(&'a self, out: &mut Vec<&'a SmolStr>) {
        match self {
            Rule::String(text) => out.push(text),
            Rule::Blank | Rule::Symbol(_) => {}
            Rule::Seq(rules) | Rule::Choice(rules) => {
                for rule in rules {
                    rule.collect_literals(out);
                }
            }
            Rule::Repeat(content)
            | Rule::Repeat1(content)
            | Rule::Prec { content, .. }
            | Rule::PrecDynamic { content, .. }
            | Rule::Field { content, .. }
            | Rule::Alias { content, .. } => content.collect_literals(out),
        }
    }
}

// ============================================================================
// Constructors
// ============================================================================

pub fn blank() -> Rule {
    Rule::Blank
}

pub fn lit(text: &str) -> Rule {
    Rule::String(SmolStr::new(text))
}

pub fn sym(name: &str) -> Rule {
    Rule::Symbol(SmolStr::new(name))
}

pub fn seq(rules: impl IntoIterator<Item = Rule>) -> Rule {
    Rule::Seq(rules.into_iter().collect())
}

pub fn choice(rules: impl IntoIterator<Item = Rule>) -> Rule {
    Rule::Choice(rules.into_iter().collect())
}

pub fn optional(rule: Rule) -> Rule {
    Rule::Choice(vec![rule, Rule::Blank])
}

pub fn repeat(rule: Rule) -> Rule {
    Rule::Repeat(Box::new(rule))
}

pub fn repeat1(rule: Rule) -> Rule {
    Rule::Repeat1(Box::new(rule))
}

pub fn prec(value: i32, rule: Rule) -> Rule {
    Rule::Prec {
        value,
        associativity: None,
        content: Box::new(rule),
    }
}

pub fn prec_left(value: i32, rule: Rule) -> Rule {
    Rule::Prec {
        value,
        associativity: Some(Associativity::Left),
        content: Box::new(rule),
    }
}

pub fn prec_right(value: i32, rule: Rule) -> Rule {
    Rule::Prec {
        value,
        associativity: Some(Associativity::Right),
        content: Box::new(rule),
    }
}

pub fn prec_dynamic(value: i32, rule: Rule) -> Rule {
    Rule::PrecDynamic {
        value,
        content: Box::new(rule),
    }
}

pub fn field(name: &str, rule: Rule) -> Rule {
    Rule::Field {
        name: SmolStr::new(name),
        content: Box::new(rule),
    }
}

/// Rename the node produced by `rule`. `named` controls whether the new kind
/// is a named node (`$.operator`) or an anonymous one (`"op"`).
pub fn alias(rule: Rule, value: &str, named: bool) -> Rule {
    Rule::Alias {
        value: SmolStr::new(value),
        named,
        content: Box::new(rule),
    }
}
