//! Grammar description: tokens, rules and the metadata the table generator needs.
//!
//! A [`Grammar`] is declarative data. [`Grammar::compile`] validates it and
//! flattens every rule into BNF [`Production`]s over numbered [`Symbol`]s,
//! which is what [`crate::table`] consumes.
//!
//! Token *recognition* is not part of the grammar: named tokens are produced by
//! the language's lexer, and literal strings (`lit("+")`) become anonymous
//! terminals the lexer is expected to recognise by their text.

mod error;
mod flatten;
mod rules;
mod symbol;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;

pub use error::GrammarError;
pub use flatten::{MAX_ALTERNATIVES, Production, ProductionStep, SyntaxGrammar};
pub use rules::{
    Associativity, Rule, alias, blank, choice, field, lit, optional, prec, prec_dynamic, prec_left,
    prec_right, repeat, repeat1, seq, sym,
};
pub use symbol::{FieldId, Symbol, SymbolInfo, SymbolKind, SymbolTable};

/// A complete grammar. The first rule is the start rule.
#[derive(Debug, Clone)]
pub struct Grammar {
    name: SmolStr,
    tokens: Vec<SmolStr>,
    externals: Vec<SmolStr>,
    rules: IndexMap<SmolStr, Rule>,
    extras: Vec<SmolStr>,
    word: Option<SmolStr>,
    conflicts: Vec<Vec<SmolStr>>,
}

impl Grammar {
    pub fn builder(name: &str) -> GrammarBuilder {
        GrammarBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_rule(&self) -> Option<&str> {
        self.rules.keys().next().map(SmolStr::as_str)
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    pub fn rules(&self) -> impl Iterator<Item = (&str, &Rule)> + '_ {
        self.rules.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    pub fn tokens(&self) -> &[SmolStr] {
        &self.tokens
    }

    pub fn externals(&self) -> &[SmolStr] {
        &self.externals
    }

    pub fn extras(&self) -> &[SmolStr] {
        &self.extras
    }

    pub fn word(&self) -> Option<&str> {
        self.word.as_deref()
    }

    pub fn conflicts(&self) -> &[Vec<SmolStr>] {
        &self.conflicts
    }

    pub(crate) fn is_token(&self, name: &str) -> bool {
        self.tokens.iter().any(|t| t == name) || self.externals.iter().any(|t| t == name)
    }

    /// Validate and flatten into productions over numbered symbols.
    pub fn compile(&self) -> Result<SyntaxGrammar, GrammarError> {
        flatten::compile(self)
    }
}

/// Builder for [`Grammar`]; all structural checks happen in [`GrammarBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct GrammarBuilder {
    name: SmolStr,
    tokens: Vec<SmolStr>,
    externals: Vec<SmolStr>,
    rules: Vec<(SmolStr, Rule)>,
    extras: Vec<SmolStr>,
    word: Option<SmolStr>,
    conflicts: Vec<Vec<SmolStr>>,
}

impl GrammarBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: SmolStr::new(name),
            ..Self::default()
        }
    }

    /// Declare named tokens produced by the lexer. Names starting with `_` are hidden.
    pub fn tokens<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.tokens.extend(names.into_iter().map(SmolStr::new));
        self
    }

    /// Declare tokens produced by the external scanner.
    pub fn externals<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.externals.extend(names.into_iter().map(SmolStr::new));
        self
    }

    /// Tokens allowed anywhere between other tokens (whitespace, comments).
    pub fn extras<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.extras.extend(names.into_iter().map(SmolStr::new));
        self
    }

    /// The identifier-like token keywords are carved out of.
    pub fn word(mut self, name: &str) -> Self {
        self.word = Some(SmolStr::new(name));
        self
    }

    /// Declare a set of rules whose conflicts are intentional (resolved at parse time).
    pub fn conflict<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.conflicts
            .push(names.into_iter().map(SmolStr::new).collect());
        self
    }

    pub fn rule(mut self, name: &str, rule: Rule) -> Self {
        self.rules.push((SmolStr::new(name), rule));
        self
    }

    pub fn build(self) -> Result<Grammar, GrammarError> {
        if self.rules.is_empty() {
            return Err(GrammarError::Empty(self.name));
        }

        let token_names: FxHashSet<&SmolStr> =
            self.tokens.iter().chain(self.externals.iter()).collect();
        let mut rules = IndexMap::with_capacity(self.rules.len());
        for (name, rule) in self.rules {
            if token_names.contains(&name) {
                return Err(GrammarError::TokenRuleClash(name));
            }
            if rules.contains_key(&name) {
                return Err(GrammarError::DuplicateRule(name));
            }
            rules.insert(name, rule);
        }

        Ok(Grammar {
            name: self.name,
            tokens: self.tokens,
            externals: self.externals,
            rules,
            extras: self.extras,
            word: self.word,
            conflicts: self.conflicts,
        })
    }
}
