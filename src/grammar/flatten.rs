//! Rule flattening: nested rules become lists of flat productions.
//!
//! `repeat`/`repeat1` are expanded into hidden left-recursive helper rules,
//! `choice`/`optional` are multiplied out, and `prec`/`field`/`alias` wrappers
//! are pushed down onto the individual steps they cover.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use super::error::GrammarError;
use super::rules::{Associativity, Rule};
use super::symbol::{FieldId, Symbol, SymbolInfo, SymbolKind, SymbolTable};
use super::Grammar;

/// Upper bound on the productions a single rule may expand into.
pub const MAX_ALTERNATIVES: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionStep {
    pub symbol: Symbol,
    pub precedence: i32,
    pub associativity: Option<Associativity>,
    pub field: Option<FieldId>,
    pub alias: Option<Symbol>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub lhs: Symbol,
    pub steps: Vec<ProductionStep>,
    pub dynamic_precedence: i32,
}

impl Production {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Precedence and associativity used when this production is reduced.
    pub fn reduce_precedence(&self) -> (i32, Option<Associativity>) {
        self.steps
            .last()
            .map(|step| (step.precedence, step.associativity))
            .unwrap_or((0, None))
    }
}

/// A grammar flattened into productions over numbered symbols.
#[derive(Debug, Clone)]
pub struct SyntaxGrammar {
    pub name: SmolStr,
    pub symbols: SymbolTable,
    pub productions: Vec<Production>,
    pub start: Symbol,
    pub extras: Vec<Symbol>,
    pub externals: Vec<Symbol>,
    pub word: Option<Symbol>,
    pub expected_conflicts: Vec<Vec<Symbol>>,
    productions_by_lhs: Vec<Vec<usize>>,
}

impl SyntaxGrammar {
    /// Indices of the productions whose left-hand side is `lhs`.
    pub fn productions_for(&self, lhs: Symbol) -> &[usize] {
        self.productions_by_lhs
            .get(lhs.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

// ============================================================================
// Compilation
// ============================================================================

pub(super) fn compile(grammar: &Grammar) -> Result<SyntaxGrammar, GrammarError> {
    let Some(start_name) = grammar.start_rule() else {
        return Err(GrammarError::Empty(grammar.name.clone()));
    };

    let reachable = reachable_rules(grammar, start_name)?;
    for (name, _) in grammar.rules() {
        if !reachable.iter().any(|r| r == name) {
            tracing::warn!(rule = name, "rule is unreachable from the start rule; ignoring it");
        }
    }

    let mut symbols = SymbolTable::default();
    symbols.push(SymbolInfo {
        name: SmolStr::new_static("end"),
        kind: SymbolKind::End,
        visible: false,
        named: true,
    });
    for token in &grammar.tokens {
        symbols.push(SymbolInfo {
            name: token.clone(),
            kind: SymbolKind::Terminal,
            visible: !token.starts_with('_'),
            named: true,
        });
    }
    let mut seen_literals = FxHashSet::default();
    for name in &reachable {
        for literal in grammar.rules[name].literals() {
            if seen_literals.insert(literal.clone()) {
                symbols.push(SymbolInfo {
                    name: literal.clone(),
                    kind: SymbolKind::Terminal,
                    visible: true,
                    named: false,
                });
            }
        }
    }
    for external in &grammar.externals {
        symbols.push(SymbolInfo {
            name: external.clone(),
            kind: SymbolKind::External,
            visible: !external.starts_with('_'),
            named: true,
        });
    }
    for name in &reachable {
        symbols.push(SymbolInfo {
            name: name.clone(),
            kind: SymbolKind::NonTerminal,
            visible: !name.starts_with('_'),
            named: true,
        });
    }

    let mut flattener = Flattener {
        symbols,
        productions: Vec::new(),
        repeats: FxHashMap::default(),
        current_rule: SmolStr::default(),
        repeat_counts: FxHashMap::default(),
    };

    for name in &reachable {
        let lhs = flattener.named_symbol(name)?;
        flattener.current_rule = name.clone();
        let alternatives = flattener.flatten(&grammar.rules[name], &Context::default())?;
        flattener.push_productions(lhs, alternatives);
    }
    flattener.check_symbol_count()?;

    let Flattener {
        symbols,
        productions,
        ..
    } = flattener;

    let start = symbols
        .lookup(start_name, true)
        .ok_or_else(|| GrammarError::Empty(grammar.name.clone()))?;

    let mut extras = Vec::with_capacity(grammar.extras.len());
    for name in &grammar.extras {
        match symbols.lookup(name, true) {
            Some(symbol) if symbols.is_terminal(symbol) => extras.push(symbol),
            _ => return Err(GrammarError::InvalidExtra(name.clone())),
        }
    }

    let externals = grammar
        .externals
        .iter()
        .filter_map(|name| symbols.lookup(name, true))
        .collect();

    let word = match &grammar.word {
        Some(name) if grammar.tokens.contains(name) => symbols.lookup(name, true),
        Some(name) => return Err(GrammarError::InvalidWord(name.clone())),
        None => None,
    };

    let mut expected_conflicts = Vec::with_capacity(grammar.conflicts.len());
    for group in &grammar.conflicts {
        let mut resolved = Vec::with_capacity(group.len());
        for name in group {
            if !grammar.rules.contains_key(name) {
                return Err(GrammarError::InvalidConflict(name.clone()));
            }
            if let Some(symbol) = symbols.lookup(name, true) {
                resolved.push(symbol);
            }
        }
        resolved.sort();
        expected_conflicts.push(resolved);
    }

    let mut productions_by_lhs = vec![Vec::new(); symbols.len()];
    for (index, production) in productions.iter().enumerate() {
        productions_by_lhs[production.lhs.index()].push(index);
    }

    tracing::debug!(
        grammar = %grammar.name,
        symbols = symbols.len(),
        terminals = symbols.terminal_count(),
        productions = productions.len(),
        "compiled grammar"
    );

    Ok(SyntaxGrammar {
        name: grammar.name.clone(),
        symbols,
        productions,
        start,
        extras,
        externals,
        word,
        expected_conflicts,
        productions_by_lhs,
    })
}

/// Rules reachable from the start rule, in declaration order.
fn reachable_rules(grammar: &Grammar, start: &str) -> Result<Vec<SmolStr>, GrammarError> {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let mut queue = VecDeque::from([start]);
    seen.insert(start);

    while let Some(name) = queue.pop_front() {
        let Some(rule) = grammar.rules.get(name) else {
            continue;
        };
        for reference in rule.references() {
            if grammar.rules.contains_key(reference.as_str()) {
                if seen.insert(reference.as_str()) {
                    queue.push_back(reference.as_str());
                }
            } else if !grammar.is_token(reference) {
                return Err(GrammarError::UndefinedSymbol {
                    name: reference.clone(),
                    rule: SmolStr::new(name),
                });
            }
        }
    }

    Ok(grammar
        .rules
        .keys()
        .filter(|name| seen.contains(name.as_str()))
        .cloned()
        .collect())
}

// ============================================================================
// Flattening
// ============================================================================

#[derive(Debug, Clone, Default)]
struct Context {
    precedence: i32,
    associativity: Option<Associativity>,
    field: Option<FieldId>,
    alias: Option<Symbol>,
}

#[derive(Debug, Clone, Default)]
struct Alternative {
    steps: Vec<ProductionStep>,
    dynamic_precedence: i32,
}

struct Flattener {
    symbols: SymbolTable,
    productions: Vec<Production>,
    repeats: FxHashMap<Rule, Symbol>,
    current_rule: SmolStr,
    repeat_counts: FxHashMap<SmolStr, usize>,
}

fn stronger(a: i32, b: i32) -> i32 {
    if b.abs() > a.abs() { b } else { a }
}

impl Flattener {
    fn named_symbol(&self, name: &SmolStr) -> Result<Symbol, GrammarError> {
        self.symbols
            .lookup(name, true)
            .ok_or_else(|| GrammarError::UndefinedSymbol {
                name: name.clone(),
                rule: self.current_rule.clone(),
            })
    }

    fn check_symbol_count(&self) -> Result<(), GrammarError> {
        let limit = u16::MAX as usize - 1;
        if self.symbols.len() > limit {
            return Err(GrammarError::TooManySymbols(limit));
        }
        Ok(())
    }

    fn step(&self, symbol: Symbol, ctx: &Context) -> Alternative {
        Alternative {
            steps: vec![ProductionStep {
                symbol,
                precedence: ctx.precedence,
                associativity: ctx.associativity,
                field: ctx.field,
                alias: ctx.alias,
            }],
            dynamic_precedence: 0,
        }
    }

    fn flatten(&mut self, rule: &Rule, ctx: &Context) -> Result<Vec<Alternative>, GrammarError> {
        match rule {
            Rule::Blank => Ok(vec![Alternative::default()]),
            Rule::String(text) => {
                let symbol = self
                    .symbols
                    .lookup(text, false)
                    .ok_or_else(|| GrammarError::UndefinedSymbol {
                        name: text.clone(),
                        rule: self.current_rule.clone(),
                    })?;
                Ok(vec![self.step(symbol, ctx)])
            }
            Rule::Symbol(name) => {
                let symbol = self.named_symbol(name)?;
                Ok(vec![self.step(symbol, ctx)])
            }
            Rule::Seq(rules) => {
                let mut result = vec![Alternative::default()];
                for rule in rules {
                    let next = self.flatten(rule, ctx)?;
                    result = self.product(result, next)?;
                }
                Ok(result)
            }
            Rule::Choice(rules) => {
                let mut result = Vec::new();
                for rule in rules {
                    result.extend(self.flatten(rule, ctx)?);
                }
                self.check_alternatives(result.len())?;
                Ok(result)
            }
            Rule::Repeat(content) => {
                let aux = self.repeat_symbol(content)?;
                Ok(vec![Alternative::default(), self.step(aux, ctx)])
            }
            Rule::Repeat1(content) => {
                let aux = self.repeat_symbol(content)?;
                Ok(vec![self.step(aux, ctx)])
            }
            Rule::Prec {
                value,
                associativity,
                content,
            } => {
                let inner = Context {
                    precedence: *value,
                    associativity: *associativity,
                    ..ctx.clone()
                };
                self.flatten(content, &inner)
            }
            Rule::PrecDynamic { value, content } => {
                let mut alternatives = self.flatten(content, ctx)?;
                for alternative in &mut alternatives {
                    alternative.dynamic_precedence = stronger(alternative.dynamic_precedence, *value);
                }
                Ok(alternatives)
            }
            Rule::Field { name, content } => {
                let inner = Context {
                    field: Some(self.symbols.intern_field(name)),
                    ..ctx.clone()
                };
                self.flatten(content, &inner)
            }
            Rule::Alias {
                value,
                named,
                content,
            } => {
                let alias = self.alias_symbol(value, *named);
                let inner = Context {
                    alias: Some(alias),
                    ..ctx.clone()
                };
                let alternatives = self.flatten(content, &inner)?;
                if alternatives.iter().any(|alt| alt.steps.len() > 1) {
                    return Err(GrammarError::InvalidAlias {
                        alias: value.clone(),
                        rule: self.current_rule.clone(),
                    });
                }
                Ok(alternatives)
            }
        }
    }

    fn product(
        &self,
        left: Vec<Alternative>,
        right: Vec<Alternative>,
    ) -> Result<Vec<Alternative>, GrammarError> {
        self.check_alternatives(left.len() * right.len())?;
        let mut result = Vec::with_capacity(left.len() * right.len());
        for a in &left {
            for b in &right {
                let mut steps = Vec::with_capacity(a.steps.len() + b.steps.len());
                steps.extend(a.steps.iter().cloned());
                steps.extend(b.steps.iter().cloned());
                result.push(Alternative {
                    steps,
                    dynamic_precedence: stronger(a.dynamic_precedence, b.dynamic_precedence),
                });
            }
        }
        Ok(result)
    }

    fn check_alternatives(&self, count: usize) -> Result<(), GrammarError> {
        if count > MAX_ALTERNATIVES {
            return Err(GrammarError::TooManyAlternatives {
                rule: self.current_rule.clone(),
                limit: MAX_ALTERNATIVES,
            });
        }
        Ok(())
    }

    /// Hidden helper `aux -> aux content | content`, shared between identical contents.
    fn repeat_symbol(&mut self, content: &Rule) -> Result<Symbol, GrammarError> {
        if let Some(&symbol) = self.repeats.get(content) {
            return Ok(symbol);
        }

        let count = self
            .repeat_counts
            .entry(self.current_rule.clone())
            .or_insert(0);
        *count += 1;
        let name = SmolStr::new(format!("{}_repeat{}", self.current_rule, count));
        let aux = self.symbols.push(SymbolInfo {
            name,
            kind: SymbolKind::Auxiliary,
            visible: false,
            named: false,
        });
        self.repeats.insert(content.clone(), aux);

        let body = self.flatten(content, &Context::default())?;
        let recursive: Vec<Alternative> = body
            .iter()
            .map(|alt| {
                let mut steps = Vec::with_capacity(alt.steps.len() + 1);
                steps.push(ProductionStep {
                    symbol: aux,
                    precedence: 0,
                    associativity: None,
                    field: None,
                    alias: None,
                });
                steps.extend(alt.steps.iter().cloned());
                Alternative {
                    steps,
                    dynamic_precedence: alt.dynamic_precedence,
                }
            })
            .collect();
        self.push_productions(aux, recursive);
        self.push_productions(aux, body);
        self.check_symbol_count()?;
        Ok(aux)
    }

    fn alias_symbol(&mut self, value: &SmolStr, named: bool) -> Symbol {
        if let Some(symbol) = self.symbols.lookup(value, named) {
            return symbol;
        }
        self.symbols.push(SymbolInfo {
            name: value.clone(),
            kind: SymbolKind::Alias,
            visible: !value.starts_with('_'),
            named,
        })
    }

    fn push_productions(&mut self, lhs: Symbol, alternatives: Vec<Alternative>) {
        for alternative in alternatives {
            self.productions.push(Production {
                lhs,
                steps: alternative.steps,
                dynamic_precedence: alternative.dynamic_precedence,
            });
        }
    }
}
