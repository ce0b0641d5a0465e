//! Parse table generation and lookup.
//!
//! [`ParseTable::build`] turns a [`SyntaxGrammar`] into canonical LR(1)
//! states, resolves each one, then merges the states that ended up with
//! identical rows. Cells that precedence and associativity cannot decide keep
//! every action; the parser explores them in parallel (GLR).

mod conflict;
mod first;
mod lr1;
mod minimize;
mod terminal_set;

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashMap;

use crate::grammar::{FieldId, Symbol, SymbolKind, SyntaxGrammar};

pub use conflict::Conflict;
pub use terminal_set::TerminalSet;

use conflict::Resolver;
use first::FirstSets;
use lr1::ItemSetBuilder;
use minimize::Row;

pub type StateId = u32;
pub type ProductionId = u32;
pub type LexModeId = u16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Shift(StateId),
    Reduce(ProductionId),
    Accept,
}

/// Per-production data the parser needs when reducing and when reading trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionInfo {
    pub lhs: Symbol,
    pub child_count: usize,
    pub dynamic_precedence: i32,
    /// Field of each structural (non-extra) child.
    pub fields: Box<[Option<FieldId>]>,
    /// Alias of each structural child.
    pub aliases: Box<[Option<Symbol>]>,
}

impl ProductionInfo {
    pub fn field(&self, child: usize) -> Option<FieldId> {
        self.fields.get(child).copied().flatten()
    }

    pub fn alias(&self, child: usize) -> Option<Symbol> {
        self.aliases.get(child).copied().flatten()
    }
}

#[derive(Debug, Clone, Default)]
struct ParseState {
    actions: FxHashMap<Symbol, Box<[Action]>>,
    gotos: FxHashMap<Symbol, StateId>,
    lex_mode: LexModeId,
}

#[derive(Debug, Clone)]
pub struct ParseTable {
    states: Vec<ParseState>,
    productions: Vec<ProductionInfo>,
    lex_modes: Vec<TerminalSet>,
    conflicts: Vec<Conflict>,
}

impl ParseTable {
    pub const START_STATE: StateId = 0;

    pub fn build(grammar: &SyntaxGrammar) -> ParseTable {
        let first = FirstSets::compute(grammar);
        let builder = ItemSetBuilder::new(grammar, &first);
        let item_sets = builder.build();
        let resolver = Resolver::new(grammar, &first, &builder);
        let augmented = builder.augmented_index();

        let mut rows = Vec::with_capacity(item_sets.len());
        let mut canonical_conflicts = Vec::new();

        for (state_id, item_set) in item_sets.iter().enumerate() {
            let mut row = Row::default();
            let mut shifts: FxHashMap<Symbol, StateId> = FxHashMap::default();
            let mut gotos: BTreeMap<Symbol, StateId> = BTreeMap::new();
            let mut reduces: FxHashMap<Symbol, Vec<ProductionId>> = FxHashMap::default();
            let mut accept = false;
            let mut terminals = BTreeSet::new();

            for (item, lookahead) in &item_set.items {
                match builder.next_step(*item) {
                    Some(step) => {
                        let Some(&target) = item_set.transitions.get(&step.symbol) else {
                            continue;
                        };
                        if grammar.symbols.is_terminal(step.symbol) {
                            shifts.insert(step.symbol, target as StateId);
                            terminals.insert(step.symbol);
                        } else {
                            gotos.insert(step.symbol, target as StateId);
                        }
                    }
                    None if item.production == augmented => {
                        accept = true;
                        terminals.insert(Symbol::END);
                    }
                    None => {
                        for terminal in lookahead.iter() {
                            let entry = reduces.entry(terminal).or_default();
                            if !entry.contains(&item.production) {
                                entry.push(item.production);
                            }
                            terminals.insert(terminal);
                        }
                    }
                }
            }

            for terminal in terminals {
                let mut candidates = reduces.remove(&terminal).unwrap_or_default();
                candidates.sort_unstable();
                let resolution = resolver.resolve(
                    state_id as StateId,
                    &item_set.items,
                    terminal,
                    shifts.get(&terminal).copied(),
                    candidates,
                    accept && terminal == Symbol::END,
                );
                if let Some(conflict) = resolution.conflict {
                    canonical_conflicts.push(conflict);
                }
                if !resolution.actions.is_empty() {
                    row.actions.push((terminal, resolution.actions));
                }
            }
            row.gotos = gotos.into_iter().collect();
            rows.push(row);
        }

        let cores: Vec<usize> = item_sets.iter().map(|set| set.core).collect();
        let (merged, count) = minimize::merge_equivalent(&rows, &cores);

        let mut states: Vec<Option<ParseState>> = vec![None; count];
        let mut lex_modes: Vec<TerminalSet> = Vec::new();
        let mut lex_mode_ids: FxHashMap<TerminalSet, LexModeId> = FxHashMap::default();
        for (canonical, row) in rows.into_iter().enumerate() {
            let slot = &mut states[merged[canonical] as usize];
            if slot.is_some() {
                continue;
            }

            let mut state = ParseState::default();
            let mut valid = TerminalSet::new(grammar.symbols.terminal_count());
            for (terminal, actions) in row.actions {
                valid.insert(terminal);
                let actions: Box<[Action]> = actions
                    .into_iter()
                    .map(|action| match action {
                        Action::Shift(target) => Action::Shift(merged[target as usize]),
                        other => other,
                    })
                    .collect();
                state.actions.insert(terminal, actions);
            }
            for (symbol, target) in row.gotos {
                state.gotos.insert(symbol, merged[target as usize]);
            }
            for &extra in &grammar.extras {
                valid.insert(extra);
            }

            state.lex_mode = match lex_mode_ids.get(&valid) {
                Some(&id) => id,
                None => {
                    let id = lex_modes.len() as LexModeId;
                    lex_mode_ids.insert(valid.clone(), id);
                    lex_modes.push(valid);
                    id
                }
            };
            *slot = Some(state);
        }
        let states: Vec<ParseState> = states.into_iter().flatten().collect();

        let mut conflicts: Vec<Conflict> = Vec::new();
        let mut seen = BTreeSet::new();
        for mut conflict in canonical_conflicts {
            conflict.state = merged[conflict.state as usize];
            if !seen.insert((conflict.state, conflict.lookahead)) {
                continue;
            }
            for action in &mut conflict.actions {
                if let Action::Shift(target) = action {
                    *target = merged[*target as usize];
                }
            }
            conflicts.push(conflict);
        }

        let productions = grammar
            .productions
            .iter()
            .map(|production| ProductionInfo {
                lhs: production.lhs,
                child_count: production.steps.len(),
                dynamic_precedence: production.dynamic_precedence,
                fields: production.steps.iter().map(|s| s.field).collect(),
                aliases: production.steps.iter().map(|s| s.alias).collect(),
            })
            .collect();

        for conflict in &conflicts {
            let names: Vec<&str> = conflict
                .symbols
                .iter()
                .map(|&s| grammar.symbols.name(s))
                .collect();
            tracing::debug!(
                state = conflict.state,
                lookahead = grammar.symbols.name(conflict.lookahead),
                symbols = ?names,
                expected = conflict.expected,
                "unresolved conflict kept for GLR"
            );
        }
        tracing::debug!(
            grammar = %grammar.name,
            item_sets = item_sets.len(),
            states = states.len(),
            lex_modes = lex_modes.len(),
            conflicts = conflicts.len(),
            "built parse table"
        );

        ParseTable {
            states,
            productions,
            lex_modes,
            conflicts,
        }
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Actions for `symbol` in `state`; empty when the symbol is not valid there.
    pub fn actions(&self, state: StateId, symbol: Symbol) -> &[Action] {
        self.states
            .get(state as usize)
            .and_then(|s| s.actions.get(&symbol))
            .map(|actions| &actions[..])
            .unwrap_or(&[])
    }

    pub fn goto(&self, state: StateId, symbol: Symbol) -> Option<StateId> {
        self.states.get(state as usize)?.gotos.get(&symbol).copied()
    }

    pub fn production(&self, id: ProductionId) -> Option<&ProductionInfo> {
        self.productions.get(id as usize)
    }

    pub fn production_count(&self) -> usize {
        self.productions.len()
    }

    pub fn lex_mode(&self, state: StateId) -> LexModeId {
        self.states
            .get(state as usize)
            .map(|s| s.lex_mode)
            .unwrap_or_default()
    }

    /// Terminals the lexer may return in a lex mode (terminals with actions plus extras).
    pub fn lex_mode_terminals(&self, mode: LexModeId) -> &TerminalSet {
        &self.lex_modes[mode as usize]
    }

    pub fn valid_terminals(&self, state: StateId) -> &TerminalSet {
        self.lex_mode_terminals(self.lex_mode(state))
    }

    pub fn lex_mode_count(&self) -> usize {
        self.lex_modes.len()
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }
}

pub(crate) fn is_auxiliary(grammar: &SyntaxGrammar, symbol: Symbol) -> bool {
    grammar
        .symbols
        .info(symbol)
        .is_some_and(|info| info.kind == SymbolKind::Auxiliary)
}
