//! Static conflict resolution with precedence and associativity.

use crate::grammar::{Associativity, Symbol, SyntaxGrammar};

use super::first::FirstSets;
use super::lr1::{Item, ItemSetBuilder};
use super::terminal_set::TerminalSet;
use super::{Action, ProductionId, StateId, is_auxiliary};

/// A table cell left with more than one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub state: StateId,
    pub lookahead: Symbol,
    pub actions: Vec<Action>,
    /// Rules involved, sorted.
    pub symbols: Vec<Symbol>,
    /// Whether the grammar declared this combination as intentional.
    pub expected: bool,
}

pub(super) struct Resolution {
    pub actions: Vec<Action>,
    pub conflict: Option<Conflict>,
}

pub(super) struct Resolver<'a> {
    grammar: &'a SyntaxGrammar,
    first: &'a FirstSets,
    items: &'a ItemSetBuilder<'a>,
}

enum Winner {
    Shift,
    Reduce,
    Both,
}

impl<'a> Resolver<'a> {
    pub(super) fn new(
        grammar: &'a SyntaxGrammar,
        first: &'a FirstSets,
        items: &'a ItemSetBuilder<'a>,
    ) -> Self {
        Self {
            grammar,
            first,
            items,
        }
    }

    pub(super) fn resolve(
        &self,
        state: StateId,
        items: &[(Item, TerminalSet)],
        lookahead: Symbol,
        shift: Option<StateId>,
        mut reduces: Vec<ProductionId>,
        accept: bool,
    ) -> Resolution {
        // reduce/reduce: only the highest static precedence survives
        if reduces.len() > 1 {
            let best = reduces
                .iter()
                .map(|&p| self.reduce_precedence(p).0)
                .max()
                .unwrap_or(0);
            reduces.retain(|&p| self.reduce_precedence(p).0 == best);
        }

        let mut keep_shift = shift.is_some();
        if shift.is_some() && !reduces.is_empty() {
            let (min, max) = self.shift_precedence(items, lookahead).unwrap_or((0, 0));
            let mut shift_beaten = false;
            reduces.retain(|&p| match self.compare(p, min, max) {
                Winner::Shift => false,
                Winner::Reduce => {
                    shift_beaten = true;
                    true
                }
                Winner::Both => true,
            });
            keep_shift = !shift_beaten;
        }

        let mut actions = Vec::with_capacity(reduces.len() + 2);
        if accept {
            actions.push(Action::Accept);
        }
        if keep_shift {
            if let Some(target) = shift {
                actions.push(Action::Shift(target));
            }
        }
        actions.extend(reduces.iter().map(|&p| Action::Reduce(p)));

        let conflict = (actions.len() > 1).then(|| {
            let symbols = self.involved_symbols(items, lookahead, &reduces, keep_shift);
            let expected = self.is_expected(&symbols);
            Conflict {
                state,
                lookahead,
                actions: actions.clone(),
                symbols,
                expected,
            }
        });

        Resolution { actions, conflict }
    }

    fn reduce_precedence(&self, production: ProductionId) -> (i32, Option<Associativity>) {
        self.items.production(production).reduce_precedence()
    }

    /// Precedence range of the in-progress items that would shift `lookahead`.
    fn shift_precedence(&self, items: &[(Item, TerminalSet)], lookahead: Symbol) -> Option<(i32, i32)> {
        let mut range: Option<(i32, i32)> = None;
        for (item, _) in items {
            if item.dot == 0 {
                continue;
            }
            let Some(step) = self.items.next_step(*item) else {
                continue;
            };
            if !self.first.first(step.symbol).contains(lookahead) {
                continue;
            }
            range = Some(match range {
                Some((min, max)) => (min.min(step.precedence), max.max(step.precedence)),
                None => (step.precedence, step.precedence),
            });
        }
        range
    }

    fn compare(&self, production: ProductionId, shift_min: i32, shift_max: i32) -> Winner {
        let (precedence, associativity) = self.reduce_precedence(production);
        if precedence > shift_max {
            return Winner::Reduce;
        }
        if precedence < shift_min {
            return Winner::Shift;
        }
        if shift_min == shift_max {
            return match associativity {
                Some(Associativity::Left) => Winner::Reduce,
                Some(Associativity::Right) => Winner::Shift,
                None => Winner::Both,
            };
        }
        Winner::Both
    }

    fn involved_symbols(
        &self,
        items: &[(Item, TerminalSet)],
        lookahead: Symbol,
        reduces: &[ProductionId],
        shift: bool,
    ) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = reduces
            .iter()
            .map(|&p| self.items.production(p).lhs)
            .collect();
        if shift {
            for (item, _) in items {
                let Some(step) = self.items.next_step(*item) else {
                    continue;
                };
                let production = self.items.production(item.production);
                if production.lhs != Symbol::ERROR && self.first.first(step.symbol).contains(lookahead) {
                    symbols.push(production.lhs);
                }
            }
        }
        symbols.sort();
        symbols.dedup();
        symbols
    }

    fn is_expected(&self, symbols: &[Symbol]) -> bool {
        let relevant: Vec<Symbol> = symbols
            .iter()
            .copied()
            .filter(|&s| !is_auxiliary(self.grammar, s))
            .collect();
        self.grammar
            .expected_conflicts
            .iter()
            .any(|group| relevant.iter().all(|s| group.contains(s)))
    }
}
