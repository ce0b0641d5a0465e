//! FIRST sets and nullability.

use crate::grammar::{ProductionStep, Symbol, SyntaxGrammar};

use super::terminal_set::TerminalSet;

pub(crate) struct FirstSets {
    first: Vec<TerminalSet>,
    nullable: Vec<bool>,
    terminal_count: usize,
}

impl FirstSets {
    pub(crate) fn compute(grammar: &SyntaxGrammar) -> Self {
        let symbol_count = grammar.symbols.len();
        let terminal_count = grammar.symbols.terminal_count();
        let mut first = vec![TerminalSet::new(terminal_count); symbol_count];
        let mut nullable = vec![false; symbol_count];
        for (index, set) in first.iter_mut().enumerate().take(terminal_count) {
            set.insert(Symbol::from_raw(index as u16));
        }

        let mut changed = true;
        while changed {
            changed = false;
            for production in &grammar.productions {
                let lhs = production.lhs.index();
                let mut all_nullable = true;
                for step in &production.steps {
                    let symbol = step.symbol.index();
                    if symbol != lhs {
                        let source = first[symbol].clone();
                        changed |= first[lhs].union_with(&source);
                    }
                    if !nullable[symbol] {
                        all_nullable = false;
                        break;
                    }
                }
                if all_nullable && !nullable[lhs] {
                    nullable[lhs] = true;
                    changed = true;
                }
            }
        }

        Self {
            first,
            nullable,
            terminal_count,
        }
    }

    pub(crate) fn first(&self, symbol: Symbol) -> &TerminalSet {
        &self.first[symbol.index()]
    }

    pub(crate) fn is_nullable(&self, symbol: Symbol) -> bool {
        self.nullable.get(symbol.index()).copied().unwrap_or(false)
    }

    /// Add FIRST(steps) to `out`; returns whether the whole sequence is nullable.
    pub(crate) fn first_of_sequence(&self, steps: &[ProductionStep], out: &mut TerminalSet) -> bool {
        for step in steps {
            out.union_with(self.first(step.symbol));
            if !self.is_nullable(step.symbol) {
                return false;
            }
        }
        true
    }

    pub(crate) fn empty_set(&self) -> TerminalSet {
        TerminalSet::new(self.terminal_count)
    }
}
