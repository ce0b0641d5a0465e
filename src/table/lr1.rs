//! Canonical LR(1) item-set construction.
//!
//! A state is a kernel of LR(0) items together with the lookahead set of each
//! item, so the same items reached with different lookaheads form different
//! states. States sharing their items have the same core; [`super::minimize`]
//! folds the indistinguishable ones back together.

use std::collections::{BTreeMap, VecDeque};

use indexmap::{IndexMap, IndexSet};

use crate::grammar::{Production, ProductionStep, Symbol, SyntaxGrammar};

use super::first::FirstSets;
use super::terminal_set::TerminalSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct Item {
    pub production: u32,
    pub dot: u32,
}

impl Item {
    fn advance(self) -> Item {
        Item {
            production: self.production,
            dot: self.dot + 1,
        }
    }
}

type Kernel = Vec<(Item, TerminalSet)>;

pub(crate) struct ItemSet {
    /// Closure of the kernel with its lookaheads.
    pub items: Vec<(Item, TerminalSet)>,
    pub transitions: BTreeMap<Symbol, usize>,
    /// Index of the LR(0) kernel this state was built from.
    pub core: usize,
}

pub(crate) struct ItemSetBuilder<'a> {
    grammar: &'a SyntaxGrammar,
    first: &'a FirstSets,
    augmented: Production,
}

impl<'a> ItemSetBuilder<'a> {
    pub(crate) fn new(grammar: &'a SyntaxGrammar, first: &'a FirstSets) -> Self {
        let augmented = Production {
            lhs: Symbol::ERROR,
            steps: vec![ProductionStep {
                symbol: grammar.start,
                precedence: 0,
                associativity: None,
                field: None,
                alias: None,
            }],
            dynamic_precedence: 0,
        };
        Self {
            grammar,
            first,
            augmented,
        }
    }

    /// Index of the synthetic `S' -> start` production.
    pub(crate) fn augmented_index(&self) -> u32 {
        self.grammar.productions.len() as u32
    }

    pub(crate) fn production(&self, index: u32) -> &Production {
        self.grammar
            .productions
            .get(index as usize)
            .unwrap_or(&self.augmented)
    }

    pub(crate) fn next_step(&self, item: Item) -> Option<&ProductionStep> {
        self.production(item.production).steps.get(item.dot as usize)
    }

    /// All states reachable from the start state, in discovery order.
    pub(crate) fn build(&self) -> Vec<ItemSet> {
        let start = Item {
            production: self.augmented_index(),
            dot: 0,
        };
        let mut end = self.first.empty_set();
        end.insert(Symbol::END);

        let mut kernels: IndexSet<Kernel> = IndexSet::new();
        kernels.insert(vec![(start, end)]);
        let mut cores: IndexSet<Vec<Item>> = IndexSet::new();
        let mut states = Vec::new();

        let mut next = 0;
        while let Some(kernel) = kernels.get_index(next).cloned() {
            next += 1;
            let (core, _) = cores.insert_full(kernel.iter().map(|(item, _)| *item).collect());
            let items = self.closure(&kernel);

            let mut successors: BTreeMap<Symbol, Kernel> = BTreeMap::new();
            for (item, lookahead) in &items {
                if let Some(step) = self.next_step(*item) {
                    successors
                        .entry(step.symbol)
                        .or_default()
                        .push((item.advance(), lookahead.clone()));
                }
            }

            let mut transitions = BTreeMap::new();
            for (symbol, mut successor) in successors {
                successor.sort_by_key(|(item, _)| *item);
                let mut merged: Kernel = Vec::with_capacity(successor.len());
                for (item, lookahead) in successor {
                    match merged.last_mut() {
                        Some((last, set)) if *last == item => {
                            set.union_with(&lookahead);
                        }
                        _ => merged.push((item, lookahead)),
                    }
                }
                let (target, _) = kernels.insert_full(merged);
                transitions.insert(symbol, target);
            }

            states.push(ItemSet {
                items,
                transitions,
                core,
            });
        }

        tracing::trace!(states = states.len(), cores = cores.len(), "built LR(1) item sets");
        states
    }

    fn closure(&self, kernel: &[(Item, TerminalSet)]) -> Vec<(Item, TerminalSet)> {
        let mut items: IndexMap<Item, TerminalSet> = kernel.iter().cloned().collect();
        let mut queue: VecDeque<usize> = (0..items.len()).collect();

        while let Some(index) = queue.pop_front() {
            let Some((&item, lookahead)) = items.get_index(index) else {
                continue;
            };
            let production = self.production(item.production);
            let Some(step) = production.steps.get(item.dot as usize) else {
                continue;
            };
            if self.grammar.symbols.is_terminal(step.symbol) {
                continue;
            }

            let mut follow = self.first.empty_set();
            let rest = &production.steps[item.dot as usize + 1..];
            if self.first.first_of_sequence(rest, &mut follow) {
                follow.union_with(lookahead);
            }

            for &candidate in self.grammar.productions_for(step.symbol) {
                let new_item = Item {
                    production: candidate as u32,
                    dot: 0,
                };
                match items.get_index_of(&new_item) {
                    Some(existing) => {
                        if items[existing].union_with(&follow) && !queue.contains(&existing) {
                            queue.push_back(existing);
                        }
                    }
                    None => {
                        let (inserted, _) = items.insert_full(new_item, follow.clone());
                        queue.push_back(inserted);
                    }
                }
            }
        }

        items.into_iter().collect()
    }
}
