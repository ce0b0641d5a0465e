//! Per-parse interning of identical subtrees.

use rustc_hash::FxHashMap;

use super::subtree::Subtree;
use crate::base::Length;
use crate::grammar::Symbol;
use crate::table::{LexModeId, ProductionId, StateId};

#[derive(Debug, PartialEq, Eq, Hash)]
struct PoolKey {
    symbol: Symbol,
    size: Length,
    lookahead_bytes: u32,
    lex_mode: LexModeId,
    parse_state: StateId,
    production: Option<ProductionId>,
    flags: u8,
    error_cost: u32,
    children: Box<[usize]>,
}

impl PoolKey {
    fn of(subtree: &Subtree) -> Option<PoolKey> {
        // Scanner state is not part of the key.
        if subtree.external_state().is_some() {
            return None;
        }
        let data = subtree.data();
        Some(PoolKey {
            symbol: data.symbol,
            size: data.size,
            lookahead_bytes: data.lookahead_bytes,
            lex_mode: data.lex_mode,
            parse_state: data.parse_state,
            production: data.production,
            flags: data.flags.bits(),
            error_cost: data.error_cost,
            children: data.children.iter().map(Subtree::id).collect(),
        })
    }
}

/// Hands out one shared instance for structurally identical subtrees.
///
/// Children are compared by identity, so interning is bottom-up: a node is
/// only found again when its children were themselves interned.
#[derive(Debug, Default)]
pub(crate) struct SubtreePool {
    entries: FxHashMap<PoolKey, Subtree>,
    hits: usize,
}

impl SubtreePool {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn intern(&mut self, subtree: Subtree) -> Subtree {
        let Some(key) = PoolKey::of(&subtree) else {
            return subtree;
        };
        match self.entries.get(&key) {
            Some(existing) => {
                self.hits += 1;
                existing.clone()
            }
            None => {
                self.entries.insert(key, subtree.clone());
                subtree
            }
        }
    }

    pub(crate) fn hits(&self) -> usize {
        self.hits
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
    }
}
