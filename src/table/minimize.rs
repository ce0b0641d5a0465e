//! Merging of equivalent LR(1) states.
//!
//! States start out grouped by core and groups are split until every member
//! has the same actions and gotos, with targets compared by group. Members of
//! a group then behave identically, lexing included, so each group becomes a
//! single parse state.

use rustc_hash::FxHashMap;

use crate::grammar::Symbol;

use super::{Action, StateId};

/// Resolved row of one LR(1) state, keyed in symbol order.
#[derive(Debug, Default)]
pub(super) struct Row {
    pub actions: Vec<(Symbol, Vec<Action>)>,
    pub gotos: Vec<(Symbol, StateId)>,
}

type Signature = (usize, Vec<(Symbol, Vec<Action>)>, Vec<(Symbol, usize)>);

/// Group of every state and the number of groups.
///
/// Groups are numbered in order of their first member, so state 0 stays 0.
pub(super) fn merge_equivalent(rows: &[Row], cores: &[usize]) -> (Vec<StateId>, usize) {
    let mut groups = number_by_first_member(cores);
    let mut count = groups.iter().max().map_or(0, |&g| g + 1);

    loop {
        let signatures: Vec<Signature> = rows
            .iter()
            .zip(&groups)
            .map(|(row, &group)| signature(group, row, &groups))
            .collect();
        let refined = number_by_first_member(&signatures);
        let refined_count = refined.iter().max().map_or(0, |&g| g + 1);
        groups = refined;
        if refined_count == count {
            break;
        }
        count = refined_count;
    }

    tracing::trace!(states = rows.len(), merged = count, "merged equivalent states");
    (groups.into_iter().map(|g| g as StateId).collect(), count)
}

fn signature(group: usize, row: &Row, groups: &[usize]) -> Signature {
    let actions = row
        .actions
        .iter()
        .map(|(symbol, actions)| {
            let mapped = actions
                .iter()
                .map(|action| match *action {
                    Action::Shift(target) => Action::Shift(groups[target as usize] as StateId),
                    other => other,
                })
                .collect();
            (*symbol, mapped)
        })
        .collect();
    let gotos = row
        .gotos
        .iter()
        .map(|&(symbol, target)| (symbol, groups[target as usize]))
        .collect();
    (group, actions, gotos)
}

fn number_by_first_member<K: std::hash::Hash + Eq + Clone>(keys: &[K]) -> Vec<usize> {
    let mut ids: FxHashMap<K, usize> = FxHashMap::default();
    keys.iter()
        .map(|key| {
            let next = ids.len();
            *ids.entry(key.clone()).or_insert(next)
        })
        .collect()
}
