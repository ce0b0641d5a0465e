//! Walking an edited tree for subtrees that can be reused by reference.

use std::sync::Arc;

use crate::base::Length;
use crate::tree::subtree::Subtree;

struct Entry {
    subtree: Subtree,
    start: Length,
    child_index: usize,
}

/// Preorder cursor over the old tree that only moves forward, tracking the
/// scanner state in effect before the current subtree.
pub(crate) struct ReusableNode {
    stack: Vec<Entry>,
    last_external: Option<Arc<[u8]>>,
}

impl ReusableNode {
    pub(crate) fn new(root: Subtree) -> Self {
        Self {
            stack: vec![Entry {
                subtree: root,
                start: Length::ZERO,
                child_index: 0,
            }],
            last_external: None,
        }
    }

    pub(crate) fn current(&self) -> Option<(&Subtree, Length)> {
        self.stack.last().map(|entry| (&entry.subtree, entry.start))
    }

    pub(crate) fn last_external(&self) -> Option<&Arc<[u8]>> {
        self.last_external.as_ref()
    }

    /// Move past the current subtree to the next one in text order.
    pub(crate) fn advance(&mut self) {
        let Some(mut entry) = self.stack.pop() else {
            return;
        };
        if let Some(state) = entry.subtree.last_external_state() {
            self.last_external = Some(Arc::clone(state));
        }
        loop {
            let end = entry.start + entry.subtree.size();
            let Some(parent) = self.stack.last() else {
                return;
            };
            let next_index = entry.child_index + 1;
            if let Some(next) = parent.subtree.children().get(next_index) {
                let next = next.clone();
                self.stack.push(Entry {
                    subtree: next,
                    start: end,
                    child_index: next_index,
                });
                return;
            }
            match self.stack.pop() {
                Some(parent) => entry = parent,
                None => return,
            }
        }
    }

    /// Move to the first child of the current subtree, if it has any.
    pub(crate) fn descend(&mut self) -> bool {
        let Some(entry) = self.stack.last() else {
            return false;
        };
        let Some(first) = entry.subtree.children().first() else {
            return false;
        };
        let child = Entry {
            subtree: first.clone(),
            start: entry.start,
            child_index: 0,
        };
        self.stack.push(child);
        true
    }

    /// Descend when possible, otherwise advance.
    pub(crate) fn descend_or_advance(&mut self) {
        if !self.descend() {
            self.advance();
        }
    }
}
