//! Persistent parse stacks for GLR versions.
//!
//! Every version is a pointer to the top of an immutable linked stack. Forking
//! a version clones one pointer; versions share every entry below the point
//! where they diverged.

use std::sync::Arc;

use crate::base::Length;
use crate::table::StateId;
use crate::tree::subtree::Subtree;

#[derive(Debug)]
pub(crate) struct StackNode {
    pub state: StateId,
    pub subtree: Option<Subtree>,
    pub prev: Option<Arc<StackNode>>,
    /// Text position after this entry.
    pub position: Length,
    /// Error cost of every subtree on the stack up to this entry.
    pub error_cost: u32,
    pub dynamic_precedence: i32,
    /// Non-extra entries up to and including this one.
    pub depth: u32,
}

impl Drop for StackNode {
    fn drop(&mut self) {
        let mut prev = self.prev.take();
        while let Some(node) = prev {
            match Arc::try_unwrap(node) {
                Ok(mut node) => prev = node.prev.take(),
                Err(_) => break,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Status {
    Active,
    Accepted,
    Failed,
}

#[derive(Debug, Clone)]
pub(crate) struct Version {
    pub head: Arc<StackNode>,
    pub status: Status,
    /// Scanner state saved with the last external token on this stack.
    pub last_external: Option<Arc<[u8]>>,
    /// Root built when this version accepted.
    pub accepted: Option<Subtree>,
}

impl Version {
    pub(crate) fn initial(state: StateId) -> Self {
        Self {
            head: Arc::new(StackNode {
                state,
                subtree: None,
                prev: None,
                position: Length::ZERO,
                error_cost: 0,
                dynamic_precedence: 0,
                depth: 0,
            }),
            status: Status::Active,
            last_external: None,
            accepted: None,
        }
    }

    pub(crate) fn state(&self) -> StateId {
        self.head.state
    }

    pub(crate) fn position(&self) -> Length {
        self.head.position
    }

    pub(crate) fn error_cost(&self) -> u32 {
        match &self.accepted {
            Some(root) => root.error_cost(),
            None => self.head.error_cost,
        }
    }

    pub(crate) fn dynamic_precedence(&self) -> i32 {
        match &self.accepted {
            Some(root) => root.dynamic_precedence(),
            None => self.head.dynamic_precedence,
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.status == Status::Active
    }

    pub(crate) fn push(&mut self, subtree: Subtree, state: StateId) {
        let prev = Arc::clone(&self.head);
        let depth = prev.depth + u32::from(!subtree.is_extra());
        self.head = Arc::new(StackNode {
            state,
            position: prev.position + subtree.size(),
            error_cost: prev.error_cost + subtree.error_cost(),
            dynamic_precedence: prev.dynamic_precedence + subtree.dynamic_precedence(),
            depth,
            subtree: Some(subtree),
            prev: Some(prev),
        });
    }

    /// Pop `count` non-extra entries plus the extras interleaved with them.
    /// Extras above the topmost popped entry are returned separately.
    pub(crate) fn pop(&mut self, count: usize) -> Option<Popped> {
        let mut trailing = Vec::new();
        let mut node = Arc::clone(&self.head);
        while let Some(subtree) = node.subtree.as_ref().filter(|s| s.is_extra()) {
            trailing.push(subtree.clone());
            node = Arc::clone(node.prev.as_ref()?);
        }
        let mut children = Vec::with_capacity(count);
        let mut popped = 0;
        while popped < count {
            let subtree = node.subtree.clone()?;
            if !subtree.is_extra() {
                popped += 1;
            }
            children.push(subtree);
            node = Arc::clone(node.prev.as_ref()?);
        }
        children.reverse();
        trailing.reverse();
        self.head = node;
        Some(Popped { children, trailing })
    }

    /// Every subtree on the stack, bottom first.
    pub(crate) fn subtrees(&self) -> Vec<Subtree> {
        let mut out = Vec::new();
        let mut node = Some(&self.head);
        while let Some(current) = node {
            if let Some(subtree) = &current.subtree {
                out.push(subtree.clone());
            }
            node = current.prev.as_ref();
        }
        out.reverse();
        out
    }

    /// States of the non-extra entries, bottom first.
    pub(crate) fn states(&self) -> Vec<StateId> {
        let mut out = Vec::new();
        let mut node = Some(&self.head);
        while let Some(current) = node {
            if !current.subtree.as_ref().is_some_and(Subtree::is_extra) {
                out.push(current.state);
            }
            node = current.prev.as_ref();
        }
        out.reverse();
        out
    }

    /// True when both stacks hold the same states at the same positions, so
    /// they accept exactly the same continuations.
    pub(crate) fn can_merge(&self, other: &Version) -> bool {
        if self.position().bytes != other.position().bytes
            || self.head.depth != other.head.depth
            || self.last_external != other.last_external
        {
            return false;
        }
        let mut a = Some(&self.head);
        let mut b = Some(&other.head);
        loop {
            a = skip_extras(a);
            b = skip_extras(b);
            match (a, b) {
                (Some(x), Some(y)) => {
                    if Arc::ptr_eq(x, y) {
                        return true;
                    }
                    if x.state != y.state || x.position.bytes != y.position.bytes {
                        return false;
                    }
                    a = x.prev.as_ref();
                    b = y.prev.as_ref();
                }
                (None, None) => return true,
                _ => return false,
            }
        }
    }
}

fn skip_extras(mut node: Option<&Arc<StackNode>>) -> Option<&Arc<StackNode>> {
    while let Some(current) = node {
        if !current.subtree.as_ref().is_some_and(Subtree::is_extra) {
            break;
        }
        node = current.prev.as_ref();
    }
    node
}

pub(crate) struct Popped {
    pub children: Vec<Subtree>,
    pub trailing: Vec<Subtree>,
}
