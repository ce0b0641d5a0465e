//! Stateful walking of visible nodes.

use super::node::Node;
use crate::grammar::FieldId;

struct Level<'tree> {
    siblings: Vec<(Node<'tree>, Option<FieldId>)>,
    index: usize,
}

/// Cursor over the visible nodes below (and including) a starting node.
///
/// The cursor never moves above the node it was created from.
pub struct TreeCursor<'tree> {
    levels: Vec<Level<'tree>>,
}

impl<'tree> TreeCursor<'tree> {
    pub(crate) fn new(node: Node<'tree>) -> Self {
        Self {
            levels: vec![Level {
                siblings: vec![(node, None)],
                index: 0,
            }],
        }
    }

    fn current(&self) -> Option<&(Node<'tree>, Option<FieldId>)> {
        let level = self.levels.last()?;
        level.siblings.get(level.index)
    }

    pub fn node(&self) -> Option<Node<'tree>> {
        self.current().map(|(node, _)| *node)
    }

    pub fn field_id(&self) -> Option<FieldId> {
        self.current().and_then(|(_, field)| *field)
    }

    pub fn field_name(&self) -> Option<&'tree str> {
        let (node, field) = self.current()?;
        node.tree().language().field_name_for_id((*field)?)
    }

    pub fn depth(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    pub fn goto_first_child(&mut self) -> bool {
        let Some((node, _)) = self.current() else {
            return false;
        };
        let siblings: Vec<_> = node.entries().collect();
        if siblings.is_empty() {
            return false;
        }
        self.levels.push(Level { siblings, index: 0 });
        true
    }

    /// Move to the first child that ends after `byte`, returning its index.
    pub fn goto_first_child_for_byte(&mut self, byte: usize) -> Option<usize> {
        let (node, _) = self.current()?;
        let siblings: Vec<_> = node.entries().collect();
        let index = siblings.iter().position(|(child, _)| child.end_byte() > byte)?;
        self.levels.push(Level { siblings, index });
        Some(index)
    }

    pub fn goto_next_sibling(&mut self) -> bool {
        if self.levels.len() < 2 {
            return false;
        }
        match self.levels.last_mut() {
            Some(level) if level.index + 1 < level.siblings.len() => {
                level.index += 1;
                true
            }
            _ => false,
        }
    }

    pub fn goto_prev_sibling(&mut self) -> bool {
        if self.levels.len() < 2 {
            return false;
        }
        match self.levels.last_mut() {
            Some(level) if level.index > 0 => {
                level.index -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn goto_parent(&mut self) -> bool {
        if self.levels.len() < 2 {
            return false;
        }
        self.levels.pop();
        true
    }

    pub fn reset(&mut self, node: Node<'tree>) {
        *self = TreeCursor::new(node);
    }
}
