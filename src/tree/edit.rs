//! Translating a tree through a text edit.

use super::subtree::Subtree;
use crate::base::{InputEdit, Length};

/// Maps a position in the old text to the new text. Positions inside the
/// replaced range collapse onto the end of the replacement.
fn map_position(position: Length, edit: &InputEdit) -> Length {
    let start = edit.start();
    let old_end = edit.old_end();
    if position.bytes <= start.bytes {
        position
    } else if position.bytes < old_end.bytes {
        edit.new_end()
    } else {
        edit.new_end() + (position - old_end)
    }
}

enum Work<'a> {
    Visit { subtree: &'a Subtree, start: Length },
    Rebuild { subtree: &'a Subtree, children: usize },
}

/// Returns a copy of `root` whose sizes reflect `edit`, with every subtree
/// whose extent or lookahead touches the edited range marked as changed.
/// Untouched subtrees are shared with the input.
pub(crate) fn edit_subtree(root: &Subtree, edit: &InputEdit) -> Subtree {
    let edit_start = u32::from(edit.start().bytes);
    let edit_old_end = u32::from(edit.old_end().bytes);

    let mut work = vec![Work::Visit {
        subtree: root,
        start: Length::ZERO,
    }];
    let mut results: Vec<Subtree> = Vec::new();

    while let Some(item) = work.pop() {
        match item {
            Work::Visit { subtree, start } => {
                let start_byte = u32::from(start.bytes);
                let end_byte = start_byte + u32::from(subtree.size().bytes);
                let affected = edit_start <= end_byte + subtree.lookahead_bytes() && edit_old_end >= start_byte;
                if !affected {
                    results.push(subtree.clone());
                    continue;
                }
                if subtree.children().is_empty() {
                    let mut leaf = subtree.clone();
                    let new_start = map_position(start, edit);
                    let new_end = map_position(start + subtree.size(), edit);
                    let data = leaf.make_mut();
                    data.size = new_end - new_start;
                    Subtree::set_has_changes(data);
                    results.push(leaf);
                    continue;
                }
                work.push(Work::Rebuild {
                    subtree,
                    children: subtree.children().len(),
                });
                let mut child_starts = Vec::with_capacity(subtree.children().len());
                let mut position = start;
                for child in subtree.children() {
                    child_starts.push(position);
                    position += child.size();
                }
                for (child, child_start) in subtree.children().iter().zip(child_starts).rev() {
                    work.push(Work::Visit {
                        subtree: child,
                        start: child_start,
                    });
                }
            }
            Work::Rebuild { subtree, children } => {
                let edited = results.split_off(results.len() - children);
                let mut node = subtree.clone();
                let data = node.make_mut();
                data.size = edited.iter().fold(Length::ZERO, |size, child| size + child.size());
                data.children = edited.into_boxed_slice();
                Subtree::set_has_changes(data);
                results.push(node);
            }
        }
    }

    results.pop().unwrap_or_else(|| root.clone())
}
