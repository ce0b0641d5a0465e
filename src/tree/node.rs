//! Read-only views of visible syntax nodes.

use std::fmt;
use std::ops::Range;

use text_size::TextRange;

use super::Tree;
use super::cursor::TreeCursor;
use super::subtree::Subtree;
use crate::base::{Length, Point};
use crate::grammar::{FieldId, Symbol};
use crate::table::ProductionInfo;

/// A visible node of a [`Tree`], positioned in the text.
///
/// Hidden nodes never surface: their children are spliced into the nearest
/// visible ancestor, and aliases from the parent production are applied.
#[derive(Clone, Copy)]
pub struct Node<'tree> {
    tree: &'tree Tree,
    subtree: &'tree Subtree,
    start: Length,
    alias: Option<Symbol>,
}

impl<'tree> Node<'tree> {
    pub(crate) fn new(tree: &'tree Tree, subtree: &'tree Subtree, start: Length, alias: Option<Symbol>) -> Self {
        Self {
            tree,
            subtree,
            start,
            alias,
        }
    }

    pub fn tree(&self) -> &'tree Tree {
        self.tree
    }

    // ========================================================================
    // Kind and flags
    // ========================================================================

    pub fn kind_id(&self) -> Symbol {
        self.alias.unwrap_or_else(|| self.subtree.symbol())
    }

    /// Symbol id the grammar gave this node, ignoring aliases.
    pub fn grammar_id(&self) -> Symbol {
        self.subtree.symbol()
    }

    pub fn kind(&self) -> &'tree str {
        self.tree.language().symbol_name(self.kind_id())
    }

    pub fn is_named(&self) -> bool {
        match self.alias {
            Some(alias) => self.tree.language().node_kind_is_named(alias),
            None => self.subtree.is_named(),
        }
    }

    pub fn is_extra(&self) -> bool {
        self.subtree.is_extra()
    }

    pub fn is_error(&self) -> bool {
        self.kind_id() == Symbol::ERROR
    }

    pub fn is_missing(&self) -> bool {
        self.subtree.is_missing()
    }

    /// True if this node is, or contains, an ERROR or MISSING node.
    pub fn has_error(&self) -> bool {
        self.subtree.has_error()
    }

    /// True if this node was touched by an edit since it was parsed.
    pub fn has_changes(&self) -> bool {
        self.subtree.has_changes()
    }

    /// Identifier unique among the nodes of one tree.
    pub fn id(&self) -> usize {
        self.subtree.id() ^ (self.start_byte().rotate_left(usize::BITS / 2))
    }

    // ========================================================================
    // Position
    // ========================================================================

    pub fn start_byte(&self) -> usize {
        self.start.byte_len()
    }

    pub fn end_byte(&self) -> usize {
        self.start_byte() + self.subtree.size().byte_len()
    }

    pub fn byte_range(&self) -> Range<usize> {
        self.start_byte()..self.end_byte()
    }

    pub fn text_range(&self) -> TextRange {
        TextRange::at(self.start.bytes, self.subtree.size().bytes)
    }

    pub fn start_position(&self) -> Point {
        self.start.extent
    }

    pub fn end_position(&self) -> Point {
        (self.start + self.subtree.size()).extent
    }

    pub fn utf8_text<'a>(&self, source: &'a [u8]) -> Result<&'a str, std::str::Utf8Error> {
        let range = self.byte_range();
        let end = range.end.min(source.len());
        let start = range.start.min(end);
        std::str::from_utf8(&source[start..end])
    }

    // ========================================================================
    // Children
    // ========================================================================

    pub fn child_count(&self) -> usize {
        self.subtree.visible_child_count() as usize
    }

    pub fn named_child_count(&self) -> usize {
        self.subtree.named_child_count() as usize
    }

    pub fn children(&self) -> impl Iterator<Item = Node<'tree>> + 'tree {
        self.entries().map(|(node, _)| node)
    }

    pub fn named_children(&self) -> impl Iterator<Item = Node<'tree>> + 'tree {
        self.children().filter(Node::is_named)
    }

    pub fn child(&self, index: usize) -> Option<Node<'tree>> {
        self.children().nth(index)
    }

    pub fn named_child(&self, index: usize) -> Option<Node<'tree>> {
        self.named_children().nth(index)
    }

    pub fn child_by_field_id(&self, field: FieldId) -> Option<Node<'tree>> {
        self.entries()
            .find(|(_, f)| *f == Some(field))
            .map(|(node, _)| node)
    }

    pub fn child_by_field_name(&self, name: &str) -> Option<Node<'tree>> {
        let field = self.tree.language().field_id_for_name(name)?;
        self.child_by_field_id(field)
    }

    pub fn children_by_field_name(&self, name: &str) -> Vec<Node<'tree>> {
        let Some(field) = self.tree.language().field_id_for_name(name) else {
            return Vec::new();
        };
        self.entries()
            .filter(|(_, f)| *f == Some(field))
            .map(|(node, _)| node)
            .collect()
    }

    pub fn field_name_for_child(&self, index: usize) -> Option<&'tree str> {
        let (_, field) = self.entries().nth(index)?;
        self.tree.language().field_name_for_id(field?)
    }

    pub(crate) fn entries(&self) -> Children<'tree> {
        Children::new(self.tree, self.subtree, self.start)
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub fn parent(&self) -> Option<Node<'tree>> {
        let root = self.tree.root_node();
        if root == *self {
            return None;
        }
        let mut stack = vec![root];
        while let Some(candidate) = stack.pop() {
            if candidate.children().any(|child| child == *self) {
                return Some(candidate);
            }
            stack.extend(candidate.children().filter(|child| {
                child.child_count() > 0
                    && child.start_byte() <= self.start_byte()
                    && self.end_byte() <= child.end_byte()
            }));
        }
        None
    }

    pub fn next_sibling(&self) -> Option<Node<'tree>> {
        let parent = self.parent()?;
        let mut children = parent.children();
        children.find(|child| child == self)?;
        children.next()
    }

    pub fn prev_sibling(&self) -> Option<Node<'tree>> {
        let parent = self.parent()?;
        let mut previous = None;
        for child in parent.children() {
            if child == *self {
                return previous;
            }
            previous = Some(child);
        }
        None
    }

    pub fn next_named_sibling(&self) -> Option<Node<'tree>> {
        let parent = self.parent()?;
        let mut children = parent.children();
        children.find(|child| child == self)?;
        children.find(Node::is_named)
    }

    pub fn prev_named_sibling(&self) -> Option<Node<'tree>> {
        let parent = self.parent()?;
        let mut previous = None;
        for child in parent.children() {
            if child == *self {
                return previous;
            }
            if child.is_named() {
                previous = Some(child);
            }
        }
        None
    }

    /// Smallest node that spans `start..end`.
    pub fn descendant_for_byte_range(&self, start: usize, end: usize) -> Option<Node<'tree>> {
        self.descend(start, end, false)
    }

    /// Smallest named node that spans `start..end`.
    pub fn named_descendant_for_byte_range(&self, start: usize, end: usize) -> Option<Node<'tree>> {
        self.descend(start, end, true)
    }

    fn descend(&self, start: usize, end: usize, named_only: bool) -> Option<Node<'tree>> {
        if start > end || start < self.start_byte() || end > self.end_byte() {
            return None;
        }
        let mut node = *self;
        let mut last_match = *self;
        'descend: loop {
            for child in node.children() {
                let spans = child.start_byte() <= start && end <= child.end_byte();
                let exact = child.start_byte() == start && child.end_byte() == end;
                if (spans && child.end_byte() > child.start_byte()) || exact {
                    node = child;
                    if !named_only || child.is_named() {
                        last_match = child;
                    }
                    continue 'descend;
                }
                if child.start_byte() > end {
                    break;
                }
            }
            return Some(last_match);
        }
    }

    pub fn walk(&self) -> TreeCursor<'tree> {
        TreeCursor::new(*self)
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// S-expression of the named structure, with field labels:
    /// `(assignment left: (identifier) right: (MISSING identifier))`.
    pub fn to_sexp(&self) -> String {
        enum Step<'tree> {
            Open(Node<'tree>, Option<FieldId>),
            Close,
        }

        let language = self.tree.language();
        let mut out = String::new();
        let mut stack = vec![Step::Open(*self, None)];
        while let Some(step) = stack.pop() {
            let (node, field) = match step {
                Step::Open(node, field) => (node, field),
                Step::Close => {
                    out.push(')');
                    continue;
                }
            };
            if !out.is_empty() {
                out.push(' ');
            }
            if let Some(name) = field.and_then(|f| language.field_name_for_id(f)) {
                out.push_str(name);
                out.push_str(": ");
            }
            out.push('(');
            if node.is_missing() {
                out.push_str("MISSING ");
                if node.is_named() {
                    out.push_str(node.kind());
                } else {
                    out.push('"');
                    out.push_str(node.kind());
                    out.push('"');
                }
                out.push(')');
                continue;
            }
            out.push_str(node.kind());
            stack.push(Step::Close);
            let children: Vec<_> = node
                .entries()
                .filter(|(child, _)| child.is_named() || child.is_missing())
                .collect();
            for (child, field) in children.into_iter().rev() {
                stack.push(Step::Open(child, field));
            }
        }
        out
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree)
            && self.subtree.ptr_eq(other.subtree)
            && self.start.bytes == other.start.bytes
    }
}

impl Eq for Node<'_> {}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{Node {} {} - {}}}", self.kind(), self.start_position(), self.end_position())
    }
}

// ============================================================================
// Child iteration
// ============================================================================

struct Frame<'tree> {
    subtree: &'tree Subtree,
    production: Option<&'tree ProductionInfo>,
    index: usize,
    structural: usize,
    position: Length,
    field: Option<FieldId>,
}

/// Visible children of a node with their field ids, descending through
/// hidden children with an explicit stack.
pub(crate) struct Children<'tree> {
    tree: &'tree Tree,
    stack: Vec<Frame<'tree>>,
}

impl<'tree> Children<'tree> {
    fn new(tree: &'tree Tree, subtree: &'tree Subtree, start: Length) -> Self {
        let mut children = Self {
            tree,
            stack: Vec::new(),
        };
        children.push(subtree, start, None);
        children
    }

    fn push(&mut self, subtree: &'tree Subtree, position: Length, field: Option<FieldId>) {
        let production = subtree
            .production()
            .and_then(|id| self.tree.language().parse_table().production(id));
        self.stack.push(Frame {
            subtree,
            production,
            index: 0,
            structural: 0,
            position,
            field,
        });
    }
}

impl<'tree> Iterator for Children<'tree> {
    type Item = (Node<'tree>, Option<FieldId>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            let subtree: &'tree Subtree = frame.subtree;
            let Some(child) = subtree.children().get(frame.index) else {
                self.stack.pop();
                continue;
            };
            frame.index += 1;
            let start = frame.position;
            frame.position += child.size();

            let (alias, field) = if child.is_extra() {
                (None, None)
            } else {
                let alias = frame.production.and_then(|p| p.alias(frame.structural));
                let field = frame
                    .production
                    .and_then(|p| p.field(frame.structural))
                    .or(frame.field);
                frame.structural += 1;
                (alias, field)
            };

            let visible = match alias {
                Some(alias) => self.tree.language().node_kind_is_visible(alias),
                None => child.is_visible(),
            };
            if visible {
                return Some((Node::new(self.tree, child, start, alias), field));
            }
            if !child.children().is_empty() {
                self.push(child, start, field);
            }
        }
    }
}
