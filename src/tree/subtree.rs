//! Persistent, reference-counted syntax subtrees.
//!
//! Subtrees store sizes, not positions, so an unchanged subtree can be shared
//! by any number of trees regardless of where it ends up in the text.

use std::sync::Arc;

use crate::base::Length;
use crate::grammar::Symbol;
use crate::language::Language;
use crate::table::{LexModeId, ProductionId, StateId};

pub(crate) const ERROR_COST_PER_RECOVERY: u32 = 500;
pub(crate) const ERROR_COST_PER_MISSING_TREE: u32 = 110;
pub(crate) const ERROR_COST_PER_SKIPPED_TREE: u32 = 100;
pub(crate) const ERROR_COST_PER_SKIPPED_LINE: u32 = 30;
pub(crate) const ERROR_COST_PER_SKIPPED_CHAR: u32 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub(crate) struct Flags(u8);

impl Flags {
    pub const VISIBLE: u8 = 1 << 0;
    pub const NAMED: u8 = 1 << 1;
    pub const EXTRA: u8 = 1 << 2;
    pub const MISSING: u8 = 1 << 3;
    pub const HAS_CHANGES: u8 = 1 << 4;
    pub const FRAGILE: u8 = 1 << 5;
    pub const HAS_EXTERNAL_TOKENS: u8 = 1 << 6;
    pub const INTERIOR: u8 = 1 << 7;

    fn get(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    fn set(&mut self, flag: u8, value: bool) {
        if value {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }

    pub(crate) fn bits(self) -> u8 {
        self.0
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SubtreeData {
    pub symbol: Symbol,
    pub size: Length,
    pub children: Box<[Subtree]>,
    /// State the parser was in before this subtree was pushed.
    pub parse_state: StateId,
    /// Lex mode a leaf was lexed in.
    pub lex_mode: LexModeId,
    pub production: Option<ProductionId>,
    /// Bytes past the end of this subtree that influenced how it was built.
    pub lookahead_bytes: u32,
    pub error_cost: u32,
    pub dynamic_precedence: i32,
    pub visible_child_count: u32,
    pub named_child_count: u32,
    pub flags: Flags,
    /// Scanner state after an external token was recognised.
    pub external_state: Option<Arc<[u8]>>,
}

impl Drop for SubtreeData {
    // Deep left-recursive trees would overflow the stack with recursive drops.
    fn drop(&mut self) {
        if self.children.is_empty() {
            return;
        }
        let mut stack: Vec<Subtree> = std::mem::take(&mut self.children).into_vec();
        while let Some(child) = stack.pop() {
            if let Ok(mut data) = Arc::try_unwrap(child.0) {
                stack.extend(std::mem::take(&mut data.children).into_vec());
            }
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Subtree(Arc<SubtreeData>);

impl Subtree {
    // ========================================================================
    // Construction
    // ========================================================================

    fn from_data(data: SubtreeData) -> Subtree {
        Subtree(Arc::new(data))
    }

    fn base(symbol: Symbol, size: Length) -> SubtreeData {
        SubtreeData {
            symbol,
            size,
            children: Box::default(),
            parse_state: 0,
            lex_mode: 0,
            production: None,
            lookahead_bytes: 0,
            error_cost: 0,
            dynamic_precedence: 0,
            visible_child_count: 0,
            named_child_count: 0,
            flags: Flags::default(),
            external_state: None,
        }
    }

    /// A token produced by the lexer or the external scanner.
    pub(crate) fn leaf(
        language: &Language,
        symbol: Symbol,
        size: Length,
        lookahead_bytes: u32,
        lex_mode: LexModeId,
    ) -> Subtree {
        let mut data = Self::base(symbol, size);
        data.lookahead_bytes = lookahead_bytes;
        data.lex_mode = lex_mode;
        data.flags.set(Flags::VISIBLE, language.node_kind_is_visible(symbol));
        data.flags.set(Flags::NAMED, language.node_kind_is_named(symbol));
        data.flags.set(Flags::EXTRA, language.is_extra(symbol));
        if symbol == Symbol::ERROR {
            data.error_cost = ERROR_COST_PER_RECOVERY
                + ERROR_COST_PER_SKIPPED_CHAR * u32::from(size.bytes)
                + ERROR_COST_PER_SKIPPED_LINE * size.extent.row;
        }
        Self::from_data(data)
    }

    /// A zero-width placeholder for a token the parser had to assume.
    pub(crate) fn missing_leaf(language: &Language, symbol: Symbol, lex_mode: LexModeId) -> Subtree {
        let mut data = Self::base(symbol, Length::ZERO);
        data.lex_mode = lex_mode;
        data.error_cost = ERROR_COST_PER_MISSING_TREE + ERROR_COST_PER_RECOVERY;
        data.flags.set(Flags::VISIBLE, language.node_kind_is_visible(symbol));
        data.flags.set(Flags::NAMED, language.node_kind_is_named(symbol));
        data.flags.set(Flags::MISSING, true);
        Self::from_data(data)
    }

    /// An interior node. `production` supplies field names and aliases of the
    /// structural (non-extra) children.
    pub(crate) fn node(
        language: &Language,
        symbol: Symbol,
        children: Vec<Subtree>,
        production: Option<ProductionId>,
        parse_state: StateId,
    ) -> Subtree {
        let mut data = Self::base(symbol, Length::ZERO);
        data.parse_state = parse_state;
        data.production = production;
        data.flags.set(Flags::VISIBLE, language.node_kind_is_visible(symbol));
        data.flags.set(Flags::NAMED, language.node_kind_is_named(symbol));
        data.flags.set(Flags::INTERIOR, true);
        data.children = children.into_boxed_slice();
        summarize(&mut data, language);
        Self::from_data(data)
    }

    /// An ERROR node wrapping skipped or abandoned subtrees.
    pub(crate) fn error_node(language: &Language, children: Vec<Subtree>, parse_state: StateId) -> Subtree {
        let mut node = Self::node(language, Symbol::ERROR, children, None, parse_state);
        let data = node.make_mut();
        let mut skipped = 0;
        for child in data.children.iter() {
            if child.is_visible() {
                skipped += 1;
            } else if !child.is_leaf() {
                skipped += child.0.visible_child_count;
            }
        }
        data.error_cost += ERROR_COST_PER_RECOVERY
            + ERROR_COST_PER_SKIPPED_CHAR * u32::from(data.size.bytes)
            + ERROR_COST_PER_SKIPPED_LINE * data.size.extent.row
            + ERROR_COST_PER_SKIPPED_TREE * skipped;
        node
    }

    // ========================================================================
    // Copy-on-write updates
    // ========================================================================

    pub(crate) fn make_mut(&mut self) -> &mut SubtreeData {
        Arc::make_mut(&mut self.0)
    }

    pub(crate) fn into_extra(mut self) -> Subtree {
        if !self.is_extra() {
            self.make_mut().flags.set(Flags::EXTRA, true);
        }
        self
    }

    /// Clear the extra flag of a token that the grammar also uses structurally.
    pub(crate) fn into_structural(mut self) -> Subtree {
        if self.is_extra() {
            self.make_mut().flags.set(Flags::EXTRA, false);
        }
        self
    }

    pub(crate) fn into_fragile(mut self) -> Subtree {
        if !self.is_fragile() {
            self.make_mut().flags.set(Flags::FRAGILE, true);
        }
        self
    }

    pub(crate) fn with_lookahead_bytes(mut self, bytes: u32) -> Subtree {
        if bytes > self.0.lookahead_bytes {
            self.make_mut().lookahead_bytes = bytes;
        }
        self
    }

    pub(crate) fn with_external_state(mut self, state: Arc<[u8]>) -> Subtree {
        let data = self.make_mut();
        data.external_state = Some(state);
        data.flags.set(Flags::HAS_EXTERNAL_TOKENS, true);
        self
    }

    pub(crate) fn set_has_changes(data: &mut SubtreeData) {
        data.flags.set(Flags::HAS_CHANGES, true);
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub(crate) fn data(&self) -> &SubtreeData {
        &self.0
    }

    pub(crate) fn ptr_eq(&self, other: &Subtree) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    pub(crate) fn symbol(&self) -> Symbol {
        self.0.symbol
    }

    pub(crate) fn size(&self) -> Length {
        self.0.size
    }

    pub(crate) fn children(&self) -> &[Subtree] {
        &self.0.children
    }

    pub(crate) fn is_leaf(&self) -> bool {
        !self.0.flags.get(Flags::INTERIOR)
    }

    pub(crate) fn is_visible(&self) -> bool {
        self.0.flags.get(Flags::VISIBLE)
    }

    pub(crate) fn is_named(&self) -> bool {
        self.0.flags.get(Flags::NAMED)
    }

    pub(crate) fn is_extra(&self) -> bool {
        self.0.flags.get(Flags::EXTRA)
    }

    pub(crate) fn is_missing(&self) -> bool {
        self.0.flags.get(Flags::MISSING)
    }

    pub(crate) fn has_changes(&self) -> bool {
        self.0.flags.get(Flags::HAS_CHANGES)
    }

    pub(crate) fn is_fragile(&self) -> bool {
        self.0.flags.get(Flags::FRAGILE)
    }

    pub(crate) fn has_external_tokens(&self) -> bool {
        self.0.flags.get(Flags::HAS_EXTERNAL_TOKENS)
    }

    pub(crate) fn has_error(&self) -> bool {
        self.0.error_cost > 0
    }

    pub(crate) fn is_error(&self) -> bool {
        self.0.symbol == Symbol::ERROR
    }

    pub(crate) fn error_cost(&self) -> u32 {
        self.0.error_cost
    }

    pub(crate) fn dynamic_precedence(&self) -> i32 {
        self.0.dynamic_precedence
    }

    pub(crate) fn parse_state(&self) -> StateId {
        self.0.parse_state
    }

    pub(crate) fn lex_mode(&self) -> LexModeId {
        self.0.lex_mode
    }

    pub(crate) fn production(&self) -> Option<ProductionId> {
        self.0.production
    }

    pub(crate) fn lookahead_bytes(&self) -> u32 {
        self.0.lookahead_bytes
    }

    pub(crate) fn external_state(&self) -> Option<&Arc<[u8]>> {
        self.0.external_state.as_ref()
    }

    pub(crate) fn visible_child_count(&self) -> u32 {
        self.0.visible_child_count
    }

    pub(crate) fn named_child_count(&self) -> u32 {
        self.0.named_child_count
    }

    /// Leftmost leaf, following first children.
    pub(crate) fn first_leaf(&self) -> &Subtree {
        let mut current = self;
        while let Some(first) = current.children().first() {
            current = first;
        }
        current
    }

    /// Scanner state stored on the last external token inside this subtree.
    pub(crate) fn last_external_state(&self) -> Option<&Arc<[u8]>> {
        let mut current = self;
        'descend: loop {
            if let Some(state) = current.external_state() {
                return Some(state);
            }
            for child in current.children().iter().rev() {
                if child.has_external_tokens() {
                    current = child;
                    continue 'descend;
                }
            }
            return None;
        }
    }
}

/// Recompute size, error cost, precedence, lookahead and visible child counts
/// of an interior node from its children.
fn summarize(data: &mut SubtreeData, language: &Language) {
    let production = data
        .production
        .and_then(|id| language.parse_table().production(id));

    let mut size = Length::ZERO;
    let mut lookahead_end = 0u32;
    let mut error_cost = 0u32;
    let mut dynamic_precedence = production.map(|p| p.dynamic_precedence).unwrap_or(0);
    let mut visible = 0u32;
    let mut named = 0u32;
    let mut fragile = false;
    let mut external = false;
    let mut structural_index = 0usize;

    for child in data.children.iter() {
        let child_end = u32::from(size.bytes) + u32::from(child.size().bytes);
        lookahead_end = lookahead_end.max(child_end + child.lookahead_bytes());
        size += child.size();
        error_cost += child.error_cost();
        dynamic_precedence += child.dynamic_precedence();
        fragile |= child.is_fragile();
        external |= child.has_external_tokens();

        let alias = if child.is_extra() {
            None
        } else {
            let alias = production.and_then(|p| p.alias(structural_index));
            structural_index += 1;
            alias
        };
        let (is_visible, is_named) = match alias {
            Some(alias) => (
                language.node_kind_is_visible(alias),
                language.node_kind_is_named(alias),
            ),
            None => (child.is_visible(), child.is_named()),
        };
        if is_visible {
            visible += 1;
            if is_named {
                named += 1;
            }
        } else if !child.children().is_empty() {
            visible += child.visible_child_count();
            named += child.named_child_count();
        }
    }

    data.size = size;
    data.lookahead_bytes = lookahead_end.saturating_sub(u32::from(size.bytes));
    data.error_cost = error_cost;
    data.dynamic_precedence = dynamic_precedence;
    data.visible_child_count = visible;
    data.named_child_count = named;
    data.flags.set(Flags::FRAGILE, fragile);
    data.flags.set(Flags::HAS_EXTERNAL_TOKENS, external);
}
