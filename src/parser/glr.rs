//! The GLR driver for a single parse.

use std::cmp::Ordering;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use super::ParseStats;
use super::config::ParserConfig;
use super::lexing::{SourceText, Token, TokenSource};
use super::reuse::ReusableNode;
use super::stack::{Status, Version};
use crate::base::Length;
use crate::grammar::Symbol;
use crate::language::{ExternalScanner, Language};
use crate::table::{Action, ParseTable, ProductionId, StateId};
use crate::tree::pool::SubtreePool;
use crate::tree::subtree::Subtree;

/// Recoveries allowed at the end of input before the stack is wrapped in an
/// ERROR root.
const MAX_END_RECOVERIES: usize = 8;
/// Recoveries at one position before tokens are skipped unconditionally.
const MAX_RECOVERIES_PER_POSITION: usize = 3;
/// Steps a table simulation may take before it is abandoned.
const MAX_SIMULATION_STEPS: usize = 512;
/// Deepest stack-pop recovery attempted at the end of input.
const MAX_POP_DEPTH: u32 = 64;

enum Reuse {
    None,
    Pushed,
    Reduce(ProductionId, Token),
    Token(Token),
}

#[derive(Debug, PartialEq, Eq)]
enum Simulated {
    Shifted,
    Accepted,
}

pub(crate) struct ParseRun<'a> {
    language: &'a Language,
    table: &'a ParseTable,
    config: &'a ParserConfig,
    source: SourceText<'a>,
    tokens: TokenSource,
    pool: &'a mut SubtreePool,
    reusable: Option<ReusableNode>,
    versions: Vec<Version>,
    cancellation: Option<CancellationToken>,
    deadline: Option<Instant>,
    operations: usize,
    operation_limit: usize,
    end_recoveries: usize,
    position_recoveries: (usize, usize),
    stats: ParseStats,
}

impl<'a> ParseRun<'a> {
    pub(crate) fn new(
        language: &'a Language,
        config: &'a ParserConfig,
        source: &'a [u8],
        scanner: Option<Box<dyn ExternalScanner>>,
        pool: &'a mut SubtreePool,
        reusable: Option<ReusableNode>,
        cancellation: Option<CancellationToken>,
    ) -> Self {
        let operation_limit = source
            .len()
            .saturating_add(1)
            .saturating_mul(4096)
            .saturating_add(100_000);
        Self {
            language,
            table: language.parse_table(),
            config,
            source: SourceText::new(source),
            tokens: TokenSource::new(scanner),
            pool,
            reusable,
            versions: vec![Version::initial(ParseTable::START_STATE)],
            cancellation,
            deadline: config.timeout.map(|timeout| Instant::now() + timeout),
            operations: 0,
            operation_limit,
            end_recoveries: 0,
            position_recoveries: (usize::MAX, 0),
            stats: ParseStats {
                versions_created: 1,
                max_versions: 1,
                ..ParseStats::default()
            },
        }
    }

    /// Run to completion. `None` means the parse was cancelled or timed out.
    pub(crate) fn run(mut self) -> (Option<Subtree>, ParseStats, Option<Box<dyn ExternalScanner>>) {
        let root = self.parse_loop();
        self.stats.tokens_lexed = self.tokens.lexed;
        self.stats.pool_hits = self.pool.hits();
        tracing::trace!(pooled = self.pool.len(), hits = self.stats.pool_hits, "subtree pool");
        (root, self.stats, self.tokens.into_scanner())
    }

    fn parse_loop(&mut self) -> Option<Subtree> {
        loop {
            self.operations += 1;
            let interval = self.config.cancellation_check_interval.max(1);
            if self.operations % interval == 0 && self.should_stop() {
                tracing::debug!(operations = self.operations, "parse cancelled");
                return None;
            }
            if self.operations > self.operation_limit {
                tracing::warn!(operations = self.operations, "parse made no progress; wrapping stack in ERROR");
                return Some(self.fallback_root());
            }

            self.condense();
            match self.next_active() {
                Some(index) => self.advance(index),
                None => {
                    if let Some(root) = self.best_accepted() {
                        return Some(root);
                    }
                    if !self.recover() {
                        return Some(self.fallback_root());
                    }
                }
            }
        }
    }

    fn should_stop(&self) -> bool {
        self.cancellation.as_ref().is_some_and(CancellationToken::is_cancelled)
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    // ========================================================================
    // Version bookkeeping
    // ========================================================================

    /// The active version furthest behind; ties go to the oldest.
    fn next_active(&self) -> Option<usize> {
        self.versions
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_active())
            .min_by_key(|(index, v)| (v.position().bytes, *index))
            .map(|(index, _)| index)
    }

    fn compare(a: &Version, b: &Version) -> Ordering {
        a.error_cost()
            .cmp(&b.error_cost())
            .then_with(|| b.dynamic_precedence().cmp(&a.dynamic_precedence()))
    }

    fn condense(&mut self) {
        if self.versions.len() < 2 {
            return;
        }
        if self.versions.iter().any(|v| v.status != Status::Failed) {
            self.versions.retain(|v| v.status != Status::Failed);
        }

        // Merge active versions that can no longer diverge.
        let mut i = 0;
        while i < self.versions.len() {
            let mut j = i + 1;
            while j < self.versions.len() {
                let (a, b) = (&self.versions[i], &self.versions[j]);
                if a.is_active() && b.is_active() && a.can_merge(b) {
                    let keep_later = Self::compare(b, a) == Ordering::Less;
                    tracing::trace!(kept = if keep_later { j } else { i }, dropped = if keep_later { i } else { j }, "merge versions");
                    if keep_later {
                        self.versions.swap(i, j);
                    }
                    self.versions.remove(j);
                    self.stats.merges += 1;
                } else {
                    j += 1;
                }
            }
            i += 1;
        }

        // Drop versions that are too expensive to win.
        let best_accepted = self
            .versions
            .iter()
            .filter(|v| v.status == Status::Accepted)
            .map(Version::error_cost)
            .min();
        if let Some(min_cost) = self.versions.iter().map(Version::error_cost).min() {
            let limit = min_cost.saturating_add(self.config.max_cost_difference);
            self.versions.retain(|v| {
                !v.is_active()
                    || (v.error_cost() <= limit && best_accepted.is_none_or(|best| v.error_cost() <= best))
            });
        }

        // Cap the number of live versions, keeping the cheapest.
        let max_versions = self.config.max_version_count.max(1);
        let active = self.versions.iter().filter(|v| v.is_active()).count();
        if active > max_versions {
            let mut order: Vec<usize> = (0..self.versions.len()).filter(|&i| self.versions[i].is_active()).collect();
            order.sort_by(|&a, &b| Self::compare(&self.versions[a], &self.versions[b]).then(a.cmp(&b)));
            let mut excess: Vec<usize> = order.split_off(max_versions);
            excess.sort_unstable_by(|a, b| b.cmp(a));
            for index in excess {
                tracing::trace!(index, "drop version over limit");
                self.versions.remove(index);
            }
        }
    }

    fn best_accepted(&mut self) -> Option<Subtree> {
        let best = self
            .versions
            .iter()
            .enumerate()
            .filter(|(_, v)| v.status == Status::Accepted)
            .min_by(|(i, a), (j, b)| Self::compare(a, b).then(i.cmp(j)))
            .map(|(index, _)| index)?;
        self.versions[best].accepted.take()
    }

    // ========================================================================
    // Advancing
    // ========================================================================

    fn advance(&mut self, index: usize) {
        let token = if self.reusable.is_some() && self.versions.len() == 1 {
            match self.try_reuse(index) {
                Reuse::Pushed => return,
                Reuse::Reduce(production, token) => {
                    self.reduce(index, production, &token);
                    return;
                }
                Reuse::Token(token) => token,
                Reuse::None => self.lex(index),
            }
        } else {
            self.lex(index)
        };
        self.process(index, token);
    }

    fn lex(&mut self, index: usize) -> Token {
        let version = &self.versions[index];
        let lex_mode = self.table.lex_mode(version.state());
        let position = version.position();
        let last_external = version.last_external.clone();
        let token = self
            .tokens
            .next_token(self.language, &self.source, position, lex_mode, last_external.as_ref());
        match token.leaf {
            Some(leaf) => Token::leaf(self.pool.intern(leaf)),
            None => Token::end(),
        }
    }

    fn process(&mut self, index: usize, token: Token) {
        let state = self.versions[index].state();
        let table = self.table;

        if token.symbol == Symbol::ERROR {
            if let Some(leaf) = token.leaf {
                tracing::trace!(state, "push unrecognized input");
                self.versions[index].push(leaf.into_extra(), state);
            }
            return;
        }

        let actions = table.actions(state, token.symbol);
        if actions.is_empty() {
            match token.leaf {
                Some(leaf) if self.language.is_extra(token.symbol) => {
                    self.versions[index].push(leaf, state);
                }
                _ => {
                    tracing::trace!(
                        index,
                        state,
                        lookahead = self.language.symbol_name(token.symbol),
                        "version failed"
                    );
                    self.versions[index].status = Status::Failed;
                }
            }
            return;
        }

        let base = (actions.len() > 1).then(|| self.versions[index].clone());
        self.apply(index, actions[0], &token);
        if let Some(base) = base {
            for &action in &actions[1..] {
                tracing::trace!(index, state, ?action, "fork");
                self.versions.push(base.clone());
                self.stats.versions_created += 1;
                let fork = self.versions.len() - 1;
                self.apply(fork, action, &token);
            }
            self.stats.max_versions = self.stats.max_versions.max(self.versions.len());
        }
    }

    fn apply(&mut self, index: usize, action: Action, token: &Token) {
        match action {
            Action::Shift(next) => {
                let Some(leaf) = token.leaf.clone() else {
                    self.versions[index].status = Status::Failed;
                    return;
                };
                self.shift(index, leaf, next);
            }
            Action::Reduce(production) => self.reduce(index, production, token),
            Action::Accept => self.accept(index),
        }
    }

    fn shift(&mut self, index: usize, leaf: Subtree, next: StateId) {
        let leaf = self.pool.intern(leaf.into_structural());
        let version = &mut self.versions[index];
        if let Some(state) = leaf.external_state() {
            version.last_external = Some(state.clone());
        }
        tracing::trace!(
            index,
            from = version.state(),
            to = next,
            symbol = self.language.symbol_name(leaf.symbol()),
            "shift"
        );
        version.push(leaf, next);
    }

    fn reduce(&mut self, index: usize, production: ProductionId, token: &Token) {
        let Some(info) = self.table.production(production) else {
            self.versions[index].status = Status::Failed;
            return;
        };
        let fragile = self.versions.len() > 1;
        let version = &mut self.versions[index];
        let token_start = version.position();
        let Some(popped) = version.pop(info.child_count) else {
            version.status = Status::Failed;
            return;
        };
        let below = version.state();
        let Some(next) = self.table.goto(below, info.lhs) else {
            version.status = Status::Failed;
            return;
        };

        let node_start = version.position();
        // A reduction past skipped or unrecognized input was decided by recovery.
        let after_error = popped.trailing.iter().any(Subtree::has_error);
        let mut node = Subtree::node(self.language, info.lhs, popped.children, Some(production), below);
        let node_end = u32::from((node_start + node.size()).bytes);
        let examined_end = u32::from(token_start.bytes) + token.examined_bytes();
        node = node.with_lookahead_bytes(examined_end.saturating_sub(node_end));
        if fragile || after_error {
            node = node.into_fragile();
        }
        let node = self.pool.intern(node);

        tracing::trace!(
            index,
            symbol = self.language.symbol_name(info.lhs),
            children = info.child_count,
            from = below,
            to = next,
            "reduce"
        );
        let version = &mut self.versions[index];
        version.push(node, next);
        for extra in popped.trailing {
            version.push(extra, next);
        }
    }

    fn accept(&mut self, index: usize) {
        let subtrees = self.versions[index].subtrees();
        let Some(root_index) = subtrees.iter().rposition(|s| !s.is_extra()) else {
            self.versions[index].status = Status::Failed;
            return;
        };
        let root = &subtrees[root_index];
        let mut children = Vec::with_capacity(subtrees.len() + root.children().len());
        children.extend(subtrees[..root_index].iter().cloned());
        children.extend(root.children().iter().cloned());
        children.extend(subtrees[root_index + 1..].iter().cloned());
        let root = Subtree::node(self.language, root.symbol(), children, root.production(), root.parse_state());

        tracing::trace!(index, cost = root.error_cost(), "accept");
        let version = &mut self.versions[index];
        version.accepted = Some(root);
        version.status = Status::Accepted;
    }

    // ========================================================================
    // Incremental reuse
    // ========================================================================

    fn try_reuse(&mut self, index: usize) -> Reuse {
        let table = self.table;
        loop {
            let Some(reusable) = self.reusable.as_mut() else {
                return Reuse::None;
            };
            let version = &self.versions[index];
            let position = version.position().bytes;
            let state = version.state();

            let Some((candidate, start)) = reusable.current() else {
                return Reuse::None;
            };
            if start.bytes > position {
                return Reuse::None;
            }
            let end = start.bytes + candidate.size().bytes;
            if end <= position {
                reusable.advance();
                continue;
            }
            // Tokens inside an ERROR node were lexed during recovery.
            if candidate.is_error() {
                reusable.advance();
                continue;
            }
            if start.bytes < position {
                reusable.descend_or_advance();
                continue;
            }

            if candidate.has_changes()
                || candidate.has_error()
                || candidate.is_fragile()
                || candidate.is_missing()
                || candidate.size().is_empty()
                || reusable.last_external() != version.last_external.as_ref()
            {
                reusable.descend_or_advance();
                continue;
            }
            let first_leaf = candidate.first_leaf();
            if first_leaf.lex_mode() != table.lex_mode(state) {
                reusable.descend_or_advance();
                continue;
            }
            if candidate.is_leaf() {
                return Reuse::Token(Token::leaf(candidate.clone()));
            }

            match table.actions(state, first_leaf.symbol()) {
                [Action::Reduce(production)] => {
                    return Reuse::Reduce(*production, Token::leaf(first_leaf.clone()));
                }
                [Action::Shift(_)] if candidate.parse_state() == state => {
                    let Some(next) = table.goto(state, candidate.symbol()) else {
                        reusable.descend_or_advance();
                        continue;
                    };
                    let candidate = candidate.clone();
                    reusable.advance();
                    tracing::trace!(
                        symbol = self.language.symbol_name(candidate.symbol()),
                        bytes = candidate.size().byte_len(),
                        "reuse subtree"
                    );
                    let version = &mut self.versions[index];
                    if let Some(state) = candidate.last_external_state() {
                        version.last_external = Some(state.clone());
                    }
                    version.push(candidate, next);
                    self.stats.reused_subtrees += 1;
                    return Reuse::Pushed;
                }
                _ => reusable.descend_or_advance(),
            }
        }
    }

    // ========================================================================
    // Error recovery
    // ========================================================================

    fn recover(&mut self) -> bool {
        let Some(chosen) = self
            .versions
            .iter()
            .enumerate()
            .filter(|(_, v)| v.status == Status::Failed)
            .min_by(|(i, a), (j, b)| {
                b.position()
                    .bytes
                    .cmp(&a.position().bytes)
                    .then_with(|| Self::compare(a, b))
                    .then(i.cmp(j))
            })
            .map(|(index, _)| index)
        else {
            return false;
        };
        let mut version = self.versions.swap_remove(chosen);
        version.status = Status::Active;
        self.versions.clear();
        self.versions.push(version);
        self.stats.recoveries += 1;

        let token = self.lex(0);
        let position = self.versions[0].position().byte_len();
        tracing::trace!(
            position,
            lookahead = self.language.symbol_name(token.symbol),
            "recover"
        );

        if token.symbol == Symbol::END {
            self.end_recoveries += 1;
            if self.versions[0].head.depth == 0 {
                self.accept_empty();
                return true;
            }
            if self.end_recoveries <= MAX_END_RECOVERIES && self.insert_missing(0, &token) {
                return true;
            }
            if self.pop_until_accepting(0) {
                return true;
            }
            let root = self.error_root(0);
            let version = &mut self.versions[0];
            version.accepted = Some(root);
            version.status = Status::Accepted;
            return true;
        }

        if self.position_recoveries.0 == position {
            self.position_recoveries.1 += 1;
        } else {
            self.position_recoveries = (position, 1);
        }
        if self.position_recoveries.1 <= MAX_RECOVERIES_PER_POSITION && self.insert_missing(0, &token) {
            return true;
        }
        self.skip_token(0, token);
        true
    }

    /// Insert the first terminal (by symbol id) that lets the parse continue
    /// with `token`, as a zero-width MISSING leaf.
    fn insert_missing(&mut self, index: usize, token: &Token) -> bool {
        let table = self.table;
        let version = &self.versions[index];
        let state = version.state();
        let states = version.states();

        let candidate = table.valid_terminals(state).iter().find(|&terminal| {
            if terminal == Symbol::END || self.language.is_extra(terminal) || table.actions(state, terminal).is_empty() {
                return false;
            }
            let mut simulated = states.clone();
            if simulate(table, &mut simulated, terminal) != Some(Simulated::Shifted) {
                return false;
            }
            match simulate(table, &mut simulated, token.symbol) {
                Some(Simulated::Accepted) => token.symbol == Symbol::END,
                Some(Simulated::Shifted) => token.symbol != Symbol::END,
                None => false,
            }
        });
        let Some(missing) = candidate else {
            return false;
        };

        tracing::trace!(index, symbol = self.language.symbol_name(missing), "insert missing token");
        let leaf = Subtree::missing_leaf(self.language, missing, table.lex_mode(state));
        let missing_token = Token::leaf(leaf.clone());
        for _ in 0..MAX_SIMULATION_STEPS {
            let current = self.versions[index].state();
            match table.actions(current, missing).first() {
                Some(Action::Shift(next)) => {
                    self.versions[index].push(leaf, *next);
                    return true;
                }
                Some(Action::Reduce(production)) => {
                    self.reduce(index, *production, &missing_token);
                    if self.versions[index].status == Status::Failed {
                        return false;
                    }
                }
                _ => return false,
            }
        }
        false
    }

    /// Pop entries until the revealed state accepts the end of input, wrapping
    /// what was popped in an ERROR node.
    fn pop_until_accepting(&mut self, index: usize) -> bool {
        let depth = self.versions[index].head.depth;
        for count in 1..=depth.min(MAX_POP_DEPTH) {
            let mut trial = self.versions[index].clone();
            let Some(popped) = trial.pop(count as usize) else {
                return false;
            };
            let mut states = trial.states();
            if simulate(self.table, &mut states, Symbol::END) != Some(Simulated::Accepted) {
                continue;
            }
            tracing::trace!(index, popped = count, "pop recovery");
            let mut children = popped.children;
            children.extend(popped.trailing);
            let state = trial.state();
            let error = self.pool.intern(Subtree::error_node(self.language, children, state).into_extra());
            trial.push(error, state);
            self.versions[index] = trial;
            return true;
        }
        false
    }

    /// Consume `token` into an ERROR node, extending an ERROR node already on
    /// top of the stack (past any trivia) instead of starting a new one.
    fn skip_token(&mut self, index: usize, token: Token) {
        let Some(leaf) = token.leaf else {
            return;
        };
        tracing::trace!(
            index,
            symbol = self.language.symbol_name(leaf.symbol()),
            "skip token"
        );
        let version = &mut self.versions[index];
        if let Some(state) = leaf.external_state() {
            version.last_external = Some(state.clone());
        }

        let mut trivia = Vec::new();
        let mut node = &version.head;
        while let Some(subtree) = node.subtree.as_ref().filter(|s| s.is_extra() && !s.is_error()) {
            trivia.push(subtree.clone());
            match node.prev.as_ref() {
                Some(prev) => node = prev,
                None => break,
            }
        }
        let previous_error = node
            .subtree
            .as_ref()
            .filter(|s| s.is_error() && !s.is_leaf())
            .cloned()
            .zip(node.prev.clone());

        let state = version.state();
        let error = match previous_error {
            Some((error, below)) => {
                version.head = below;
                let mut children = error.children().to_vec();
                children.extend(trivia.into_iter().rev());
                children.push(leaf);
                Subtree::error_node(self.language, children, state)
            }
            None => Subtree::error_node(self.language, vec![leaf], state),
        };
        version.push(error.into_extra(), state);
    }

    fn accept_empty(&mut self) {
        let version = &mut self.versions[0];
        let extras = version.subtrees();
        let root = Subtree::node(self.language, self.language.start_symbol(), extras, None, ParseTable::START_STATE);
        tracing::trace!("accept empty input");
        version.accepted = Some(root);
        version.status = Status::Accepted;
    }

    fn error_root(&mut self, index: usize) -> Subtree {
        let mut children = self.versions[index].subtrees();
        let end = self.versions[index].position().byte_len();
        if end < self.source.len() {
            let rest = &self.source.bytes()[end..];
            children.push(Subtree::leaf(self.language, Symbol::ERROR, Length::of(rest), 0, 0));
        }
        Subtree::error_node(self.language, children, ParseTable::START_STATE)
    }

    fn fallback_root(&mut self) -> Subtree {
        let best = self
            .versions
            .iter()
            .enumerate()
            .max_by(|(i, a), (j, b)| {
                a.position()
                    .bytes
                    .cmp(&b.position().bytes)
                    .then_with(|| Self::compare(b, a))
                    .then(j.cmp(i))
            })
            .map(|(index, _)| index);
        match best {
            Some(index) => match self.versions[index].accepted.take() {
                Some(root) => root,
                None => self.error_root(index),
            },
            None => {
                let rest = Length::of(self.source.bytes());
                let leaf = Subtree::leaf(self.language, Symbol::ERROR, rest, 0, 0);
                Subtree::error_node(self.language, vec![leaf], ParseTable::START_STATE)
            }
        }
    }
}

/// Follow the first action for `symbol` from the top of `states`, performing
/// reductions until the symbol is shifted or accepted.
fn simulate(table: &ParseTable, states: &mut Vec<StateId>, symbol: Symbol) -> Option<Simulated> {
    for _ in 0..MAX_SIMULATION_STEPS {
        let state = *states.last()?;
        match *table.actions(state, symbol).first()? {
            Action::Shift(next) => {
                states.push(next);
                return Some(Simulated::Shifted);
            }
            Action::Accept => return Some(Simulated::Accepted),
            Action::Reduce(production) => {
                let info = table.production(production)?;
                if info.child_count >= states.len() {
                    return None;
                }
                states.truncate(states.len() - info.child_count);
                let below = *states.last()?;
                states.push(table.goto(below, info.lhs)?);
            }
        }
    }
    None
}
