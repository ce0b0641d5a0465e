//! The GLR parser.
//!
//! A [`Parser`] drives one [`Language`] over a byte buffer and produces a
//! [`Tree`]. Parsing never fails on bad input: unrecognised bytes become ERROR
//! leaves, absent tokens become zero-width MISSING leaves and unparseable
//! stretches are wrapped in ERROR nodes.
//!
//! ## Architecture
//!
//! ```text
//! bytes ─┬─> TokenSource (lexer + external scanner, per lex mode)
//!        │        ↓
//!        └─> ParseRun: versions of persistent stacks
//!                 ├─ shift / reduce / accept from the ParseTable
//!                 ├─ fork on conflicting actions, merge equal stacks
//!                 ├─ reuse unchanged subtrees of the old tree
//!                 └─ recover: insert MISSING, pop into ERROR, skip into ERROR
//!                         ↓
//!                       Tree
//! ```
//!
//! ## Incremental reparsing
//!
//! Edit the old tree with [`Tree::edit`], then pass it to [`Parser::parse`]
//! together with the new text. Subtrees that neither contain nor depend on the
//! edited range are pushed onto the stack whole instead of being reparsed.

mod batch;
mod config;
mod glr;
mod lexing;
mod reuse;
mod stack;

use tokio_util::sync::CancellationToken;

use crate::base::{MAX_TEXT_LEN, Point};
use crate::language::{
    ExternalScanner, Language, LanguageError, LANGUAGE_VERSION, MIN_COMPATIBLE_LANGUAGE_VERSION,
};
use crate::tree::Tree;
use crate::tree::pool::SubtreePool;

pub use batch::parse_batch;
pub use config::ParserConfig;

use glr::ParseRun;
use reuse::ReusableNode;

/// Counters describing the most recent parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Stack versions created, including the initial one.
    pub versions_created: usize,
    /// Most versions alive at the same time.
    pub max_versions: usize,
    /// Versions merged into an equivalent one.
    pub merges: usize,
    /// Subtrees of the old tree pushed without reparsing.
    pub reused_subtrees: usize,
    /// Times the parser had to recover from a syntax error.
    pub recoveries: usize,
    pub tokens_lexed: usize,
    /// Subtrees shared through the per-parse pool.
    pub pool_hits: usize,
}

/// Parses text for one language at a time.
///
/// A parser is `Send` but used from one thread at a time; create one per
/// thread to parse in parallel (see [`parse_batch`]).
pub struct Parser {
    language: Option<Language>,
    config: ParserConfig,
    cancellation: Option<CancellationToken>,
    scanner: Option<Box<dyn ExternalScanner>>,
    pool: SubtreePool,
    stats: ParseStats,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("language", &self.language.as_ref().map(Language::name))
            .field("config", &self.config)
            .field("stats", &self.stats)
            .finish()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            language: None,
            config,
            cancellation: None,
            scanner: None,
            pool: SubtreePool::new(),
            stats: ParseStats::default(),
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ParserConfig) {
        self.config = config;
    }

    pub fn language(&self) -> Option<&Language> {
        self.language.as_ref()
    }

    /// Switch to `language`, creating a fresh external scanner for it.
    ///
    /// Languages built for an incompatible table version are rejected and the
    /// current language is kept.
    pub fn set_language(&mut self, language: &Language) -> Result<(), LanguageError> {
        if !language.is_compatible() {
            return Err(LanguageError::Version {
                version: language.version(),
                min: MIN_COMPATIBLE_LANGUAGE_VERSION,
                max: LANGUAGE_VERSION,
            });
        }
        self.language = Some(language.clone());
        self.scanner = language.create_scanner();
        self.pool.clear();
        Ok(())
    }

    /// Token checked during parsing; once cancelled, `parse` returns `None`.
    pub fn set_cancellation_token(&mut self, token: Option<CancellationToken>) {
        self.cancellation = token;
    }

    /// Statistics of the most recent parse.
    pub fn stats(&self) -> ParseStats {
        self.stats
    }

    /// Parse `source`, reusing unchanged parts of `old_tree` when given.
    ///
    /// `old_tree` must already reflect every edit made to the text since it was
    /// produced (see [`Tree::edit`]). Returns `None` when no language is set,
    /// when `source` is longer than [`MAX_TEXT_LEN`] or when the parse was
    /// cancelled or timed out.
    pub fn parse(&mut self, source: &[u8], old_tree: Option<&Tree>) -> Option<Tree> {
        let language = self.language.clone()?;
        if source.len() > MAX_TEXT_LEN {
            tracing::warn!(bytes = source.len(), max = MAX_TEXT_LEN, "source too long to parse");
            return None;
        }
        let _span = tracing::debug_span!(
            "parse",
            language = language.name(),
            bytes = source.len(),
            incremental = old_tree.is_some()
        )
        .entered();

        let reusable = old_tree
            .filter(|tree| {
                let same = tree.language() == &language;
                if !same {
                    tracing::debug!("old tree belongs to another language; parsing from scratch");
                }
                same && self.config.reuse_subtrees
            })
            .map(|tree| ReusableNode::new(tree.root_subtree().clone()));

        if let Some(scanner) = self.scanner.as_mut() {
            scanner.deserialize(&[]);
        }
        let run = ParseRun::new(
            &language,
            &self.config,
            source,
            self.scanner.take(),
            &mut self.pool,
            reusable,
            self.cancellation.clone(),
        );
        let (root, stats, scanner) = run.run();
        self.scanner = scanner;
        self.stats = stats;
        self.pool.clear();

        let Some(root) = root else {
            tracing::debug!("parse abandoned");
            return None;
        };
        tracing::debug!(
            versions_created = stats.versions_created,
            max_versions = stats.max_versions,
            reused = stats.reused_subtrees,
            recoveries = stats.recoveries,
            tokens = stats.tokens_lexed,
            error_cost = root.error_cost(),
            "parse finished"
        );
        Some(Tree::new(root, language))
    }

    /// Parse text supplied in chunks by `read`, called with the byte offset and
    /// point of the next chunk until it returns an empty slice.
    pub fn parse_with<'a, F>(&mut self, mut read: F, old_tree: Option<&Tree>) -> Option<Tree>
    where
        F: FnMut(usize, Point) -> &'a [u8],
    {
        let mut source = Vec::new();
        let mut position = Point::ZERO;
        loop {
            let chunk = read(source.len(), position);
            if chunk.is_empty() {
                break;
            }
            position = position + crate::base::Length::of(chunk).extent;
            source.extend_from_slice(chunk);
        }
        self.parse(&source, old_tree)
    }

    /// Forget per-parse state: pooled subtrees, scanner state and statistics.
    pub fn reset(&mut self) {
        self.pool.clear();
        if let Some(scanner) = self.scanner.as_mut() {
            scanner.deserialize(&[]);
        }
        self.stats = ParseStats::default();
    }
}
