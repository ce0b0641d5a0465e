//! Parser tuning knobs.

use std::time::Duration;

/// Limits and switches for a [`Parser`](super::Parser).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ParserConfig {
    /// Most stack versions kept alive at once.
    pub max_version_count: usize,
    /// Versions whose error cost exceeds the best version's by more than this are dropped.
    pub max_cost_difference: u32,
    /// Reuse unchanged subtrees of the old tree when reparsing.
    pub reuse_subtrees: bool,
    /// Give up and return no tree after this much wall-clock time.
    pub timeout: Option<Duration>,
    /// Parser operations between cancellation and timeout checks.
    pub cancellation_check_interval: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_version_count: 6,
            max_cost_difference: 1800,
            reuse_subtrees: true,
            timeout: None,
            cancellation_check_interval: 64,
        }
    }
}

impl ParserConfig {
    pub fn with_max_version_count(mut self, count: usize) -> Self {
        self.max_version_count = count.max(1);
        self
    }

    pub fn with_max_cost_difference(mut self, cost: u32) -> Self {
        self.max_cost_difference = cost;
        self
    }

    pub fn with_reuse_subtrees(mut self, reuse: bool) -> Self {
        self.reuse_subtrees = reuse;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancellation_check_interval(mut self, operations: usize) -> Self {
        self.cancellation_check_interval = operations.max(1);
        self
    }
}
