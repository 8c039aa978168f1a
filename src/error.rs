//! Error types for construction, insertion, and invariant checking.

use std::time::Duration;

use thiserror::Error;

/// Rejected cache configuration. No partial cache is ever returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `max_size` was zero.
    #[error("cache max size must be greater than zero")]
    ZeroMaxSize,

    /// `shard_count` was zero.
    #[error("shard count must be greater than zero")]
    ZeroShardCount,

    /// A non-zero `sweep_interval` shorter than the allowed minimum; very
    /// short intervals would make the sweep workers a CPU drain.
    #[error("sweep interval {0:?} is shorter than the allowed minimum of 200ms")]
    SweepIntervalTooShort(Duration),
}

/// A single entry's computed size exceeds the shard budget.
///
/// Returned from `set` before any mutation; the cache is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("entry of {size} bytes exceeds the shard budget of {max_size} bytes")]
pub struct EntryTooLarge {
    /// Computed size of the rejected entry.
    pub size: u64,
    /// Per-shard byte budget it was checked against.
    pub max_size: u64,
}

/// A broken shard invariant found by [`Cache::verify`](crate::Cache::verify).
///
/// Diagnostic only: produced by tests and stress harnesses, never by normal
/// operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// Walking head-to-tail and tail-to-head did not visit the same entries
    /// in mirrored order.
    #[error("shard {shard}: forward and backward list walks disagree")]
    BrokenChain {
        /// Index of the offending shard.
        shard: usize,
    },

    /// The same key occurs more than once in the recency list.
    #[error("shard {shard}: key {key:?} appears more than once in the recency list")]
    DuplicateKey {
        /// Index of the offending shard.
        shard: usize,
        /// The duplicated key.
        key: String,
    },

    /// A listed entry is missing from the index or the index points at a
    /// different entry.
    #[error("shard {shard}: index disagrees with the recency list for key {key:?}")]
    IndexMismatch {
        /// Index of the offending shard.
        shard: usize,
        /// The key whose mapping is wrong.
        key: String,
    },

    /// Index and list disagree about how many entries are live.
    #[error("shard {shard}: index holds {index_len} keys but the list holds {list_len}")]
    CountMismatch {
        /// Index of the offending shard.
        shard: usize,
        /// Number of keys in the hash index.
        index_len: usize,
        /// Number of entries in the recency list.
        list_len: usize,
    },

    /// `current_size` drifted from the sum of live entry sizes.
    #[error("shard {shard}: accounted size {accounted} differs from live total {actual}")]
    SizeDrift {
        /// Index of the offending shard.
        shard: usize,
        /// The shard's `current_size` counter.
        accounted: u64,
        /// Sum of `size` over the live entries.
        actual: u64,
    },

    /// The shard is over its byte budget.
    #[error("shard {shard}: current size {current} exceeds budget {max}")]
    OverBudget {
        /// Index of the offending shard.
        shard: usize,
        /// The shard's `current_size` counter.
        current: u64,
        /// The shard's byte budget.
        max: u64,
    },
}
