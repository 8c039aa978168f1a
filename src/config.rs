//! Cache configuration.
//!
//! [`CacheConfig`] has public fields for simple instantiation, with
//! [`CacheConfig::new`] filling in the defaults: 32 shards, a one second
//! sweep interval, and the built-in shard hash.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ConfigError;

/// Maps a key to a shard selector.
///
/// The router reduces the returned value modulo the shard count, so the
/// function may return either a full hash or a shard index directly. Custom
/// functions let callers exploit workload-specific locality, e.g. routing by
/// a key suffix.
pub type ShardFn = Arc<dyn Fn(&str) -> u64 + Send + Sync>;

/// Default number of shards.
pub const DEFAULT_SHARD_COUNT: usize = 32;

/// Default interval between background expiry sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Shortest permitted non-zero sweep interval.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(200);

/// Configuration for a [`Cache`](crate::Cache).
#[derive(Clone)]
pub struct CacheConfig {
    /// Total byte budget, divided evenly across shards (integer division;
    /// the remainder is dropped capacity).
    pub max_size: u64,
    /// Number of independently locked shards. More shards mean less
    /// contention; a good starting point is a small multiple of the core
    /// count.
    pub shard_count: usize,
    /// Pause between background expiry sweeps. Zero disables the sweep
    /// workers entirely; expired entries are then reclaimed only on access
    /// or eviction.
    pub sweep_interval: Duration,
    /// Optional custom shard routing function. `None` selects the built-in
    /// [`polynomial_hash`].
    pub shard_fn: Option<ShardFn>,
}

impl CacheConfig {
    /// Configuration with the given byte budget and default everything else.
    #[must_use]
    pub fn new(max_size: u64) -> Self {
        CacheConfig {
            max_size,
            shard_count: DEFAULT_SHARD_COUNT,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            shard_fn: None,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.max_size == 0 {
            return Err(ConfigError::ZeroMaxSize);
        }
        if self.shard_count == 0 {
            return Err(ConfigError::ZeroShardCount);
        }
        if !self.sweep_interval.is_zero() && self.sweep_interval < MIN_SWEEP_INTERVAL {
            return Err(ConfigError::SweepIntervalTooShort(self.sweep_interval));
        }
        Ok(())
    }
}

impl fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("max_size", &self.max_size)
            .field("shard_count", &self.shard_count)
            .field("sweep_interval", &self.sweep_interval)
            .field(
                "shard_fn",
                &self.shard_fn.as_ref().map(|_| "<custom>"),
            )
            .finish()
    }
}

/// The default shard routing hash: BKDR rolling polynomial,
/// `hash = hash * 131 + char`, over the key's characters.
#[must_use]
pub fn polynomial_hash(key: &str) -> u64 {
    let mut hash = 0u64;
    for c in key.chars() {
        hash = hash.wrapping_mul(131).wrapping_add(u64::from(c));
    }
    hash
}
