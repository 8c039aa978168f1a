//! The shard router: the cache's public surface.
//!
//! A [`Cache`] owns a fixed array of shards, each behind its own
//! `parking_lot::Mutex`, and routes every operation to one shard through a
//! pluggable hash function. Global `gets`/`sets`/`requests` counters are
//! independent atomics updated outside the shard locks; router-level
//! statistics are therefore only eventually consistent with shard contents,
//! which is fine for diagnostics.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use crate::config::{polynomial_hash, CacheConfig, ShardFn};
use crate::error::{ConfigError, EntryTooLarge, InvariantViolation};
use crate::shard::Shard;
use crate::sweep::{spawn_sweepers, Shutdown};

/// A sharded, size-bounded, TTL-aware LRU cache.
///
/// Cheap to share behind an `Arc`; all operations take `&self`. Dropping the
/// cache stops and joins every background sweep worker.
///
/// # Example
///
/// ```
/// use shardcache::{Cache, MB};
/// use std::time::Duration;
///
/// let cache = Cache::new(16 * MB).unwrap();
/// cache.set("greeting", "hello", Duration::from_secs(60)).unwrap();
/// assert_eq!(cache.get("greeting").as_deref(), Some("hello"));
/// ```
pub struct Cache {
    shards: Arc<[Mutex<Shard>]>,
    shard_fn: ShardFn,
    gets: AtomicU64,
    sets: AtomicU64,
    requests: AtomicU64,
    shutdown: Arc<Shutdown>,
    workers: Vec<JoinHandle<()>>,
}

impl Cache {
    /// Creates a cache with the given total byte budget and default
    /// configuration: 32 shards, a one second sweep interval, and the
    /// built-in shard hash.
    pub fn new(max_size: u64) -> Result<Self, ConfigError> {
        Self::with_config(CacheConfig::new(max_size))
    }

    /// Creates a cache from an explicit configuration.
    ///
    /// The byte budget is divided evenly across shards (integer division;
    /// the remainder is dropped capacity). Fails if the budget is zero, the
    /// shard count is zero, or a non-zero sweep interval is below the
    /// allowed minimum.
    pub fn with_config(config: CacheConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let shard_max = config.max_size / config.shard_count as u64;
        let shards: Arc<[Mutex<Shard>]> = (0..config.shard_count)
            .map(|_| Mutex::new(Shard::new(shard_max)))
            .collect();
        let shard_fn = config
            .shard_fn
            .unwrap_or_else(|| Arc::new(polynomial_hash) as ShardFn);

        let shutdown = Arc::new(Shutdown::new());
        let workers = if config.sweep_interval.is_zero() {
            Vec::new()
        } else {
            spawn_sweepers(&shards, config.sweep_interval, &shutdown)
        };

        debug!(
            shard_count = config.shard_count,
            shard_max_size = shard_max,
            sweep_interval = ?config.sweep_interval,
            "cache constructed"
        );

        Ok(Cache {
            shards,
            shard_fn,
            gets: AtomicU64::new(0),
            sets: AtomicU64::new(0),
            requests: AtomicU64::new(0),
            shutdown,
            workers,
        })
    }

    fn shard_index(&self, key: &str) -> usize {
        ((self.shard_fn)(key) % self.shards.len() as u64) as usize
    }

    /// Stores `payload` under `key` for `ttl`.
    ///
    /// Updating an existing key replaces its payload, refreshes its expiry,
    /// and promotes it to most-recently-used. Returns [`EntryTooLarge`]
    /// without mutating anything when the entry alone would exceed its
    /// shard's budget.
    pub fn set(&self, key: &str, payload: &str, ttl: Duration) -> Result<(), EntryTooLarge> {
        self.sets.fetch_add(1, Ordering::Relaxed);
        let shard = &self.shards[self.shard_index(key)];
        shard.lock().set(key, payload, ttl, Instant::now())
    }

    /// Looks up `key`, promoting it on a hit.
    ///
    /// Expired entries are removed on discovery and reported as a miss;
    /// callers cannot distinguish "absent" from "expired".
    pub fn get(&self, key: &str) -> Option<String> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let shard = &self.shards[self.shard_index(key)];
        let payload = shard.lock().get(key, Instant::now());
        if payload.is_some() {
            self.gets.fetch_add(1, Ordering::Relaxed);
        }
        payload
    }

    /// Removes `key`. Returns whether a live entry was removed.
    pub fn purge(&self, key: &str) -> bool {
        let shard = &self.shards[self.shard_index(key)];
        shard.lock().purge(key)
    }

    /// Number of shards the key space is partitioned across.
    #[must_use]
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Number of live entries across all shards.
    ///
    /// Locks each shard in turn, so the value may be slightly stale under
    /// concurrent mutation.
    #[must_use]
    pub fn object_count(&self) -> u64 {
        self.shards.iter().map(|s| s.lock().len() as u64).sum()
    }

    /// Total bytes accounted to live entries across all shards.
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.shards.iter().map(|s| s.lock().current_size()).sum()
    }

    /// Total byte budget across all shards.
    #[must_use]
    pub fn max_size(&self) -> u64 {
        self.shards.iter().map(|s| s.lock().max_size()).sum()
    }

    /// Number of entries evicted to satisfy the size budget. Expiry and
    /// purge removals are not counted here.
    #[must_use]
    pub fn eviction_count(&self) -> u64 {
        self.shards.iter().map(|s| s.lock().evictions()).sum()
    }

    /// Number of `get` calls that hit.
    #[must_use]
    pub fn get_count(&self) -> u64 {
        self.gets.load(Ordering::Relaxed)
    }

    /// Number of `set` calls, including rejected oversize ones.
    #[must_use]
    pub fn set_count(&self) -> u64 {
        self.sets.load(Ordering::Relaxed)
    }

    /// Number of `get` calls, hit or miss.
    #[must_use]
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Fraction of `get` calls that hit, or 0.0 before any request.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let requests = self.requests.load(Ordering::Relaxed);
        if requests == 0 {
            return 0.0;
        }
        self.gets.load(Ordering::Relaxed) as f64 / requests as f64
    }

    /// Point-in-time snapshot of the aggregate counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let mut object_count = 0u64;
        let mut current_size = 0u64;
        let mut max_size = 0u64;
        let mut evictions = 0u64;
        for shard in self.shards.iter() {
            let shard = shard.lock();
            object_count += shard.len() as u64;
            current_size += shard.current_size();
            max_size += shard.max_size();
            evictions += shard.evictions();
        }
        CacheStats {
            object_count,
            current_size,
            max_size,
            evictions,
            gets: self.get_count(),
            sets: self.set_count(),
            requests: self.request_count(),
            hit_rate: self.hit_rate(),
        }
    }

    /// Checks every shard's list/index/size invariants and returns all
    /// violations found. Empty means consistent.
    ///
    /// A diagnostic for tests and stress harnesses, not a production call.
    #[must_use]
    pub fn verify(&self) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();
        for (index, shard) in self.shards.iter().enumerate() {
            violations.extend(shard.lock().verify(index));
        }
        violations
    }
}

impl Drop for Cache {
    /// Stops the sweep workers and joins them; no thread outlives the cache.
    fn drop(&mut self) {
        self.shutdown.trigger();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("shard_count", &self.shards.len())
            .field("object_count", &self.object_count())
            .field("current_size", &self.current_size())
            .finish()
    }
}

/// Aggregate counters captured by [`Cache::stats`].
///
/// Per-shard sums and the atomic global counters are read at slightly
/// different moments, so fields may be mutually inconsistent by a few
/// operations under load.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStats {
    /// Live entries across all shards.
    pub object_count: u64,
    /// Bytes accounted to live entries.
    pub current_size: u64,
    /// Total byte budget.
    pub max_size: u64,
    /// Size-budget evictions since construction.
    pub evictions: u64,
    /// `get` calls that hit.
    pub gets: u64,
    /// `set` calls.
    pub sets: u64,
    /// `get` calls, hit or miss.
    pub requests: u64,
    /// `gets / requests`, or 0.0 before any request.
    pub hit_rate: f64,
}
