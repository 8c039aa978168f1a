#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │                         Cache (router)                             │
//! │                                                                    │
//! │  shard_fn(key) % N  ──▶  shard selection                           │
//! │                                                                    │
//! │  ┌─────────────┐ ┌─────────────┐         ┌─────────────┐           │
//! │  │   Shard 0   │ │   Shard 1   │   ...   │  Shard N-1  │           │
//! │  │  ┌───────┐  │ │  ┌───────┐  │         │  ┌───────┐  │           │
//! │  │  │ Mutex │  │ │  │ Mutex │  │         │  │ Mutex │  │           │
//! │  │  └───┬───┘  │ │  └───┬───┘  │         │  └───┬───┘  │           │
//! │  │ index+list │ │ index+list  │         │ index+list  │            │
//! │  └──────▲──────┘ └──────▲──────┘         └──────▲──────┘           │
//! │         │               │                       │                  │
//! │    sweep worker    sweep worker            sweep worker            │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each shard pairs a hash index with a recency list over the same entry
//! storage: one logical allocation per key, indexed two ways. The byte
//! budget is enforced per shard by evicting from the list tail; TTL expiry
//! happens lazily on access and through the per-shard sweep workers.
//!
//! # Modules
//!
//! - [`cache`]: the shard router and public call surface
//! - [`config`]: configuration, defaults, and the shard routing hash
//! - [`entry`]: the byte-size model
//! - [`error`]: construction, insertion, and invariant-check errors

/// The shard router and public cache type.
pub mod cache;

/// Cache configuration structures and the default shard hash.
pub mod config;

/// Cache entry byte-size model.
///
/// Exposes the [`ENTRY_OVERHEAD`](entry::ENTRY_OVERHEAD) constant and the
/// [`entry_size`](entry::entry_size) helper so callers and tests can compute
/// exact entry costs.
pub mod entry;

/// Error types.
pub mod error;

/// Arena-backed recency list.
///
/// Internal infrastructure: entries are addressed by generation-checked
/// handles so that deletions racing the background sweep are idempotent.
pub(crate) mod list;

/// The per-shard LRU core: index + recency list + byte budget.
pub(crate) mod shard;

/// Background expiry workers and their shutdown signalling.
pub(crate) mod sweep;

pub use cache::{Cache, CacheStats};
pub use config::{CacheConfig, ShardFn};
pub use entry::{entry_size, ENTRY_OVERHEAD};
pub use error::{ConfigError, EntryTooLarge, InvariantViolation};

/// One kibibyte, for sizing caches.
pub const KB: u64 = 1024;
/// One mebibyte.
pub const MB: u64 = KB * 1024;
/// One gibibyte.
pub const GB: u64 = MB * 1024;
/// One tebibyte.
pub const TB: u64 = GB * 1024;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_size_constants() {
        assert_eq!(KB, 1 << 10);
        assert_eq!(MB, 1 << 20);
        assert_eq!(GB, 1 << 30);
        assert_eq!(TB, 1 << 40);
    }
}
