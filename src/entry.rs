//! Cache entry and the byte-size model.
//!
//! Every entry is costed as `key.len() + payload.len() + ENTRY_OVERHEAD`.
//! The same formula drives budget enforcement in the shards and exact-size
//! assertions in tests, so it lives in one place.

use std::time::Instant;

/// Fixed per-entry bookkeeping cost in bytes.
///
/// Covers the entry struct itself (two string headers, size, expiry) plus
/// the recency-list slot links and the index mapping. A constant rather than
/// a layout query so size arithmetic is exact and portable across
/// implementations of the storage.
pub const ENTRY_OVERHEAD: u64 = 80;

/// Byte cost of an entry holding `key` and `payload`.
#[must_use]
pub fn entry_size(key: &str, payload: &str) -> u64 {
    key.len() as u64 + payload.len() as u64 + ENTRY_OVERHEAD
}

/// One cached key/payload record plus its size and expiry instant.
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry {
    pub(crate) key: String,
    pub(crate) payload: String,
    pub(crate) size: u64,
    pub(crate) expires_at: Instant,
}

impl CacheEntry {
    pub(crate) fn new(key: &str, payload: &str, size: u64, expires_at: Instant) -> Self {
        CacheEntry {
            key: key.to_owned(),
            payload: payload.to_owned(),
            size,
            expires_at,
        }
    }

    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}
