//! A single cache shard: hash index + recency list + byte budget.
//!
//! The shard is the LRU core. It is not synchronized itself; the router
//! wraps each shard in a `Mutex` and every operation here runs under that
//! lock. String copies for stored entries happen inside the critical
//! section, and nothing here blocks.

use std::time::{Duration, Instant};

use hashbrown::{HashMap, HashSet};

use crate::entry::{entry_size, CacheEntry};
use crate::error::{EntryTooLarge, InvariantViolation};
use crate::list::{Handle, RecencyList};

/// One independently locked partition of the cache.
#[derive(Debug)]
pub(crate) struct Shard {
    index: HashMap<String, Handle>,
    list: RecencyList<CacheEntry>,
    current_size: u64,
    max_size: u64,
    evictions: u64,
}

impl Shard {
    pub(crate) fn new(max_size: u64) -> Self {
        Shard {
            index: HashMap::new(),
            list: RecencyList::new(),
            current_size: 0,
            max_size,
            evictions: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    pub(crate) fn current_size(&self) -> u64 {
        self.current_size
    }

    pub(crate) fn max_size(&self) -> u64 {
        self.max_size
    }

    pub(crate) fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Inserts or updates `key`, then evicts from the tail until the shard
    /// fits its budget again.
    ///
    /// An entry whose computed size alone exceeds the budget is rejected up
    /// front with no mutation: the budget is a hard per-entry ceiling, not
    /// just an aggregate one.
    pub(crate) fn set(
        &mut self,
        key: &str,
        payload: &str,
        ttl: Duration,
        now: Instant,
    ) -> Result<(), EntryTooLarge> {
        let size = entry_size(key, payload);
        if size > self.max_size {
            return Err(EntryTooLarge {
                size,
                max_size: self.max_size,
            });
        }
        let expires_at = now + ttl;

        if let Some(handle) = self.index.get(key).copied() {
            if let Some(entry) = self.list.get_mut(handle) {
                let old_size = entry.size;
                entry.payload.clear();
                entry.payload.push_str(payload);
                entry.size = size;
                entry.expires_at = expires_at;
                // old_size is a summand of current_size, so subtracting
                // first cannot underflow
                self.current_size = self.current_size - old_size + size;
                self.list.move_to_front(handle);
                self.evict_overflow();
                return Ok(());
            }
            // index pointed at a vacant slot; drop the stale mapping and
            // fall through to a fresh insert
            self.index.remove(key);
        }

        let handle = self
            .list
            .push_front(CacheEntry::new(key, payload, size, expires_at));
        self.index.insert(key.to_owned(), handle);
        self.current_size += size;
        self.evict_overflow();
        Ok(())
    }

    /// Looks up `key`, promoting it to the head on a hit.
    ///
    /// An entry found expired is deleted on the spot and reported as a miss;
    /// callers cannot tell "absent" from "expired".
    pub(crate) fn get(&mut self, key: &str, now: Instant) -> Option<String> {
        let handle = self.index.get(key).copied()?;
        let (expired, payload) = {
            let entry = self.list.get(handle)?;
            (entry.is_expired(now), entry.payload.clone())
        };
        if expired {
            self.remove_entry(handle);
            return None;
        }
        self.list.move_to_front(handle);
        Some(payload)
    }

    /// Removes `key` if live. Returns whether an entry was removed.
    pub(crate) fn purge(&mut self, key: &str) -> bool {
        match self.index.get(key).copied() {
            Some(handle) => self.remove_entry(handle),
            None => false,
        }
    }

    /// Least-recently-used entry, for starting a sweep pass.
    pub(crate) fn tail_handle(&self) -> Option<Handle> {
        self.list.tail()
    }

    /// One step of the background expiry sweep: check `cursor`, delete it if
    /// expired, and report the next node toward the head.
    ///
    /// The cursor was captured under an earlier lock acquisition and the
    /// lock has been released since, so the node may have been removed or
    /// promoted in the meantime. A promoted node is simply checked at its
    /// new position; a vanished node ends the pass (`(None, _)`), and the
    /// next pass restarts from the fresh tail. Returns `(next, expired)`.
    pub(crate) fn sweep_step(&mut self, cursor: Handle, now: Instant) -> (Option<Handle>, bool) {
        let expired = match self.list.get(cursor) {
            Some(entry) => entry.is_expired(now),
            None => return (None, false),
        };
        let prev = self.list.prev(cursor);
        if expired {
            self.remove_entry(cursor);
        }
        (prev, expired)
    }

    /// Unlinks the entry at `handle` from both the list and the index.
    ///
    /// Idempotent: a stale handle (node already removed by a racing caller)
    /// is a no-op, so `current_size` is never decremented twice for one
    /// entry. The index mapping is only dropped when it still points at this
    /// exact handle, protecting a re-inserted key from losing its fresh
    /// mapping.
    fn remove_entry(&mut self, handle: Handle) -> bool {
        let Some(entry) = self.list.remove(handle) else {
            return false;
        };
        if self.index.get(&entry.key) == Some(&handle) {
            self.index.remove(&entry.key);
        }
        self.current_size -= entry.size;
        true
    }

    /// Evicts tail entries until the shard fits its budget. Unconditional
    /// LRU: the list total order already encodes recency, no tie-break
    /// needed.
    fn evict_overflow(&mut self) {
        while self.current_size > self.max_size {
            let Some(tail) = self.list.tail() else {
                break;
            };
            if self.remove_entry(tail) {
                self.evictions += 1;
            }
        }
    }

    /// Live keys ordered most- to least-recently touched.
    #[cfg(test)]
    pub(crate) fn keys_by_recency(&self) -> Vec<String> {
        self.list.iter().map(|entry| entry.key.clone()).collect()
    }

    /// Checks the shard's structural invariants: the list is a symmetric
    /// chain, the index and list describe the same entries, keys are unique,
    /// and `current_size` equals the live total and respects the budget.
    pub(crate) fn verify(&self, shard: usize) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();
        let step_limit = self.list.len() + 1;

        let mut forward = Vec::new();
        let mut cursor = self.list.head();
        while let Some(handle) = cursor {
            if forward.len() >= step_limit {
                violations.push(InvariantViolation::BrokenChain { shard });
                return violations;
            }
            forward.push(handle);
            cursor = self.list.next(handle);
        }

        let mut backward = Vec::new();
        let mut cursor = self.list.tail();
        while let Some(handle) = cursor {
            if backward.len() >= step_limit {
                violations.push(InvariantViolation::BrokenChain { shard });
                return violations;
            }
            backward.push(handle);
            cursor = self.list.prev(handle);
        }
        backward.reverse();

        if forward != backward {
            violations.push(InvariantViolation::BrokenChain { shard });
        }

        let mut seen = HashSet::new();
        let mut live_total = 0u64;
        for &handle in &forward {
            let Some(entry) = self.list.get(handle) else {
                violations.push(InvariantViolation::BrokenChain { shard });
                continue;
            };
            if !seen.insert(entry.key.clone()) {
                violations.push(InvariantViolation::DuplicateKey {
                    shard,
                    key: entry.key.clone(),
                });
            }
            if self.index.get(&entry.key).copied() != Some(handle) {
                violations.push(InvariantViolation::IndexMismatch {
                    shard,
                    key: entry.key.clone(),
                });
            }
            live_total += entry.size;
        }

        if self.index.len() != forward.len() {
            violations.push(InvariantViolation::CountMismatch {
                shard,
                index_len: self.index.len(),
                list_len: forward.len(),
            });
        }
        if live_total != self.current_size {
            violations.push(InvariantViolation::SizeDrift {
                shard,
                accounted: self.current_size,
                actual: live_total,
            });
        }
        if self.current_size > self.max_size {
            violations.push(InvariantViolation::OverBudget {
                shard,
                current: self.current_size,
                max: self.max_size,
            });
        }

        violations
    }
}
