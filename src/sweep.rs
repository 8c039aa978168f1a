//! Background expiry workers, one per shard.
//!
//! Each worker periodically walks its shard's recency list from the
//! least-recently-used end, deleting expired entries. The shard lock is
//! re-acquired for every step and released in between, so a sweep over a
//! large list never stalls foreground callers for more than one step. The
//! cost of that choice is that the cursor can go stale between steps; the
//! shard's `sweep_step` rechecks it under the lock and ends the pass when
//! the node has vanished.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::trace;

use crate::shard::Shard;

/// Shutdown signal shared by all sweep workers of one cache.
#[derive(Debug)]
pub(crate) struct Shutdown {
    stopped: Mutex<bool>,
    signal: Condvar,
}

impl Shutdown {
    pub(crate) fn new() -> Self {
        Shutdown {
            stopped: Mutex::new(false),
            signal: Condvar::new(),
        }
    }

    /// Sleeps for at most `timeout`, waking early on shutdown. Returns true
    /// once shutdown has been requested.
    fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut stopped = self.stopped.lock();
        if !*stopped {
            self.signal.wait_for(&mut stopped, timeout);
        }
        *stopped
    }

    /// Wakes every worker and tells it to exit.
    pub(crate) fn trigger(&self) {
        *self.stopped.lock() = true;
        self.signal.notify_all();
    }
}

/// Spawns one sweep worker per shard.
pub(crate) fn spawn_sweepers(
    shards: &Arc<[Mutex<Shard>]>,
    interval: Duration,
    shutdown: &Arc<Shutdown>,
) -> Vec<JoinHandle<()>> {
    (0..shards.len())
        .map(|index| {
            let shards = Arc::clone(shards);
            let shutdown = Arc::clone(shutdown);
            thread::spawn(move || run(&shards[index], index, interval, &shutdown))
        })
        .collect()
}

fn run(shard: &Mutex<Shard>, index: usize, interval: Duration, shutdown: &Shutdown) {
    while !shutdown.wait_timeout(interval) {
        let mut removed = 0usize;
        let mut cursor = shard.lock().tail_handle();
        while let Some(handle) = cursor {
            let (next, expired) = shard.lock().sweep_step(handle, Instant::now());
            if expired {
                removed += 1;
            }
            cursor = next;
        }
        if removed > 0 {
            trace!(shard = index, removed, "sweep pass removed expired entries");
        }
    }
}
