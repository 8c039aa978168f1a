//! End-to-end correctness tests for the cache through its public surface.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use shardcache::{Cache, CacheConfig, ConfigError, MB};

const TTL: Duration = Duration::from_secs(30);

fn small_cache(max_size: u64, shard_count: usize) -> Cache {
    Cache::with_config(CacheConfig {
        max_size,
        shard_count,
        sweep_interval: Duration::ZERO,
        shard_fn: None,
    })
    .expect("valid config")
}

#[test]
fn test_set_get_purge_round_trip() {
    let cache = Cache::new(16 * MB).unwrap();

    cache.set("alpha", "one", TTL).unwrap();
    cache.set("beta", "two", TTL).unwrap();

    assert_eq!(cache.get("alpha").as_deref(), Some("one"));
    assert_eq!(cache.get("beta").as_deref(), Some("two"));
    assert_eq!(cache.get("gamma"), None);

    assert!(cache.purge("alpha"));
    assert!(!cache.purge("alpha"));
    assert_eq!(cache.get("alpha"), None);

    assert!(cache.verify().is_empty());
}

#[test]
fn test_update_replaces_payload() {
    let cache = small_cache(MB, 4);
    cache.set("k", "first", TTL).unwrap();
    cache.set("k", "second", TTL).unwrap();
    assert_eq!(cache.get("k").as_deref(), Some("second"));
    assert_eq!(cache.object_count(), 1);
    assert!(cache.verify().is_empty());
}

#[test]
fn test_oversize_set_is_rejected_and_counted() {
    // one shard, tiny budget
    let cache = small_cache(200, 1);
    let payload = "x".repeat(500);

    let err = cache.set("big", &payload, TTL).unwrap_err();
    assert!(err.size > err.max_size);

    // the set was still counted, nothing was stored
    assert_eq!(cache.set_count(), 1);
    assert_eq!(cache.object_count(), 0);
    assert_eq!(cache.current_size(), 0);
    assert!(cache.verify().is_empty());
}

#[test]
fn test_eviction_under_pressure() {
    let per_entry = shardcache::entry_size("key-00", "xxxxxxxx");
    let cache = small_cache(8 * per_entry, 1);

    for i in 0..20 {
        cache.set(&format!("key-{i:02}"), "xxxxxxxx", TTL).unwrap();
    }

    assert_eq!(cache.object_count(), 8);
    assert_eq!(cache.eviction_count(), 12);
    assert!(cache.current_size() <= cache.max_size());

    // the most recent keys survived
    for i in 12..20 {
        assert!(cache.get(&format!("key-{i:02}")).is_some());
    }
    assert!(cache.verify().is_empty());
}

#[test]
fn test_lazy_expiry_without_sweeper() {
    let cache = small_cache(MB, 2);
    cache.set("short", "v", Duration::from_millis(50)).unwrap();
    cache.set("long", "v", TTL).unwrap();

    thread::sleep(Duration::from_millis(120));

    // no sweeper: the expired entry is still resident...
    assert_eq!(cache.object_count(), 2);
    // ...until an access discovers it
    assert_eq!(cache.get("short"), None);
    assert_eq!(cache.object_count(), 1);
    assert_eq!(cache.get("long").as_deref(), Some("v"));
    assert!(cache.verify().is_empty());
}

#[test]
fn test_background_sweep_reclaims_expired() {
    let cache = Cache::with_config(CacheConfig {
        max_size: MB,
        shard_count: 4,
        sweep_interval: Duration::from_millis(200),
        shard_fn: None,
    })
    .unwrap();

    for i in 0..40 {
        cache
            .set(&format!("ephemeral-{i}"), "v", Duration::from_millis(50))
            .unwrap();
    }
    cache.set("durable", "v", TTL).unwrap();

    // several sweep passes worth of waiting; the expired entries must go
    // away without any foreground access
    thread::sleep(Duration::from_millis(800));

    assert_eq!(cache.object_count(), 1);
    assert_eq!(
        cache.current_size(),
        shardcache::entry_size("durable", "v")
    );
    assert!(cache.verify().is_empty());
}

#[test]
fn test_counters_and_hit_rate() {
    let cache = small_cache(MB, 1);
    assert_eq!(cache.hit_rate(), 0.0);
    assert_eq!(cache.request_count(), 0);

    cache.set("a", "1", TTL).unwrap();
    assert!(cache.get("a").is_some());
    assert!(cache.get("a").is_some());
    assert!(cache.get("nope").is_none());
    assert!(cache.get("nada").is_none());

    assert_eq!(cache.set_count(), 1);
    assert_eq!(cache.request_count(), 4);
    assert_eq!(cache.get_count(), 2);
    assert_eq!(cache.hit_rate(), 0.5);

    let stats = cache.stats();
    assert_eq!(stats.requests, 4);
    assert_eq!(stats.gets, 2);
    assert_eq!(stats.object_count, 1);
}

#[test]
fn test_custom_shard_fn_trailing_char() {
    // route by the key's last byte, a workload-specific locality scheme
    let cache = Cache::with_config(CacheConfig {
        max_size: MB,
        shard_count: 8,
        sweep_interval: Duration::ZERO,
        shard_fn: Some(Arc::new(|key: &str| {
            u64::from(key.as_bytes().last().copied().unwrap_or(0))
        })),
    })
    .unwrap();

    for i in 0..50 {
        cache.set(&format!("user:{i}"), "profile", TTL).unwrap();
    }
    for i in 0..50 {
        assert_eq!(cache.get(&format!("user:{i}")).as_deref(), Some("profile"));
    }
    assert!(cache.verify().is_empty());
}

#[test]
fn test_config_errors() {
    assert_eq!(Cache::new(0).unwrap_err(), ConfigError::ZeroMaxSize);

    let err = Cache::with_config(CacheConfig {
        max_size: MB,
        shard_count: 0,
        sweep_interval: Duration::ZERO,
        shard_fn: None,
    })
    .unwrap_err();
    assert_eq!(err, ConfigError::ZeroShardCount);

    let err = Cache::with_config(CacheConfig {
        max_size: MB,
        shard_count: 4,
        sweep_interval: Duration::from_millis(10),
        shard_fn: None,
    })
    .unwrap_err();
    assert_eq!(
        err,
        ConfigError::SweepIntervalTooShort(Duration::from_millis(10))
    );
}

#[test]
fn test_shared_across_threads() {
    let cache = Arc::new(Cache::new(16 * MB).unwrap());
    let writer = Arc::clone(&cache);

    let handle = thread::spawn(move || {
        for i in 0..100 {
            writer.set(&format!("t-{i}"), "v", TTL).unwrap();
        }
    });
    handle.join().unwrap();

    assert_eq!(cache.object_count(), 100);
    assert!(cache.verify().is_empty());
}
