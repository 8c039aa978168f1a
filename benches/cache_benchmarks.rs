//! Criterion benchmarks for the cache hot paths.

use std::hint::black_box;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};
use shardcache::{Cache, CacheConfig, MB};

const TTL: Duration = Duration::from_secs(300);

fn bench_cache() -> Cache {
    Cache::with_config(CacheConfig {
        max_size: 64 * MB,
        shard_count: 32,
        sweep_interval: Duration::ZERO,
        shard_fn: None,
    })
    .expect("valid config")
}

fn bench_set(c: &mut Criterion) {
    let cache = bench_cache();
    let mut i = 0u64;
    c.bench_function("set", |b| {
        b.iter(|| {
            i = i.wrapping_add(1);
            let key = format!("key-{}", i % 10_000);
            cache.set(black_box(&key), black_box("payload"), TTL).unwrap();
        })
    });
}

fn bench_get_hit(c: &mut Criterion) {
    let cache = bench_cache();
    for i in 0..10_000 {
        cache.set(&format!("key-{i}"), "payload", TTL).unwrap();
    }
    let mut i = 0u64;
    c.bench_function("get_hit", |b| {
        b.iter(|| {
            i = i.wrapping_add(1);
            let key = format!("key-{}", i % 10_000);
            black_box(cache.get(black_box(&key)));
        })
    });
}

fn bench_get_miss(c: &mut Criterion) {
    let cache = bench_cache();
    c.bench_function("get_miss", |b| {
        b.iter(|| {
            black_box(cache.get(black_box("absent-key")));
        })
    });
}

fn bench_mixed_concurrent(c: &mut Criterion) {
    c.bench_function("mixed_concurrent_4_threads", |b| {
        b.iter(|| {
            let cache = Arc::new(bench_cache());
            let mut handles = Vec::new();
            for t in 0..4 {
                let cache = Arc::clone(&cache);
                handles.push(thread::spawn(move || {
                    for i in 0..1_000 {
                        let key = format!("key-{}", (t * 1_000 + i) % 500);
                        if i % 2 == 0 {
                            cache.set(&key, "payload", TTL).unwrap();
                        } else {
                            black_box(cache.get(&key));
                        }
                    }
                }));
            }
            for handle in handles {
                handle.join().unwrap();
            }
        })
    });
}

criterion_group!(
    benches,
    bench_set,
    bench_get_hit,
    bench_get_miss,
    bench_mixed_concurrent
);
criterion_main!(benches);
