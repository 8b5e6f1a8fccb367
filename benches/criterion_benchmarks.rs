use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use polycache::{Cache, CacheConfig, EvictionKind};
use std::sync::Arc;
use std::thread;

const ALL_POLICIES: [EvictionKind; 4] = [
    EvictionKind::Fifo,
    EvictionKind::Lru,
    EvictionKind::Lfu,
    EvictionKind::Arc,
];

// Helper to create a cache filled with keys 0..cap
fn make_filled(kind: EvictionKind, cap: usize) -> Cache<usize, usize> {
    let cache = Cache::init(CacheConfig::new(cap, kind)).unwrap();
    for i in 0..cap {
        cache.set(i, i).unwrap();
    }
    cache
}

pub fn criterion_benchmark(c: &mut Criterion) {
    const CACHE_SIZE: usize = 1000;
    let mut group = c.benchmark_group("Cache Operations");

    for kind in ALL_POLICIES {
        let cache = make_filled(kind, CACHE_SIZE);

        group.bench_function(format!("{kind} get hit"), |b| {
            b.iter(|| {
                for i in 0..100 {
                    black_box(cache.get(&(i % CACHE_SIZE)).ok());
                }
            });
        });

        group.bench_function(format!("{kind} get miss"), |b| {
            b.iter(|| {
                for i in 0..100 {
                    black_box(cache.get(&(i + CACHE_SIZE)).ok());
                }
            });
        });

        group.bench_function(format!("{kind} set existing"), |b| {
            b.iter(|| {
                for i in 0..100 {
                    black_box(cache.set(i % CACHE_SIZE, i).ok());
                }
            });
        });

        // Every set past the fill evicts one entry.
        let mut next = CACHE_SIZE;
        group.bench_function(format!("{kind} set evicting"), |b| {
            b.iter(|| {
                for _ in 0..100 {
                    next += 1;
                    black_box(cache.set(next, next).ok());
                }
            });
        });
    }

    group.finish();
}

pub fn loader_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Loading");

    for threads in [1usize, 4] {
        group.bench_with_input(
            BenchmarkId::new("ARC get through loader", threads),
            &threads,
            |b, &threads| {
                b.iter(|| {
                    let cache: Arc<Cache<usize, usize>> = Arc::new(
                        Cache::init(
                            CacheConfig::new(256, EvictionKind::Arc).with_loader(|k: &usize| Ok(k * 2)),
                        )
                        .unwrap(),
                    );
                    let handles: Vec<_> = (0..threads)
                        .map(|t| {
                            let cache = Arc::clone(&cache);
                            thread::spawn(move || {
                                for i in 0..500 {
                                    black_box(cache.get(&((i * (t + 1)) % 1024)).ok());
                                }
                            })
                        })
                        .collect();
                    for handle in handles {
                        handle.join().unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, criterion_benchmark, loader_benchmark);
criterion_main!(benches);
