//! A tour of the cache: the four policies, expiration, loading and callbacks.
//!
//! Run with `cargo run --example basic_usage`.

use polycache::{Cache, CacheConfig, CacheError, EvictionKind, FakeClock};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn simple_usage() {
    let cache: Cache<&str, &str> = Cache::init(CacheConfig::new(20, EvictionKind::Lru)).unwrap();
    cache.set("key", "ok").unwrap();
    match cache.get(&"key") {
        Ok(value) => println!("get: {value}"),
        Err(err) => println!("{err}"),
    }
    println!("hits: {}", cache.hit_count());
}

fn policies() {
    for name in ["simple", "lru", "lfu", "arc"] {
        let kind: EvictionKind = name.parse().unwrap();
        let cache: Cache<u32, u32> = Cache::init(CacheConfig::new(3, kind)).unwrap();
        for key in 1..=3 {
            cache.set(key, key * 10).unwrap();
        }
        let _ = cache.get(&1);
        let _ = cache.get(&1);
        let _ = cache.get(&2);
        cache.set(4, 40).unwrap();

        let mut keys = cache.keys();
        keys.sort_unstable();
        println!("{kind:<4} keeps {keys:?}");
    }
}

fn expiration() {
    let clock = Arc::new(FakeClock::new());
    let cache: Cache<&str, &str> = Cache::init(
        CacheConfig::new(20, EvictionKind::Lru)
            .with_expiration(Duration::from_secs(4))
            .with_clock(clock.clone()),
    )
    .unwrap();

    cache.set("timeout_key", "timeout ok").unwrap();
    cache
        .set_with_expire("short_key", "short ok", Duration::from_secs(1))
        .unwrap();
    println!("before expiry: {:?}", cache.get(&"timeout_key"));

    clock.advance(Duration::from_secs(5));
    match cache.get(&"timeout_key") {
        Err(CacheError::KeyNotFound) => println!("after expiry: key not found"),
        other => println!("after expiry: {other:?}"),
    }
    println!("expired so far: {}", cache.stats().expirations);
}

fn loading_with_callbacks() {
    let clock = Arc::new(FakeClock::new());
    let loaded = Arc::new(AtomicUsize::new(0));
    let evicted = Arc::new(AtomicUsize::new(0));
    let purged = Arc::new(AtomicUsize::new(0));

    let cache: Cache<String, String> = {
        let loaded = Arc::clone(&loaded);
        let evicted = Arc::clone(&evicted);
        let purged = Arc::clone(&purged);
        Cache::init(
            CacheConfig::new(20, EvictionKind::Lru)
                .with_clock(clock.clone())
                .with_loader_expire(move |key: &String| {
                    loaded.fetch_add(1, Ordering::SeqCst);
                    Ok((format!("loaded {key}"), Some(Duration::from_secs(1))))
                })
                .with_on_evicted(move |key: &String, _: &String| {
                    evicted.fetch_add(1, Ordering::SeqCst);
                    println!("evicted key: {key}");
                })
                .with_on_purge_visit(move |key: &String, _: &String| {
                    purged.fetch_add(1, Ordering::SeqCst);
                    println!("purged key: {key}");
                }),
        )
        .unwrap()
    };

    let key = "key".to_string();
    println!("get: {:?}", cache.get(&key));
    clock.advance(Duration::from_secs(2));
    println!("get: {:?}", cache.get(&key));
    cache.purge();

    let (loaded, evicted, purged) = (
        loaded.load(Ordering::SeqCst),
        evicted.load(Ordering::SeqCst),
        purged.load(Ordering::SeqCst),
    );
    println!("loaded {loaded}, evicted {evicted}, purged {purged}");
    assert_eq!(loaded, evicted + purged);
}

fn main() {
    simple_usage();
    policies();
    expiration();
    loading_with_callbacks();
}
