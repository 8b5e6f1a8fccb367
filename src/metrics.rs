//! Cache Metrics System
//!
//! Every cache keeps a set of lock-free counters: lookups split into hits and
//! misses, plus evictions, expirations, loader runs and loader failures.
//! Counters are updated with relaxed atomics outside the cache lock, so a
//! [`CacheStatsSnapshot`] taken while other threads are working is a
//! consistent view of each counter but not necessarily of all of them at once.
//!
//! # Why BTreeMap over HashMap?
//!
//! [`CacheMetrics::metrics`] reports through a `BTreeMap` so that metric keys
//! always come out in the same order. Reports can then be diffed between runs
//! and compared across eviction policies without sorting first.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared by every operation on a cache.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
    loads: AtomicU64,
    load_failures: AtomicU64,
}

impl CacheStats {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a lookup that found a live entry.
    #[inline]
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a lookup that found nothing, or only an expired entry.
    #[inline]
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an entry evicted to make room for another.
    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an entry dropped because its deadline passed.
    pub fn record_expiration(&self) {
        self.expirations.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a loader invocation.
    pub fn record_load(&self) {
        self.loads.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a loader invocation that returned an error.
    pub fn record_load_failure(&self) {
        self.load_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of hits.
    pub fn hit_count(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of misses.
    pub fn miss_count(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Hits plus misses.
    pub fn lookup_count(&self) -> u64 {
        self.hit_count() + self.miss_count()
    }

    /// Hits divided by lookups, or 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        self.snapshot().hit_rate()
    }

    /// Copies every counter.
    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            load_failures: self.load_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`CacheStats`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStatsSnapshot {
    /// Lookups that found a live entry.
    pub hits: u64,
    /// Lookups that found nothing live.
    pub misses: u64,
    /// Entries evicted for capacity.
    pub evictions: u64,
    /// Entries dropped after their deadline, lazily or by a sweep.
    pub expirations: u64,
    /// Loader invocations.
    pub loads: u64,
    /// Loader invocations that failed.
    pub load_failures: u64,
}

impl CacheStatsSnapshot {
    /// Hits plus misses.
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Hits divided by lookups, or 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.lookups();
        if lookups > 0 {
            self.hits as f64 / lookups as f64
        } else {
            0.0
        }
    }

    /// Misses divided by lookups, or 0.0 before the first lookup.
    pub fn miss_rate(&self) -> f64 {
        let lookups = self.lookups();
        if lookups > 0 {
            self.misses as f64 / lookups as f64
        } else {
            0.0
        }
    }

    /// Convert the snapshot to a BTreeMap for reporting
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();

        // Counters
        metrics.insert("cache_hits".to_string(), self.hits as f64);
        metrics.insert("cache_misses".to_string(), self.misses as f64);
        metrics.insert("requests".to_string(), self.lookups() as f64);
        metrics.insert("evictions".to_string(), self.evictions as f64);
        metrics.insert("expirations".to_string(), self.expirations as f64);
        metrics.insert("loads".to_string(), self.loads as f64);
        metrics.insert("load_failures".to_string(), self.load_failures as f64);

        // Rates (0.0 to 1.0)
        metrics.insert("hit_rate".to_string(), self.hit_rate());
        metrics.insert("miss_rate".to_string(), self.miss_rate());

        if self.lookups() > 0 {
            metrics.insert(
                "eviction_rate".to_string(),
                self.evictions as f64 / self.lookups() as f64,
            );
        }

        metrics
    }
}

/// Trait that all caches implement for metrics reporting
///
/// The trait uses BTreeMap to ensure deterministic ordering of metrics, which is
/// essential for reproducible benchmarks and consistent test results.
pub trait CacheMetrics {
    /// Returns all metrics as key-value pairs in deterministic order
    fn metrics(&self) -> BTreeMap<String, f64>;

    /// Algorithm name for identification
    ///
    /// # Returns
    /// A static string identifying the eviction policy (e.g., "FIFO", "LRU", "ARC")
    fn algorithm_name(&self) -> &'static str;
}
