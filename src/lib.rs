#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! # Code Reference
//!
//! ## Policy Selection Guide
//!
//! | Policy | Evicts | Best Use Case |
//! |--------|--------|---------------|
//! | [`EvictionKind::Fifo`] | Oldest admission | Write-once data, predictable turnover |
//! | [`EvictionKind::Lru`] | Least recently used | General purpose, temporal locality |
//! | [`EvictionKind::Lfu`] | Least frequently used | Stable popularity patterns |
//! | [`EvictionKind::Arc`] | Adaptively T1 or T2 | Mixed recency/frequency, scan-heavy |
//!
//! ## Performance Characteristics
//!
//! | Policy | Get | Set | Remove | Extra state |
//! |--------|-----|-----|--------|-------------|
//! | FIFO   | O(1)| O(1)| O(1)   | one key list |
//! | LRU    | O(1)| O(1)| O(1)   | one key list |
//! | LFU    | O(log F)| O(log F)| O(log F) | frequency map + buckets (F = distinct counts) |
//! | ARC    | O(1)| O(1)| O(1)   | four key lists, ghosts up to `capacity` |
//!
//! ## Loading on a Miss
//!
//! ```rust
//! use polycache::{Cache, CacheConfig, EvictionKind};
//! use std::time::Duration;
//!
//! let cache: Cache<String, usize> = Cache::init(
//!     CacheConfig::new(100, EvictionKind::Lfu)
//!         .with_loader_expire(|key: &String| Ok((key.len(), Some(Duration::from_secs(60))))),
//! )
//! .unwrap();
//!
//! assert_eq!(cache.get(&"hello".to_string()).unwrap(), 5);
//! assert!(cache.has(&"hello".to_string()));
//! assert_eq!(cache.stats().loads, 1);
//! ```
//!
//! ## Thread Safety
//!
//! `Cache<K, V>` is `Send + Sync`. Share it with `Arc`:
//!
//! ```rust
//! use polycache::{Cache, CacheConfig, EvictionKind};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let cache: Arc<Cache<u32, u32>> =
//!     Arc::new(Cache::init(CacheConfig::new(1_000, EvictionKind::Arc)).unwrap());
//!
//! let handles: Vec<_> = (0..4)
//!     .map(|t| {
//!         let cache = Arc::clone(&cache);
//!         thread::spawn(move || {
//!             for i in 0..100 {
//!                 cache.set(t * 100 + i, i).unwrap();
//!             }
//!         })
//!     })
//!     .collect();
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! assert_eq!(cache.len(), 400);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `hashbrown` | ✓ | Use hashbrown for internal maps |
//! | `nightly` | | Enable nightly-only hashbrown optimizations |

#[cfg(feature = "hashbrown")]
pub(crate) use hashbrown::HashMap;
#[cfg(not(feature = "hashbrown"))]
pub(crate) use std::collections::HashMap;

/// Upper bound on storage reserved up front for a cache of `capacity` entries.
pub(crate) fn preallocation(capacity: usize) -> usize {
    capacity.min(4096)
}

/// Doubly linked key list backing every eviction policy.
///
/// **Note**: This module is internal infrastructure and should not be used directly
/// by library consumers.
pub(crate) mod list;

/// Key → entry storage.
pub(crate) mod store;

/// Cache entry type with creation time and optional deadline.
pub mod entry;

/// Time sources used for expiration.
pub mod clock;

/// Deadlines and the background expiration sweeper.
pub mod expiry;

/// Error types.
pub mod error;

/// Cache configuration.
pub mod config;

/// The `EvictionPolicy` trait and the `EvictionKind` selector.
pub mod policy;

/// First-in, first-out eviction.
pub mod fifo;

/// Least Recently Used (LRU) eviction.
///
/// Evicts the key that has gone longest without a hit.
pub mod lru;

/// Least Frequently Used (LFU) eviction.
///
/// Evicts the key with the fewest hits, breaking ties by oldest arrival.
pub mod lfu;

/// Adaptive Replacement Cache (ARC) eviction.
///
/// Balances a recency list against a frequency list, steering their relative
/// sizes with the history kept in two ghost lists.
pub mod arc;

/// Lifecycle callbacks.
pub mod callback;

/// Per-key load deduplication.
pub(crate) mod singleflight;

/// Cache metrics system.
///
/// Lock-free counters and a deterministic `BTreeMap` report.
pub mod metrics;

/// The thread-safe cache facade.
pub mod cache;

pub use arc::ArcPolicy;
pub use cache::Cache;
pub use callback::EntryHook;
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{CacheConfig, ExpiringLoaderFn, LoaderFn, ValueHook};
pub use entry::CacheEntry;
pub use error::{BoxError, CacheError, ConfigError};
pub use expiry::Sweeper;
pub use fifo::FifoPolicy;
pub use lfu::LfuPolicy;
pub use lru::LruPolicy;
pub use metrics::{CacheMetrics, CacheStats, CacheStatsSnapshot};
pub use policy::{EvictionKind, EvictionPolicy, RemovalCause, UnknownPolicy};
