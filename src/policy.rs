//! Eviction policy interface.
//!
//! A policy only tracks keys; values stay in the entry store. The cache calls
//! into the policy on every hit, admission and removal, and asks it for a
//! victim when a new key arrives at a full store.
//!
//! ```text
//!   get hit ──────────────► on_access(k)
//!   set existing key ─────► on_access(k)
//!   set new key, full ────► select_victim(k) ─► on_remove(victim, Evicted)
//!                           ─► on_insert(k)
//!   expired / remove ─────► on_remove(k, Expired | Removed)
//! ```
//!
//! Calling any hook with a key the policy does not track is a caller bug. It
//! trips a `debug_assert!` in debug builds and is ignored otherwise.

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use thiserror::Error;

use crate::arc::ArcPolicy;
use crate::fifo::FifoPolicy;
use crate::lfu::LfuPolicy;
use crate::lru::LruPolicy;

/// Why an entry left the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemovalCause {
    /// Chosen as victim to make room for a new key.
    Evicted,
    /// Its deadline passed.
    Expired,
    /// Removed explicitly by the application.
    Removed,
}

/// Bookkeeping for an eviction strategy.
pub trait EvictionPolicy<K>: Send {
    /// Records a hit on `key`, or an overwrite of its value.
    fn on_access(&mut self, key: &K);

    /// Starts tracking `key`, which has just been stored.
    fn on_insert(&mut self, key: &K);

    /// Picks the key to evict so that `incoming` can be admitted.
    ///
    /// The victim stays tracked until [`on_remove`](Self::on_remove) is
    /// called for it. Returns `None` only when nothing is tracked.
    fn select_victim(&mut self, incoming: &K) -> Option<K>;

    /// Stops tracking `key`.
    fn on_remove(&mut self, key: &K, cause: RemovalCause);
}

/// The eviction strategies a cache can be built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EvictionKind {
    /// First in, first out. Reads do not affect eviction order.
    Fifo,
    /// Least recently used.
    #[default]
    Lru,
    /// Least frequently used, oldest arrival first among equals.
    Lfu,
    /// Adaptive replacement between recency and frequency.
    Arc,
}

impl EvictionKind {
    /// Builds an empty policy of this kind for a cache of `capacity` entries.
    pub fn build<K>(self, capacity: usize) -> Box<dyn EvictionPolicy<K>>
    where
        K: Hash + Eq + Clone + Send + 'static,
    {
        match self {
            EvictionKind::Fifo => Box::new(FifoPolicy::new(capacity)),
            EvictionKind::Lru => Box::new(LruPolicy::new(capacity)),
            EvictionKind::Lfu => Box::new(LfuPolicy::new(capacity)),
            EvictionKind::Arc => Box::new(ArcPolicy::new(capacity)),
        }
    }

    /// Upper-case name used in metrics reports.
    pub fn name(self) -> &'static str {
        match self {
            EvictionKind::Fifo => "FIFO",
            EvictionKind::Lru => "LRU",
            EvictionKind::Lfu => "LFU",
            EvictionKind::Arc => "ARC",
        }
    }
}

impl fmt::Display for EvictionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when parsing an unknown policy name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown eviction policy `{0}`")]
pub struct UnknownPolicy(String);

impl FromStr for EvictionKind {
    type Err = UnknownPolicy;

    /// Parses a case-insensitive policy name. `simple` is accepted for FIFO.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fifo" | "simple" => Ok(EvictionKind::Fifo),
            "lru" => Ok(EvictionKind::Lru),
            "lfu" => Ok(EvictionKind::Lfu),
            "arc" => Ok(EvictionKind::Arc),
            _ => Err(UnknownPolicy(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("LRU".parse::<EvictionKind>(), Ok(EvictionKind::Lru));
        assert_eq!("simple".parse::<EvictionKind>(), Ok(EvictionKind::Fifo));
        assert_eq!("Arc".parse::<EvictionKind>(), Ok(EvictionKind::Arc));
        assert_eq!("lfu".parse::<EvictionKind>(), Ok(EvictionKind::Lfu));
        let err = "mru".parse::<EvictionKind>().unwrap_err();
        assert_eq!(err.to_string(), "unknown eviction policy `mru`");
        let boxed: crate::error::BoxError = Box::new(err);
        assert_eq!(boxed.to_string(), "unknown eviction policy `mru`");
    }

    #[test]
    fn test_display_matches_name() {
        for kind in [
            EvictionKind::Fifo,
            EvictionKind::Lru,
            EvictionKind::Lfu,
            EvictionKind::Arc,
        ] {
            assert_eq!(kind.to_string(), kind.name());
        }
        assert_eq!(EvictionKind::default(), EvictionKind::Lru);
    }

    #[test]
    fn test_built_policies_evict() {
        for kind in [
            EvictionKind::Fifo,
            EvictionKind::Lru,
            EvictionKind::Lfu,
            EvictionKind::Arc,
        ] {
            let mut policy = kind.build::<u32>(2);
            assert_eq!(policy.select_victim(&9), None, "{kind}");
            policy.on_insert(&1);
            policy.on_insert(&2);
            assert_eq!(policy.select_victim(&3), Some(1), "{kind}");
            policy.on_remove(&1, RemovalCause::Evicted);
            policy.on_insert(&3);
            assert_eq!(policy.select_victim(&4), Some(2), "{kind}");
        }
    }
}
