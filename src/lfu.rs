//! Least Frequently Used (LFU) eviction.
//!
//! Each key carries an access count. Keys are grouped into buckets by count,
//! and within a bucket they are ordered by arrival, where arrival means
//! admission or promotion into that bucket. The victim is the oldest arrival
//! of the lowest non-empty bucket.
//!
//! ```text
//!   frequencies: { A: 3, B: 1, C: 1, D: 2 }
//!
//!   buckets (BTreeMap<u64, KeyList>)
//!   1 ─► [ B, C ]     oldest ─► newest   ◄── min_frequency, victim = B
//!   2 ─► [ D ]
//!   3 ─► [ A ]
//! ```
//!
//! A hit moves the key from bucket `f` to the back of bucket `f + 1`; an empty
//! bucket is dropped immediately so the lowest key of the map is always a
//! populated bucket. `min_frequency` caches that lowest key.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;

use crate::list::KeyList;
use crate::policy::{EvictionPolicy, RemovalCause};
use crate::HashMap;

/// Frequency-ordered eviction.
pub struct LfuPolicy<K> {
    frequencies: HashMap<K, u64>,
    buckets: BTreeMap<u64, KeyList<K>>,
    min_frequency: u64,
}

impl<K: Hash + Eq + Clone> LfuPolicy<K> {
    /// Creates an empty policy sized for `capacity` keys.
    pub fn new(capacity: usize) -> Self {
        LfuPolicy {
            frequencies: HashMap::with_capacity(crate::preallocation(capacity)),
            buckets: BTreeMap::new(),
            min_frequency: 1,
        }
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// Returns true when no key is tracked.
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Access count of `key`, starting at 1 on admission.
    pub fn frequency(&self, key: &K) -> Option<u64> {
        self.frequencies.get(key).copied()
    }

    /// Lowest access count among tracked keys.
    pub fn min_frequency(&self) -> Option<u64> {
        if self.is_empty() {
            None
        } else {
            Some(self.min_frequency)
        }
    }

    fn detach(&mut self, key: &K, frequency: u64) {
        if let Some(bucket) = self.buckets.get_mut(&frequency) {
            bucket.remove(key);
            if bucket.is_empty() {
                self.buckets.remove(&frequency);
            }
        }
    }

    fn refresh_min_frequency(&mut self) {
        self.min_frequency = self.buckets.keys().next().copied().unwrap_or(1);
    }

    /// Panics if buckets and frequencies disagree.
    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        let bucketed: usize = self.buckets.values().map(KeyList::len).sum();
        assert_eq!(bucketed, self.frequencies.len(), "bucket sizes");
        for (frequency, bucket) in &self.buckets {
            assert!(!bucket.is_empty(), "empty bucket {frequency} kept");
            for key in bucket.iter() {
                assert_eq!(self.frequencies.get(key), Some(frequency));
            }
        }
        if let Some(lowest) = self.buckets.keys().next() {
            assert_eq!(*lowest, self.min_frequency, "stale min_frequency");
        }
    }
}

impl<K: Hash + Eq + Clone + Send> EvictionPolicy<K> for LfuPolicy<K> {
    fn on_access(&mut self, key: &K) {
        let Some(frequency) = self.frequencies.get_mut(key) else {
            debug_assert!(false, "access to untracked key");
            return;
        };
        let old = *frequency;
        let new = old.saturating_add(1);
        if new == old {
            return;
        }
        *frequency = new;

        self.detach(key, old);
        self.buckets.entry(new).or_default().push_back(key.clone());
        if old == self.min_frequency && !self.buckets.contains_key(&old) {
            self.min_frequency = new;
        }
    }

    fn on_insert(&mut self, key: &K) {
        if self.frequencies.contains_key(key) {
            debug_assert!(false, "key inserted twice");
            return;
        }
        self.frequencies.insert(key.clone(), 1);
        self.buckets.entry(1).or_default().push_back(key.clone());
        self.min_frequency = 1;
    }

    fn select_victim(&mut self, _incoming: &K) -> Option<K> {
        match self.buckets.get(&self.min_frequency) {
            Some(bucket) => bucket.front().cloned(),
            None => self
                .buckets
                .values()
                .next()
                .and_then(|bucket| bucket.front().cloned()),
        }
    }

    fn on_remove(&mut self, key: &K, _cause: RemovalCause) {
        let Some(frequency) = self.frequencies.remove(key) else {
            debug_assert!(false, "removal of untracked key");
            return;
        };
        self.detach(key, frequency);
        if frequency == self.min_frequency && !self.buckets.contains_key(&frequency) {
            self.refresh_min_frequency();
        }
    }
}

impl<K> fmt::Debug for LfuPolicy<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LfuPolicy")
            .field("len", &self.frequencies.len())
            .field("buckets", &self.buckets.len())
            .field("min_frequency", &self.min_frequency)
            .finish()
    }
}
