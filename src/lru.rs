//! Least Recently Used (LRU) eviction.
//!
//! Keys are kept in a single list ordered from most to least recently used.
//! A hit or overwrite moves the key to the front, admission pushes it to the
//! front, and the victim is always the key at the back.
//!
//! ```text
//!   front (MRU)                         back (LRU)
//!   ┌───┐   ┌───┐   ┌───┐   ┌───┐   ┌───┐
//!   │ E │◄─►│ D │◄─►│ C │◄─►│ B │◄─►│ A │ ──► victim
//!   └───┘   └───┘   └───┘   └───┘   └───┘
//!
//!   get(C):  C moves to the front
//!   ┌───┐   ┌───┐   ┌───┐   ┌───┐   ┌───┐
//!   │ C │◄─►│ E │◄─►│ D │◄─►│ B │◄─►│ A │
//!   └───┘   └───┘   └───┘   └───┘   └───┘
//! ```
//!
//! Every operation is O(1). LRU suits workloads with temporal locality but
//! is vulnerable to scans: one pass over cold keys flushes the hot set.

use std::fmt;
use std::hash::Hash;

use crate::list::KeyList;
use crate::policy::{EvictionPolicy, RemovalCause};

/// Recency-ordered eviction.
pub struct LruPolicy<K> {
    recency: KeyList<K>,
}

impl<K: Hash + Eq + Clone> LruPolicy<K> {
    /// Creates an empty policy sized for `capacity` keys.
    pub fn new(capacity: usize) -> Self {
        LruPolicy {
            recency: KeyList::with_capacity(capacity),
        }
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.recency.len()
    }

    /// Returns true when no key is tracked.
    pub fn is_empty(&self) -> bool {
        self.recency.is_empty()
    }

    /// Keys from most to least recently used.
    pub fn keys_by_recency(&self) -> Vec<K> {
        self.recency.iter().cloned().collect()
    }
}

impl<K: Hash + Eq + Clone + Send> EvictionPolicy<K> for LruPolicy<K> {
    fn on_access(&mut self, key: &K) {
        let found = self.recency.move_to_front(key);
        debug_assert!(found, "access to untracked key");
    }

    fn on_insert(&mut self, key: &K) {
        debug_assert!(!self.recency.contains(key), "key inserted twice");
        self.recency.push_front(key.clone());
    }

    fn select_victim(&mut self, _incoming: &K) -> Option<K> {
        self.recency.back().cloned()
    }

    fn on_remove(&mut self, key: &K, _cause: RemovalCause) {
        let removed = self.recency.remove(key);
        debug_assert!(removed, "removal of untracked key");
    }
}

impl<K> fmt::Debug for LruPolicy<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruPolicy")
            .field("recency", &self.recency)
            .finish()
    }
}
