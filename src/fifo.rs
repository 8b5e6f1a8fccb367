//! First-in, first-out eviction.
//!
//! Keys are evicted in the order they were admitted. Hits and overwrites do
//! not change the order, so a frequently read key is evicted just as early as
//! one that was never read.

use std::fmt;
use std::hash::Hash;

use crate::list::KeyList;
use crate::policy::{EvictionPolicy, RemovalCause};

/// Admission-ordered eviction.
pub struct FifoPolicy<K> {
    queue: KeyList<K>,
}

impl<K: Hash + Eq + Clone> FifoPolicy<K> {
    /// Creates an empty policy sized for `capacity` keys.
    pub fn new(capacity: usize) -> Self {
        FifoPolicy {
            queue: KeyList::with_capacity(capacity),
        }
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns true when no key is tracked.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<K: Hash + Eq + Clone + Send> EvictionPolicy<K> for FifoPolicy<K> {
    fn on_access(&mut self, key: &K) {
        debug_assert!(self.queue.contains(key), "access to untracked key");
    }

    fn on_insert(&mut self, key: &K) {
        debug_assert!(!self.queue.contains(key), "key inserted twice");
        self.queue.push_back(key.clone());
    }

    fn select_victim(&mut self, _incoming: &K) -> Option<K> {
        self.queue.front().cloned()
    }

    fn on_remove(&mut self, key: &K, _cause: RemovalCause) {
        let removed = self.queue.remove(key);
        debug_assert!(removed, "removal of untracked key");
    }
}

impl<K> fmt::Debug for FifoPolicy<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FifoPolicy")
            .field("queue", &self.queue)
            .finish()
    }
}
