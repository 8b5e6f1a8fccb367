//! Entry store.
//!
//! Plain key → entry mapping. The store knows nothing about eviction order;
//! the cache keeps it and the policy in step under a single lock.

use std::fmt;
use std::hash::Hash;

use crate::entry::CacheEntry;
use crate::HashMap;

/// Owns every live entry of a cache.
pub(crate) struct EntryStore<K, V> {
    map: HashMap<K, CacheEntry<K, V>>,
}

impl<K: Hash + Eq, V> EntryStore<K, V> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        EntryStore {
            map: HashMap::with_capacity(crate::preallocation(capacity)),
        }
    }

    #[inline]
    pub(crate) fn get(&self, key: &K) -> Option<&CacheEntry<K, V>> {
        self.map.get(key)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, key: &K) -> Option<&mut CacheEntry<K, V>> {
        self.map.get_mut(key)
    }

    /// Stores `entry` under `key`, returning the entry it replaced.
    pub(crate) fn put(&mut self, key: K, entry: CacheEntry<K, V>) -> Option<CacheEntry<K, V>> {
        self.map.insert(key, entry)
    }

    pub(crate) fn delete(&mut self, key: &K) -> Option<CacheEntry<K, V>> {
        self.map.remove(key)
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    /// Calls `visitor` once per stored entry, expired or not.
    pub(crate) fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&CacheEntry<K, V>),
    {
        for entry in self.map.values() {
            visitor(entry);
        }
    }

    /// Keys of every stored entry matching `keep`.
    pub(crate) fn keys<F>(&self, mut keep: F) -> Vec<K>
    where
        K: Clone,
        F: FnMut(&CacheEntry<K, V>) -> bool,
    {
        self.map
            .values()
            .filter(|entry| keep(entry))
            .map(|entry| entry.key.clone())
            .collect()
    }

    pub(crate) fn clear(&mut self) {
        self.map.clear();
    }
}

impl<K, V> fmt::Debug for EntryStore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryStore")
            .field("len", &self.map.len())
            .finish()
    }
}
