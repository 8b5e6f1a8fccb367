//! The cache facade.
//!
//! [`Cache`] combines the entry store and an eviction policy behind a single
//! `parking_lot::Mutex`. Every operation takes the lock, including reads,
//! because a hit updates the policy's bookkeeping (recency position, access
//! count or ARC list). Loads run outside the lock through a per-key
//! [`LoadGroup`], and the `on_added`/`on_evicted` hooks fire after the lock is
//! released so they may call back into the cache.
//!
//! ```text
//!   get(k) ──► lock ──► store.get(k)
//!                         ├─ live     ─► policy.on_access(k) ─► hit
//!                         ├─ expired  ─► remove(k, Expired)  ─► miss ─┐
//!                         └─ absent   ─────────────────────────► miss ─┤
//!                                                                      ▼
//!              unlock ◄──────────────────────────── loader configured? ─► LoadGroup
//!                                                                         (one load per key)
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::callback::Callbacks;
use crate::clock::Clock;
use crate::config::{CacheConfig, Loader, ValueHook};
use crate::entry::CacheEntry;
use crate::error::{CacheError, ConfigError};
use crate::metrics::{CacheMetrics, CacheStats, CacheStatsSnapshot};
use crate::policy::{EvictionKind, EvictionPolicy, RemovalCause};
use crate::singleflight::LoadGroup;
use crate::store::EntryStore;

/// Result of a locked lookup.
enum Lookup<K, V> {
    Hit(V),
    Expired(K, V),
    Miss,
}

/// Entries displaced by an admission, handed back so their callbacks can
/// fire after the lock is released.
struct Admission<K, V> {
    evicted: Option<(K, V)>,
    expired: Option<(K, V)>,
}

/// Everything guarded by the cache lock.
struct CacheState<K, V> {
    store: EntryStore<K, V>,
    policy: Box<dyn EvictionPolicy<K>>,
    capacity: usize,
}

impl<K, V> CacheState<K, V>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Clone,
{
    fn new(capacity: usize, kind: EvictionKind) -> Self {
        CacheState {
            store: EntryStore::with_capacity(capacity),
            policy: kind.build(capacity),
            capacity,
        }
    }

    fn lookup(&mut self, key: &K, now: Instant) -> Lookup<K, V> {
        let expired = match self.store.get(key) {
            Some(entry) => entry.is_expired(now),
            None => return Lookup::Miss,
        };
        if expired {
            return match self.remove(key, RemovalCause::Expired) {
                Some((key, value)) => Lookup::Expired(key, value),
                None => Lookup::Miss,
            };
        }
        self.policy.on_access(key);
        match self.store.get(key) {
            Some(entry) => Lookup::Hit(entry.value.clone()),
            None => Lookup::Miss,
        }
    }

    /// Reads a live value without touching the policy.
    fn peek(&self, key: &K, now: Instant) -> Option<V> {
        self.store
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone())
    }

    fn contains_live(&self, key: &K, now: Instant) -> bool {
        self.store
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    /// Stores `value`, evicting one entry first if a new key meets a full
    /// store.
    ///
    /// Writing over a live entry counts as an access. Writing over an expired
    /// one removes it as expired and admits the key afresh.
    fn admit(
        &mut self,
        key: K,
        value: V,
        now: Instant,
        ttl: Option<Duration>,
    ) -> Admission<K, V> {
        let mut admission = Admission {
            evicted: None,
            expired: None,
        };
        if let Some(entry) = self.store.get_mut(&key) {
            if !entry.is_expired(now) {
                entry.value = value;
                entry.attach_expiry(now, ttl);
                self.policy.on_access(&key);
                return admission;
            }
            admission.expired = self.remove(&key, RemovalCause::Expired);
        }

        if self.store.len() >= self.capacity {
            match self.policy.select_victim(&key) {
                Some(victim) => admission.evicted = self.remove(&victim, RemovalCause::Evicted),
                None => debug_assert!(false, "full store but policy chose no victim"),
            }
        }
        self.store
            .put(key.clone(), CacheEntry::new(key.clone(), value, now, ttl));
        self.policy.on_insert(&key);
        admission
    }

    fn remove(&mut self, key: &K, cause: RemovalCause) -> Option<(K, V)> {
        let entry = self.store.delete(key)?;
        self.policy.on_remove(key, cause);
        Some(entry.into_pair())
    }

    fn drain_expired(&mut self, now: Instant) -> Vec<(K, V)> {
        let expired = self.store.keys(|entry| entry.is_expired(now));
        expired
            .iter()
            .filter_map(|key| self.remove(key, RemovalCause::Expired))
            .collect()
    }

    fn live_entries(&self, now: Instant) -> Vec<(K, V)> {
        let mut live = Vec::with_capacity(self.store.len());
        self.store.for_each(|entry| {
            if !entry.is_expired(now) {
                live.push((entry.key.clone(), entry.value.clone()));
            }
        });
        live
    }

    fn live_len(&self, now: Instant) -> usize {
        let mut count = 0;
        self.store.for_each(|entry| {
            if !entry.is_expired(now) {
                count += 1;
            }
        });
        count
    }
}

/// A thread-safe, bounded key-value cache.
///
/// Build one from a [`CacheConfig`] with [`Cache::init`], then share it
/// between threads with `Arc`.
///
/// ```
/// use polycache::{Cache, CacheConfig, CacheError, EvictionKind};
///
/// let cache: Cache<&str, i32> = Cache::init(CacheConfig::new(2, EvictionKind::Lru)).unwrap();
/// cache.set("a", 1).unwrap();
/// cache.set("b", 2).unwrap();
/// assert_eq!(cache.get(&"a").unwrap(), 1); // "a" is now most recent
/// cache.set("c", 3).unwrap();              // evicts "b"
/// assert!(matches!(cache.get(&"b"), Err(CacheError::KeyNotFound)));
/// assert_eq!(cache.hit_count(), 1);
/// assert_eq!(cache.miss_count(), 1);
/// ```
pub struct Cache<K, V> {
    state: Mutex<CacheState<K, V>>,
    capacity: usize,
    kind: EvictionKind,
    expiration: Option<Duration>,
    loader: Option<Loader<K, V>>,
    serialize: Option<ValueHook<K, V>>,
    deserialize: Option<ValueHook<K, V>>,
    callbacks: Callbacks<K, V>,
    clock: Arc<dyn Clock>,
    loads: LoadGroup<K, V>,
    stats: CacheStats,
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    /// Builds a cache from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroCapacity`] when `config.capacity` is zero.
    pub fn init(config: CacheConfig<K, V>) -> Result<Self, ConfigError> {
        let CacheConfig {
            capacity,
            policy,
            expiration,
            loader,
            callbacks,
            serialize,
            deserialize,
            clock,
        } = config;
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }

        Ok(Cache {
            state: Mutex::new(CacheState::new(capacity, policy)),
            capacity,
            kind: policy,
            expiration,
            loader,
            serialize,
            deserialize,
            callbacks,
            clock,
            loads: LoadGroup::new(),
            stats: CacheStats::new(),
        })
    }

    /// Returns the value for `key`, loading it on a miss if a loader is
    /// configured.
    ///
    /// Concurrent misses on the same key share a single loader call.
    ///
    /// # Errors
    ///
    /// [`CacheError::KeyNotFound`] on a miss without a loader, and
    /// [`CacheError::Load`] when the loader or a value hook fails.
    pub fn get(&self, key: &K) -> Result<V, CacheError> {
        if let Some(value) = self.lookup(key) {
            return self.read_out(key, value);
        }
        match &self.loader {
            Some(loader) => self.load(key, loader),
            None => Err(CacheError::KeyNotFound),
        }
    }

    /// Returns the value for `key` without ever calling the loader.
    ///
    /// Counts as a lookup for hit/miss statistics.
    pub fn get_if_present(&self, key: &K) -> Result<V, CacheError> {
        match self.lookup(key) {
            Some(value) => self.read_out(key, value),
            None => Err(CacheError::KeyNotFound),
        }
    }

    /// Stores `value` under `key` with the default expiration.
    ///
    /// # Errors
    ///
    /// [`CacheError::Load`] when the serialize hook fails; nothing is stored.
    pub fn set(&self, key: K, value: V) -> Result<(), CacheError> {
        self.insert(key, value, self.expiration)
    }

    /// Stores `value` under `key`, expiring `ttl` from now.
    pub fn set_with_expire(&self, key: K, value: V, ttl: Duration) -> Result<(), CacheError> {
        self.insert(key, value, Some(ttl))
    }

    /// Removes `key`. Returns true if an entry was stored.
    ///
    /// No callback fires.
    pub fn remove(&self, key: &K) -> bool {
        self.state
            .lock()
            .remove(key, RemovalCause::Removed)
            .is_some()
    }

    /// Returns true if a live entry exists for `key`.
    ///
    /// Does not count as a lookup, load, or touch the eviction order.
    pub fn has(&self, key: &K) -> bool {
        let now = self.clock.now();
        self.state.lock().contains_live(key, now)
    }

    /// Drops every entry and resets the eviction policy.
    ///
    /// The purge visitor sees each stored entry, including expired entries
    /// not yet removed, while the cache is locked. Like every callback it is
    /// handed the stored value, before any deserialize hook.
    pub fn purge(&self) {
        let mut state = self.state.lock();
        if self.callbacks.has_purge_visit() {
            state
                .store
                .for_each(|entry| self.callbacks.purge_visit(&entry.key, &entry.value));
        }
        state.store.clear();
        state.policy = self.kind.build(self.capacity);
        log::debug!("cache purged");
    }

    /// Keys of every live entry, in no particular order.
    pub fn keys(&self) -> Vec<K> {
        let now = self.clock.now();
        self.state
            .lock()
            .store
            .keys(|entry| !entry.is_expired(now))
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.state.lock().live_len(now)
    }

    /// Returns true when no live entry is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every live entry, passed through the deserialize hook.
    ///
    /// Entries whose value fails to deserialize are left out. Does not count
    /// as lookups.
    pub fn get_all(&self) -> std::collections::HashMap<K, V> {
        let now = self.clock.now();
        let live = self.state.lock().live_entries(now);
        live.into_iter()
            .filter_map(|(key, value)| match self.read_out(&key, value) {
                Ok(value) => Some((key, value)),
                Err(err) => {
                    log::debug!("skipping entry that failed to deserialize: {err}");
                    None
                }
            })
            .collect()
    }

    /// Removes every expired entry, firing `on_evicted` for each.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let expired = self.state.lock().drain_expired(now);
        for (key, value) in &expired {
            self.expired(key, value);
        }
        expired.len()
    }

    /// Number of lookups that found a live entry.
    pub fn hit_count(&self) -> u64 {
        self.stats.hit_count()
    }

    /// Number of lookups that found nothing live.
    pub fn miss_count(&self) -> u64 {
        self.stats.miss_count()
    }

    /// Hits plus misses.
    pub fn lookup_count(&self) -> u64 {
        self.stats.lookup_count()
    }

    /// Hits divided by lookups, or 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        self.stats.hit_rate()
    }

    /// Copies every counter.
    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The configured eviction policy.
    pub fn policy(&self) -> EvictionKind {
        self.kind
    }

    fn lookup(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let outcome = self.state.lock().lookup(key, now);
        match outcome {
            Lookup::Hit(value) => {
                self.stats.record_hit();
                Some(value)
            }
            Lookup::Expired(key, value) => {
                self.stats.record_miss();
                self.expired(&key, &value);
                None
            }
            Lookup::Miss => {
                self.stats.record_miss();
                None
            }
        }
    }

    fn load(&self, key: &K, loader: &Loader<K, V>) -> Result<V, CacheError> {
        self.loads.load_or_join(key, || {
            // A load for this key may have finished between our miss and
            // claiming the slot.
            let resident = self.state.lock().peek(key, self.clock.now());
            if let Some(value) = resident {
                return self.read_out(key, value);
            }

            self.stats.record_load();
            log::debug!("loading missing key");
            let (value, ttl) = loader.load(key).map_err(|err| {
                self.stats.record_load_failure();
                log::debug!("loader failed: {err}");
                CacheError::load(err)
            })?;
            self.insert(key.clone(), value.clone(), ttl.or(self.expiration))?;
            Ok(value)
        })
    }

    fn insert(&self, key: K, value: V, ttl: Option<Duration>) -> Result<(), CacheError> {
        let value = match &self.serialize {
            Some(serialize) => serialize(&key, value).map_err(CacheError::load)?,
            None => value,
        };
        let added = self
            .callbacks
            .has_added()
            .then(|| (key.clone(), value.clone()));

        let now = self.clock.now();
        let admission = self.state.lock().admit(key, value, now, ttl);

        if let Some((key, value)) = admission.expired {
            self.expired(&key, &value);
        }
        if let Some((key, value)) = admission.evicted {
            self.stats.record_eviction();
            log::trace!("evicted an entry to admit a new key");
            self.callbacks.evicted(&key, &value);
        }
        if let Some((key, value)) = added {
            self.callbacks.added(&key, &value);
        }
        Ok(())
    }

    fn read_out(&self, key: &K, value: V) -> Result<V, CacheError> {
        match &self.deserialize {
            Some(deserialize) => deserialize(key, value).map_err(CacheError::load),
            None => Ok(value),
        }
    }

    fn expired(&self, key: &K, value: &V) {
        self.stats.record_expiration();
        log::trace!("dropped an expired entry");
        self.callbacks.evicted(key, value);
    }
}

impl<K, V> CacheMetrics for Cache<K, V>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    fn metrics(&self) -> BTreeMap<String, f64> {
        let mut metrics = self.stats.snapshot().to_btreemap();
        metrics.insert("capacity".to_string(), self.capacity as f64);
        metrics.insert("len".to_string(), self.len() as f64);
        metrics.insert("loads_in_flight".to_string(), self.loads.in_flight() as f64);
        metrics
    }

    fn algorithm_name(&self) -> &'static str {
        self.kind.name()
    }
}

impl<K, V> fmt::Debug for Cache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("capacity", &self.capacity)
            .field("policy", &self.kind)
            .field("store", &self.state.lock().store)
            .field("expiration", &self.expiration)
            .field("callbacks", &self.callbacks)
            .field("clock", &self.clock)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn make_cache(capacity: usize, kind: EvictionKind) -> Cache<u32, String> {
        Cache::init(CacheConfig::new(capacity, kind)).unwrap()
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = Cache::<u32, u32>::init(CacheConfig::new(0, EvictionKind::Lru)).unwrap_err();
        assert_eq!(err, ConfigError::ZeroCapacity);
    }

    #[test]
    fn test_set_get_overwrite() {
        let cache = make_cache(2, EvictionKind::Lru);
        cache.set(1, "one".to_string()).unwrap();
        cache.set(1, "uno".to_string()).unwrap();
        assert_eq!(cache.get(&1).unwrap(), "uno");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.capacity(), 2);
        assert_eq!(cache.policy(), EvictionKind::Lru);
    }

    #[test]
    fn test_capacity_is_never_exceeded() {
        for kind in [
            EvictionKind::Fifo,
            EvictionKind::Lru,
            EvictionKind::Lfu,
            EvictionKind::Arc,
        ] {
            let cache = make_cache(3, kind);
            for i in 0..20 {
                cache.set(i, i.to_string()).unwrap();
                let _ = cache.get(&(i / 2));
                assert!(cache.len() <= 3, "{kind}");
            }
            assert_eq!(cache.stats().evictions, 17, "{kind}");
        }
    }

    #[test]
    fn test_remove_and_has() {
        let cache = make_cache(2, EvictionKind::Fifo);
        cache.set(1, "a".to_string()).unwrap();
        assert!(cache.has(&1));
        assert!(cache.remove(&1));
        assert!(!cache.remove(&1));
        assert!(!cache.has(&1));
        assert_eq!(cache.lookup_count(), 0);
    }

    #[test]
    fn test_lazy_expiration_fires_evicted() {
        let clock = Arc::new(FakeClock::new());
        let evicted = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&evicted);
        let cache: Cache<u32, u32> = Cache::init(
            CacheConfig::new(4, EvictionKind::Arc)
                .with_clock(clock.clone())
                .with_on_evicted(move |_, _| {
                    seen.fetch_add(1, Ordering::SeqCst);
                }),
        )
        .unwrap();

        cache.set_with_expire(1, 10, Duration::from_secs(1)).unwrap();
        clock.advance(Duration::from_secs(2));
        assert!(!cache.has(&1));
        assert!(matches!(cache.get(&1), Err(CacheError::KeyNotFound)));
        assert_eq!(evicted.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().expirations, 1);
        assert_eq!(cache.miss_count(), 1);
    }

    #[test]
    fn test_overwriting_expired_entry_expires_it_first() {
        let clock = Arc::new(FakeClock::new());
        let evicted = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&evicted);
        let cache: Cache<u32, u32> = Cache::init(
            CacheConfig::new(2, EvictionKind::Lru)
                .with_clock(clock.clone())
                .with_on_evicted(move |_, v| {
                    seen.fetch_add(*v as usize, Ordering::SeqCst);
                }),
        )
        .unwrap();

        cache.set_with_expire(1, 10, Duration::from_secs(1)).unwrap();
        clock.advance(Duration::from_secs(2));
        cache.set(1, 20).unwrap();
        assert_eq!(evicted.load(Ordering::SeqCst), 10);
        assert_eq!(cache.stats().expirations, 1);
        assert_eq!(cache.stats().evictions, 0);
        assert_eq!(cache.get(&1).unwrap(), 20);
    }

    #[test]
    fn test_purge_resets_policy() {
        let cache = make_cache(2, EvictionKind::Lfu);
        cache.set(1, "a".to_string()).unwrap();
        cache.set(2, "b".to_string()).unwrap();
        cache.purge();
        assert!(cache.is_empty());
        cache.set(3, "c".to_string()).unwrap();
        cache.set(4, "d".to_string()).unwrap();
        cache.set(5, "e".to_string()).unwrap();
        assert_eq!(cache.len(), 2);
        assert!(!cache.has(&3));
    }

    #[test]
    fn test_metrics_report() {
        let cache = make_cache(4, EvictionKind::Arc);
        cache.set(1, "a".to_string()).unwrap();
        let _ = cache.get(&1);
        let _ = cache.get(&2);
        let metrics = cache.metrics();
        assert_eq!(cache.algorithm_name(), "ARC");
        assert_eq!(metrics.get("cache_hits"), Some(&1.0));
        assert_eq!(metrics.get("cache_misses"), Some(&1.0));
        assert_eq!(metrics.get("capacity"), Some(&4.0));
        assert_eq!(metrics.get("len"), Some(&1.0));
        assert!(format!("{cache:?}").contains("Arc"));
    }
}
