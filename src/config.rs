//! Cache Configuration Module
//!
//! A cache is described by one [`CacheConfig`]: the entry capacity and
//! eviction policy as public fields, plus optional behaviour attached through
//! chained `with_*` setters. Validation happens once, in
//! [`Cache::init`](crate::Cache::init).
//!
//! # Optional behaviour
//!
//! | Setter | Effect |
//! |--------|--------|
//! | `with_expiration` | Default TTL applied by `set` and by loads |
//! | `with_loader` | Populates misses on `get` |
//! | `with_loader_expire` | Loader that also picks the entry's TTL |
//! | `with_on_added` | Called after an entry is stored |
//! | `with_on_evicted` | Called after an entry is evicted or expires |
//! | `with_on_purge_visit` | Called for every entry dropped by `purge` |
//! | `with_serialize` | Transforms values before they are stored |
//! | `with_deserialize` | Transforms stored values on the way out |
//! | `with_clock` | Replaces the time source |
//!
//! Setting `with_loader` and `with_loader_expire` both keeps whichever came last.
//!
//! # Examples
//!
//! ```
//! use polycache::{Cache, CacheConfig, EvictionKind};
//! use std::time::Duration;
//!
//! let config = CacheConfig::new(1_000, EvictionKind::Arc)
//!     .with_expiration(Duration::from_secs(30))
//!     .with_loader(|key: &u64| Ok(key * 2));
//! let cache: Cache<u64, u64> = Cache::init(config).unwrap();
//! assert_eq!(cache.get(&21).unwrap(), 42);
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::callback::{Callbacks, EntryHook};
use crate::clock::{Clock, SystemClock};
use crate::error::BoxError;
use crate::policy::EvictionKind;

/// Loads the value for a missing key.
pub type LoaderFn<K, V> = Arc<dyn Fn(&K) -> Result<V, BoxError> + Send + Sync>;

/// Loads the value for a missing key together with its TTL. A `None` TTL
/// falls back to the cache's default expiration.
pub type ExpiringLoaderFn<K, V> =
    Arc<dyn Fn(&K) -> Result<(V, Option<Duration>), BoxError> + Send + Sync>;

/// Transforms a value on its way into or out of the store.
pub type ValueHook<K, V> = Arc<dyn Fn(&K, V) -> Result<V, BoxError> + Send + Sync>;

pub(crate) enum Loader<K, V> {
    Plain(LoaderFn<K, V>),
    Expiring(ExpiringLoaderFn<K, V>),
}

impl<K, V> Loader<K, V> {
    pub(crate) fn load(&self, key: &K) -> Result<(V, Option<Duration>), BoxError> {
        match self {
            Loader::Plain(load) => load(key).map(|value| (value, None)),
            Loader::Expiring(load) => load(key),
        }
    }
}

/// Configuration for a [`Cache`](crate::Cache).
///
/// # Fields
///
/// - `capacity`: Maximum number of entries. Must be greater than zero.
/// - `policy`: Which entries are evicted when the cache is full.
/// - `expiration`: Default time-to-live; `None` means entries never expire
///   unless written with `set_with_expire`.
pub struct CacheConfig<K, V> {
    /// Maximum number of entries the cache holds.
    pub capacity: usize,
    /// Eviction strategy.
    pub policy: EvictionKind,
    /// Default time-to-live for entries written by `set` or a load.
    pub expiration: Option<Duration>,
    pub(crate) loader: Option<Loader<K, V>>,
    pub(crate) callbacks: Callbacks<K, V>,
    pub(crate) serialize: Option<ValueHook<K, V>>,
    pub(crate) deserialize: Option<ValueHook<K, V>>,
    pub(crate) clock: Arc<dyn Clock>,
}

impl<K, V> CacheConfig<K, V> {
    /// Creates a configuration with no expiration, loader or hooks.
    pub fn new(capacity: usize, policy: EvictionKind) -> Self {
        CacheConfig {
            capacity,
            policy,
            expiration: None,
            loader: None,
            callbacks: Callbacks::default(),
            serialize: None,
            deserialize: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Sets the default time-to-live.
    #[must_use]
    pub fn with_expiration(mut self, ttl: Duration) -> Self {
        self.expiration = Some(ttl);
        self
    }

    /// Sets the loader that `get` calls on a miss.
    #[must_use]
    pub fn with_loader<F>(mut self, loader: F) -> Self
    where
        F: Fn(&K) -> Result<V, BoxError> + Send + Sync + 'static,
    {
        self.loader = Some(Loader::Plain(Arc::new(loader)));
        self
    }

    /// Sets a loader that also returns the TTL for the loaded entry.
    #[must_use]
    pub fn with_loader_expire<F>(mut self, loader: F) -> Self
    where
        F: Fn(&K) -> Result<(V, Option<Duration>), BoxError> + Send + Sync + 'static,
    {
        self.loader = Some(Loader::Expiring(Arc::new(loader)));
        self
    }

    /// Called with the stored key and value after every `set` and load.
    /// The value is the one in the store, after any serialize hook.
    #[must_use]
    pub fn with_on_added<F>(mut self, hook: F) -> Self
    where
        F: Fn(&K, &V) + Send + Sync + 'static,
    {
        self.callbacks.on_added = Some(Arc::new(hook) as EntryHook<K, V>);
        self
    }

    /// Called with each entry evicted for capacity or dropped after expiring.
    /// The value is the stored one and has not been through the deserialize
    /// hook.
    #[must_use]
    pub fn with_on_evicted<F>(mut self, hook: F) -> Self
    where
        F: Fn(&K, &V) + Send + Sync + 'static,
    {
        self.callbacks.on_evicted = Some(Arc::new(hook) as EntryHook<K, V>);
        self
    }

    /// Called for each entry dropped by `purge`.
    ///
    /// Like the other callbacks it receives the stored value, so with a
    /// serialize hook set it sees the serialized form.
    /// The hook runs while the cache is locked and must not call back into it.
    #[must_use]
    pub fn with_on_purge_visit<F>(mut self, hook: F) -> Self
    where
        F: Fn(&K, &V) + Send + Sync + 'static,
    {
        self.callbacks.on_purge_visit = Some(Arc::new(hook) as EntryHook<K, V>);
        self
    }

    /// Transforms values before they are stored.
    #[must_use]
    pub fn with_serialize<F>(mut self, hook: F) -> Self
    where
        F: Fn(&K, V) -> Result<V, BoxError> + Send + Sync + 'static,
    {
        self.serialize = Some(Arc::new(hook));
        self
    }

    /// Transforms stored values before they are returned.
    #[must_use]
    pub fn with_deserialize<F>(mut self, hook: F) -> Self
    where
        F: Fn(&K, V) -> Result<V, BoxError> + Send + Sync + 'static,
    {
        self.deserialize = Some(Arc::new(hook));
        self
    }

    /// Replaces the time source used for expiration.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl<K, V> fmt::Debug for CacheConfig<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("capacity", &self.capacity)
            .field("policy", &self.policy)
            .field("expiration", &self.expiration)
            .field("loader", &self.loader.is_some())
            .field("callbacks", &self.callbacks)
            .field("serialize", &self.serialize.is_some())
            .field("deserialize", &self.deserialize.is_some())
            .field("clock", &self.clock)
            .finish()
    }
}
