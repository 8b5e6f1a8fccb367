//! Per-key load deduplication.
//!
//! When several threads miss on the same key at once, only the first (the
//! leader) runs the loader. The others (waiters) block on the leader's slot
//! and receive a clone of whatever it produced, success or error. The slot is
//! removed as soon as the load completes, so errors are never cached: the
//! next miss after a failure starts a fresh load.

use std::fmt;
use std::hash::Hash;
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::error::CacheError;
use crate::HashMap;

/// One in-flight load.
struct InflightLoad<V> {
    outcome: Mutex<Option<Result<V, CacheError>>>,
    done: Condvar,
}

impl<V: Clone> InflightLoad<V> {
    fn new() -> Self {
        InflightLoad {
            outcome: Mutex::new(None),
            done: Condvar::new(),
        }
    }

    fn wait(&self) -> Result<V, CacheError> {
        let mut outcome = self.outcome.lock();
        loop {
            if let Some(result) = outcome.as_ref() {
                return result.clone();
            }
            self.done.wait(&mut outcome);
        }
    }

    fn complete(&self, result: Result<V, CacheError>) {
        *self.outcome.lock() = Some(result);
        self.done.notify_all();
    }
}

enum InflightRole<V> {
    Leader(Arc<InflightLoad<V>>),
    Waiter(Arc<InflightLoad<V>>),
}

/// Deduplicates concurrent loads of the same key.
pub(crate) struct LoadGroup<K, V> {
    inflight: Mutex<HashMap<K, Arc<InflightLoad<V>>>>,
}

impl<K: Hash + Eq + Clone, V: Clone> LoadGroup<K, V> {
    pub(crate) fn new() -> Self {
        LoadGroup {
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Runs `load` for `key` unless a load of the same key is already in
    /// flight, in which case this call waits for and shares its outcome.
    ///
    /// If the leader's `load` panics, waiters receive a load error and the
    /// panic continues in the leader's thread.
    pub(crate) fn load_or_join<F>(&self, key: &K, load: F) -> Result<V, CacheError>
    where
        F: FnOnce() -> Result<V, CacheError>,
    {
        let slot = match self.claim(key) {
            InflightRole::Waiter(slot) => return slot.wait(),
            InflightRole::Leader(slot) => slot,
        };

        match catch_unwind(AssertUnwindSafe(load)) {
            Ok(result) => {
                self.release(key, &slot, result.clone());
                result
            }
            Err(payload) => {
                log::warn!("loader panicked; failing all waiters");
                self.release(key, &slot, Err(CacheError::loader_panicked()));
                resume_unwind(payload)
            }
        }
    }

    /// Number of keys with a load in flight.
    pub(crate) fn in_flight(&self) -> usize {
        self.inflight.lock().len()
    }

    fn claim(&self, key: &K) -> InflightRole<V> {
        let mut inflight = self.inflight.lock();
        if let Some(existing) = inflight.get(key) {
            return InflightRole::Waiter(Arc::clone(existing));
        }
        let slot = Arc::new(InflightLoad::new());
        inflight.insert(key.clone(), Arc::clone(&slot));
        InflightRole::Leader(slot)
    }

    fn release(&self, key: &K, slot: &InflightLoad<V>, result: Result<V, CacheError>) {
        slot.complete(result);
        self.inflight.lock().remove(key);
    }
}

impl<K, V> fmt::Debug for LoadGroup<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadGroup")
            .field("in_flight", &self.inflight.lock().len())
            .finish()
    }
}
