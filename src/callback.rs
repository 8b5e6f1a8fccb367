//! Lifecycle callbacks.
//!
//! Hooks observe entries being added, evicted or expired, and visited during a
//! purge. A panicking hook is caught and logged; it never poisons the cache or
//! aborts the operation that triggered it.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// A hook receiving a key and its stored value.
pub type EntryHook<K, V> = Arc<dyn Fn(&K, &V) + Send + Sync>;

/// The set of hooks configured on a cache.
pub(crate) struct Callbacks<K, V> {
    pub(crate) on_added: Option<EntryHook<K, V>>,
    pub(crate) on_evicted: Option<EntryHook<K, V>>,
    pub(crate) on_purge_visit: Option<EntryHook<K, V>>,
}

impl<K, V> Callbacks<K, V> {
    /// An entry was stored by `set` or by a load.
    pub(crate) fn added(&self, key: &K, value: &V) {
        if let Some(hook) = &self.on_added {
            invoke("on_added", hook, key, value);
        }
    }

    /// An entry left for capacity or because it expired.
    pub(crate) fn evicted(&self, key: &K, value: &V) {
        if let Some(hook) = &self.on_evicted {
            invoke("on_evicted", hook, key, value);
        }
    }

    /// An entry is about to be dropped by `purge`.
    pub(crate) fn purge_visit(&self, key: &K, value: &V) {
        if let Some(hook) = &self.on_purge_visit {
            invoke("on_purge_visit", hook, key, value);
        }
    }

    pub(crate) fn has_added(&self) -> bool {
        self.on_added.is_some()
    }

    pub(crate) fn has_purge_visit(&self) -> bool {
        self.on_purge_visit.is_some()
    }
}

impl<K, V> Default for Callbacks<K, V> {
    fn default() -> Self {
        Callbacks {
            on_added: None,
            on_evicted: None,
            on_purge_visit: None,
        }
    }
}

impl<K, V> Clone for Callbacks<K, V> {
    fn clone(&self) -> Self {
        Callbacks {
            on_added: self.on_added.clone(),
            on_evicted: self.on_evicted.clone(),
            on_purge_visit: self.on_purge_visit.clone(),
        }
    }
}

impl<K, V> fmt::Debug for Callbacks<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_added", &self.on_added.is_some())
            .field("on_evicted", &self.on_evicted.is_some())
            .field("on_purge_visit", &self.on_purge_visit.is_some())
            .finish()
    }
}

fn invoke<K, V>(name: &str, hook: &EntryHook<K, V>, key: &K, value: &V) {
    if catch_unwind(AssertUnwindSafe(|| hook(key, value))).is_err() {
        log::warn!("{name} callback panicked; cache state is unaffected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_hooks_fire_when_set() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let callbacks: Callbacks<&str, i32> = Callbacks {
            on_added: Some(Arc::new(move |_: &&str, v: &i32| {
                seen.fetch_add(*v as usize, Ordering::SeqCst);
            })),
            ..Callbacks::default()
        };
        callbacks.added(&"a", &5);
        callbacks.evicted(&"a", &5);
        callbacks.purge_visit(&"a", &5);
        assert_eq!(count.load(Ordering::SeqCst), 5);
        assert!(!callbacks.has_purge_visit());
    }

    #[test]
    fn test_panicking_hook_is_contained() {
        let callbacks: Callbacks<&str, i32> = Callbacks {
            on_evicted: Some(Arc::new(|_: &&str, _: &i32| panic!("hook failure"))),
            ..Callbacks::default()
        };
        callbacks.evicted(&"a", &1);
        callbacks.clone().evicted(&"b", &2);
    }
}
