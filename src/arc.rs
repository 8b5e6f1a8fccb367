//! Adaptive Replacement Cache (ARC) eviction.
//!
//! ARC balances recency against frequency by splitting resident keys into two
//! lists and remembering recently evicted keys in two ghost lists:
//!
//! ```text
//!            recency side                    frequency side
//!   B1 (ghosts) ◄── T1 (seen once) │ T2 (seen twice+) ──► B2 (ghosts)
//!                                  │
//!                    ◄──── p ─────►│
//! ```
//!
//! - **T1**: resident keys seen exactly once since admission.
//! - **T2**: resident keys hit at least once more, or readmitted from a ghost.
//! - **B1/B2**: keys recently evicted from T1/T2. Keys only, no values.
//! - **p**: target size for T1, in `[0, capacity]`.
//!
//! A miss whose key sits in B1 means T1 was too small, so `p` grows by
//! `max(1, |B2| / |B1|)`. A miss in B2 shrinks `p` by `max(1, |B1| / |B2|)`.
//! Either way the key is readmitted straight into T2. Victims come from T1
//! while T1 exceeds `p` (or equals it on a B2 readmission) and from T2
//! otherwise.
//!
//! The ghost lists are trimmed oldest-first after every operation so that
//! `|T1| + |B1| ≤ c` and `|T1| + |T2| + |B1| + |B2| ≤ 2c`.

use std::fmt;
use std::hash::Hash;

use crate::list::KeyList;
use crate::policy::{EvictionPolicy, RemovalCause};

/// Adaptive recency/frequency eviction.
pub struct ArcPolicy<K> {
    capacity: usize,
    p: usize,
    t1: KeyList<K>,
    t2: KeyList<K>,
    b1: KeyList<K>,
    b2: KeyList<K>,
    /// Key whose ghost hit already adjusted `p` during victim selection.
    adapted: Option<K>,
}

impl<K: Hash + Eq + Clone> ArcPolicy<K> {
    /// Creates an empty policy for a cache of `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        ArcPolicy {
            capacity,
            p: 0,
            t1: KeyList::with_capacity(capacity),
            t2: KeyList::with_capacity(capacity),
            b1: KeyList::with_capacity(capacity),
            b2: KeyList::with_capacity(capacity),
            adapted: None,
        }
    }

    /// Current target size for T1.
    pub fn p_value(&self) -> usize {
        self.p
    }

    /// Number of resident keys seen once.
    pub fn t1_len(&self) -> usize {
        self.t1.len()
    }

    /// Number of resident keys seen more than once.
    pub fn t2_len(&self) -> usize {
        self.t2.len()
    }

    /// Number of ghosts evicted from T1.
    pub fn b1_len(&self) -> usize {
        self.b1.len()
    }

    /// Number of ghosts evicted from T2.
    pub fn b2_len(&self) -> usize {
        self.b2.len()
    }

    /// Number of resident keys.
    pub fn len(&self) -> usize {
        self.t1.len() + self.t2.len()
    }

    /// Returns true when no resident key is tracked.
    pub fn is_empty(&self) -> bool {
        self.t1.is_empty() && self.t2.is_empty()
    }

    /// Returns true if `key` is remembered in either ghost list.
    pub fn is_ghost(&self, key: &K) -> bool {
        self.b1.contains(key) || self.b2.contains(key)
    }

    /// Adjusts `p` if `key` is a ghost. Returns true when it was.
    fn adapt(&mut self, key: &K) -> bool {
        if self.b1.contains(key) {
            let delta = (self.b2.len() / self.b1.len()).max(1);
            self.p = self.p.saturating_add(delta).min(self.capacity);
            true
        } else if self.b2.contains(key) {
            let delta = (self.b1.len() / self.b2.len()).max(1);
            self.p = self.p.saturating_sub(delta);
            true
        } else {
            false
        }
    }

    fn trim_ghosts(&mut self) {
        while self.t1.len() + self.b1.len() > self.capacity && self.b1.pop_back().is_some() {}
        let limit = self.capacity.saturating_mul(2);
        while self.t1.len() + self.t2.len() + self.b1.len() + self.b2.len() > limit {
            if self.b2.pop_back().is_none() && self.b1.pop_back().is_none() {
                break;
            }
        }
    }

    /// Panics if any ARC size or disjointness invariant is violated.
    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        let c = self.capacity;
        let (t1, t2, b1, b2) = (self.t1.len(), self.t2.len(), self.b1.len(), self.b2.len());
        assert!(self.p <= c, "p={} exceeds capacity {c}", self.p);
        assert!(t1 + t2 <= c, "resident {t1}+{t2} exceeds {c}");
        assert!(t1 + b1 <= c, "t1+b1 {t1}+{b1} exceeds {c}");
        assert!(t2 + b2 <= 2 * c, "t2+b2 {t2}+{b2} exceeds {}", 2 * c);
        assert!(t1 + t2 + b1 + b2 <= 2 * c, "directory exceeds {}", 2 * c);

        let lists = [&self.t1, &self.t2, &self.b1, &self.b2];
        for (i, list) in lists.iter().enumerate() {
            for key in list.iter() {
                for other in lists.iter().skip(i + 1) {
                    assert!(!other.contains(key), "key tracked in two lists");
                }
            }
        }
    }
}

impl<K: Hash + Eq + Clone + Send> EvictionPolicy<K> for ArcPolicy<K> {
    fn on_access(&mut self, key: &K) {
        if self.t1.remove(key) {
            self.t2.push_front(key.clone());
        } else {
            let found = self.t2.move_to_front(key);
            debug_assert!(found, "access to untracked key");
        }
    }

    fn on_insert(&mut self, key: &K) {
        if self.t1.contains(key) || self.t2.contains(key) {
            debug_assert!(false, "key inserted twice");
            return;
        }
        let already_adapted = self.adapted.take().is_some_and(|k| &k == key);
        if !already_adapted {
            self.adapt(key);
        }
        if self.b1.remove(key) || self.b2.remove(key) {
            self.t2.push_front(key.clone());
        } else {
            self.t1.push_front(key.clone());
        }
        self.trim_ghosts();
    }

    fn select_victim(&mut self, incoming: &K) -> Option<K> {
        if self.adapted.as_ref() != Some(incoming) && self.adapt(incoming) {
            self.adapted = Some(incoming.clone());
        }

        let t1 = self.t1.len();
        let from_t1 = t1 > 0 && (t1 > self.p || (t1 == self.p && self.b2.contains(incoming)));
        let victim = if from_t1 {
            self.t1.back()
        } else {
            self.t2.back().or_else(|| self.t1.back())
        };
        victim.cloned()
    }

    fn on_remove(&mut self, key: &K, cause: RemovalCause) {
        let ghost = cause == RemovalCause::Evicted;
        if self.t1.remove(key) {
            if ghost {
                self.b1.push_front(key.clone());
            }
        } else if self.t2.remove(key) {
            if ghost {
                self.b2.push_front(key.clone());
            }
        } else {
            debug_assert!(false, "removal of untracked key");
            return;
        }
        self.trim_ghosts();
    }
}

impl<K> fmt::Debug for ArcPolicy<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArcPolicy")
            .field("capacity", &self.capacity)
            .field("p", &self.p)
            .field("t1", &self.t1.len())
            .field("t2", &self.t2.len())
            .field("b1", &self.b1.len())
            .field("b2", &self.b2.len())
            .finish()
    }
}
