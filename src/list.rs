//! Indexed doubly linked list of keys.
//!
//! Every eviction policy keeps its ordering as one or more `KeyList`s: the
//! front is the most recently pushed key, the back the oldest. Nodes live in
//! a slot vector and are linked by index, and a side index maps each key to
//! its slot so that removal and move-to-front are O(1).
//!
//! ```text
//!   index: HashMap<K, usize>        slots: Vec<Slot<K>>
//!   ┌───────┬──────┐                head ─► [C] ◄──► [B] ◄──► [A] ◄── tail
//!   │ key A │  0   │                       newest             oldest
//!   │ key B │  1   │
//!   │ key C │  2   │                free: [..] (recycled slot indices)
//!   └───────┴──────┘
//! ```
//!
//! This module is internal infrastructure; policies expose their own
//! higher-level views.

use crate::HashMap;
use core::fmt;
use core::hash::Hash;

const NIL: usize = usize::MAX;

/// A slot in the arena. `key` is `None` only while the slot is on the free list.
struct Slot<K> {
    key: Option<K>,
    prev: usize,
    next: usize,
}

/// A doubly linked list of unique keys with O(1) keyed removal.
pub(crate) struct KeyList<K> {
    slots: Vec<Slot<K>>,
    free: Vec<usize>,
    head: usize,
    tail: usize,
    index: HashMap<K, usize>,
}

impl<K> KeyList<K> {
    /// Returns the number of keys in the list.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns true if the list holds no keys.
    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl<K: Hash + Eq + Clone> KeyList<K> {
    /// Creates an empty list.
    pub(crate) fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty list with room for `capacity` keys before reallocating.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let capacity = crate::preallocation(capacity);
        KeyList {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            index: HashMap::with_capacity(capacity),
        }
    }


    #[inline]
    pub(crate) fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Returns the most recently pushed key.
    pub(crate) fn front(&self) -> Option<&K> {
        self.key_at(self.head)
    }

    /// Returns the oldest key.
    pub(crate) fn back(&self) -> Option<&K> {
        self.key_at(self.tail)
    }

    /// Pushes `key` to the front. A key already in the list is moved instead.
    pub(crate) fn push_front(&mut self, key: K) {
        if let Some(&idx) = self.index.get(&key) {
            self.unlink(idx);
            self.link_front(idx);
            return;
        }
        let idx = self.alloc(key.clone());
        self.link_front(idx);
        self.index.insert(key, idx);
    }

    /// Pushes `key` to the back. A key already in the list is moved instead.
    pub(crate) fn push_back(&mut self, key: K) {
        if let Some(&idx) = self.index.get(&key) {
            self.unlink(idx);
            self.link_back(idx);
            return;
        }
        let idx = self.alloc(key.clone());
        self.link_back(idx);
        self.index.insert(key, idx);
    }

    /// Moves an existing key to the front. Returns false if the key is absent.
    pub(crate) fn move_to_front(&mut self, key: &K) -> bool {
        match self.index.get(key) {
            Some(&idx) => {
                if self.head != idx {
                    self.unlink(idx);
                    self.link_front(idx);
                }
                true
            }
            None => false,
        }
    }

    /// Removes `key`, returning true if it was present.
    pub(crate) fn remove(&mut self, key: &K) -> bool {
        let Some(idx) = self.index.remove(key) else {
            return false;
        };
        self.unlink(idx);
        self.release(idx);
        true
    }

    /// Removes and returns the oldest key.
    pub(crate) fn pop_back(&mut self) -> Option<K> {
        if self.tail == NIL {
            return None;
        }
        let idx = self.tail;
        self.unlink(idx);
        let key = self.release(idx)?;
        self.index.remove(&key);
        Some(key)
    }

    /// Iterates keys from front (newest) to back (oldest).
    pub(crate) fn iter(&self) -> Iter<'_, K> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    fn key_at(&self, idx: usize) -> Option<&K> {
        if idx == NIL {
            None
        } else {
            self.slots[idx].key.as_ref()
        }
    }

    fn alloc(&mut self, key: K) -> usize {
        let slot = Slot {
            key: Some(key),
            prev: NIL,
            next: NIL,
        };
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = slot;
                idx
            }
            None => {
                self.slots.push(slot);
                self.slots.len() - 1
            }
        }
    }

    fn release(&mut self, idx: usize) -> Option<K> {
        let key = self.slots[idx].key.take();
        self.free.push(idx);
        key
    }

    fn unlink(&mut self, idx: usize) {
        let prev = self.slots[idx].prev;
        let next = self.slots[idx].next;
        if prev == NIL {
            self.head = next;
        } else {
            self.slots[prev].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.slots[next].prev = prev;
        }
        self.slots[idx].prev = NIL;
        self.slots[idx].next = NIL;
    }

    fn link_front(&mut self, idx: usize) {
        self.slots[idx].prev = NIL;
        self.slots[idx].next = self.head;
        if self.head == NIL {
            self.tail = idx;
        } else {
            self.slots[self.head].prev = idx;
        }
        self.head = idx;
    }

    fn link_back(&mut self, idx: usize) {
        self.slots[idx].next = NIL;
        self.slots[idx].prev = self.tail;
        if self.tail == NIL {
            self.head = idx;
        } else {
            self.slots[self.tail].next = idx;
        }
        self.tail = idx;
    }
}

impl<K: Hash + Eq + Clone> Default for KeyList<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> fmt::Debug for KeyList<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyList")
            .field("len", &self.index.len())
            .field("slots", &self.slots.len())
            .finish()
    }
}

/// Front-to-back iterator over a [`KeyList`].
pub(crate) struct Iter<'a, K> {
    list: &'a KeyList<K>,
    cursor: usize,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        if self.cursor == NIL {
            return None;
        }
        let slot = &self.list.slots[self.cursor];
        self.cursor = slot.next;
        slot.key.as_ref()
    }
}
