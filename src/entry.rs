//! Cache entry.
//!
//! A `CacheEntry` holds the stored key and value together with its creation
//! time and optional absolute deadline. Policy metadata (recency position,
//! frequency, ARC list membership) is not kept here; each eviction policy
//! indexes its own bookkeeping by key.

use std::fmt;
use std::time::{Duration, Instant};

use crate::expiry::deadline;

/// A stored key/value pair with expiration metadata.
pub struct CacheEntry<K, V> {
    /// The entry's key.
    pub key: K,
    /// The stored value, after the serialize hook if one is configured.
    pub value: V,
    created_at: Instant,
    expire_at: Option<Instant>,
}

impl<K, V> CacheEntry<K, V> {
    /// Creates an entry at `now` that expires `ttl` later, or never when `ttl`
    /// is `None`.
    pub fn new(key: K, value: V, now: Instant, ttl: Option<Duration>) -> Self {
        CacheEntry {
            key,
            value,
            created_at: now,
            expire_at: deadline(now, ttl),
        }
    }

    /// Replaces the deadline with `now + ttl`, or clears it when `ttl` is `None`.
    pub fn attach_expiry(&mut self, now: Instant, ttl: Option<Duration>) {
        self.expire_at = deadline(now, ttl);
    }

    /// Returns true once the deadline lies strictly before `now`.
    #[inline]
    pub fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expire_at, Some(at) if at < now)
    }

    /// When the entry was created.
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// The absolute deadline, if any.
    pub fn expire_at(&self) -> Option<Instant> {
        self.expire_at
    }

    /// Time left until the deadline. `None` when the entry never expires.
    pub fn time_to_live(&self, now: Instant) -> Option<Duration> {
        self.expire_at.map(|at| at.saturating_duration_since(now))
    }

    /// Splits the entry into its key and value.
    pub fn into_pair(self) -> (K, V) {
        (self.key, self.value)
    }
}

impl<K: Clone, V: Clone> Clone for CacheEntry<K, V> {
    fn clone(&self) -> Self {
        CacheEntry {
            key: self.key.clone(),
            value: self.value.clone(),
            created_at: self.created_at,
            expire_at: self.expire_at,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for CacheEntry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("created_at", &self.created_at)
            .field("expire_at", &self.expire_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_without_ttl_never_expires() {
        let now = Instant::now();
        let entry = CacheEntry::new("k", 1, now, None);
        assert!(entry.expire_at().is_none());
        assert!(!entry.is_expired(now + Duration::from_secs(3600)));
        assert_eq!(entry.time_to_live(now), None);
    }

    #[test]
    fn test_entry_expires_strictly_after_deadline() {
        let now = Instant::now();
        let entry = CacheEntry::new("k", 1, now, Some(Duration::from_secs(4)));
        assert!(!entry.is_expired(now + Duration::from_secs(1)));
        assert!(!entry.is_expired(now + Duration::from_secs(4)));
        assert!(entry.is_expired(now + Duration::from_secs(5)));
    }

    #[test]
    fn test_attach_expiry_replaces_deadline() {
        let now = Instant::now();
        let mut entry = CacheEntry::new("k", 1, now, Some(Duration::from_secs(1)));
        entry.attach_expiry(now, Some(Duration::from_secs(10)));
        assert!(!entry.is_expired(now + Duration::from_secs(5)));
        assert_eq!(
            entry.time_to_live(now + Duration::from_secs(4)),
            Some(Duration::from_secs(6))
        );
        entry.attach_expiry(now, None);
        assert!(!entry.is_expired(now + Duration::from_secs(60)));
    }

    #[test]
    fn test_into_pair() {
        let entry = CacheEntry::new(String::from("a"), 7, Instant::now(), None);
        assert_eq!(entry.created_at(), entry.clone().created_at());
        assert_eq!(entry.into_pair(), (String::from("a"), 7));
    }
}
