//! Error types returned by cache operations and construction.

use std::error::Error;
use std::sync::Arc;

use thiserror::Error;

/// Error type returned by user-supplied hooks (loaders, serializers).
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Errors surfaced by [`Cache`](crate::Cache) lookups and writes.
///
/// `CacheError` is cheap to clone: a failed load is shared between every
/// caller that waited on it, and all of them observe the same underlying error.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// The key is absent or expired and no loader produced a value.
    #[error("key not found")]
    KeyNotFound,

    /// A loader, serializer or deserializer failed, or a loader panicked.
    #[error("load failed: {0}")]
    Load(Arc<dyn Error + Send + Sync + 'static>),
}

impl CacheError {
    /// Wraps a hook error as [`CacheError::Load`].
    pub fn load(err: BoxError) -> Self {
        CacheError::Load(Arc::from(err))
    }

    pub(crate) fn loader_panicked() -> Self {
        CacheError::Load(Arc::new(LoaderPanicked))
    }

    /// Returns true for [`CacheError::KeyNotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::KeyNotFound)
    }
}

/// Reported to every waiter of a load whose loader panicked.
#[derive(Debug, Error)]
#[error("loader panicked")]
struct LoaderPanicked;

/// Errors detected while validating a [`CacheConfig`](crate::CacheConfig).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The configured capacity was zero.
    #[error("cache capacity must be greater than zero")]
    ZeroCapacity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(CacheError::KeyNotFound.to_string(), "key not found");
        let err = CacheError::load("disk on fire".into());
        assert_eq!(err.to_string(), "load failed: disk on fire");
        assert_eq!(
            ConfigError::ZeroCapacity.to_string(),
            "cache capacity must be greater than zero"
        );
    }

    #[test]
    fn test_clones_share_source() {
        let err = CacheError::load("boom".into());
        let copy = err.clone();
        match (err, copy) {
            (CacheError::Load(a), CacheError::Load(b)) => assert!(Arc::ptr_eq(&a, &b)),
            _ => panic!("expected load errors"),
        }
    }

    #[test]
    fn test_loader_panicked_message() {
        let err = CacheError::loader_panicked();
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "load failed: loader panicked");
    }
}
