//! Time sources for expiration.
//!
//! The cache never calls `Instant::now` directly; it asks a [`Clock`]. The
//! default [`SystemClock`] reads the monotonic clock, while [`FakeClock`] only
//! moves when told to, which makes TTL behaviour deterministic in tests.

use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// A monotonic time source.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// The process monotonic clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A manually advanced clock.
///
/// Starts at the instant it was created and moves forward only through
/// [`FakeClock::advance`].
///
/// ```
/// use polycache::{Clock, FakeClock};
/// use std::time::Duration;
///
/// let clock = FakeClock::new();
/// let start = clock.now();
/// clock.advance(Duration::from_secs(5));
/// assert_eq!(clock.now() - start, Duration::from_secs(5));
/// ```
#[derive(Debug)]
pub struct FakeClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl FakeClock {
    /// Creates a clock frozen at the current instant.
    pub fn new() -> Self {
        FakeClock {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock();
        *offset = offset.saturating_add(by);
    }

    /// Total time advanced since creation.
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock()
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock();
        self.origin.checked_add(offset).unwrap_or(self.origin)
    }
}
