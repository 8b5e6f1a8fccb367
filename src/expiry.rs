//! Time-based expiration.
//!
//! Expiration is lazy: a lookup that finds an entry past its deadline removes
//! it and reports a miss. Entries that are never read again linger until
//! [`Cache::purge_expired`](crate::Cache::purge_expired) runs, either called
//! by the application or by a [`Sweeper`] on a fixed interval.

use std::fmt;
use std::hash::Hash;
use std::io;
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::cache::Cache;

/// Absolute deadline for an entry written at `now` with `ttl`.
///
/// A TTL too large to represent yields no deadline at all.
pub(crate) fn deadline(now: Instant, ttl: Option<Duration>) -> Option<Instant> {
    ttl.and_then(|ttl| now.checked_add(ttl))
}

/// Background thread that periodically removes expired entries.
///
/// The sweeper holds only a weak reference to the cache, so it never keeps a
/// cache alive: once the last `Arc<Cache>` is gone the thread exits on its
/// next tick. Dropping the `Sweeper` stops the thread and joins it.
///
/// ```
/// use polycache::{Cache, CacheConfig, EvictionKind, Sweeper};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let cache: Arc<Cache<u32, u32>> = Arc::new(
///     Cache::init(
///         CacheConfig::new(16, EvictionKind::Lru).with_expiration(Duration::from_millis(50)),
///     )
///     .unwrap(),
/// );
/// let sweeper = Sweeper::spawn(&cache, Duration::from_millis(10)).unwrap();
/// cache.set(1, 1).unwrap();
/// sweeper.stop();
/// ```
pub struct Sweeper {
    signal: Arc<StopSignal>,
    handle: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl Sweeper {
    /// Starts a thread that calls `purge_expired` on `cache` every `interval`.
    pub fn spawn<K, V>(cache: &Arc<Cache<K, V>>, interval: Duration) -> io::Result<Self>
    where
        K: Hash + Eq + Clone + Send + 'static,
        V: Clone + Send + 'static,
    {
        let weak: Weak<Cache<K, V>> = Arc::downgrade(cache);
        let signal = Arc::new(StopSignal::default());
        let thread_signal = Arc::clone(&signal);

        let handle = thread::Builder::new()
            .name(String::from("polycache-sweeper"))
            .spawn(move || loop {
                {
                    let mut stopped = thread_signal.stopped.lock();
                    if !*stopped {
                        thread_signal.wake.wait_for(&mut stopped, interval);
                    }
                    if *stopped {
                        break;
                    }
                }
                let Some(cache) = weak.upgrade() else {
                    log::trace!("sweeper exiting, cache dropped");
                    break;
                };
                let swept = cache.purge_expired();
                if swept > 0 {
                    log::trace!("sweeper removed {swept} expired entries");
                }
            })?;

        Ok(Sweeper {
            signal,
            handle: Some(handle),
        })
    }

    /// Stops the thread and waits for it to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        {
            let mut stopped = self.signal.stopped.lock();
            *stopped = true;
            self.signal.wake.notify_all();
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("sweeper thread panicked");
            }
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for Sweeper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sweeper")
            .field("running", &self.handle.is_some())
            .finish()
    }
}
