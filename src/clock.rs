//! Clock abstraction.
//!
//! Every expiry decision in this crate goes through a [`Clock`] so that
//! time-dependent behavior can be tested without real waiting. Production
//! code uses [`SystemClock`]; tests inject a [`ManualClock`] and advance it
//! explicitly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A source of the current instant.
pub trait Clock: Send + Sync + 'static {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// The default clock, backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
///
/// Cloning yields a handle to the same underlying time, so a test can hand
/// one clone to an [`ExpiringMap`](crate::ExpiringMap) and keep another to
/// drive it:
///
/// ```
/// use expiremap::{ExpiringMap, ManualClock};
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// let map = ExpiringMap::with_clock(clock.clone());
///
/// map.set("token", 7, Duration::from_secs(30));
/// assert!(map.contains(&"token"));
///
/// clock.advance(Duration::from_secs(31));
/// assert!(!map.contains(&"token"));
/// ```
#[derive(Debug, Clone)]
pub struct ManualClock {
    epoch: Instant,
    offset_nanos: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock frozen at the instant of creation.
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            offset_nanos: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let nanos = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.offset_nanos.fetch_add(nanos, Ordering::Release);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.epoch + Duration::from_nanos(self.offset_nanos.load(Ordering::Acquire))
    }
}
