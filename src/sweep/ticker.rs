//! Tick source abstraction.
//!
//! The sweeper does not own a timer. It awaits ticks from a [`Ticker`], so
//! tests can drive sweeps deterministically by injecting their own tick
//! source instead of waiting on real time.

use std::future::Future;
use std::time::Duration;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

/// An abstract source of periodic tick events.
///
/// A ticker is a lazy, unbounded sequence: each call to `tick` completes
/// when the next event is due. Resources are released when the ticker is
/// dropped; a ticker is restarted only by creating a new one.
pub trait Ticker: Send + 'static {
    /// Completes when the next tick is due.
    fn tick(&mut self) -> impl Future<Output = ()> + Send;
}

/// A [`Ticker`] backed by the tokio timer.
///
/// The first tick fires one full period after creation. Ticks that come due
/// while a sweep is still running are skipped, not delivered in a burst.
#[derive(Debug)]
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    /// Creates a ticker firing every `period`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(period: Duration) -> Self {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }
}

impl Ticker for IntervalTicker {
    async fn tick(&mut self) {
        self.interval.tick().await;
    }
}
