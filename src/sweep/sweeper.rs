//! Background Cleanup Scheduler
//!
//! Lazy expiry alone has a gap: an entry that expires and is never read
//! again stays in memory until someone touches the map. The sweeper closes
//! it by periodically invoking a cleanup pass on every registered target
//! from a single background task.
//!
//! ## Design
//!
//! The sweeper holds an ordered registry of callbacks behind its own lock,
//! independent of any map lock. On every tick from its [`Ticker`] it runs
//! all registered callbacks, in registration order, synchronously within
//! that tick. Its lifecycle is an explicit state machine:
//!
//! ```text
//! Created --start()--> Running --stop()--> Stopped (terminal)
//! ```
//!
//! `stop` is idempotent; `start` on a running or stopped sweeper returns an
//! error instead of spawning a duplicate loop.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::sweep::ticker::{IntervalTicker, Ticker};

/// The cleanup-pass capability a sweep target exposes.
///
/// Implemented by [`ExpiringMap`](crate::ExpiringMap); any other type with
/// a notion of expired state can implement it and be registered alongside.
pub trait Cleanable {
    /// Performs one cleanup pass.
    ///
    /// # Returns
    ///
    /// The number of entries removed by this pass.
    fn cleanup(&self) -> usize;
}

/// Error returned by [`Sweeper::start`] on lifecycle misuse.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartError {
    /// The sweeper's background task is already running.
    #[error("sweeper is already running")]
    AlreadyRunning,
    /// The sweeper was stopped and cannot be restarted.
    #[error("sweeper has been stopped")]
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Created,
    Running,
    Stopped,
}

type Callback = Box<dyn Fn() + Send>;

/// Drives periodic cleanup passes over registered targets.
///
/// Construction only records the tick source; [`start`](Sweeper::start)
/// spawns the background task. Dropping the sweeper stops it.
///
/// # Example
///
/// ```ignore
/// use expiremap::{ExpiringMap, Sweeper};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let map: Arc<ExpiringMap<String, u64>> = Arc::new(ExpiringMap::new());
///
/// let sweeper = Sweeper::new(Duration::from_secs(1));
/// sweeper.register_cleanable(Arc::clone(&map));
/// sweeper.start()?;
///
/// // expired entries are now removed in the background
///
/// sweeper.stop();
/// ```
pub struct Sweeper<T: Ticker = IntervalTicker> {
    ticker: Mutex<Option<T>>,
    callbacks: Arc<Mutex<Vec<Callback>>>,
    state: Mutex<State>,
    shutdown_tx: watch::Sender<bool>,
}

impl Sweeper<IntervalTicker> {
    /// Creates a sweeper ticking every `interval` on the tokio timer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(interval: Duration) -> Self {
        Self::with_ticker(IntervalTicker::new(interval))
    }
}

impl<T: Ticker> Sweeper<T> {
    /// Creates a sweeper driven by an injected tick source.
    pub fn with_ticker(ticker: T) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            ticker: Mutex::new(Some(ticker)),
            callbacks: Arc::new(Mutex::new(Vec::new())),
            state: Mutex::new(State::Created),
            shutdown_tx,
        }
    }

    /// Registers `target`'s cleanup pass to run on every tick.
    ///
    /// Safe to call while the sweeper is running; the target is picked up
    /// on the next tick.
    pub fn register_cleanable<C>(&self, target: Arc<C>)
    where
        C: Cleanable + Send + Sync + 'static,
    {
        self.register_callback(move || {
            let removed = target.cleanup();
            if removed > 0 {
                debug!(removed, "swept expired entries");
            }
        });
    }

    /// Registers an arbitrary callback to run on every tick, after all
    /// previously registered ones.
    pub fn register_callback<F>(&self, callback: F)
    where
        F: Fn() + Send + 'static,
    {
        self.callbacks.lock().unwrap().push(Box::new(callback));
    }

    /// Spawns the background task processing ticks.
    ///
    /// # Errors
    ///
    /// [`StartError::AlreadyRunning`] if the sweeper is running,
    /// [`StartError::Stopped`] if it has been stopped. Neither spawns a
    /// second loop.
    pub fn start(&self) -> Result<(), StartError> {
        let mut state = self.state.lock().unwrap();
        match *state {
            State::Running => Err(StartError::AlreadyRunning),
            State::Stopped => Err(StartError::Stopped),
            State::Created => {
                let ticker = self
                    .ticker
                    .lock()
                    .unwrap()
                    .take()
                    .ok_or(StartError::AlreadyRunning)?;
                tokio::spawn(run_loop(
                    ticker,
                    Arc::clone(&self.callbacks),
                    self.shutdown_tx.subscribe(),
                ));
                *state = State::Running;
                info!("expiry sweeper started");
                Ok(())
            }
        }
    }

    /// Signals the background task to terminate.
    ///
    /// Idempotent: any call after the first is a no-op. A callback already
    /// executing when the signal lands completes normally; no further ticks
    /// are processed.
    pub fn stop(&self) {
        let mut state = self.state.lock().unwrap();
        if *state == State::Stopped {
            return;
        }
        *state = State::Stopped;
        let _ = self.shutdown_tx.send(true);
        info!("expiry sweeper stopped");
    }
}

impl<T: Ticker> Drop for Sweeper<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<T: Ticker> fmt::Debug for Sweeper<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sweeper")
            .field("state", &*self.state.lock().unwrap())
            .field("callbacks", &self.callbacks.lock().unwrap().len())
            .finish()
    }
}

/// The tick-processing loop.
async fn run_loop<T: Ticker>(
    mut ticker: T,
    callbacks: Arc<Mutex<Vec<Callback>>>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            // the shutdown signal wins over a simultaneously ready tick
            biased;
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    debug!("sweeper loop received shutdown signal");
                    return;
                }
            }
            _ = ticker.tick() => {
                let queue = callbacks.lock().unwrap();
                for callback in queue.iter() {
                    callback();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::map::ExpiringMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    /// A ticker fired by hand through a channel.
    struct ManualTicker {
        ticks: mpsc::Receiver<()>,
    }

    impl ManualTicker {
        fn new() -> (mpsc::Sender<()>, Self) {
            let (tx, rx) = mpsc::channel(8);
            (tx, Self { ticks: rx })
        }
    }

    impl Ticker for ManualTicker {
        async fn tick(&mut self) {
            if self.ticks.recv().await.is_none() {
                // driver gone: no further ticks, ever
                std::future::pending::<()>().await;
            }
        }
    }

    #[tokio::test]
    async fn tick_sweeps_registered_maps() {
        let clock = ManualClock::new();
        let map = Arc::new(ExpiringMap::with_clock(clock.clone()));
        map.set("a", 1, Duration::from_millis(10));
        map.set("b", 2, Duration::from_secs(3600));

        let (ticks, ticker) = ManualTicker::new();
        let sweeper = Sweeper::with_ticker(ticker);
        sweeper.register_cleanable(Arc::clone(&map));
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        sweeper.register_callback(move || {
            let _ = done_tx.send(());
        });
        sweeper.start().unwrap();

        clock.advance(Duration::from_millis(20));
        ticks.send(()).await.unwrap();
        done_rx.recv().await.unwrap();

        assert_eq!(map.len(), 1);
        assert!(map.contains(&"b"));
    }

    #[tokio::test]
    async fn callbacks_run_in_registration_order() {
        let (ticks, ticker) = ManualTicker::new();
        let sweeper = Sweeper::with_ticker(ticker);

        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let order = Arc::clone(&order);
            sweeper.register_callback(move || order.lock().unwrap().push(i));
        }
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        sweeper.register_callback(move || {
            let _ = done_tx.send(());
        });
        sweeper.start().unwrap();

        ticks.send(()).await.unwrap();
        done_rx.recv().await.unwrap();

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn registration_while_running_is_picked_up() {
        let (ticks, ticker) = ManualTicker::new();
        let sweeper = Sweeper::with_ticker(ticker);
        sweeper.start().unwrap();

        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        sweeper.register_callback(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        sweeper.register_callback(move || {
            let _ = done_tx.send(());
        });

        ticks.send(()).await.unwrap();
        done_rx.recv().await.unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn start_twice_is_an_error() {
        let (_ticks, ticker) = ManualTicker::new();
        let sweeper = Sweeper::with_ticker(ticker);

        sweeper.start().unwrap();

        assert_eq!(sweeper.start(), Err(StartError::AlreadyRunning));
    }

    #[tokio::test]
    async fn stop_is_idempotent_and_start_after_stop_errors() {
        let (_ticks, ticker) = ManualTicker::new();
        let sweeper = Sweeper::with_ticker(ticker);
        sweeper.start().unwrap();

        sweeper.stop();
        sweeper.stop();
        sweeper.stop();

        assert_eq!(sweeper.start(), Err(StartError::Stopped));
    }

    #[tokio::test]
    async fn stop_before_start_is_terminal() {
        let (_ticks, ticker) = ManualTicker::new();
        let sweeper = Sweeper::with_ticker(ticker);

        sweeper.stop();

        assert_eq!(sweeper.start(), Err(StartError::Stopped));
    }

    #[tokio::test]
    async fn ticks_after_stop_are_ignored() {
        let (ticks, ticker) = ManualTicker::new();
        let sweeper = Sweeper::with_ticker(ticker);

        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        sweeper.register_callback(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        sweeper.register_callback(move || {
            let _ = done_tx.send(());
        });
        sweeper.start().unwrap();

        ticks.send(()).await.unwrap();
        done_rx.recv().await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        sweeper.stop();
        let _ = ticks.send(()).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn drop_stops_the_sweeper() {
        let clock = ManualClock::new();
        let map = Arc::new(ExpiringMap::with_clock(clock.clone()));

        {
            let (_ticks, ticker) = ManualTicker::new();
            let sweeper = Sweeper::with_ticker(ticker);
            sweeper.register_cleanable(Arc::clone(&map));
            sweeper.start().unwrap();
        }

        map.set("key", 1, Duration::from_millis(10));
        clock.advance(Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(20)).await;

        // nothing sweeps anymore, but lazy expiry still applies
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&"key"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_sweeper_ticks_on_schedule() {
        let count = Arc::new(AtomicUsize::new(0));
        let sweeper = Sweeper::new(Duration::from_millis(100));
        let counter = Arc::clone(&count);
        sweeper.register_callback(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        sweeper.start().unwrap();

        tokio::time::sleep(Duration::from_millis(350)).await;

        assert_eq!(count.load(Ordering::SeqCst), 3);
        sweeper.stop();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sweeper_removes_expired_entries_within_two_ticks() {
        let map = Arc::new(ExpiringMap::new());
        for i in 0..10 {
            map.set(i, "value", Duration::from_millis(30));
        }
        map.set(99, "value", Duration::from_secs(3600));

        let sweeper = Sweeper::new(Duration::from_millis(10));
        sweeper.register_cleanable(Arc::clone(&map));
        sweeper.start().unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(map.len(), 1);
        assert!(map.contains(&99));
        sweeper.stop();
    }
}
