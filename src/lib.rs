//! # expiremap - A Concurrent Map With Expiring Entries
//!
//! `expiremap` is an in-process cache building block: a thread-safe map
//! whose entries disappear after a per-entry time-to-live, plus a background
//! sweeper that reclaims the memory of entries nobody reads again.
//!
//! ## Features
//!
//! - **Generic**: any `Eq + Hash` key, any value type
//! - **Lazy + Active Expiry**: reads filter out expired entries against the
//!   clock; a background sweeper physically removes them
//! - **Cheap Lifetime Extension**: `extend`/`shorten` adjust an entry's
//!   expiry atomically under the shared lock, without write-lock contention
//! - **Deterministic Testing**: both the clock and the sweeper's tick
//!   source are injectable capabilities
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────┐      ┌────────────────────────────┐
//! │       ExpiringMap          │      │          Sweeper           │
//! │  RwLock<HashMap<K, Slot>>  │<─────│   (background tokio task)  │
//! │  per-entry atomic expiry   │ tick │   ordered callback registry│
//! └────────────────────────────┘      └──────────────┬─────────────┘
//!               ▲                                    │
//!               │ Clock                              │ Ticker
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use expiremap::ExpiringMap;
//! use std::time::Duration;
//!
//! let map = ExpiringMap::new();
//!
//! map.set("session:42", "token", Duration::from_secs(60));
//! assert_eq!(map.get(&"session:42"), Some("token"));
//!
//! // extend the session without taking the write lock
//! map.extend(&"session:42", Duration::from_secs(60));
//! ```
//!
//! With background sweeping:
//!
//! ```ignore
//! use expiremap::{ExpiringMap, Sweeper};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let map: Arc<ExpiringMap<String, String>> = Arc::new(ExpiringMap::new());
//!
//! let sweeper = Sweeper::new(Duration::from_secs(1));
//! sweeper.register_cleanable(Arc::clone(&map));
//! sweeper.start()?;
//! ```
//!
//! ## Module Overview
//!
//! - [`map`]: the expiring map and its entry types
//! - [`sweep`]: the cleanup scheduler and tick source abstraction
//! - [`clock`]: the injectable clock capability
//!
//! ## Design Highlights
//!
//! ### Lazy + Active Expiry
//!
//! Entries are expired in two cooperating ways sharing one predicate
//! (`now >= expires_at` means absent):
//! 1. **Lazy**: every read checks expiry at access time, so a map is
//!    correct standalone, with no sweeper at all.
//! 2. **Active**: a [`Sweeper`] tick runs [`ExpiringMap::cleanup`], which
//!    physically removes expired entries under one time sample.
//!
//! Reads never mutate the map; physical removal is the sweeper's job (or an
//! explicit `remove`/`flush`).
//!
//! ### Lock Discipline
//!
//! Structural changes (`set`, `remove`, `flush`, `cleanup`) take the
//! map-wide write lock. Reads share the read lock. Expiry extension only
//! locates the entry under the read lock and then updates the expiry cell
//! atomically, so hot paths that keep sessions alive do not serialize.

pub mod clock;
pub mod map;
pub mod sweep;

// Re-export commonly used types for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use map::{Entry, ExpiringMap};
pub use sweep::{Cleanable, IntervalTicker, StartError, Sweeper, Ticker};
