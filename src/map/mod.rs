//! Expiring Map Module
//!
//! The core data structure: a thread-safe map whose entries carry a
//! per-entry time-to-live.
//!
//! ## Expiry Model
//!
//! - **Lazy Expiry**: every read filters out expired entries using the
//!   map's clock, without modifying the map.
//! - **Active Expiry**: [`ExpiringMap::cleanup`] physically removes expired
//!   entries; registering the map with a [`Sweeper`](crate::Sweeper) runs
//!   it periodically.
//!
//! A map is fully usable standalone with lazy expiry alone; expired entries
//! then stay physically stored until explicitly removed or flushed, but are
//! invisible to every read.
//!
//! ## Example
//!
//! ```
//! use expiremap::ExpiringMap;
//! use std::time::Duration;
//!
//! let map = ExpiringMap::new();
//!
//! map.set("rate:10.0.0.1", 3u32, Duration::from_secs(1));
//! assert_eq!(map.get(&"rate:10.0.0.1"), Some(3));
//! assert!(map.expiry_time(&"rate:10.0.0.1").is_some());
//! ```

mod entry;
mod expiring;

pub use entry::Entry;
pub use expiring::ExpiringMap;
