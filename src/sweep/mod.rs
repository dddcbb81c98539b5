//! Cleanup Scheduler Module
//!
//! Active expiry for one or more [`ExpiringMap`](crate::ExpiringMap)s (or
//! anything else implementing [`Cleanable`]): a [`Sweeper`] runs a single
//! background task that invokes every registered cleanup pass on each tick
//! of its tick source.
//!
//! ```text
//!  ┌──────────┐   tick   ┌─────────────────────────────┐
//!  │  Ticker  │ ───────> │  Sweeper task               │
//!  └──────────┘          │  for cb in registry { cb() }│
//!                        └──────────────┬──────────────┘
//!                                       │ cleanup()
//!                              ┌────────▼────────┐
//!                              │  Cleanable(s)   │
//!                              └─────────────────┘
//! ```
//!
//! The tick source is injectable, so scheduler behavior is testable without
//! real elapsed time.

mod sweeper;
mod ticker;

pub use sweeper::{Cleanable, StartError, Sweeper};
pub use ticker::{IntervalTicker, Ticker};
