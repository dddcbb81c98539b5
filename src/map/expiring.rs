//! The expiring map.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::clock::{Clock, SystemClock};
use crate::map::entry::{nanos_i64, Entry, Slot};
use crate::sweep::Cleanable;

/// A thread-safe map whose entries expire after a per-entry time-to-live.
///
/// Expiry happens in two ways:
/// 1. **Lazy**: every read checks the entry's expiry against the clock, so
///    an expired entry is invisible even if it is still physically stored.
/// 2. **Active**: [`cleanup`](ExpiringMap::cleanup) physically removes
///    expired entries; a [`Sweeper`](crate::Sweeper) can drive it
///    periodically.
///
/// Reads never modify the map. An expired entry stays in storage (and in
/// [`len`](ExpiringMap::len)) until it is swept or explicitly removed.
///
/// # Thread Safety
///
/// Designed to be wrapped in an `Arc` and shared across threads. Structural
/// writes (`set`, `remove`, `flush`, `cleanup`) serialize on a map-wide
/// write lock; reads share a read lock. [`extend`](ExpiringMap::extend) and
/// [`shorten`](ExpiringMap::shorten) only take the read lock and adjust the
/// entry's expiry atomically, so lifetime extensions of different keys do
/// not contend on the write lock.
///
/// # Example
///
/// ```
/// use expiremap::ExpiringMap;
/// use std::time::Duration;
///
/// let map = ExpiringMap::new();
///
/// map.set("session", "abc123", Duration::from_secs(60));
/// assert_eq!(map.get(&"session"), Some("abc123"));
///
/// map.remove(&"session");
/// assert_eq!(map.get(&"session"), None);
/// ```
pub struct ExpiringMap<K, V, C = SystemClock> {
    slots: RwLock<HashMap<K, Slot<V>>>,
    clock: C,
}

impl<K, V> ExpiringMap<K, V> {
    /// Creates an empty map backed by the system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<K, V> Default for ExpiringMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C: Clock> ExpiringMap<K, V, C> {
    /// Creates an empty map reading time from `clock`.
    ///
    /// Injecting a [`ManualClock`](crate::ManualClock) makes expiry fully
    /// deterministic in tests.
    pub fn with_clock(clock: C) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            clock,
        }
    }
}

impl<K, V, C> ExpiringMap<K, V, C>
where
    K: Eq + Hash,
    C: Clock,
{
    /// Inserts or overwrites the entry for `key`, expiring `ttl` from now.
    ///
    /// A prior entry for the same key is replaced entirely, including its
    /// expiry.
    pub fn set(&self, key: K, value: V, ttl: Duration) {
        let now = self.clock.now();
        self.slots
            .write()
            .unwrap()
            .insert(key, Slot::new(value, now, ttl));
    }

    /// Runs `f` against the stored record for `key` if it is live.
    fn read_live<R>(&self, key: &K, f: impl FnOnce(&Slot<V>, Instant) -> R) -> Option<R> {
        let now = self.clock.now();
        let slots = self.slots.read().unwrap();
        let slot = slots.get(key)?;
        if slot.is_expired_at(now) {
            None
        } else {
            Some(f(slot, now))
        }
    }

    /// Returns the value for `key`, or `None` if the key is absent or
    /// expired.
    ///
    /// The expiry check happens at read time against the map's clock, so the
    /// result is correct whether or not a sweep has run.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.read_live(key, |slot, _| slot.value().clone())
    }

    /// Returns a snapshot of the live entry for `key`: its value and its
    /// absolute expiry instant.
    pub fn get_entry(&self, key: &K) -> Option<Entry<V>>
    where
        V: Clone,
    {
        self.read_live(key, |slot, _| Entry {
            value: slot.value().clone(),
            expires_at: slot.expires_at(),
        })
    }

    /// Returns the absolute instant at which the live entry for `key`
    /// expires.
    pub fn expiry_time(&self, key: &K) -> Option<Instant> {
        self.read_live(key, |slot, _| slot.expires_at())
    }

    /// Returns the remaining time-to-live of the live entry for `key`.
    pub fn ttl(&self, key: &K) -> Option<Duration> {
        self.read_live(key, |slot, now| {
            slot.expires_at().saturating_duration_since(now)
        })
    }

    /// Returns true iff a live entry exists for `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.read_live(key, |_, _| ()).is_some()
    }

    /// Deletes any entry for `key`, live or expired.
    ///
    /// # Returns
    ///
    /// `true` if an entry was stored, `false` if the key was absent.
    pub fn remove(&self, key: &K) -> bool {
        self.slots.write().unwrap().remove(key).is_some()
    }

    /// Postpones the expiry of the live entry for `key` by `by`.
    ///
    /// Takes only shared map access; the expiry itself is adjusted
    /// atomically, so concurrent extensions each apply exactly once.
    ///
    /// # Returns
    ///
    /// `true` if a live entry existed, `false` otherwise (no effect).
    pub fn extend(&self, key: &K, by: Duration) -> bool {
        self.read_live(key, |slot, _| slot.adjust(nanos_i64(by)))
            .is_some()
    }

    /// Brings the expiry of the live entry for `key` forward by `by`.
    ///
    /// Shortening past the current instant makes the entry behave as absent
    /// from that point on.
    pub fn shorten(&self, key: &K, by: Duration) -> bool {
        self.read_live(key, |slot, _| slot.adjust(-nanos_i64(by)))
            .is_some()
    }

    /// Removes all entries unconditionally.
    pub fn flush(&self) {
        self.slots.write().unwrap().clear();
    }

    /// Returns the number of entries physically stored.
    ///
    /// This is a structural count: expired entries that have not been swept
    /// yet are included, so it can overcount the live entries.
    pub fn len(&self) -> usize {
        self.slots.read().unwrap().len()
    }

    /// Returns true if no entries are physically stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Physically deletes every expired entry.
    ///
    /// # Returns
    ///
    /// The number of entries removed.
    pub fn cleanup(&self) -> usize {
        let mut slots = self.slots.write().unwrap();
        // one time sample for the whole scan
        let now = self.clock.now();
        let before = slots.len();
        slots.retain(|_, slot| !slot.is_expired_at(now));
        before - slots.len()
    }
}

impl<K, V, C> Cleanable for ExpiringMap<K, V, C>
where
    K: Eq + Hash,
    C: Clock,
{
    fn cleanup(&self) -> usize {
        ExpiringMap::cleanup(self)
    }
}

impl<K, V, C> fmt::Debug for ExpiringMap<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringMap")
            .field("len", &self.slots.read().unwrap().len())
            .finish()
    }
}
