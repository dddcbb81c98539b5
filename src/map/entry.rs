//! Entry types for the expiring map.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};

/// Converts a duration to whole nanoseconds, saturating at `i64::MAX`.
pub(crate) fn nanos_i64(d: Duration) -> i64 {
    i64::try_from(d.as_nanos()).unwrap_or(i64::MAX)
}

/// A stored record: the payload plus an atomically adjustable expiry.
///
/// The expiry is kept as a nanosecond offset from the instant the record was
/// created. `adjust` mutates only this cell, so extending a key's lifetime
/// needs no exclusive access to the surrounding map. A non-positive offset
/// reads as already expired, which is how a large `shorten` lands.
#[derive(Debug)]
pub(crate) struct Slot<V> {
    value: V,
    set_at: Instant,
    expires: AtomicI64,
}

impl<V> Slot<V> {
    pub(crate) fn new(value: V, now: Instant, ttl: Duration) -> Self {
        Self {
            value,
            set_at: now,
            expires: AtomicI64::new(nanos_i64(ttl)),
        }
    }

    pub(crate) fn value(&self) -> &V {
        &self.value
    }

    /// Whether the record is expired as of `now`.
    pub(crate) fn is_expired_at(&self, now: Instant) -> bool {
        let elapsed = nanos_i64(now.saturating_duration_since(self.set_at));
        elapsed >= self.expires.load(Ordering::Acquire)
    }

    /// The absolute instant at which the record expires.
    pub(crate) fn expires_at(&self) -> Instant {
        let offset = self.expires.load(Ordering::Acquire);
        if offset <= 0 {
            self.set_at
        } else {
            self.set_at + Duration::from_nanos(offset as u64)
        }
    }

    /// Shifts the expiry by `delta` nanoseconds. Atomic; callers hold at
    /// most the map's shared lock.
    pub(crate) fn adjust(&self, delta: i64) {
        self.expires.fetch_add(delta, Ordering::AcqRel);
    }
}

/// An owned snapshot of a live entry, as returned by
/// [`ExpiringMap::get_entry`](crate::ExpiringMap::get_entry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<V> {
    /// The stored payload.
    pub value: V,
    /// The absolute instant at which the entry expires.
    pub expires_at: Instant,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_is_live_until_its_ttl_elapses() {
        let now = Instant::now();
        let slot = Slot::new("v", now, Duration::from_secs(10));

        assert!(!slot.is_expired_at(now));
        assert!(!slot.is_expired_at(now + Duration::from_secs(9)));
        assert!(slot.is_expired_at(now + Duration::from_secs(10)));
        assert!(slot.is_expired_at(now + Duration::from_secs(11)));
    }

    #[test]
    fn adjust_moves_the_expiry_exactly() {
        let now = Instant::now();
        let slot = Slot::new("v", now, Duration::from_secs(10));

        slot.adjust(nanos_i64(Duration::from_secs(5)));
        assert_eq!(slot.expires_at(), now + Duration::from_secs(15));

        slot.adjust(-nanos_i64(Duration::from_secs(12)));
        assert_eq!(slot.expires_at(), now + Duration::from_secs(3));
    }

    #[test]
    fn negative_offset_reads_as_expired() {
        let now = Instant::now();
        let slot = Slot::new("v", now, Duration::from_secs(1));

        slot.adjust(-nanos_i64(Duration::from_secs(60)));

        assert!(slot.is_expired_at(now));
        assert_eq!(slot.expires_at(), now);
    }

    #[test]
    fn oversized_ttl_saturates() {
        let now = Instant::now();
        let slot = Slot::new("v", now, Duration::MAX);
        assert!(!slot.is_expired_at(now + Duration::from_secs(3600)));
    }
}
