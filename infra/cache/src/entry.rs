use chrono::{DateTime, TimeDelta, Utc};
use factgate_domain::outcome::FactResult;
use std::time::Duration;

/// A cached section value with its sampling and expiry times.
///
/// Entries are replaced on refresh, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    value: FactResult<T>,
    sampled_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    /// Wraps `value`, stamping it with its own sample time (or now) plus `ttl`.
    pub fn new(value: FactResult<T>, ttl: Duration) -> Self {
        let sampled_at = value.sampled_at().unwrap_or_else(Utc::now);
        let expires_at = TimeDelta::from_std(ttl)
            .ok()
            .and_then(|ttl| sampled_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self { value, sampled_at, expires_at }
    }

    #[must_use]
    pub const fn value(&self) -> &FactResult<T> {
        &self.value
    }

    pub fn into_value(self) -> FactResult<T> {
        self.value
    }

    #[must_use]
    pub const fn sampled_at(&self) -> DateTime<Utc> {
        self.sampled_at
    }

    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Wall-clock check; the cache itself expires entries on a monotonic clock.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
