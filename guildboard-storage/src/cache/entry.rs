//! Cached values with their refresh time.

use std::time::Duration;

use guildboard_core::Timestamp;

/// A value paired with the instant it was last fully computed.
///
/// `fetched_at` is taken after the value (including any weighting) is
/// complete, never before the load started.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedEntry<V> {
    pub value: V,
    pub fetched_at: Timestamp,
}

impl<V> TimedEntry<V> {
    pub fn new(value: V, fetched_at: Timestamp) -> Self {
        Self { value, fetched_at }
    }

    /// Elapsed time since the refresh. Zero if the clock went backwards.
    pub fn age(&self, now: Timestamp) -> Duration {
        (now - self.fetched_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// Strictly older than `ttl`. An entry exactly `ttl` old is still fresh.
    pub fn is_stale(&self, ttl: Duration, now: Timestamp) -> bool {
        self.age(now) > ttl
    }
}

/// Staleness of an optional entry. Absent entries are always stale.
pub fn is_stale<V>(entry: Option<&TimedEntry<V>>, ttl: Duration, now: Timestamp) -> bool {
    entry.map_or(true, |entry| entry.is_stale(ttl, now))
}
