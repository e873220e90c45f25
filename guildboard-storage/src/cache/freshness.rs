//! Freshness contracts for cache reads.
//!
//! Callers choose what happens when a refresh fails, and every read carries
//! enough metadata to tell a cache hit from a load and a stale fallback from
//! a fresh value.

use std::time::Duration;

use guildboard_core::Timestamp;

/// What a read does when the refresh of a stale entry fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Freshness {
    /// Surface the loader error.
    #[default]
    Strict,

    /// Serve the previous entry, marked stale, if one exists.
    ///
    /// A missing entry still surfaces the error.
    TolerateStale,
}

impl Freshness {
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Strict)
    }

    pub fn tolerates_stale(&self) -> bool {
        matches!(self, Self::TolerateStale)
    }
}

/// Result of a cache read, carrying staleness metadata.
#[derive(Debug, Clone)]
pub struct CacheRead<T> {
    value: T,
    /// When the value was computed.
    fetched_at: Timestamp,
    was_cache_hit: bool,
    /// Served past its TTL because the refresh failed.
    is_stale: bool,
}

impl<T> CacheRead<T> {
    /// A fresh entry served from the cache.
    pub fn from_cache(value: T, fetched_at: Timestamp) -> Self {
        Self {
            value,
            fetched_at,
            was_cache_hit: true,
            is_stale: false,
        }
    }

    /// A value just loaded from the backing store.
    pub fn from_storage(value: T, fetched_at: Timestamp) -> Self {
        Self {
            value,
            fetched_at,
            was_cache_hit: false,
            is_stale: false,
        }
    }

    /// An expired entry served because its refresh failed.
    pub fn stale_fallback(value: T, fetched_at: Timestamp) -> Self {
        Self {
            value,
            fetched_at,
            was_cache_hit: true,
            is_stale: true,
        }
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn fetched_at(&self) -> Timestamp {
        self.fetched_at
    }

    /// Time since the value was computed, as seen at `now`.
    pub fn staleness(&self, now: Timestamp) -> Duration {
        (now - self.fetched_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// Whether the value was computed at or after `timestamp`.
    pub fn is_fresh_as_of(&self, timestamp: Timestamp) -> bool {
        self.fetched_at >= timestamp
    }

    pub fn was_cache_hit(&self) -> bool {
        self.was_cache_hit
    }

    pub fn was_cache_miss(&self) -> bool {
        !self.was_cache_hit
    }

    pub fn is_stale(&self) -> bool {
        self.is_stale
    }

    pub fn map<U, F>(self, f: F) -> CacheRead<U>
    where
        F: FnOnce(T) -> U,
    {
        CacheRead {
            value: f(self.value),
            fetched_at: self.fetched_at,
            was_cache_hit: self.was_cache_hit,
            is_stale: self.is_stale,
        }
    }
}

impl<T> AsRef<T> for CacheRead<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}
