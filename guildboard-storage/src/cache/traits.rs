//! Loader contract and aliasing for cached records.

use async_trait::async_trait;
use guildboard_core::{
    CacheKey, GuildMetricSeries, GuildRecord, GuildboardResult, PlayerMetricSeries, PlayerRecord,
};

/// A record reachable under one or more cache keys.
pub trait CacheableRecord: Send + Sync + 'static {
    /// Every key this record is cached under. Duplicates are allowed.
    fn cache_keys(&self) -> Vec<CacheKey>;
}

/// Loads one record from the backing store on a miss.
///
/// `Ok(None)` means the record does not exist; it is never cached.
#[async_trait]
pub trait StorageFetcher<V>: Send + Sync {
    async fn fetch(&self, key: &CacheKey) -> GuildboardResult<Option<V>>;
}

/// Loads the single value of an aggregate cache (all guilds, autocomplete,
/// patron count).
#[async_trait]
pub trait AggregateFetcher<V>: Send + Sync {
    async fn fetch_all(&self) -> GuildboardResult<V>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    /// Reads that had to call the loader, including refreshes of stale entries.
    pub misses: u64,
    pub refresh_failures: u64,
    /// Entries removed by sweeps or invalidation.
    pub evictions: u64,
    /// Keys currently held, aliases counted separately.
    pub entry_count: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// ============================================================================
// ALIASES FOR LEADERBOARD RECORDS
// ============================================================================

impl CacheableRecord for GuildRecord {
    fn cache_keys(&self) -> Vec<CacheKey> {
        vec![CacheKey::new(&self.id), CacheKey::new(&self.name)]
    }
}

impl CacheableRecord for GuildMetricSeries {
    fn cache_keys(&self) -> Vec<CacheKey> {
        vec![CacheKey::new(&self.guild_id)]
    }
}

impl CacheableRecord for PlayerRecord {
    fn cache_keys(&self) -> Vec<CacheKey> {
        vec![CacheKey::new(&self.uuid), CacheKey::new(&self.name)]
    }
}

impl CacheableRecord for PlayerMetricSeries {
    fn cache_keys(&self) -> Vec<CacheKey> {
        vec![CacheKey::new(&self.uuid), CacheKey::new(&self.name)]
    }
}
