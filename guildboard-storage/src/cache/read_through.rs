//! Read-through cache with TTL expiry, aliasing and sweep eviction.
//!
//! One `ReadThroughCache` serves one namespace (guilds, players, ...). A read
//! returns the cached entry while it is younger than the namespace TTL and
//! otherwise calls the loader. A loaded record is stored under every key it
//! declares in a single write-lock acquisition. No lock is held while the
//! loader runs, so concurrent misses on one key may each load; the last write
//! wins.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use guildboard_core::{CacheKey, GuildboardError, GuildboardResult};
use tokio::sync::RwLock;

use super::clock::SharedClock;
use super::entry::TimedEntry;
use super::freshness::{CacheRead, Freshness};
use super::traits::{AggregateFetcher, CacheStats, CacheableRecord, StorageFetcher};

/// Configuration for one cache namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Name used in logs.
    pub namespace: &'static str,
    /// Maximum entry age before a read reloads it.
    pub ttl: Duration,
}

impl CacheConfig {
    pub fn new(namespace: &'static str, ttl: Duration) -> Self {
        Self { namespace, ttl }
    }

    /// Set the entry TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

#[derive(Debug, Default)]
struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    refresh_failures: AtomicU64,
    evictions: AtomicU64,
}

/// Outcome of the cache-side half of a read.
enum Lookup<V> {
    Fresh(CacheRead<Arc<V>>),
    /// Missing or past its TTL. Carries the expired entry, if any, for
    /// stale fallback.
    Expired(Option<TimedEntry<Arc<V>>>),
}

/// Keyed store of timed entries for one namespace.
pub struct ReadThroughCache<V> {
    config: CacheConfig,
    clock: SharedClock,
    entries: RwLock<HashMap<CacheKey, TimedEntry<Arc<V>>>>,
    counters: CacheCounters,
}

impl<V> std::fmt::Debug for ReadThroughCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadThroughCache")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl<V: Send + Sync + 'static> ReadThroughCache<V> {
    pub fn new(config: CacheConfig, clock: SharedClock) -> Self {
        Self {
            config,
            clock,
            entries: RwLock::new(HashMap::new()),
            counters: CacheCounters::default(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn namespace(&self) -> &'static str {
        self.config.namespace
    }

    /// Read the single value of an aggregate cache, loading it if needed.
    pub async fn get_aggregate<F>(
        &self,
        freshness: Freshness,
        fetcher: &F,
    ) -> GuildboardResult<CacheRead<Arc<V>>>
    where
        F: AggregateFetcher<V> + ?Sized,
    {
        let key = CacheKey::aggregate();
        let previous = match self.lookup(&key).await {
            Lookup::Fresh(read) => return Ok(read),
            Lookup::Expired(previous) => previous,
        };

        match fetcher.fetch_all().await {
            Ok(value) => Ok(self.store(value, vec![key]).await),
            Err(err) => self.recover(&key, freshness, previous, err),
        }
    }

    /// Remove every entry older than the TTL.
    ///
    /// Age is measured against the clock read after the write lock is
    /// taken, so an entry refreshed while the sweep waited for the lock
    /// survives.
    pub async fn sweep(&self) -> usize {
        let mut entries = self.entries.write().await;
        let now = self.clock.now();
        let ttl = self.config.ttl;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_stale(ttl, now));
        let evicted = before - entries.len();
        drop(entries);

        if evicted > 0 {
            self.counters
                .evictions
                .fetch_add(evicted as u64, Ordering::Relaxed);
        }
        tracing::debug!(
            namespace = self.config.namespace,
            evicted,
            "Cache sweep completed"
        );
        evicted
    }

    /// Drop every entry.
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.write().await;
        let removed = entries.len();
        entries.clear();
        self.counters
            .evictions
            .fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    /// Number of keys held, aliases counted separately.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Whether `key` is present, fresh or not.
    pub async fn contains(&self, key: &CacheKey) -> bool {
        self.entries.read().await.contains_key(key)
    }

    pub async fn stats(&self) -> CacheStats {
        let entry_count = self.entries.read().await.len() as u64;
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            refresh_failures: self.counters.refresh_failures.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            entry_count,
        }
    }

    async fn lookup(&self, key: &CacheKey) -> Lookup<V> {
        let now = self.clock.now();
        let cached = self.entries.read().await.get(key).cloned();

        match cached {
            Some(entry) if !entry.is_stale(self.config.ttl, now) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                Lookup::Fresh(CacheRead::from_cache(entry.value, entry.fetched_at))
            }
            previous => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    namespace = self.config.namespace,
                    key = %key,
                    expired = previous.is_some(),
                    "Refreshing cache entry"
                );
                Lookup::Expired(previous)
            }
        }
    }

    /// Write one value under all of its aliases.
    async fn store(&self, value: V, mut aliases: Vec<CacheKey>) -> CacheRead<Arc<V>> {
        aliases.retain(|alias| !alias.is_empty());
        aliases.sort();
        aliases.dedup();

        let value = Arc::new(value);
        let mut entries = self.entries.write().await;
        let fetched_at = self.clock.now();
        for alias in aliases {
            entries.insert(alias, TimedEntry::new(Arc::clone(&value), fetched_at));
        }
        drop(entries);

        CacheRead::from_storage(value, fetched_at)
    }

    fn recover(
        &self,
        key: &CacheKey,
        freshness: Freshness,
        previous: Option<TimedEntry<Arc<V>>>,
        err: GuildboardError,
    ) -> GuildboardResult<CacheRead<Arc<V>>> {
        self.counters
            .refresh_failures
            .fetch_add(1, Ordering::Relaxed);

        match previous {
            Some(entry) if freshness.tolerates_stale() => {
                tracing::warn!(
                    namespace = self.config.namespace,
                    key = %key,
                    error = %err,
                    "Cache refresh failed, serving stale entry"
                );
                Ok(CacheRead::stale_fallback(entry.value, entry.fetched_at))
            }
            _ => {
                tracing::warn!(
                    namespace = self.config.namespace,
                    key = %key,
                    error = %err,
                    "Cache refresh failed"
                );
                Err(err)
            }
        }
    }
}

impl<V: CacheableRecord> ReadThroughCache<V> {
    /// Read a record, loading it on miss or expiry.
    ///
    /// Returns `Ok(None)` when the loader finds nothing; that outcome is not
    /// cached, so the next read asks the loader again.
    pub async fn get<F>(
        &self,
        key: &CacheKey,
        freshness: Freshness,
        fetcher: &F,
    ) -> GuildboardResult<Option<CacheRead<Arc<V>>>>
    where
        F: StorageFetcher<V> + ?Sized,
    {
        let previous = match self.lookup(key).await {
            Lookup::Fresh(read) => return Ok(Some(read)),
            Lookup::Expired(previous) => previous,
        };

        match fetcher.fetch(key).await {
            Ok(Some(value)) => {
                let aliases = value.cache_keys();
                Ok(Some(self.store(value, aliases).await))
            }
            Ok(None) => {
                tracing::debug!(
                    namespace = self.config.namespace,
                    key = %key,
                    "Record not found"
                );
                Ok(None)
            }
            Err(err) => self.recover(key, freshness, previous, err).map(Some),
        }
    }

    /// Insert a record under all of its aliases with a fresh timestamp.
    pub async fn put(&self, value: V) -> Arc<V> {
        let aliases = value.cache_keys();
        self.store(value, aliases).await.into_value()
    }

    /// Remove `key` and every alias that points at the same record.
    pub async fn invalidate(&self, key: &CacheKey) -> usize {
        let mut entries = self.entries.write().await;
        let Some(entry) = entries.remove(key) else {
            return 0;
        };

        let mut removed = 1;
        for alias in entry.value.cache_keys() {
            let same_record = entries
                .get(&alias)
                .is_some_and(|other| Arc::ptr_eq(&other.value, &entry.value));
            if same_record {
                entries.remove(&alias);
                removed += 1;
            }
        }
        drop(entries);

        self.counters
            .evictions
            .fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::ManualClock;
    use async_trait::async_trait;
    use guildboard_core::UpstreamError;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    struct Named {
        id: String,
        name: String,
        version: u32,
    }

    impl CacheableRecord for Named {
        fn cache_keys(&self) -> Vec<CacheKey> {
            vec![CacheKey::new(&self.id), CacheKey::new(&self.name)]
        }
    }

    #[derive(Default)]
    struct CountingFetcher {
        records: Mutex<Vec<Named>>,
        calls: AtomicUsize,
        failing: AtomicBool,
    }

    impl CountingFetcher {
        fn with(record: Named) -> Self {
            let fetcher = Self::default();
            fetcher.records.lock().expect("records lock").push(record);
            fetcher
        }

        fn replace(&self, record: Named) {
            *self.records.lock().expect("records lock") = vec![record];
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StorageFetcher<Named> for CountingFetcher {
        async fn fetch(&self, key: &CacheKey) -> GuildboardResult<Option<Named>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(GuildboardError::unavailable("test-store", "offline"));
            }
            let records = self.records.lock().expect("records lock");
            Ok(records
                .iter()
                .find(|r| CacheKey::new(&r.id) == *key || CacheKey::new(&r.name) == *key)
                .cloned())
        }
    }

    #[async_trait]
    impl AggregateFetcher<Vec<Named>> for CountingFetcher {
        async fn fetch_all(&self) -> GuildboardResult<Vec<Named>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(GuildboardError::unavailable("test-store", "offline"));
            }
            Ok(self.records.lock().expect("records lock").clone())
        }
    }

    fn lucid(version: u32) -> Named {
        Named {
            id: "5e264d398ea8c9feb3f0bdd6".to_string(),
            name: "Lucid".to_string(),
            version,
        }
    }

    fn cache_with_clock<V: Send + Sync + 'static>() -> (ReadThroughCache<V>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        let cache = ReadThroughCache::new(
            CacheConfig::new("test", Duration::from_secs(60)),
            clock.clone(),
        );
        (cache, clock)
    }

    #[tokio::test]
    async fn test_second_read_within_ttl_is_a_hit() {
        let (cache, clock) = cache_with_clock::<Named>();
        let fetcher = CountingFetcher::with(lucid(1));
        let key = CacheKey::new("lucid");

        let first = cache.get(&key, Freshness::Strict, &fetcher).await.unwrap().unwrap();
        assert!(first.was_cache_miss());

        clock.advance_secs(30);
        let second = cache.get(&key, Freshness::Strict, &fetcher).await.unwrap().unwrap();
        assert!(second.was_cache_hit());
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(second.value().version, 1);
    }

    #[tokio::test]
    async fn test_read_after_ttl_reloads() {
        let (cache, clock) = cache_with_clock::<Named>();
        let fetcher = CountingFetcher::with(lucid(1));
        let key = CacheKey::new("lucid");

        cache.get(&key, Freshness::Strict, &fetcher).await.unwrap();
        fetcher.replace(lucid(2));
        clock.advance_secs(61);

        let read = cache.get(&key, Freshness::Strict, &fetcher).await.unwrap().unwrap();
        assert!(read.was_cache_miss());
        assert_eq!(read.value().version, 2);
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_load_under_one_alias_serves_the_other() {
        let (cache, _clock) = cache_with_clock::<Named>();
        let fetcher = CountingFetcher::with(lucid(1));

        cache
            .get(&CacheKey::new("5e264d398ea8c9feb3f0bdd6"), Freshness::Strict, &fetcher)
            .await
            .unwrap();
        let by_name = cache
            .get(&CacheKey::new("LUCID"), Freshness::Strict, &fetcher)
            .await
            .unwrap()
            .unwrap();

        assert!(by_name.was_cache_hit());
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_not_found_is_not_cached() {
        let (cache, _clock) = cache_with_clock::<Named>();
        let fetcher = CountingFetcher::default();
        let key = CacheKey::new("ghost");

        assert!(cache.get(&key, Freshness::Strict, &fetcher).await.unwrap().is_none());
        assert!(cache.get(&key, Freshness::Strict, &fetcher).await.unwrap().is_none());
        assert_eq!(fetcher.calls(), 2);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_strict_read_surfaces_refresh_failure() {
        let (cache, clock) = cache_with_clock::<Named>();
        let fetcher = CountingFetcher::with(lucid(1));
        let key = CacheKey::new("lucid");

        cache.get(&key, Freshness::Strict, &fetcher).await.unwrap();
        clock.advance_secs(61);
        fetcher.failing.store(true, Ordering::SeqCst);

        let err = cache
            .get(&key, Freshness::Strict, &fetcher)
            .await
            .expect_err("strict read must fail");
        assert!(err.is_transient());
        assert_eq!(cache.stats().await.refresh_failures, 1);
        // The expired entry is still there for a later tolerant read.
        assert!(cache.contains(&key).await);
    }

    #[tokio::test]
    async fn test_tolerant_read_serves_stale_entry() {
        let (cache, clock) = cache_with_clock::<Named>();
        let fetcher = CountingFetcher::with(lucid(1));
        let key = CacheKey::new("lucid");

        let loaded = cache.get(&key, Freshness::Strict, &fetcher).await.unwrap().unwrap();
        clock.advance_secs(61);
        fetcher.failing.store(true, Ordering::SeqCst);

        let stale = cache
            .get(&key, Freshness::TolerateStale, &fetcher)
            .await
            .unwrap()
            .unwrap();
        assert!(stale.is_stale());
        assert_eq!(stale.fetched_at(), loaded.fetched_at());
        assert_eq!(stale.value().version, 1);
    }

    #[tokio::test]
    async fn test_tolerant_read_without_entry_still_fails() {
        let (cache, _clock) = cache_with_clock::<Named>();
        let fetcher = CountingFetcher::default();
        fetcher.failing.store(true, Ordering::SeqCst);

        let result = cache
            .get(&CacheKey::new("lucid"), Freshness::TolerateStale, &fetcher)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired_entries() {
        let (cache, clock) = cache_with_clock::<Named>();
        let old = CountingFetcher::with(lucid(1));
        cache.get(&CacheKey::new("lucid"), Freshness::Strict, &old).await.unwrap();

        clock.advance_secs(45);
        let recent = CountingFetcher::with(Named {
            id: "abc".to_string(),
            name: "Fresh".to_string(),
            version: 1,
        });
        cache.get(&CacheKey::new("fresh"), Freshness::Strict, &recent).await.unwrap();

        clock.advance_secs(30);
        let evicted = cache.sweep().await;

        assert_eq!(evicted, 2);
        assert!(!cache.contains(&CacheKey::new("lucid")).await);
        assert!(cache.contains(&CacheKey::new("fresh")).await);
        assert!(cache.contains(&CacheKey::new("abc")).await);
        assert_eq!(cache.stats().await.evictions, 2);
    }

    #[tokio::test]
    async fn test_invalidate_drops_all_aliases() {
        let (cache, _clock) = cache_with_clock::<Named>();
        cache.put(lucid(1)).await;
        assert_eq!(cache.len().await, 2);

        let removed = cache.invalidate(&CacheKey::new("Lucid")).await;
        assert_eq!(removed, 2);
        assert!(cache.is_empty().await);
        assert_eq!(cache.invalidate(&CacheKey::new("lucid")).await, 0);
    }

    #[tokio::test]
    async fn test_aggregate_cached_until_ttl() {
        let (cache, clock) = cache_with_clock::<Vec<Named>>();
        let fetcher = CountingFetcher::with(lucid(1));

        let first = cache.get_aggregate(Freshness::Strict, &fetcher).await.unwrap();
        assert_eq!(first.value().len(), 1);
        cache.get_aggregate(Freshness::Strict, &fetcher).await.unwrap();
        assert_eq!(fetcher.calls(), 1);

        clock.advance_secs(61);
        cache.get_aggregate(Freshness::Strict, &fetcher).await.unwrap();
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_aggregate_tolerates_stale() {
        let (cache, clock) = cache_with_clock::<Vec<Named>>();
        let fetcher = CountingFetcher::with(lucid(1));
        cache.get_aggregate(Freshness::Strict, &fetcher).await.unwrap();

        clock.advance_secs(61);
        fetcher.failing.store(true, Ordering::SeqCst);
        let stale = cache
            .get_aggregate(Freshness::TolerateStale, &fetcher)
            .await
            .unwrap();
        assert!(stale.is_stale());

        let strict = cache.get_aggregate(Freshness::Strict, &fetcher).await;
        assert!(matches!(
            strict,
            Err(GuildboardError::Upstream(UpstreamError::Unavailable { .. }))
        ));
    }

    #[tokio::test]
    async fn test_stats_track_hits_and_misses() {
        let (cache, _clock) = cache_with_clock::<Named>();
        let fetcher = CountingFetcher::with(lucid(1));
        let key = CacheKey::new("lucid");
        for _ in 0..4 {
            cache.get(&key, Freshness::Strict, &fetcher).await.unwrap();
        }
        let stats = cache.stats().await;
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.entry_count, 2);
        assert!((stats.hit_rate() - 0.75).abs() < 0.001);
    }

    #[test]
    fn test_cache_config_builder() {
        let config = CacheConfig::new("guild", Duration::from_secs(60)).with_ttl(Duration::from_secs(5));
        assert_eq!(config.namespace, "guild");
        assert_eq!(config.ttl, Duration::from_secs(5));
    }
}
