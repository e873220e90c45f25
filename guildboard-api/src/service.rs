//! Leaderboard Service
//!
//! The read API the web layer calls. Lookups go through one
//! [`ReadThroughCache`] per namespace; paged history and ranking queries go
//! straight to the store.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use guildboard_core::{
    fix_history_order, AutocompleteEntry, CacheKey, GuildHistoryItem, GuildMetricSeries,
    GuildRecord, GuildSummary, GuildboardResult, HistoryFilter, HistoryPage, PageRequest,
    PageResult, PlayerHistoryItem, PlayerMetricSeries, PlayerRankingRow, PlayerRecord,
    RankingQuery, SitemapLinks, Stats,
};
use guildboard_storage::{
    CacheConfig, CacheRead, CacheStats, Freshness, LeaderboardStore, PatronSource,
    ReadThroughCache, SharedClock, SystemClock,
};
use serde::Serialize;

use crate::config::ServiceConfig;
use crate::fetchers::{
    AutocompleteFetcher, GuildFetcher, GuildMetricsFetcher, GuildsFetcher, PatronFetcher,
    PlayerFetcher, PlayerMetricsFetcher, SitemapFetcher,
};

// ============================================================================
// NAMESPACES
// ============================================================================

pub const NS_GUILDS: &str = "guilds";
pub const NS_GUILD: &str = "guild";
pub const NS_GUILD_METRICS: &str = "guild_metrics";
pub const NS_PLAYER: &str = "player";
pub const NS_PLAYER_METRICS: &str = "player_metrics";
pub const NS_AUTOCOMPLETE: &str = "autocomplete";
pub const NS_PATRONS: &str = "patrons";
pub const NS_SITEMAP: &str = "sitemap";

fn namespace<V: Send + Sync + 'static>(
    name: &'static str,
    ttl: Duration,
    clock: &SharedClock,
) -> ReadThroughCache<V> {
    ReadThroughCache::new(CacheConfig::new(name, ttl), clock.clone())
}

/// Entries evicted by one sweep, per namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub evicted: BTreeMap<&'static str, usize>,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.evicted.values().sum()
    }

    pub fn evicted_from(&self, namespace: &str) -> usize {
        self.evicted.get(namespace).copied().unwrap_or(0)
    }
}

// ============================================================================
// SERVICE
// ============================================================================

/// Cached read access to guilds, players and their history.
///
/// Shared between request handlers and the sweep job behind an `Arc`.
pub struct LeaderboardService {
    store: Arc<dyn LeaderboardStore>,
    patron_source: Arc<dyn PatronSource>,
    clock: SharedClock,
    freshness: Freshness,

    guilds: ReadThroughCache<Vec<GuildSummary>>,
    guild: ReadThroughCache<GuildRecord>,
    guild_metrics: ReadThroughCache<GuildMetricSeries>,
    player: ReadThroughCache<PlayerRecord>,
    player_metrics: ReadThroughCache<PlayerMetricSeries>,
    autocomplete: ReadThroughCache<Vec<AutocompleteEntry>>,
    patrons: ReadThroughCache<u64>,
    sitemap: ReadThroughCache<SitemapLinks>,
}

impl std::fmt::Debug for LeaderboardService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeaderboardService")
            .field("freshness", &self.freshness)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl LeaderboardService {
    /// Create a service over `store`, reading time from `clock`.
    pub fn new(
        store: Arc<dyn LeaderboardStore>,
        patron_source: Arc<dyn PatronSource>,
        config: &ServiceConfig,
        clock: SharedClock,
    ) -> Self {
        let ttls = &config.ttls;

        Self {
            guilds: namespace(NS_GUILDS, ttls.guilds, &clock),
            guild: namespace(NS_GUILD, ttls.guild, &clock),
            guild_metrics: namespace(NS_GUILD_METRICS, ttls.guild_metrics, &clock),
            player: namespace(NS_PLAYER, ttls.player, &clock),
            player_metrics: namespace(NS_PLAYER_METRICS, ttls.player_metrics, &clock),
            autocomplete: namespace(NS_AUTOCOMPLETE, ttls.autocomplete, &clock),
            patrons: namespace(NS_PATRONS, ttls.patrons, &clock),
            sitemap: namespace(NS_SITEMAP, ttls.sitemap, &clock),
            store,
            patron_source,
            clock,
            freshness: config.freshness(),
        }
    }

    /// Create a service on the system UTC clock.
    pub fn with_system_clock(
        store: Arc<dyn LeaderboardStore>,
        patron_source: Arc<dyn PatronSource>,
        config: &ServiceConfig,
    ) -> Self {
        Self::new(store, patron_source, config, SystemClock::shared())
    }

    pub fn freshness(&self) -> Freshness {
        self.freshness
    }

    // ========================================================================
    // GUILDS
    // ========================================================================

    /// Every guild with weights applied.
    pub async fn get_all(&self) -> GuildboardResult<Arc<Vec<GuildSummary>>> {
        let fetcher = GuildsFetcher {
            store: self.store.as_ref(),
            clock: self.clock.as_ref(),
        };
        self.guilds
            .get_aggregate(self.freshness, &fetcher)
            .await
            .map(CacheRead::into_value)
    }

    /// One guild by id or name. Returns `None` for an unknown or empty key.
    pub async fn get_one(&self, key: &str) -> GuildboardResult<Option<Arc<GuildRecord>>> {
        let key = CacheKey::new(key);
        if key.is_empty() {
            return Ok(None);
        }
        let fetcher = GuildFetcher {
            store: self.store.as_ref(),
            clock: self.clock.as_ref(),
        };
        let result = self.guild.get(&key, self.freshness, &fetcher).await;
        result.map(|read| read.map(CacheRead::into_value))
    }

    /// Metric history of one guild, by guild id.
    pub async fn get_metrics_series(
        &self,
        guild_id: &str,
    ) -> GuildboardResult<Option<Arc<GuildMetricSeries>>> {
        let key = CacheKey::new(guild_id);
        if key.is_empty() {
            return Ok(None);
        }
        let fetcher = GuildMetricsFetcher {
            store: self.store.as_ref(),
            clock: self.clock.as_ref(),
        };
        let result = self.guild_metrics.get(&key, self.freshness, &fetcher).await;
        result.map(|read| read.map(CacheRead::into_value))
    }

    pub async fn get_autocomplete(&self) -> GuildboardResult<Arc<Vec<AutocompleteEntry>>> {
        let fetcher = AutocompleteFetcher {
            store: self.store.as_ref(),
        };
        self.autocomplete
            .get_aggregate(self.freshness, &fetcher)
            .await
            .map(CacheRead::into_value)
    }

    /// Names of every guild and player, refreshed hourly by default.
    pub async fn get_sitemap(&self) -> GuildboardResult<Arc<SitemapLinks>> {
        let fetcher = SitemapFetcher {
            store: self.store.as_ref(),
        };
        self.sitemap
            .get_aggregate(self.freshness, &fetcher)
            .await
            .map(CacheRead::into_value)
    }

    // ========================================================================
    // PLAYERS
    // ========================================================================

    /// One player by uuid or name.
    pub async fn get_player(&self, key: &str) -> GuildboardResult<Option<Arc<PlayerRecord>>> {
        let key = CacheKey::new(key);
        if key.is_empty() {
            return Ok(None);
        }
        let fetcher = PlayerFetcher {
            store: self.store.as_ref(),
            clock: self.clock.as_ref(),
        };
        let result = self.player.get(&key, self.freshness, &fetcher).await;
        result.map(|read| read.map(CacheRead::into_value))
    }

    pub async fn get_player_metrics(
        &self,
        key: &str,
    ) -> GuildboardResult<Option<Arc<PlayerMetricSeries>>> {
        let key = CacheKey::new(key);
        if key.is_empty() {
            return Ok(None);
        }
        let fetcher = PlayerMetricsFetcher {
            store: self.store.as_ref(),
            clock: self.clock.as_ref(),
        };
        let result = self.player_metrics.get(&key, self.freshness, &fetcher).await;
        result.map(|read| read.map(CacheRead::into_value))
    }

    // ========================================================================
    // PAGED QUERIES
    // ========================================================================

    /// One page of the membership log, filtered by exactly one of guild id
    /// or player uuid.
    ///
    /// Player pages are repaired with [`fix_history_order`] before
    /// projection; guild pages are returned in store order.
    pub async fn get_history_page(
        &self,
        guild_id: Option<&str>,
        player_uuid: Option<&str>,
        page: i64,
        per_page: i64,
    ) -> GuildboardResult<HistoryPage> {
        let filter = HistoryFilter::from_params(guild_id, player_uuid)?;
        let request = PageRequest::new(page, per_page);

        let (events, total) = self.store.load_history_page(&filter, request).await?;
        tracing::debug!(
            filter = ?filter,
            page = request.page(),
            per_page = request.per_page(),
            returned = events.len(),
            total,
            "Loaded history page"
        );

        let history = match filter {
            HistoryFilter::Player(_) => {
                let items = fix_history_order(events)
                    .into_iter()
                    .map(PlayerHistoryItem::from)
                    .collect();
                HistoryPage::Player(PageResult::new(items, request, total))
            }
            HistoryFilter::Guild(_) => {
                let items = events.into_iter().map(GuildHistoryItem::from).collect();
                HistoryPage::Guild(PageResult::new(items, request, total))
            }
        };
        Ok(history)
    }

    /// One page of the player ranking, 25 rows per page.
    ///
    /// An unknown sort field fails before the store is queried.
    pub async fn get_player_ranking_page(
        &self,
        sort_field: &str,
        reverse: bool,
        page: i64,
        username_prefix: Option<&str>,
    ) -> GuildboardResult<PageResult<PlayerRankingRow>> {
        let query = RankingQuery::parse(sort_field, reverse, page, username_prefix)?;
        let (rows, total) = self.store.load_ranking_page(&query).await?;
        tracing::debug!(
            sort_field = %query.sort_field,
            reverse,
            page = query.page.page(),
            total,
            "Loaded ranking page"
        );
        Ok(PageResult::new(rows, query.page, total))
    }

    // ========================================================================
    // STATS
    // ========================================================================

    /// Site-wide counters derived from the all-guilds view.
    ///
    /// A failing patron source degrades to `patrons: None` instead of
    /// failing the whole view.
    pub async fn get_stats(&self) -> GuildboardResult<Stats> {
        let guilds = self.get_all().await?;
        let fetcher = PatronFetcher {
            source: self.patron_source.as_ref(),
        };
        let patrons = match self.patrons.get_aggregate(self.freshness, &fetcher).await {
            Ok(read) => Some(*read.into_value()),
            Err(e) => {
                tracing::warn!(error = %e, "Patron count unavailable");
                None
            }
        };
        Ok(Stats::from_guilds(&guilds, patrons))
    }

    // ========================================================================
    // MAINTENANCE
    // ========================================================================

    /// Evict expired entries from every namespace.
    pub async fn sweep(&self) -> SweepReport {
        let mut evicted = BTreeMap::new();
        evicted.insert(NS_GUILDS, self.guilds.sweep().await);
        evicted.insert(NS_GUILD, self.guild.sweep().await);
        evicted.insert(NS_GUILD_METRICS, self.guild_metrics.sweep().await);
        evicted.insert(NS_PLAYER, self.player.sweep().await);
        evicted.insert(NS_PLAYER_METRICS, self.player_metrics.sweep().await);
        evicted.insert(NS_AUTOCOMPLETE, self.autocomplete.sweep().await);
        evicted.insert(NS_PATRONS, self.patrons.sweep().await);
        evicted.insert(NS_SITEMAP, self.sitemap.sweep().await);
        SweepReport { evicted }
    }

    /// Usage counters per namespace.
    pub async fn cache_stats(&self) -> BTreeMap<&'static str, CacheStats> {
        let mut stats = BTreeMap::new();
        stats.insert(NS_GUILDS, self.guilds.stats().await);
        stats.insert(NS_GUILD, self.guild.stats().await);
        stats.insert(NS_GUILD_METRICS, self.guild_metrics.stats().await);
        stats.insert(NS_PLAYER, self.player.stats().await);
        stats.insert(NS_PLAYER_METRICS, self.player_metrics.stats().await);
        stats.insert(NS_AUTOCOMPLETE, self.autocomplete.stats().await);
        stats.insert(NS_PATRONS, self.patrons.stats().await);
        stats.insert(NS_SITEMAP, self.sitemap.stats().await);
        stats
    }

    /// Drop a guild and all of its aliases from the guild cache.
    pub async fn invalidate_guild(&self, key: &str) -> usize {
        self.guild.invalidate(&CacheKey::new(key)).await
    }

    /// Drop a player and all of its aliases from the player cache.
    pub async fn invalidate_player(&self, key: &str) -> usize {
        self.player.invalidate(&CacheKey::new(key)).await
    }
}
