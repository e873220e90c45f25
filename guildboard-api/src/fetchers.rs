//! Storage fetchers backing each cache namespace.
//!
//! Each fetcher borrows the store and clock for the duration of one cache
//! miss, loads raw rows, and assembles the view the cache holds. Ages and
//! weights are computed here, at refresh time, so a cached value reflects
//! the moment it was loaded.

use async_trait::async_trait;
use guildboard_core::{
    guild_lookup_order, player_lookup_order, AutocompleteEntry, CacheKey, GuildMetricSeries,
    GuildRecord, GuildRow, GuildSummary, GuildboardResult, LookupKind, PlayerMetricSeries,
    PlayerRecord, PlayerRow, SitemapLinks,
};
use guildboard_storage::{AggregateFetcher, Clock, LeaderboardStore, PatronSource, StorageFetcher};

// ============================================================================
// GUILDS
// ============================================================================

/// Storage fetcher for the all-guilds view.
pub(crate) struct GuildsFetcher<'a> {
    pub store: &'a dyn LeaderboardStore,
    pub clock: &'a dyn Clock,
}

#[async_trait]
impl AggregateFetcher<Vec<GuildSummary>> for GuildsFetcher<'_> {
    async fn fetch_all(&self) -> GuildboardResult<Vec<GuildSummary>> {
        let rows = self.store.load_guild_summaries().await?;
        let now = self.clock.now();
        Ok(rows
            .into_iter()
            .map(|row| GuildSummary::from_row(row, now))
            .collect())
    }
}

/// Storage fetcher for single guilds, by id or by name.
pub(crate) struct GuildFetcher<'a> {
    pub store: &'a dyn LeaderboardStore,
    pub clock: &'a dyn Clock,
}

impl GuildFetcher<'_> {
    async fn resolve(&self, candidate: &str) -> GuildboardResult<Option<GuildRow>> {
        for kind in guild_lookup_order(candidate) {
            let found = match kind {
                LookupKind::Id => self.store.load_guild_by_id(candidate).await?,
                LookupKind::Name => self.store.load_guild_by_name(candidate).await?,
            };
            if found.is_some() {
                return Ok(found);
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl StorageFetcher<GuildRecord> for GuildFetcher<'_> {
    async fn fetch(&self, key: &CacheKey) -> GuildboardResult<Option<GuildRecord>> {
        let Some(row) = self.resolve(key.as_str()).await? else {
            return Ok(None);
        };
        let members = self.store.load_players(&row.member_uuids).await?;
        let discord = self.store.load_guild_discord(&row.id).await?;
        Ok(Some(GuildRecord::assemble(row, members, discord, self.clock.now())))
    }
}

/// Storage fetcher for guild metric series. Keyed by guild id only.
pub(crate) struct GuildMetricsFetcher<'a> {
    pub store: &'a dyn LeaderboardStore,
    pub clock: &'a dyn Clock,
}

#[async_trait]
impl StorageFetcher<GuildMetricSeries> for GuildMetricsFetcher<'_> {
    async fn fetch(&self, key: &CacheKey) -> GuildboardResult<Option<GuildMetricSeries>> {
        let rows = self.store.load_guild_metrics(key.as_str()).await?;
        Ok(GuildMetricSeries::from_rows(key.as_str(), rows, self.clock.now()))
    }
}

/// Storage fetcher for the autocomplete list.
pub(crate) struct AutocompleteFetcher<'a> {
    pub store: &'a dyn LeaderboardStore,
}

#[async_trait]
impl AggregateFetcher<Vec<AutocompleteEntry>> for AutocompleteFetcher<'_> {
    async fn fetch_all(&self) -> GuildboardResult<Vec<AutocompleteEntry>> {
        self.store.load_autocomplete().await
    }
}

/// Storage fetcher for the sitemap name lists.
pub(crate) struct SitemapFetcher<'a> {
    pub store: &'a dyn LeaderboardStore,
}

#[async_trait]
impl AggregateFetcher<SitemapLinks> for SitemapFetcher<'_> {
    async fn fetch_all(&self) -> GuildboardResult<SitemapLinks> {
        self.store.load_sitemap_links().await
    }
}

// ============================================================================
// PLAYERS
// ============================================================================

async fn resolve_player(
    store: &dyn LeaderboardStore,
    candidate: &str,
) -> GuildboardResult<Option<PlayerRow>> {
    for kind in player_lookup_order(candidate) {
        let found = match kind {
            LookupKind::Id => store.load_player_by_uuid(candidate).await?,
            LookupKind::Name => store.load_player_by_name(candidate).await?,
        };
        if found.is_some() {
            return Ok(found);
        }
    }
    Ok(None)
}

/// Storage fetcher for single players, by uuid or by name.
pub(crate) struct PlayerFetcher<'a> {
    pub store: &'a dyn LeaderboardStore,
    pub clock: &'a dyn Clock,
}

#[async_trait]
impl StorageFetcher<PlayerRecord> for PlayerFetcher<'_> {
    async fn fetch(&self, key: &CacheKey) -> GuildboardResult<Option<PlayerRecord>> {
        let Some(row) = resolve_player(self.store, key.as_str()).await? else {
            return Ok(None);
        };
        let guild = self.store.load_player_guild(&row.uuid).await?;
        Ok(Some(PlayerRecord::assemble(row, guild, self.clock.now())))
    }
}

/// Storage fetcher for player metric series, by uuid or by name.
pub(crate) struct PlayerMetricsFetcher<'a> {
    pub store: &'a dyn LeaderboardStore,
    pub clock: &'a dyn Clock,
}

#[async_trait]
impl StorageFetcher<PlayerMetricSeries> for PlayerMetricsFetcher<'_> {
    async fn fetch(&self, key: &CacheKey) -> GuildboardResult<Option<PlayerMetricSeries>> {
        let candidate = key.as_str();
        for kind in player_lookup_order(candidate) {
            let uuid = match kind {
                LookupKind::Id => candidate.to_string(),
                LookupKind::Name => match self.store.load_player_by_name(candidate).await? {
                    Some(player) => player.uuid,
                    None => continue,
                },
            };
            let rows = self.store.load_player_metrics(&uuid).await?;
            if let Some(series) = PlayerMetricSeries::from_rows(rows, self.clock.now()) {
                return Ok(Some(series));
            }
        }
        Ok(None)
    }
}

// ============================================================================
// EXTERNAL
// ============================================================================

/// Storage fetcher for the patron count.
pub(crate) struct PatronFetcher<'a> {
    pub source: &'a dyn PatronSource,
}

#[async_trait]
impl AggregateFetcher<u64> for PatronFetcher<'_> {
    async fn fetch_all(&self) -> GuildboardResult<u64> {
        self.source.patron_count().await
    }
}
