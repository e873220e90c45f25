//! Backing-store contract.
//!
//! The cache never talks to a database directly; it consumes these traits.
//! Every read returns raw rows with absolute capture timestamps. Weighting
//! and age calculation happen above this layer.

use async_trait::async_trait;
use guildboard_core::{
    AutocompleteEntry, GuildMetricRow, GuildRow, GuildSummaryRow, GuildboardResult, HistoryEvent,
    HistoryFilter, PageRequest, PlayerGuildRow, PlayerMetricRow, PlayerRankingRow, PlayerRow,
    RankingQuery, SitemapLinks,
};

/// Read access to snapshotted guild and player data.
#[async_trait]
pub trait LeaderboardStore: Send + Sync {
    // === Guilds ===

    /// Latest snapshot of every guild.
    async fn load_guild_summaries(&self) -> GuildboardResult<Vec<GuildSummaryRow>>;

    /// Latest snapshot of one guild by id.
    async fn load_guild_by_id(&self, guild_id: &str) -> GuildboardResult<Option<GuildRow>>;

    /// Latest snapshot of one guild by name, matched case-insensitively.
    async fn load_guild_by_name(&self, name: &str) -> GuildboardResult<Option<GuildRow>>;

    /// Players among `uuids` that exist. Unknown uuids are skipped.
    async fn load_players(&self, uuids: &[String]) -> GuildboardResult<Vec<PlayerRow>>;

    async fn load_guild_discord(&self, guild_id: &str) -> GuildboardResult<Option<String>>;

    /// Every snapshot of one guild, oldest first. Empty if unknown.
    async fn load_guild_metrics(&self, guild_id: &str) -> GuildboardResult<Vec<GuildMetricRow>>;

    async fn load_autocomplete(&self) -> GuildboardResult<Vec<AutocompleteEntry>>;

    /// Names of every guild and every player.
    async fn load_sitemap_links(&self) -> GuildboardResult<SitemapLinks>;

    // === Players ===

    async fn load_player_by_uuid(&self, uuid: &str) -> GuildboardResult<Option<PlayerRow>>;

    /// Matched case-insensitively.
    async fn load_player_by_name(&self, name: &str) -> GuildboardResult<Option<PlayerRow>>;

    /// Most recent guild snapshot listing this player.
    async fn load_player_guild(&self, uuid: &str) -> GuildboardResult<Option<PlayerGuildRow>>;

    /// Every snapshot of one player, oldest first. Empty if unknown.
    async fn load_player_metrics(&self, uuid: &str) -> GuildboardResult<Vec<PlayerMetricRow>>;

    // === Paged queries ===

    /// One page of the membership log, newest first, with the unwindowed
    /// total.
    async fn load_history_page(
        &self,
        filter: &HistoryFilter,
        page: PageRequest,
    ) -> GuildboardResult<(Vec<HistoryEvent>, u64)>;

    /// One page of the player ranking with the filtered total.
    async fn load_ranking_page(
        &self,
        query: &RankingQuery,
    ) -> GuildboardResult<(Vec<PlayerRankingRow>, u64)>;
}

/// Third-party patron count.
#[async_trait]
pub trait PatronSource: Send + Sync {
    async fn patron_count(&self) -> GuildboardResult<u64>;
}
