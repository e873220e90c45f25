//! Guildboard Core - Leaderboard Types
//!
//! Pure data types and deterministic transforms shared by the cache and
//! service layers. Nothing in this crate performs I/O or reads the clock;
//! callers pass `now` where a derivation needs it.

pub mod config;
pub mod error;
pub mod history;
pub mod identity;
pub mod pagination;
pub mod ranking;
pub mod records;
pub mod weight;

pub use config::CacheTtls;
pub use error::{
    ConfigError, GuildboardError, GuildboardResult, LookupError, OptionExt, QueryError,
    UpstreamError,
};
pub use history::{
    fix_history_order, pair_chronological, GuildHistoryItem, HistoryEntry, HistoryEvent,
    HistoryFilter, HistoryKind, HistoryPage, PlayerHistoryItem,
};
pub use identity::{
    guild_lookup_order, is_guild_id, is_player_uuid, lookup_order, player_lookup_order, CacheKey,
    EntityType, LookupKind, Timestamp,
};
pub use pagination::{last_page, PageRequest, PageResult, Pagination, DEFAULT_PER_PAGE};
pub use ranking::{PlayerRankingRow, RankingQuery, RankingSortField, PLAYER_PAGE_SIZE};
pub use records::{
    age_seconds, AutocompleteEntry, GuildMetricRow, GuildMetricSeries, GuildRecord, GuildRow,
    GuildScores, GuildSummary, GuildSummaryRow, MetricSample, PlayerGuildRow, PlayerMetricRow,
    PlayerMetricSample, PlayerMetricSeries, PlayerRecord, PlayerRow, PlayerScores, PlayerSummary,
    SitemapLinks, Stats, TopGuild, GUILD_MEMBERSHIP_MAX_AGE_HOURS, TOP_GUILD_COUNT,
};
pub use weight::{multiplier, round2, weigh, NOMINAL_GUILD_SIZE};
