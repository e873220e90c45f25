//! Leaderboard records
//!
//! Two layers live here. `*Row` types are what the backing store hands back:
//! raw scores and an absolute capture timestamp. View types (`GuildSummary`,
//! `GuildRecord`, `PlayerRecord`, ...) are what readers see: weighted scores,
//! the size multiplier, and an age in seconds instead of a timestamp.
//!
//! Derivations take `now` explicitly so ages come from the same clock the
//! cache uses.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::identity::Timestamp;
use crate::weight::{multiplier, weigh};

/// A guild is no longer reported as a player's guild once the snapshot that
/// lists them is this old.
pub const GUILD_MEMBERSHIP_MAX_AGE_HOURS: i64 = 25;

/// How many guilds the stats view lists.
pub const TOP_GUILD_COUNT: usize = 3;

/// Whole seconds elapsed since `captured_at`, never negative.
pub fn age_seconds(captured_at: Timestamp, now: Timestamp) -> i64 {
    (now - captured_at).num_seconds().max(0)
}

fn member_count_of(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

// ============================================================================
// SCORES
// ============================================================================

/// Aggregate guild scores. Any field may be missing from a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GuildScores {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub senither_weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lily_weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catacombs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slayer: Option<f64>,
}

impl GuildScores {
    /// Apply the size multiplier to the weight fields.
    ///
    /// Skill, catacombs and slayer averages are not size-dependent and pass
    /// through untouched.
    pub fn weighted(&self, multiplier: f64) -> Self {
        Self {
            senither_weight: weigh(self.senither_weight, multiplier),
            lily_weight: weigh(self.lily_weight, multiplier),
            ..self.clone()
        }
    }
}

/// Per-player scores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PlayerScores {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub senither_weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lily_weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_skill: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catacombs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_slayer: Option<f64>,
}

// ============================================================================
// STORE ROWS
// ============================================================================

/// Latest snapshot of one guild, as listed in the all-guilds view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuildSummaryRow {
    pub id: String,
    pub name: String,
    pub member_count: u32,
    pub scores: GuildScores,
    pub scammers: u32,
    pub position_change: i32,
    pub captured_at: Timestamp,
}

/// Latest snapshot of one guild with its member uuids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuildRow {
    pub id: String,
    pub name: String,
    pub member_uuids: Vec<String>,
    pub scores: GuildScores,
    pub scammers: u32,
    pub captured_at: Timestamp,
}

/// Latest snapshot of one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRow {
    pub uuid: String,
    pub name: String,
    pub scores: PlayerScores,
    pub scam_reason: Option<String>,
    pub captured_at: Timestamp,
}

/// Most recent guild snapshot listing a given player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerGuildRow {
    pub guild_id: String,
    pub guild_name: String,
    pub captured_at: Timestamp,
}

/// One historical guild snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuildMetricRow {
    pub scores: GuildScores,
    pub member_count: u32,
    pub captured_at: Timestamp,
}

/// One historical player snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMetricRow {
    pub uuid: String,
    pub name: String,
    pub scores: PlayerScores,
    pub captured_at: Timestamp,
}

// ============================================================================
// VIEWS
// ============================================================================

/// One row of the all-guilds leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GuildSummary {
    pub id: String,
    pub name: String,
    pub members: u32,
    #[serde(flatten)]
    pub scores: GuildScores,
    pub multiplier: f64,
    pub position_change: i32,
    pub scammers: u32,
    pub age_seconds: i64,
}

impl GuildSummary {
    pub fn from_row(row: GuildSummaryRow, now: Timestamp) -> Self {
        Self {
            multiplier: multiplier(row.member_count),
            age_seconds: age_seconds(row.captured_at, now),
            id: row.id,
            name: row.name,
            members: row.member_count,
            scores: row.scores,
            position_change: row.position_change,
            scammers: row.scammers,
        }
    }

    /// Senither weight after applying the size multiplier.
    pub fn weighted_senither(&self) -> Option<f64> {
        weigh(self.scores.senither_weight, self.multiplier)
    }
}

/// A guild member as embedded in a [`GuildRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PlayerSummary {
    pub uuid: String,
    pub name: String,
    #[serde(flatten)]
    pub scores: PlayerScores,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scam_reason: Option<String>,
    pub age_seconds: i64,
}

impl PlayerSummary {
    pub fn from_row(row: PlayerRow, now: Timestamp) -> Self {
        Self {
            age_seconds: age_seconds(row.captured_at, now),
            uuid: row.uuid,
            name: row.name,
            scores: row.scores,
            scam_reason: row.scam_reason,
        }
    }
}

/// A single guild with its members resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GuildRecord {
    pub id: String,
    pub name: String,
    pub members: Vec<PlayerSummary>,
    pub member_count: u32,
    #[serde(flatten)]
    pub scores: GuildScores,
    pub multiplier: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discord: Option<String>,
    pub scammers: u32,
    pub age_seconds: i64,
}

impl GuildRecord {
    /// Assemble a guild from its row and the member rows the store resolved.
    ///
    /// The multiplier follows the number of members that actually resolved,
    /// not the length of the stored uuid list.
    pub fn assemble(
        row: GuildRow,
        members: Vec<PlayerRow>,
        discord: Option<String>,
        now: Timestamp,
    ) -> Self {
        let members: Vec<PlayerSummary> = members
            .into_iter()
            .map(|member| PlayerSummary::from_row(member, now))
            .collect();
        let member_count = member_count_of(members.len());

        Self {
            id: row.id,
            name: row.name,
            members,
            member_count,
            scores: row.scores,
            multiplier: multiplier(member_count),
            discord,
            scammers: row.scammers,
            age_seconds: age_seconds(row.captured_at, now),
        }
    }
}

/// One point of a guild's metric series with weights applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MetricSample {
    #[serde(flatten)]
    pub scores: GuildScores,
    pub member_count: u32,
    pub age_seconds: i64,
}

impl MetricSample {
    pub fn from_row(row: GuildMetricRow, now: Timestamp) -> Self {
        Self {
            scores: row.scores.weighted(multiplier(row.member_count)),
            member_count: row.member_count,
            age_seconds: age_seconds(row.captured_at, now),
        }
    }
}

/// Metric series of one guild, oldest sample first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuildMetricSeries {
    pub guild_id: String,
    pub samples: Vec<MetricSample>,
}

impl GuildMetricSeries {
    /// Build a series; an empty row set means the guild is unknown.
    pub fn from_rows(guild_id: &str, rows: Vec<GuildMetricRow>, now: Timestamp) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }
        Some(Self {
            guild_id: guild_id.to_string(),
            samples: rows
                .into_iter()
                .map(|row| MetricSample::from_row(row, now))
                .collect(),
        })
    }
}

/// A single player with their current guild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PlayerRecord {
    pub uuid: String,
    pub name: String,
    #[serde(flatten)]
    pub scores: PlayerScores,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scam_reason: Option<String>,
    pub guild_name: Option<String>,
    pub age_seconds: i64,
}

impl PlayerRecord {
    /// Assemble a player from their row and latest guild snapshot.
    ///
    /// `guild_name` is cleared when that snapshot is older than
    /// [`GUILD_MEMBERSHIP_MAX_AGE_HOURS`].
    pub fn assemble(row: PlayerRow, guild: Option<PlayerGuildRow>, now: Timestamp) -> Self {
        let max_age = Duration::hours(GUILD_MEMBERSHIP_MAX_AGE_HOURS);
        let guild_name = guild
            .filter(|g| now - g.captured_at < max_age)
            .map(|g| g.guild_name);

        Self {
            age_seconds: age_seconds(row.captured_at, now),
            uuid: row.uuid,
            name: row.name,
            scores: row.scores,
            scam_reason: row.scam_reason,
            guild_name,
        }
    }
}

/// One point of a player's metric series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PlayerMetricSample {
    #[serde(flatten)]
    pub scores: PlayerScores,
    pub age_seconds: i64,
}

/// Metric series of one player, oldest sample first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMetricSeries {
    pub uuid: String,
    pub name: String,
    pub samples: Vec<PlayerMetricSample>,
}

impl PlayerMetricSeries {
    /// Build a series from oldest-first rows. Identity comes from the
    /// newest row, so a renamed player is keyed by their current name.
    pub fn from_rows(rows: Vec<PlayerMetricRow>, now: Timestamp) -> Option<Self> {
        let newest = rows.last()?;
        let uuid = newest.uuid.clone();
        let name = newest.name.clone();
        let samples = rows
            .into_iter()
            .map(|row| PlayerMetricSample {
                scores: row.scores,
                age_seconds: age_seconds(row.captured_at, now),
            })
            .collect();
        Some(Self { uuid, name, samples })
    }
}

/// Guild id and name pair for search boxes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AutocompleteEntry {
    pub id: String,
    pub name: String,
}

/// Every guild and player name, for sitemap generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SitemapLinks {
    pub guilds: Vec<String>,
    pub players: Vec<String>,
}

/// A guild in the stats view's top list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TopGuild {
    pub id: String,
    pub name: String,
    pub senither_weight: f64,
}

/// Site-wide counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Stats {
    pub guilds_tracked: u64,
    pub players_tracked: u64,
    pub patrons: Option<u64>,
    pub top_guilds: Vec<TopGuild>,
}

impl Stats {
    /// Derive the counters from the all-guilds view.
    ///
    /// Guilds without a senither weight are left out of the top list; ties
    /// keep the order of the input.
    pub fn from_guilds(guilds: &[GuildSummary], patrons: Option<u64>) -> Self {
        let players_tracked = guilds.iter().map(|g| u64::from(g.members)).sum();

        let mut ranked: Vec<TopGuild> = guilds
            .iter()
            .filter_map(|g| {
                g.weighted_senither().map(|weight| TopGuild {
                    id: g.id.clone(),
                    name: g.name.clone(),
                    senither_weight: weight,
                })
            })
            .collect();
        ranked.sort_by(|a, b| b.senither_weight.total_cmp(&a.senither_weight));
        ranked.truncate(TOP_GUILD_COUNT);

        Self {
            guilds_tracked: guilds.len() as u64,
            players_tracked,
            patrons,
            top_guilds: ranked,
        }
    }
}
