//! Player ranking queries
//!
//! Rankings sort the player table by one of a closed set of "latest" score
//! columns. The column name reaches the store verbatim, so anything outside
//! the set is rejected before a query is built.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::QueryError;
use crate::pagination::PageRequest;

/// Rows per ranking page.
pub const PLAYER_PAGE_SIZE: u32 = 25;

/// Score columns a ranking may sort on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum RankingSortField {
    #[serde(rename = "latest_senither")]
    Senither,
    #[serde(rename = "latest_lily")]
    Lily,
    #[serde(rename = "latest_nw")]
    Networth,
    #[serde(rename = "latest_sb_xp")]
    SkyblockXp,
    #[serde(rename = "latest_slayer")]
    Slayer,
    #[serde(rename = "latest_cata")]
    Catacombs,
    #[serde(rename = "latest_asl")]
    AverageSkillLevel,
}

impl RankingSortField {
    pub const ALL: [RankingSortField; 7] = [
        Self::Senither,
        Self::Lily,
        Self::Networth,
        Self::SkyblockXp,
        Self::Slayer,
        Self::Catacombs,
        Self::AverageSkillLevel,
    ];

    /// Column name as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Senither => "latest_senither",
            Self::Lily => "latest_lily",
            Self::Networth => "latest_nw",
            Self::SkyblockXp => "latest_sb_xp",
            Self::Slayer => "latest_slayer",
            Self::Catacombs => "latest_cata",
            Self::AverageSkillLevel => "latest_asl",
        }
    }
}

impl fmt::Display for RankingSortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RankingSortField {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| QueryError::InvalidSortField { field: s.to_string() })
    }
}

/// A validated ranking query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingQuery {
    pub sort_field: RankingSortField,
    /// Ascending when set; descending otherwise.
    pub reverse: bool,
    /// Case-insensitive name prefix.
    pub username_prefix: Option<String>,
    pub page: PageRequest,
}

impl RankingQuery {
    /// Validate raw ranking parameters.
    ///
    /// The sort field is checked first so an invalid column never reaches the
    /// store.
    pub fn parse(
        sort_field: &str,
        reverse: bool,
        page: i64,
        username_prefix: Option<&str>,
    ) -> Result<Self, QueryError> {
        let sort_field = sort_field.parse::<RankingSortField>()?;
        let username_prefix = username_prefix
            .map(str::trim)
            .filter(|prefix| !prefix.is_empty())
            .map(str::to_string);

        Ok(Self {
            sort_field,
            reverse,
            username_prefix,
            page: PageRequest::fixed(page, PLAYER_PAGE_SIZE),
        })
    }

    /// Whether a player name passes the prefix filter.
    pub fn matches_name(&self, name: &str) -> bool {
        match &self.username_prefix {
            Some(prefix) => name.to_lowercase().starts_with(&prefix.to_lowercase()),
            None => true,
        }
    }
}

/// One row of a ranking page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PlayerRankingRow {
    #[serde(rename = "_id")]
    pub uuid: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_senither: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_lily: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_nw: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_sb_xp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_slayer: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_cata: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_asl: Option<f64>,
}

impl PlayerRankingRow {
    /// Value of the given sort column, if recorded.
    pub fn sort_value(&self, field: RankingSortField) -> Option<f64> {
        match field {
            RankingSortField::Senither => self.latest_senither,
            RankingSortField::Lily => self.latest_lily,
            RankingSortField::Networth => self.latest_nw,
            RankingSortField::SkyblockXp => self.latest_sb_xp,
            RankingSortField::Slayer => self.latest_slayer,
            RankingSortField::Catacombs => self.latest_cata,
            RankingSortField::AverageSkillLevel => self.latest_asl,
        }
    }
}
