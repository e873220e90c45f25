//! Guild membership history
//!
//! The upstream log is captured per player across snapshots. When two
//! snapshots of different guilds interleave badly, a player's slice can show
//! two joins (or two leaves) back to back. [`fix_history_order`] repairs that
//! by pulling the next opposite event forward so joins and leaves alternate
//! wherever a partner exists.

use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::identity::Timestamp;
use crate::pagination::PageResult;

/// Direction of a membership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Joined,
    Left,
}

/// One membership change as stored upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub kind: HistoryKind,
    pub player_uuid: String,
    pub player_name: String,
    pub guild_id: String,
    pub guild_name: String,
    pub captured_at: Timestamp,
}

/// Guild-scoped projection: who joined or left this guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GuildHistoryItem {
    #[serde(rename = "type")]
    pub kind: HistoryKind,
    pub uuid: String,
    pub name: String,
    #[cfg_attr(feature = "openapi", schema(value_type = chrono::DateTime<chrono::Utc>))]
    pub capture_date: Timestamp,
}

/// Player-scoped projection: which guilds this player joined or left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PlayerHistoryItem {
    #[serde(rename = "type")]
    pub kind: HistoryKind,
    pub guild_id: String,
    pub guild_name: String,
    #[cfg_attr(feature = "openapi", schema(value_type = chrono::DateTime<chrono::Utc>))]
    pub capture_date: Timestamp,
}

impl From<HistoryEvent> for GuildHistoryItem {
    fn from(event: HistoryEvent) -> Self {
        Self {
            kind: event.kind,
            uuid: event.player_uuid,
            name: event.player_name,
            capture_date: event.captured_at,
        }
    }
}

impl From<HistoryEvent> for PlayerHistoryItem {
    fn from(event: HistoryEvent) -> Self {
        Self {
            kind: event.kind,
            guild_id: event.guild_id,
            guild_name: event.guild_name,
            capture_date: event.captured_at,
        }
    }
}

/// Anything that carries a membership direction.
pub trait HistoryEntry {
    fn kind(&self) -> HistoryKind;
}

impl HistoryEntry for HistoryKind {
    fn kind(&self) -> HistoryKind {
        *self
    }
}

impl HistoryEntry for HistoryEvent {
    fn kind(&self) -> HistoryKind {
        self.kind
    }
}

impl HistoryEntry for PlayerHistoryItem {
    fn kind(&self) -> HistoryKind {
        self.kind
    }
}

impl HistoryEntry for GuildHistoryItem {
    fn kind(&self) -> HistoryKind {
        self.kind
    }
}

/// Which dimension a history query filters on. The two are exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HistoryFilter {
    Guild(String),
    Player(String),
}

impl HistoryFilter {
    /// Build a filter from optional request parameters.
    pub fn from_params(guild_id: Option<&str>, player_uuid: Option<&str>) -> Result<Self, QueryError> {
        let guild_id = guild_id.map(str::trim).filter(|s| !s.is_empty());
        let player_uuid = player_uuid.map(str::trim).filter(|s| !s.is_empty());

        match (guild_id, player_uuid) {
            (Some(_), Some(_)) => Err(QueryError::ConflictingFilters),
            (Some(guild), None) => Ok(Self::Guild(guild.to_string())),
            (None, Some(player)) => Ok(Self::Player(player.to_string())),
            (None, None) => Err(QueryError::MissingFilter),
        }
    }

    pub fn is_player_scoped(&self) -> bool {
        matches!(self, Self::Player(_))
    }

    pub fn value(&self) -> &str {
        match self {
            Self::Guild(id) | Self::Player(id) => id,
        }
    }
}

/// Repair same-kind repeats in a newest-first slice of one player's history.
///
/// Returns the slice newest-first. Slices of length 0 or 1 are returned
/// unchanged.
pub fn fix_history_order<T: HistoryEntry>(mut newest_first: Vec<T>) -> Vec<T> {
    if newest_first.len() < 2 {
        return newest_first;
    }
    newest_first.reverse();
    let mut repaired = pair_chronological(newest_first);
    repaired.reverse();
    repaired
}

/// Pairing pass over an oldest-first slice.
///
/// The first event is kept as-is. An event repeating the previous kind is
/// swapped with its successor, which is then consumed. A repeat with no
/// successor stays in place.
pub fn pair_chronological<T: HistoryEntry>(oldest_first: Vec<T>) -> Vec<T> {
    let mut paired = Vec::with_capacity(oldest_first.len());
    let mut events = oldest_first.into_iter();

    let Some(first) = events.next() else {
        return paired;
    };
    let mut last = first.kind();
    paired.push(first);

    while let Some(event) = events.next() {
        let kind = event.kind();
        if kind == last {
            if let Some(successor) = events.next() {
                paired.push(successor);
            }
        }
        paired.push(event);
        last = kind;
    }

    paired
}

/// A history page shaped for whichever side the query filtered on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HistoryPage {
    Guild(PageResult<GuildHistoryItem>),
    Player(PageResult<PlayerHistoryItem>),
}

impl HistoryPage {
    pub fn total(&self) -> u64 {
        match self {
            Self::Guild(page) => page.total(),
            Self::Player(page) => page.total(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Guild(page) => page.data.len(),
            Self::Player(page) => page.data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Event kinds in page order.
    pub fn kinds(&self) -> Vec<HistoryKind> {
        match self {
            Self::Guild(page) => page.data.iter().map(HistoryEntry::kind).collect(),
            Self::Player(page) => page.data.iter().map(HistoryEntry::kind).collect(),
        }
    }
}
