//! Identity types and lookup-key resolution
//!
//! Guild ids, player uuids and display names share one input surface, so a
//! lookup string has to be classified before it can be sent to the backing
//! store. Classification is structural only: an id-shaped string is tried as
//! an id first and as a name second, everything else the other way round.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Entity type discriminator for cache namespaces and lookup errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum EntityType {
    Guild,
    GuildMetrics,
    Player,
    PlayerMetrics,
}

/// Guild ids are 24 lowercase hex characters.
static GUILD_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-f]{24}$").expect("Invalid guild id regex"));

/// Player uuids are 32 lowercase hex characters (undashed).
static PLAYER_UUID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-f]{32}$").expect("Invalid player uuid regex"));

/// Key reserved for single-entry aggregate caches.
const AGGREGATE_KEY: &str = "*";

/// Normalized cache key.
///
/// Keys are trimmed and lower-cased on construction so that an id and a
/// differently-cased display name of the same record land on stable aliases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_lowercase())
    }

    /// The single key used by aggregate caches.
    pub fn aggregate() -> Self {
        Self(AGGREGATE_KEY.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for CacheKey {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// How a lookup string is interpreted against the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LookupKind {
    Id,
    Name,
}

/// Check whether a string has the structure of a guild id.
pub fn is_guild_id(candidate: &str) -> bool {
    GUILD_ID_PATTERN.is_match(candidate)
}

/// Check whether a string has the structure of an undashed player uuid.
pub fn is_player_uuid(candidate: &str) -> bool {
    PLAYER_UUID_PATTERN.is_match(candidate)
}

/// Order in which an ambiguous identifier is tried.
///
/// Both interpretations are always returned; the second one is the fallback
/// when the first yields no record.
pub fn lookup_order(candidate: &str, looks_like_id: fn(&str) -> bool) -> [LookupKind; 2] {
    if looks_like_id(candidate) {
        [LookupKind::Id, LookupKind::Name]
    } else {
        [LookupKind::Name, LookupKind::Id]
    }
}

/// Lookup order for guild identifiers.
pub fn guild_lookup_order(candidate: &str) -> [LookupKind; 2] {
    lookup_order(candidate, is_guild_id)
}

/// Lookup order for player identifiers.
pub fn player_lookup_order(candidate: &str) -> [LookupKind; 2] {
    lookup_order(candidate, is_player_uuid)
}
