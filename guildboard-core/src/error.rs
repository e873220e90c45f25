//! Error types for Guildboard operations

use crate::EntityType;
use thiserror::Error;

/// Failures of the backing store or other upstream collaborators.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("Upstream {source_name} unavailable: {reason}")]
    Unavailable { source_name: String, reason: String },

    #[error("Malformed {entity_type:?} row from upstream: {reason}")]
    MalformedRow {
        entity_type: EntityType,
        reason: String,
    },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Lookup errors for callers that need an absent record as an error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("{entity_type:?} not found for key {key}")]
    NotFound { entity_type: EntityType, key: String },
}

/// Rejected query parameters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Invalid sort field: {field}")]
    InvalidSortField { field: String },

    #[error("History query must filter by guild or by player, not both")]
    ConflictingFilters,

    #[error("History query requires a guild or player filter")]
    MissingFilter,
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all Guildboard errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GuildboardError {
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl GuildboardError {
    /// Shorthand for an unavailable upstream.
    pub fn unavailable(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Upstream(UpstreamError::Unavailable {
            source_name: source_name.into(),
            reason: reason.into(),
        })
    }

    /// Whether retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Upstream(UpstreamError::Unavailable { .. }))
    }

    /// Whether this is an absent-record error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Lookup(LookupError::NotFound { .. }))
    }
}

/// Result type alias for Guildboard operations.
pub type GuildboardResult<T> = Result<T, GuildboardError>;

/// Converts an absent read result into [`LookupError::NotFound`].
pub trait OptionExt<T> {
    fn or_not_found(self, entity_type: EntityType, key: impl Into<String>) -> GuildboardResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, entity_type: EntityType, key: impl Into<String>) -> GuildboardResult<T> {
        self.ok_or_else(|| {
            GuildboardError::Lookup(LookupError::NotFound {
                entity_type,
                key: key.into(),
            })
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
