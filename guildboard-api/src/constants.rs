//! Constants for the Guildboard API
//!
//! Default cache lifetimes and the environment variables that override them.

// ============================================================================
// CACHE LIFETIMES
// ============================================================================

/// Default TTL for guild and player lookups and the all-guilds view (1 minute)
pub const DEFAULT_RECORD_TTL_SECS: u64 = 60;

/// Default TTL for the autocomplete list (10 minutes)
pub const DEFAULT_AUTOCOMPLETE_TTL_SECS: u64 = 600;

/// Default TTL for the external patron count (1 hour)
pub const DEFAULT_PATRONS_TTL_SECS: u64 = 3600;

/// Default TTL for the sitemap name lists (1 hour)
pub const DEFAULT_SITEMAP_TTL_SECS: u64 = 3600;

/// Default interval between sweeps of expired cache entries
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 30;

// ============================================================================
// ENVIRONMENT
// ============================================================================

pub const ENV_GUILDS_TTL_SECS: &str = "GUILDBOARD_GUILDS_TTL_SECS";
pub const ENV_RECORD_TTL_SECS: &str = "GUILDBOARD_RECORD_TTL_SECS";
pub const ENV_AUTOCOMPLETE_TTL_SECS: &str = "GUILDBOARD_AUTOCOMPLETE_TTL_SECS";
pub const ENV_PATRONS_TTL_SECS: &str = "GUILDBOARD_PATRONS_TTL_SECS";
pub const ENV_SITEMAP_TTL_SECS: &str = "GUILDBOARD_SITEMAP_TTL_SECS";
pub const ENV_SWEEP_INTERVAL_SECS: &str = "GUILDBOARD_SWEEP_INTERVAL_SECS";

/// "true" lets reads fall back to an expired value when a refresh fails
pub const ENV_SERVE_STALE: &str = "GUILDBOARD_SERVE_STALE";

pub const ENV_LOG_FILTER: &str = "GUILDBOARD_LOG_FILTER";

/// "json" or "plain" (default)
pub const ENV_LOG_FORMAT: &str = "GUILDBOARD_LOG_FORMAT";

pub const ENV_SERVICE_NAME: &str = "GUILDBOARD_SERVICE_NAME";

// ============================================================================
// TELEMETRY
// ============================================================================

/// Filter used when neither `RUST_LOG` nor `GUILDBOARD_LOG_FILTER` is set
pub const DEFAULT_LOG_FILTER: &str = "guildboard_api=debug,guildboard_storage=debug,info";

pub const DEFAULT_SERVICE_NAME: &str = "guildboard-api";
