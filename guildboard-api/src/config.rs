//! Service Configuration Module
//!
//! Cache lifetimes and the stale-read policy, loaded from environment
//! variables with defaults matching the hosted leaderboard.

use std::time::Duration;

use guildboard_core::{CacheTtls, ConfigError};
use guildboard_storage::Freshness;

use crate::constants::{
    DEFAULT_AUTOCOMPLETE_TTL_SECS, DEFAULT_PATRONS_TTL_SECS, DEFAULT_RECORD_TTL_SECS,
    DEFAULT_SITEMAP_TTL_SECS, DEFAULT_SWEEP_INTERVAL_SECS, ENV_AUTOCOMPLETE_TTL_SECS,
    ENV_GUILDS_TTL_SECS, ENV_PATRONS_TTL_SECS, ENV_RECORD_TTL_SECS, ENV_SERVE_STALE,
    ENV_SITEMAP_TTL_SECS, ENV_SWEEP_INTERVAL_SECS,
};

// ============================================================================
// SERVICE CONFIGURATION
// ============================================================================

/// Configuration for [`crate::LeaderboardService`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceConfig {
    pub ttls: CacheTtls,

    /// Serve the previous value, flagged stale, when a refresh fails.
    /// Off by default: failures surface to the caller.
    pub serve_stale_on_error: bool,
}

impl ServiceConfig {
    /// Create ServiceConfig from environment variables.
    ///
    /// Environment variables:
    /// - `GUILDBOARD_GUILDS_TTL_SECS`: All-guilds view TTL (default: 60)
    /// - `GUILDBOARD_RECORD_TTL_SECS`: Guild, player and metric lookups (default: 60)
    /// - `GUILDBOARD_AUTOCOMPLETE_TTL_SECS`: Autocomplete list TTL (default: 600)
    /// - `GUILDBOARD_PATRONS_TTL_SECS`: Patron count TTL (default: 3600)
    /// - `GUILDBOARD_SITEMAP_TTL_SECS`: Sitemap name lists TTL (default: 3600)
    /// - `GUILDBOARD_SWEEP_INTERVAL_SECS`: Eviction interval (default: 30)
    /// - `GUILDBOARD_SERVE_STALE`: "true" or "false" (default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// Unset variables take their default; set but unparsable ones are
    /// rejected rather than silently replaced.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let record_ttl = secs(&lookup, ENV_RECORD_TTL_SECS, DEFAULT_RECORD_TTL_SECS)?;
        let guilds_ttl = secs(&lookup, ENV_GUILDS_TTL_SECS, DEFAULT_RECORD_TTL_SECS)?;
        let autocomplete_ttl = secs(
            &lookup,
            ENV_AUTOCOMPLETE_TTL_SECS,
            DEFAULT_AUTOCOMPLETE_TTL_SECS,
        )?;
        let patrons_ttl = secs(&lookup, ENV_PATRONS_TTL_SECS, DEFAULT_PATRONS_TTL_SECS)?;
        let sitemap_ttl = secs(&lookup, ENV_SITEMAP_TTL_SECS, DEFAULT_SITEMAP_TTL_SECS)?;
        let sweep_interval = secs(
            &lookup,
            ENV_SWEEP_INTERVAL_SECS,
            DEFAULT_SWEEP_INTERVAL_SECS,
        )?;

        let serve_stale_on_error = match lookup(ENV_SERVE_STALE) {
            Some(raw) => parse_bool(ENV_SERVE_STALE, &raw)?,
            None => false,
        };

        let config = Self {
            ttls: CacheTtls::new()
                .with_record_ttl(record_ttl)
                .with_guilds_ttl(guilds_ttl)
                .with_autocomplete_ttl(autocomplete_ttl)
                .with_patrons_ttl(patrons_ttl)
                .with_sitemap_ttl(sitemap_ttl)
                .with_sweep_interval(sweep_interval),
            serve_stale_on_error,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_ttls(mut self, ttls: CacheTtls) -> Self {
        self.ttls = ttls;
        self
    }

    pub fn with_serve_stale_on_error(mut self, enabled: bool) -> Self {
        self.serve_stale_on_error = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ttls.validate()
    }

    /// Refresh-failure policy applied to every cached read.
    pub fn freshness(&self) -> Freshness {
        if self.serve_stale_on_error {
            Freshness::TolerateStale
        } else {
            Freshness::Strict
        }
    }
}

fn secs<F>(lookup: &F, name: &str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return Ok(Duration::from_secs(default));
    };
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::InvalidValue {
            field: name.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        })
}

fn parse_bool(name: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: name.to_string(),
            value: raw.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ServiceConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.ttls.guild, Duration::from_secs(60));
        assert_eq!(config.ttls.autocomplete, Duration::from_secs(600));
        assert_eq!(config.ttls.patrons, Duration::from_secs(3600));
        assert_eq!(config.ttls.sitemap, Duration::from_secs(3600));
        assert_eq!(config.ttls.sweep_interval, Duration::from_secs(30));
        assert_eq!(config.freshness(), Freshness::Strict);
    }

    #[test]
    fn test_overrides_apply() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            (ENV_RECORD_TTL_SECS, "120"),
            (ENV_GUILDS_TTL_SECS, "90"),
            (ENV_SITEMAP_TTL_SECS, "1800"),
            (ENV_SWEEP_INTERVAL_SECS, "5"),
            (ENV_SERVE_STALE, "TRUE"),
        ]))
        .unwrap();

        assert_eq!(config.ttls.guild, Duration::from_secs(120));
        assert_eq!(config.ttls.player_metrics, Duration::from_secs(120));
        assert_eq!(config.ttls.guilds, Duration::from_secs(90));
        assert_eq!(config.ttls.sitemap, Duration::from_secs(1800));
        assert_eq!(config.ttls.sweep_interval, Duration::from_secs(5));
        assert_eq!(config.freshness(), Freshness::TolerateStale);
    }

    #[test]
    fn test_unparsable_value_is_rejected() {
        let err = ServiceConfig::from_lookup(lookup_from(&[(ENV_RECORD_TTL_SECS, "soon")]))
            .unwrap_err();
        match err {
            ConfigError::InvalidValue { field, value, .. } => {
                assert_eq!(field, ENV_RECORD_TTL_SECS);
                assert_eq!(value, "soon");
            }
        }
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let err = ServiceConfig::from_lookup(lookup_from(&[(ENV_SWEEP_INTERVAL_SECS, "0")]))
            .unwrap_err();
        let ConfigError::InvalidValue { field, .. } = err;
        assert_eq!(field, "sweep_interval");
    }

    #[test]
    fn test_bad_bool_is_rejected() {
        assert!(ServiceConfig::from_lookup(lookup_from(&[(ENV_SERVE_STALE, "maybe")])).is_err());
    }
}
