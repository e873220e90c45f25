//! Cache lifetime configuration

use std::time::Duration;

use crate::error::ConfigError;

/// Time-to-live per cache namespace, plus the sweep interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheTtls {
    /// The all-guilds leaderboard view.
    pub guilds: Duration,
    /// Single guild lookups.
    pub guild: Duration,
    pub guild_metrics: Duration,
    pub player: Duration,
    pub player_metrics: Duration,
    pub autocomplete: Duration,
    /// External patron count.
    pub patrons: Duration,
    /// Guild and player name lists.
    pub sitemap: Duration,
    /// How often expired entries are evicted.
    pub sweep_interval: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            guilds: Duration::from_secs(60),
            guild: Duration::from_secs(60),
            guild_metrics: Duration::from_secs(60),
            player: Duration::from_secs(60),
            player_metrics: Duration::from_secs(60),
            autocomplete: Duration::from_secs(600),
            patrons: Duration::from_secs(3600), // 1 hour
            sitemap: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(30),
        }
    }
}

impl CacheTtls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one TTL for every single-record namespace (guild, guild metrics,
    /// player, player metrics).
    pub fn with_record_ttl(mut self, ttl: Duration) -> Self {
        self.guild = ttl;
        self.guild_metrics = ttl;
        self.player = ttl;
        self.player_metrics = ttl;
        self
    }

    pub fn with_guilds_ttl(mut self, ttl: Duration) -> Self {
        self.guilds = ttl;
        self
    }

    pub fn with_autocomplete_ttl(mut self, ttl: Duration) -> Self {
        self.autocomplete = ttl;
        self
    }

    pub fn with_patrons_ttl(mut self, ttl: Duration) -> Self {
        self.patrons = ttl;
        self
    }

    pub fn with_sitemap_ttl(mut self, ttl: Duration) -> Self {
        self.sitemap = ttl;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Reject zero durations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("guilds", self.guilds),
            ("guild", self.guild),
            ("guild_metrics", self.guild_metrics),
            ("player", self.player),
            ("player_metrics", self.player_metrics),
            ("autocomplete", self.autocomplete),
            ("patrons", self.patrons),
            ("sitemap", self.sitemap),
            ("sweep_interval", self.sweep_interval),
        ];

        for (field, value) in fields {
            if value.is_zero() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: "0".to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }
}
