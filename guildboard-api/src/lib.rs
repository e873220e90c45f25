//! Guildboard API - Cached Leaderboard Reads
//!
//! [`LeaderboardService`] answers guild, player, history, ranking and stats
//! queries, keeping lookups in per-namespace read-through caches. This crate
//! also owns environment configuration, tracing setup and the background
//! cache sweep.
//!
//! # Example
//!
//! ```ignore
//! let config = ServiceConfig::from_env()?;
//! init_tracing(&TelemetryConfig::default())?;
//!
//! let service = Arc::new(LeaderboardService::with_system_clock(store, patrons, &config));
//! tokio::spawn(cache_sweep_task(
//!     Arc::clone(&service),
//!     SweepConfig::from(&config.ttls),
//!     shutdown_rx,
//! ));
//!
//! let lucid = service.get_one("lucid").await?;
//! ```

pub mod config;
pub mod constants;
mod fetchers;
pub mod jobs;
pub mod service;
pub mod telemetry;

pub use config::ServiceConfig;
pub use jobs::{cache_sweep_task, SweepConfig, SweepMetrics, SweepSnapshot};
pub use service::{LeaderboardService, SweepReport};
pub use telemetry::{init_tracing, LogFormat, TelemetryConfig, TelemetryError};
