//! Background Jobs for the Guildboard API
//!
//! - `sweep`: Evicts expired cache entries on a fixed interval
//!
//! # Usage
//!
//! Background jobs are spawned next to the service at startup:
//!
//! ```ignore
//! use guildboard_api::jobs::{cache_sweep_task, SweepConfig};
//! use tokio::sync::watch;
//!
//! // Create shutdown signal
//! let (shutdown_tx, shutdown_rx) = watch::channel(false);
//!
//! // Spawn sweep task
//! let service = Arc::clone(&service);
//! tokio::spawn(cache_sweep_task(service, SweepConfig::from(&config.ttls), shutdown_rx));
//!
//! // On shutdown
//! let _ = shutdown_tx.send(true);
//! ```

pub mod sweep;

// Re-export commonly used types
pub use sweep::{cache_sweep_task, SweepConfig, SweepMetrics, SweepSnapshot};
