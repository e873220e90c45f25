//! Cache Sweep Background Task
//!
//! Periodically evicts expired entries from every cache namespace of a
//! [`LeaderboardService`]. Reads refresh expired entries on their own; the
//! sweep only bounds memory held by keys nobody asks for anymore.
//!
//! # Configuration
//!
//! ```rust
//! use guildboard_api::jobs::SweepConfig;
//! use std::time::Duration;
//!
//! let config = SweepConfig {
//!     interval: Duration::from_secs(30), // Sweep every 30 seconds
//! };
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use guildboard_core::CacheTtls;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::constants::{DEFAULT_SWEEP_INTERVAL_SECS, ENV_SWEEP_INTERVAL_SECS};
use crate::service::LeaderboardService;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Configuration for the cache sweep task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepConfig {
    /// Time between sweeps (default: 30 seconds). The first sweep runs one
    /// interval after start.
    pub interval: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
        }
    }
}

impl From<&CacheTtls> for SweepConfig {
    fn from(ttls: &CacheTtls) -> Self {
        Self {
            interval: ttls.sweep_interval,
        }
    }
}

impl SweepConfig {
    /// Create SweepConfig from environment variables.
    ///
    /// # Environment Variables
    /// - `GUILDBOARD_SWEEP_INTERVAL_SECS`: Time between sweeps (default: 30)
    pub fn from_env() -> Self {
        let interval = Duration::from_secs(
            std::env::var(ENV_SWEEP_INTERVAL_SECS)
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS),
        );
        Self { interval }
    }

    /// Short interval for local development.
    pub fn development() -> Self {
        Self {
            interval: Duration::from_secs(5),
        }
    }
}

// ============================================================================
// METRICS
// ============================================================================

/// Counters for sweep activity since the task started.
#[derive(Debug, Default)]
pub struct SweepMetrics {
    /// Total sweep cycles completed
    pub cycles: AtomicU64,

    /// Total entries evicted, aliases counted separately
    pub entries_evicted: AtomicU64,
}

impl SweepMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current snapshot of all metrics.
    pub fn snapshot(&self) -> SweepSnapshot {
        SweepSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            entries_evicted: self.entries_evicted.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of sweep metrics at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSnapshot {
    pub cycles: u64,
    pub entries_evicted: u64,
}

// ============================================================================
// BACKGROUND TASK
// ============================================================================

/// Background task that sweeps every cache namespace on a fixed interval.
///
/// Runs until the shutdown signal is received and returns the metrics
/// collected over its lifetime.
///
/// # Example
///
/// ```ignore
/// use tokio::sync::watch;
///
/// let (shutdown_tx, shutdown_rx) = watch::channel(false);
/// let config = SweepConfig::from(&service_config.ttls);
/// let handle = tokio::spawn(cache_sweep_task(Arc::clone(&service), config, shutdown_rx));
///
/// // Later, trigger shutdown
/// let _ = shutdown_tx.send(true);
/// let metrics = handle.await?;
/// ```
pub async fn cache_sweep_task(
    service: Arc<LeaderboardService>,
    config: SweepConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Arc<SweepMetrics> {
    let metrics = Arc::new(SweepMetrics::new());

    let mut sweep_interval = interval_at(Instant::now() + config.interval, config.interval);
    sweep_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        interval_secs = config.interval.as_secs(),
        "Cache sweep task started"
    );

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                // A dropped sender counts as shutdown.
                if changed.is_err() || *shutdown_rx.borrow() {
                    tracing::info!("Cache sweep task shutting down");
                    break;
                }
            }

            _ = sweep_interval.tick() => {
                sweep_once(&service, &metrics).await;
            }
        }
    }

    let snapshot = metrics.snapshot();
    tracing::info!(
        cycles = snapshot.cycles,
        entries_evicted = snapshot.entries_evicted,
        "Cache sweep task completed"
    );

    metrics
}

async fn sweep_once(service: &LeaderboardService, metrics: &SweepMetrics) {
    metrics.cycles.fetch_add(1, Ordering::Relaxed);

    let report = service.sweep().await;
    let evicted = report.total();
    metrics
        .entries_evicted
        .fetch_add(evicted as u64, Ordering::Relaxed);

    if evicted > 0 {
        tracing::debug!(evicted, per_namespace = ?report.evicted, "Cache sweep cycle completed");
    } else {
        tracing::trace!("Cache sweep cycle completed with nothing expired");
    }
}
