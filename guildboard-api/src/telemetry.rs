//! Tracing Initialization
//!
//! Installs the global `tracing` subscriber: an `EnvFilter` plus a plain or
//! JSON formatting layer.

use std::str::FromStr;

use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::constants::{
    DEFAULT_LOG_FILTER, DEFAULT_SERVICE_NAME, ENV_LOG_FILTER, ENV_LOG_FORMAT, ENV_SERVICE_NAME,
};

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("Failed to init subscriber: {0}")]
    Install(String),
}

/// Output format of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "plain" | "text" | "pretty" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {}", other)),
        }
    }
}

/// Telemetry configuration from environment variables.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Explicit filter directive. `RUST_LOG` wins when set.
    pub log_filter: Option<String>,
    pub log_format: LogFormat,
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: std::env::var(ENV_LOG_FILTER).ok(),
            log_format: std::env::var(ENV_LOG_FORMAT)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            service_name: std::env::var(ENV_SERVICE_NAME)
                .unwrap_or_else(|_| DEFAULT_SERVICE_NAME.to_string()),
        }
    }
}

impl TelemetryConfig {
    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = Some(filter.into());
        self
    }

    /// Resolve the filter: `RUST_LOG`, then the configured directive, then
    /// the built-in default.
    pub fn env_filter(&self) -> Result<EnvFilter, TelemetryError> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        match &self.log_filter {
            Some(directive) => {
                EnvFilter::try_new(directive).map_err(|e| TelemetryError::InvalidFilter {
                    filter: directive.clone(),
                    reason: e.to_string(),
                })
            }
            None => Ok(EnvFilter::new(DEFAULT_LOG_FILTER)),
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// Call once at startup. A second call fails with
/// [`TelemetryError::Install`].
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = config.env_filter()?;

    let (json_layer, plain_layer) = match config.log_format {
        LogFormat::Json => (Some(fmt::layer().json()), None),
        LogFormat::Plain => (None, Some(fmt::layer())),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(plain_layer)
        .try_init()
        .map_err(|e| TelemetryError::Install(e.to_string()))?;

    tracing::info!(
        service_name = %config.service_name,
        log_format = ?config.log_format,
        "Telemetry initialized"
    );

    Ok(())
}
