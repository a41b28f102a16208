//! Configuration management for the hotel manager.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Binaries call `dotenvy::dotenv()` first so a `.env` file can supply them.

use crate::aggregates::DomainSettings;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Periodic job configuration
    pub jobs: JobsConfig,
    /// Loyalty model configuration
    pub model: ModelConfig,
    /// Business settings
    pub domain: DomainConfig,
    /// Logging and metrics
    pub observability: ObservabilityConfig,
    /// Fixture file loaded at startup
    pub seed_file: Option<String>,
    /// Capacity of the domain event bus
    pub event_bus_capacity: usize,
}

/// One periodic job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Whether the job is scheduled at all
    pub enabled: bool,
    /// Seconds between runs
    pub interval_secs: u64,
}

impl JobConfig {
    /// Interval as a `Duration`
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Periodic job configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Daily analytics rebuild (default: daily)
    pub analytics: JobConfig,
    /// Room sweep (default: hourly)
    pub sweep: JobConfig,
    /// Loyalty scoring (default: daily)
    pub loyalty: JobConfig,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_secs: u64,
}

/// Loyalty model configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path of the JSON artifact
    pub path: String,
}

/// Business settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Average lifespan used for the remaining healthspan (default: 75)
    pub average_lifespan: u32,
    /// Drop affected snapshots when a reservation changes (default: false)
    pub invalidate_snapshots_on_change: bool,
}

impl From<DomainConfig> for DomainSettings {
    fn from(config: DomainConfig) -> Self {
        Self {
            average_lifespan: config.average_lifespan,
            invalidate_snapshots_on_change: config.invalidate_snapshots_on_change,
        }
    }
}

/// Logging and metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// `tracing-subscriber` filter directives
    pub log_filter: String,
    /// Metrics server host (for Prometheus scraping)
    pub metrics_host: String,
    /// Metrics server port; no exporter when unset
    pub metrics_port: Option<u16>,
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key).and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    lookup(key).map_or(default, |value| {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

impl Config {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let job = |prefix: &str, default_interval: u64| JobConfig {
            enabled: flag(&lookup, &format!("{prefix}_ENABLED"), true),
            interval_secs: parse_or(
                &lookup,
                &format!("{prefix}_INTERVAL_SECS"),
                default_interval,
            )
            .max(1),
        };

        Self {
            jobs: JobsConfig {
                analytics: job("ANALYTICS", 86_400),
                sweep: job("SWEEP", 3_600),
                loyalty: job("LOYALTY", 86_400),
                shutdown_timeout_secs: parse_or(&lookup, "SHUTDOWN_TIMEOUT_SECS", 30),
            },
            model: ModelConfig {
                path: lookup("LOYALTY_MODEL_PATH")
                    .unwrap_or_else(|| "models/loyalty_model.json".to_string()),
            },
            domain: DomainConfig {
                average_lifespan: parse_or(
                    &lookup,
                    "AVERAGE_LIFESPAN",
                    crate::state::DEFAULT_AVERAGE_LIFESPAN,
                ),
                invalidate_snapshots_on_change: flag(
                    &lookup,
                    "ANALYTICS_INVALIDATE_ON_CHANGE",
                    false,
                ),
            },
            observability: ObservabilityConfig {
                log_filter: lookup("RUST_LOG")
                    .unwrap_or_else(|| "info,hotel_manager=debug".to_string()),
                metrics_host: lookup("METRICS_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                metrics_port: lookup("METRICS_PORT").and_then(|s| s.trim().parse().ok()),
            },
            seed_file: lookup("SEED_FILE").filter(|path| !path.trim().is_empty()),
            event_bus_capacity: parse_or(&lookup, "EVENT_BUS_CAPACITY", 1024).max(1),
        }
    }

    /// Graceful shutdown timeout
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.jobs.shutdown_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
