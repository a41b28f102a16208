//! Prometheus metrics for observability and monitoring.
//!
//! Installs the global `metrics` recorder backed by a Prometheus exporter
//! and describes the metrics the Store emits. Business metrics are
//! described by the application itself.
//!
//! # Example
//!
//! ```rust,no_run
//! use hotel_runtime::metrics::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//! // Metrics available at http://localhost:9090/metrics
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use thiserror::Error;

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus metrics server.
///
/// Exposes metrics on an HTTP endpoint for Prometheus scraping.
pub struct MetricsServer {
    addr: SocketAddr,
    started: bool,
}

impl MetricsServer {
    /// Create a new metrics server bound to `addr` once started.
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            started: false,
        }
    }

    /// Address the exporter listens on.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Whether the exporter has been installed by this server.
    #[must_use]
    pub const fn is_started(&self) -> bool {
        self.started
    }

    /// Describe runtime metrics and start the HTTP exporter.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or a recorder is
    /// already installed for reasons other than a previous `start`.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_runtime_metrics();

        let builder = PrometheusBuilder::new()
            .with_http_listener(self.addr)
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install() {
            Ok(()) => {
                self.started = true;
                tracing::info!(addr = %self.addr, "Metrics exporter listening");
                Ok(())
            },
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            },
        }
    }
}

/// Describe the metrics emitted by the Store and the scheduler.
pub fn register_runtime_metrics() {
    describe_counter!("store.commands.total", "Total number of actions sent to stores");
    describe_counter!("store.effects.executed", "Total number of effects executed, by type");
    describe_histogram!(
        "store.reducer.duration_seconds",
        "Time spent inside reducers while holding the state lock"
    );
    describe_counter!("store.shutdown.initiated", "Number of graceful shutdowns started");
    describe_counter!("store.shutdown.completed", "Number of graceful shutdowns completed");
    describe_counter!("store.shutdown.timeout", "Number of shutdowns that timed out");
    describe_counter!(
        "store.shutdown.rejected_actions",
        "Actions rejected because the store was shutting down"
    );
    describe_counter!("scheduler.job.runs", "Number of scheduled job runs, by job");
    describe_histogram!(
        "scheduler.job.duration_seconds",
        "Wall time of scheduled job runs, by job"
    );
}
