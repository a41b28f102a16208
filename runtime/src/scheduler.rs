//! Periodic job scheduler.
//!
//! Each job runs on its own tokio task driven by an interval. All jobs share
//! a shutdown broadcast; [`Scheduler::shutdown`] signals it and waits for the
//! tasks to finish the run they are in.
//!
//! ```ignore
//! let mut scheduler = Scheduler::new();
//! scheduler.every("sweep_rooms", Duration::from_secs(86_400), move || {
//!     let service = service.clone();
//!     async move { service.sweep_rooms().await; }
//! });
//! // ...
//! scheduler.shutdown(Duration::from_secs(10)).await;
//! ```

use std::future::Future;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Owns the periodic job tasks.
pub struct Scheduler {
    jobs: Vec<(&'static str, JoinHandle<()>)>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Scheduler {
    /// Create an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            jobs: Vec::new(),
            shutdown_tx,
        }
    }

    /// Number of registered jobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether no job is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Run `job` every `period`, first run one full period from now.
    ///
    /// Ticks missed while a run is still going are skipped, so runs of the
    /// same job never overlap.
    pub fn every<F, Fut>(&mut self, name: &'static str, period: Duration, job: F)
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        tracing::debug!(job = name, "Scheduler job stopping");
                        break;
                    }
                    _ = ticker.tick() => {
                        tracing::debug!(job = name, "Running scheduled job");
                        let started = std::time::Instant::now();
                        job().await;
                        metrics::counter!("scheduler.job.runs", "job" => name).increment(1);
                        metrics::histogram!("scheduler.job.duration_seconds", "job" => name)
                            .record(started.elapsed().as_secs_f64());
                    }
                }
            }
        });
        tracing::info!(job = name, period_secs = period.as_secs(), "Scheduled job registered");
        self.jobs.push((name, handle));
    }

    /// Signal every job to stop and wait for them, `timeout` per job.
    pub async fn shutdown(self, timeout: Duration) {
        let _ = self.shutdown_tx.send(());

        for (name, handle) in self.jobs {
            match tokio::time::timeout(timeout, handle).await {
                Ok(Ok(())) => tracing::info!(job = name, "Job stopped gracefully"),
                Ok(Err(e)) => tracing::warn!(job = name, error = %e, "Job task failed"),
                Err(_) => tracing::warn!(job = name, "Job shutdown timed out"),
            }
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
