//! Periodic batch jobs.
//!
//! Registers the analytics rebuild, the room sweep and the loyalty scoring
//! on the runtime [`Scheduler`]. Each run is a single Store action (or, for
//! scoring, one action per guest), so overlapping runs cannot duplicate
//! snapshots.

use crate::app::HotelService;
use crate::config::JobsConfig;
use hotel_runtime::scheduler::Scheduler;
use std::sync::Arc;

/// Job names, as they appear in logs and `scheduler.job.*` metrics
pub mod names {
    /// Daily analytics rebuild
    pub const ANALYTICS: &str = "rebuild_analytics";
    /// Room sweep
    pub const SWEEP: &str = "sweep_rooms";
    /// Loyalty scoring
    pub const LOYALTY: &str = "score_loyalty";
}

/// Schedule every enabled job
#[must_use]
pub fn schedule(service: &HotelService, jobs: &JobsConfig, model_path: &str) -> Scheduler {
    let mut scheduler = Scheduler::new();

    if jobs.analytics.enabled {
        let service = service.clone();
        scheduler.every(names::ANALYTICS, jobs.analytics.interval(), move || {
            let service = service.clone();
            async move {
                if let Err(error) = service.rebuild_analytics().await {
                    tracing::warn!(error = %error, "Analytics rebuild skipped");
                }
            }
        });
    }

    if jobs.sweep.enabled {
        let service = service.clone();
        scheduler.every(names::SWEEP, jobs.sweep.interval(), move || {
            let service = service.clone();
            async move {
                if let Err(error) = service.sweep_rooms().await {
                    tracing::warn!(error = %error, "Room sweep skipped");
                }
            }
        });
    }

    if jobs.loyalty.enabled {
        let service = service.clone();
        let model_path: Arc<str> = Arc::from(model_path);
        scheduler.every(names::LOYALTY, jobs.loyalty.interval(), move || {
            let service = service.clone();
            let model_path = Arc::clone(&model_path);
            async move {
                let outcome = service.score_loyalty(&*model_path).await;
                if let Some(reason) = outcome.aborted {
                    tracing::warn!(reason, "Loyalty scoring produced no labels");
                }
            }
        });
    }

    tracing::info!(jobs = scheduler.len(), "Periodic jobs scheduled");
    scheduler
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregates::fixtures;
    use crate::config::Config;
    use crate::state::HotelState;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn schedules_only_enabled_jobs() {
        let service = HotelService::with_state(HotelState::new(), fixtures::env());
        let mut jobs = Config::default().jobs;
        jobs.loyalty.enabled = false;

        let scheduler = schedule(&service, &jobs, "models/loyalty_model.json");
        assert_eq!(scheduler.len(), 2);
        scheduler.shutdown(Duration::from_secs(1)).await;
    }
}
