//! Hotel manager service.
//!
//! Runs the Store with the periodic jobs (analytics rebuild, room sweep,
//! loyalty scoring) and the dashboard projection until Ctrl+C or SIGTERM.

use anyhow::Context;
use hotel_core::environment::SystemClock;
use hotel_core::event_bus::{EventBus, InMemoryEventBus};
use hotel_manager::projections::{DashboardProjection, spawn_projection};
use hotel_manager::{
    Config, DomainSettings, HotelEnvironment, HotelEvent, HotelService, HotelState, jobs, seed,
};
use hotel_runtime::metrics::MetricsServer;
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.observability.log_filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Hotel Manager");
    info!(
        model = %config.model.path,
        average_lifespan = config.domain.average_lifespan,
        invalidate_snapshots = config.domain.invalidate_snapshots_on_change,
        "Configuration loaded"
    );

    if let Some(port) = config.observability.metrics_port {
        let addr: SocketAddr = format!("{}:{port}", config.observability.metrics_host)
            .parse()
            .context("Invalid metrics address")?;
        MetricsServer::new(addr)
            .start()
            .context("Failed to start metrics exporter")?;
    } else {
        hotel_runtime::metrics::register_runtime_metrics();
    }
    hotel_manager::metrics::register_business_metrics();

    let bus: Arc<dyn EventBus<HotelEvent>> =
        Arc::new(InMemoryEventBus::new(config.event_bus_capacity));
    let env = HotelEnvironment::new(
        Arc::new(SystemClock),
        Arc::clone(&bus),
        DomainSettings::from(config.domain),
    );
    let service = HotelService::with_state(HotelState::new(), env);

    // Subscribe before seeding so the dashboard sees the fixtures
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let dashboard = Arc::new(RwLock::new(DashboardProjection::new()));
    let projection = spawn_projection(Arc::clone(&dashboard), &bus, shutdown_rx);

    if let Some(path) = &config.seed_file {
        let fixtures = seed::SeedFile::load(path).context("Failed to load seed file")?;
        let summary = seed::apply(&service, &fixtures)
            .await
            .context("Failed to apply seed file")?;
        info!(path = %path, reservations = summary.reservations, "Seed applied");
    }

    let scheduler = jobs::schedule(&service, &config.jobs, &config.model.path);

    // Startup pass so snapshots and room states are current right away
    if config.jobs.analytics.enabled {
        if let Err(e) = service.rebuild_analytics().await {
            warn!(error = %e, "Initial analytics rebuild failed");
        }
    }
    if config.jobs.sweep.enabled {
        if let Err(e) = service.sweep_rooms().await {
            warn!(error = %e, "Initial room sweep failed");
        }
    }

    info!("Hotel Manager running");
    shutdown_signal().await;

    scheduler.shutdown(config.shutdown_timeout()).await;
    if let Err(e) = service.shutdown(config.shutdown_timeout()).await {
        error!(error = %e, "Store shutdown incomplete");
    }

    let _ = shutdown_tx.send(true);
    if let Err(e) = projection.await {
        warn!(error = %e, "Dashboard projection task failed");
    }

    if let Ok(view) = dashboard.read() {
        let today = chrono::Utc::now().date_naive();
        let summary = view.summary(today);
        info!(
            reservations = summary.reservations,
            in_house = summary.in_house,
            nps = summary.nps.score,
            "Final dashboard"
        );
    }

    info!("Hotel Manager stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            },
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
