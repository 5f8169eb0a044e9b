// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::application::firmware_service::FirmwareService;
use crate::application::fleet_service::FleetService;
use crate::application::polling::{ShutdownSignal, make_rng};
use crate::application::session_service::SessionService;
use crate::infrastructure::config::load_simulation_config;
use crate::infrastructure::random_walk_source::RandomWalkSource;
use crate::infrastructure::seed::load_fleet_seed;
use crate::presentation::app_state::AppState;
use crate::presentation::router::router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Arc::new(load_simulation_config()?);
    let seed = load_fleet_seed("config/fleet")?;
    tracing::info!(
        robots = seed.robots.len(),
        alerts = seed.alerts.len(),
        seeded_rng = config.seed.is_some(),
        "fleet loaded"
    );

    // Telemetry source (infrastructure layer)
    let source = Arc::new(RandomWalkSource::new(
        config.fleet.clone(),
        config.alerts.clone(),
        make_rng(config.seed, "fleet"),
    ));

    // Create services (application layer)
    let fleet = FleetService::new(seed.robots, seed.alerts, source, config.clone());
    let sessions = SessionService::new(config.clone());
    let firmware = FirmwareService::new(config.firmware.clone(), config.seed);
    let pollers = fleet.start_polling();
    let shutdown = ShutdownSignal::new();

    let state = Arc::new(AppState {
        fleet,
        sessions: sessions.clone(),
        firmware: firmware.clone(),
        shutdown: shutdown.clone(),
    });

    // Build router (presentation layer)
    let app = router(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {}", config.server.bind))?;
    tracing::info!("Starting fleet-telemetry service on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    for poller in &pollers {
        poller.stop();
    }
    sessions.stop_all().await;
    firmware.stop_all().await;
    tracing::info!("shutdown complete");

    Ok(())
}

/// Waits for Ctrl-C, then tells open update streams to finish so the
/// server can drain.
async fn shutdown_signal(shutdown: ShutdownSignal) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
    shutdown.trigger();
}
