use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use domain::services::DeviceReconciler;
use persistence::PgDeviceStore;
use tablet_fleet_api::app::{create_app, AppState};
use tablet_fleet_api::config::Config;
use tablet_fleet_api::jobs::{DeviceSyncJob, JobScheduler, PoolMetricsJob, ReservationCleanupJob};
use tablet_fleet_api::middleware::{init_metrics, logging::init_logging};
use tablet_fleet_api::services::{
    AcceptAllCredentials, CredentialChecker, HttpCredentialChecker, RelutionClient,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Arc::new(Config::load()?);

    init_logging(&config.logging).context("Failed to initialize logging")?;
    init_metrics().context("Failed to install Prometheus recorder")?;

    info!("Starting Tablet Fleet v{}", env!("CARGO_PKG_VERSION"));

    let db_config: persistence::db::DatabaseConfig = (&config.database).into();
    let pool = persistence::db::create_pool(&db_config).await?;

    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    info!("Migrations completed");

    let credentials: Arc<dyn CredentialChecker> = if config.auth.enabled {
        Arc::new(HttpCredentialChecker::new(config.auth.url.clone())?)
    } else {
        warn!("Authentication disabled, any Basic credentials are accepted");
        Arc::new(AcceptAllCredentials)
    };
    let state = AppState::new(config.clone(), pool.clone(), credentials);

    let reconciler = Arc::new(DeviceReconciler::new(
        Arc::new(PgDeviceStore::new(pool.clone())),
        Arc::new(RelutionClient::new(&config.inventory)?),
        config.reconciler_settings(),
    ));

    let mut scheduler = JobScheduler::new();
    scheduler.register(DeviceSyncJob::new(reconciler, config.sync.interval_secs));
    scheduler.register(ReservationCleanupJob::new(
        state.allocator.clone(),
        config.reservations.cleanup_interval_minutes,
    ));
    scheduler.register(PoolMetricsJob::new(pool.clone()));
    scheduler.start();

    let app = create_app(state);

    let addr = config.socket_addr().context("Invalid server address")?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown(Duration::from_secs(30)).await;
    pool.close().await;
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
