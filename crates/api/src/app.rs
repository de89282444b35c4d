use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, require_auth, trace_id};
use crate::routes::{devices, groups, health, reservations, telemetry};
use crate::services::CredentialChecker;
use domain::services::ReservationAllocator;
use persistence::PgReservationStore;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub allocator: Arc<ReservationAllocator>,
    pub credentials: Arc<dyn CredentialChecker>,
}

impl AppState {
    /// Wires the allocator onto the PostgreSQL reservation store.
    pub fn new(config: Arc<Config>, pool: PgPool, credentials: Arc<dyn CredentialChecker>) -> Self {
        let store = Arc::new(PgReservationStore::new(pool.clone()));
        let allocator = Arc::new(ReservationAllocator::new(store, config.retention_policy()));
        Self {
            pool,
            config,
            allocator,
            credentials,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let request_timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    // Every route below requires HTTP Basic credentials.
    let protected_routes = Router::new()
        .route("/ipad_list/devices", get(devices::list_devices))
        .route("/history", post(telemetry::query_history))
        .route("/history/", post(telemetry::query_history))
        .route("/charging/batteries", post(telemetry::query_batteries))
        .route("/reservations/", get(reservations::overview))
        .route(
            "/reservations/list",
            get(reservations::list_all)
                .post(reservations::create)
                .put(reservations::update)
                .delete(reservations::delete),
        )
        .route(
            "/reservations/list/:ipad_group",
            get(reservations::list_by_resource_group),
        )
        .route("/reservations/free", get(reservations::free_groups))
        .route(
            "/reservations/groups",
            get(groups::list)
                .post(groups::create)
                .put(groups::update)
                .delete(groups::delete),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .with_state(state)
}
