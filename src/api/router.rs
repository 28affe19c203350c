use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use super::health;
use super::state::AppState;
use super::v1;
use crate::infrastructure::observability::{PrometheusMetrics, create_metrics_router};

/// Create the full router with application state
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .nest("/v1", v1::create_v1_router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Full router plus the Prometheus endpoint at `path`
pub fn create_router_with_metrics(
    state: AppState,
    metrics: PrometheusMetrics,
    path: &str,
) -> Router {
    create_router(state).merge(create_metrics_router(metrics, path))
}
