//! HTTP router configuration

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::runtime::handlers::{ExporterState, health_check, metrics_endpoint};

/// Create the router serving the scrape and health endpoints
pub fn router(state: ExporterState) -> Router {
    Router::new()
        .route("/", get(metrics_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
