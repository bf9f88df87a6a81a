//! Liveness endpoint

/// GET /health - answers without contacting the broker
pub async fn health_check() -> &'static str {
    "ok"
}
