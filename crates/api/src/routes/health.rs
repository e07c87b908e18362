//! Liveness and readiness probes.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;

use crate::AppState;

/// Probe response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy`, `ready`, or `unavailable`.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Payment methods loaded at startup. Only reported by the readiness probe.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_methods: Option<usize>,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        payment_methods: None,
    })
}

/// Ready once the database answers and the method registry is populated.
async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let methods = state.ctx.registry.len();
    let ready = methods > 0 && state.db.ping().await.is_ok();
    let status = if ready {
        StatusCode::OK
    } else {
        tracing::warn!(payment_methods = methods, "readiness probe failed");
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if ready { "ready" } else { "unavailable" },
            version: env!("CARGO_PKG_VERSION"),
            payment_methods: Some(methods),
        }),
    )
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness))
}
