//! Health check endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health.

use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

/// Health response body.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct HealthResponse {
    /// `ok`, `ready` or `unavailable`
    pub status: &'static str,
}

/// Liveness probe.
///
/// Returns 200 OK while the process is serving requests. Does NOT check the
/// database.
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

/// Readiness probe backed by a store round-trip.
///
/// # Status Codes
///
/// - 200 OK: the store answered
/// - 503 Service Unavailable: the store did not
///
/// ```text
/// GET /health/ready
/// ```
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse { status: "ready" })),
        Err(err) => {
            tracing::warn!(error = %err, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                }),
            )
        },
    }
}
