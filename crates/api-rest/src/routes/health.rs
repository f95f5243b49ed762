//! Health check endpoints.
//!
//! `/health` is pure liveness and never touches a backend. `/health/ready`
//! reports store reachability: on Postgres it runs a probe query and answers
//! 503 when the pool is unhealthy; on the in-memory backend it is always
//! ready.

use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service name
    pub service: String,

    /// Service version
    pub version: String,
}

/// Readiness check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReadinessResponse {
    /// Overall readiness status
    pub ready: bool,

    /// Database probe result; absent on the in-memory backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseReadiness>,
}

/// Database probe detail
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DatabaseReadiness {
    /// Whether the probe query succeeded
    pub healthy: bool,

    /// Probe latency in milliseconds
    pub latency_ms: u64,

    /// Current connection pool size
    pub pool_size: u32,
}

/// Health check routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(ready))
}

/// Liveness check
///
/// Returns service status and version information.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub(crate) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "civicwatch-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness check
///
/// Probes the configured store and reports 503 until it is reachable.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Service is ready", body = ReadinessResponse),
        (status = 503, description = "Store unreachable", body = ReadinessResponse)
    )
)]
pub(crate) async fn ready(State(state): State<AppState>) -> Response {
    match state.database() {
        Some(pool) => {
            let health = pool.health_check().await;
            let body = ReadinessResponse {
                ready: health.healthy,
                database: Some(DatabaseReadiness {
                    healthy: health.healthy,
                    latency_ms: health.latency.as_millis() as u64,
                    pool_size: health.pool_size,
                }),
            };
            let status = if health.healthy {
                StatusCode::OK
            } else {
                StatusCode::SERVICE_UNAVAILABLE
            };
            (status, Json(body)).into_response()
        }
        None => Json(ReadinessResponse {
            ready: true,
            database: None,
        })
        .into_response(),
    }
}
