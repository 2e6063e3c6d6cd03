//! Health check handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Service version.
    pub version: String,
    /// Whether the store answered.
    pub database: bool,
    /// Whether a payment gateway is configured.
    pub payments: bool,
}

/// Health check endpoint. Responds 503 while the store is unreachable.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let database = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check: store unreachable");
            false
        }
    };

    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if database { "ok" } else { "degraded" }.to_string(),
            service: "zenbali".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database,
            payments: state.has_payments(),
        }),
    )
}
