//! Stripe webhook handler.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Serialize;

use crate::error::ApiError;
use crate::ingest::IngestError;
use crate::state::AppState;

/// Webhook response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Whether the webhook was accepted.
    pub received: bool,
}

/// Handle Stripe webhooks.
///
/// Responds 200 once the delivery is verified and either applied or safely
/// ignorable, 400 for deliveries that must not be retried as-is, and 500
/// (without detail) when Stripe should redeliver.
pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<(StatusCode, Json<WebhookResponse>), ApiError> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok());

    match state.ingestor.ingest(&body, signature).await {
        Ok(disposition) => {
            tracing::debug!(disposition = ?disposition, "Webhook acknowledged");
            Ok((StatusCode::OK, Json(WebhookResponse { received: true })))
        }
        Err(IngestError::MissingSignature) => {
            Err(ApiError::BadRequest("Missing Stripe signature".into()))
        }
        Err(IngestError::InvalidSignature) => {
            Err(ApiError::BadRequest("Invalid webhook signature".into()))
        }
        Err(IngestError::Malformed(msg)) => Err(ApiError::BadRequest(msg)),
        Err(IngestError::Processing(e)) => Err(ApiError::Internal(format!(
            "webhook processing failed: {e}"
        ))),
    }
}
