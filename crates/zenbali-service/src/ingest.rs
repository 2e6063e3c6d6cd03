//! Webhook ingestion.
//!
//! Verifies Stripe notifications and dispatches them to the payment workflow.
//! Acknowledgement policy:
//!
//! - Success outcomes that fail downstream return [`IngestError::Processing`]
//!   so Stripe redelivers.
//! - Failure outcomes (expired sessions, failed async payments) are logged and
//!   acknowledged even if handling them fails.
//! - Unknown event types are acknowledged.

use serde::Deserialize;

use zenbali_core::MarketError;

use crate::payments::{PaymentOutcome, PaymentWorkflow};
use crate::stripe::{construct_event, StripeError, WebhookEvent};

/// Checkout finished; payment may still be pending for async methods.
pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";
/// Delayed payment method succeeded.
pub const ASYNC_PAYMENT_SUCCEEDED: &str = "checkout.session.async_payment_succeeded";
/// Delayed payment method failed.
pub const ASYNC_PAYMENT_FAILED: &str = "checkout.session.async_payment_failed";
/// Session expired without payment.
pub const CHECKOUT_EXPIRED: &str = "checkout.session.expired";

/// Error type for webhook ingestion.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Signing secret configured but no signature header sent.
    #[error("missing Stripe-Signature header")]
    MissingSignature,

    /// Signature did not verify.
    #[error("invalid webhook signature")]
    InvalidSignature,

    /// Body is not a well-formed notification.
    #[error("malformed notification: {0}")]
    Malformed(String),

    /// Downstream handling failed; the notification should be redelivered.
    #[error("processing failed: {0}")]
    Processing(#[from] MarketError),
}

/// What happened to an accepted notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Dispatched to the payment workflow.
    Handled(PaymentOutcome),
    /// Accepted without action.
    Ignored,
}

/// The fields of a checkout session object the workflow needs.
#[derive(Debug, Deserialize)]
struct SessionObject {
    id: String,
    #[serde(default)]
    payment_status: Option<String>,
}

/// Verifies and dispatches payment notifications.
#[derive(Clone)]
pub struct WebhookIngestor {
    payments: PaymentWorkflow,
    signing_secret: Option<String>,
    tolerance_seconds: i64,
}

impl WebhookIngestor {
    /// Create an ingestor. Without a signing secret, notifications are accepted
    /// unverified.
    pub fn new(
        payments: PaymentWorkflow,
        signing_secret: Option<String>,
        tolerance_seconds: i64,
    ) -> Self {
        if signing_secret.is_none() {
            tracing::warn!(
                "STRIPE_WEBHOOK_SECRET not set - webhook signatures will not be verified"
            );
        }
        Self {
            payments,
            signing_secret,
            tolerance_seconds,
        }
    }

    /// Whether notifications are signature-checked.
    #[must_use]
    pub fn verifies_signatures(&self) -> bool {
        self.signing_secret.is_some()
    }

    /// Verify, parse and dispatch one delivery.
    ///
    /// # Errors
    ///
    /// Returns `MissingSignature`, `InvalidSignature` or `Malformed` for
    /// deliveries that should be rejected, and `Processing` when a success
    /// outcome could not be applied.
    pub async fn ingest(
        &self,
        payload: &str,
        signature: Option<&str>,
    ) -> Result<Disposition, IngestError> {
        let event = self.parse(payload, signature)?;

        tracing::info!(
            event_type = %event.event_type,
            event_id = %event.id,
            "Received Stripe webhook"
        );

        match event.event_type.as_str() {
            CHECKOUT_COMPLETED => {
                let session = session_of(&event)?;
                if session.payment_status.as_deref() == Some("unpaid") {
                    tracing::info!(
                        session_id = %session.id,
                        payment_status = "unpaid",
                        "Checkout completed with payment still pending"
                    );
                    return Ok(Disposition::Ignored);
                }
                self.succeed(&session.id).await
            }
            ASYNC_PAYMENT_SUCCEEDED => {
                let session = session_of(&event)?;
                self.succeed(&session.id).await
            }
            CHECKOUT_EXPIRED | ASYNC_PAYMENT_FAILED => {
                let session = session_of(&event)?;
                match self.payments.handle_failed_payment(&session.id).await {
                    Ok(outcome) => Ok(Disposition::Handled(outcome)),
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            session_id = %session.id,
                            event_type = %event.event_type,
                            "Failed to record payment failure"
                        );
                        Ok(Disposition::Ignored)
                    }
                }
            }
            _ => {
                tracing::debug!(event_type = %event.event_type, "Unhandled Stripe event");
                Ok(Disposition::Ignored)
            }
        }
    }

    fn parse(&self, payload: &str, signature: Option<&str>) -> Result<WebhookEvent, IngestError> {
        let Some(secret) = &self.signing_secret else {
            tracing::warn!("Accepting unverified webhook - no signing secret configured");
            return serde_json::from_str(payload)
                .map_err(|e| IngestError::Malformed(e.to_string()));
        };

        let signature = signature.ok_or_else(|| {
            tracing::warn!("Webhook delivery without Stripe-Signature header");
            IngestError::MissingSignature
        })?;

        let now = chrono::Utc::now().timestamp();
        construct_event(payload, signature, secret, self.tolerance_seconds, now).map_err(
            |e| match e {
                StripeError::Serialization(e) => IngestError::Malformed(e.to_string()),
                other => {
                    tracing::warn!(error = %other, "Invalid Stripe webhook signature");
                    IngestError::InvalidSignature
                }
            },
        )
    }

    async fn succeed(&self, session_id: &str) -> Result<Disposition, IngestError> {
        match self.payments.handle_successful_payment(session_id).await {
            Ok(outcome) => Ok(Disposition::Handled(outcome)),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    session_id = %session_id,
                    "Failed to apply successful payment"
                );
                Err(IngestError::Processing(e))
            }
        }
    }
}

fn session_of(event: &WebhookEvent) -> Result<SessionObject, IngestError> {
    serde_json::from_value(event.data.object.clone())
        .map_err(|e| IngestError::Malformed(format!("checkout session object: {e}")))
}
