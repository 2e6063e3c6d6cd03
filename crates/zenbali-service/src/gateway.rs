//! Payment gateway abstraction.
//!
//! The payment workflow talks to the hosted-checkout processor only through
//! [`PaymentGateway`], so tests can substitute a fake and the Stripe client
//! stays a thin HTTP wrapper.

use async_trait::async_trait;

/// A hosted checkout session to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    /// Amount in minor currency units.
    pub amount_cents: i64,
    /// Lower-case ISO currency code.
    pub currency: String,
    /// Line item name shown on the checkout page.
    pub product_name: String,
    /// Line item description.
    pub description: String,
    /// Where the processor redirects after payment.
    pub success_url: String,
    /// Where the processor redirects if the payer backs out.
    pub cancel_url: String,
    /// Opaque key/value pairs echoed back in notifications.
    pub metadata: Vec<(String, String)>,
}

/// A checkout session opened by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedSession {
    /// External session ID.
    pub session_id: String,
    /// Hosted payment page to redirect the payer to.
    pub redirect_url: String,
}

/// Confirmation details of a checkout session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionDetails {
    /// External payment intent ID, once a payment was attempted.
    pub payment_intent_id: Option<String>,
    /// Processor-reported payment status, e.g. `paid` or `unpaid`.
    pub payment_status: Option<String>,
}

/// Error returned by a payment gateway.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct GatewayError(pub String);

/// Hosted-checkout payment processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Open a hosted checkout session.
    ///
    /// # Errors
    ///
    /// Returns an error if the processor rejects the request or is unreachable.
    async fn create_session(&self, request: &CheckoutRequest)
        -> Result<OpenedSession, GatewayError>;

    /// Fetch the confirmation details of a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the processor rejects the request or is unreachable.
    async fn get_session(&self, session_id: &str) -> Result<SessionDetails, GatewayError>;
}
