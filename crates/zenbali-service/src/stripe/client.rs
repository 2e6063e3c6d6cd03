//! Stripe API client implementation.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::types::{CheckoutSession, StripeErrorResponse};
use crate::gateway::{CheckoutRequest, GatewayError, OpenedSession, PaymentGateway, SessionDetails};

/// Error type for Stripe operations.
#[derive(Debug, thiserror::Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stripe API returned an error.
    #[error("Stripe API error: {error_type} - {message}")]
    Api {
        /// Error type.
        error_type: String,
        /// Error message.
        message: String,
        /// Error code.
        code: Option<String>,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid webhook signature.
    #[error("Invalid webhook signature")]
    InvalidSignature,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<StripeError> for GatewayError {
    fn from(err: StripeError) -> Self {
        Self(err.to_string())
    }
}

/// Stripe API client.
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl StripeClient {
    /// Stripe API base URL.
    pub const BASE_URL: &'static str = "https://api.stripe.com/v1";

    /// Create a new Stripe client.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Stripe secret API key (`sk_test_...` or `sk_live_...`)
    /// * `base_url` - API root, normally [`Self::BASE_URL`]
    /// * `timeout` - Per-request timeout
    ///
    /// # Errors
    ///
    /// Returns `Configuration` for an empty key, or `Http` if the HTTP client
    /// cannot be built.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, StripeError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(StripeError::Configuration("Stripe API key is empty".into()));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create a Checkout session for an event posting fee.
    pub async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, StripeError> {
        let mut params = vec![
            ("mode".to_string(), "payment".to_string()),
            ("payment_method_types[]".to_string(), "card".to_string()),
            ("success_url".to_string(), request.success_url.clone()),
            ("cancel_url".to_string(), request.cancel_url.clone()),
            (
                "line_items[0][price_data][currency]".to_string(),
                request.currency.clone(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                request.product_name.clone(),
            ),
            (
                "line_items[0][price_data][product_data][description]".to_string(),
                request.description.clone(),
            ),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                request.amount_cents.to_string(),
            ),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
        ];

        for (key, value) in &request.metadata {
            params.push((format!("metadata[{key}]"), value.clone()));
        }

        tracing::debug!(
            amount_cents = %request.amount_cents,
            currency = %request.currency,
            "Creating Stripe checkout session"
        );

        let response = self
            .client
            .post(format!("{}/checkout/sessions", self.base_url))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .form(&params)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Retrieve a Checkout session by ID.
    pub async fn get_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, StripeError> {
        let response = self
            .client
            .get(format!("{}/checkout/sessions/{}", self.base_url, session_id))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, StripeError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        // Try to parse error response
        let error_body: Result<StripeErrorResponse, _> = response.json().await;

        match error_body {
            Ok(stripe_error) => Err(StripeError::Api {
                error_type: stripe_error.error.error_type,
                message: stripe_error.error.message,
                code: stripe_error.error.code,
            }),
            Err(_) => Err(StripeError::Api {
                error_type: "unknown".to_string(),
                message: format!("HTTP {status}"),
                code: None,
            }),
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    fn name(&self) -> &'static str {
        "stripe"
    }

    async fn create_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<OpenedSession, GatewayError> {
        let session = self.create_checkout_session(request).await?;
        let redirect_url = session.url.ok_or_else(|| {
            GatewayError(format!("checkout session {} has no URL", session.id))
        })?;

        Ok(OpenedSession {
            session_id: session.id,
            redirect_url,
        })
    }

    async fn get_session(&self, session_id: &str) -> Result<SessionDetails, GatewayError> {
        let session = self.get_checkout_session(session_id).await?;

        Ok(SessionDetails {
            payment_intent_id: session.payment_intent,
            payment_status: session.payment_status,
        })
    }
}
