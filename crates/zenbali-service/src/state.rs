//! Application state.

use std::sync::Arc;
use std::time::Duration;

use zenbali_store::Store;

use crate::config::ServiceConfig;
use crate::events::EventLifecycle;
use crate::gateway::PaymentGateway;
use crate::ingest::WebhookIngestor;
use crate::payments::{PaymentSettings, PaymentWorkflow};
use crate::stripe::StripeClient;
use crate::upload::UploadService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<dyn Store>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Event lifecycle manager.
    pub events: EventLifecycle,

    /// Payment workflow manager.
    pub payments: PaymentWorkflow,

    /// Webhook ingestion.
    pub ingestor: WebhookIngestor,

    /// Event image storage.
    pub uploads: UploadService,
}

impl AppState {
    /// Create application state, building the Stripe gateway if configured.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        let gateway = config.stripe_secret_key.as_ref().and_then(|key| {
            match StripeClient::new(
                key,
                config.stripe_api_base.clone(),
                Duration::from_secs(config.gateway_timeout_seconds),
            ) {
                Ok(client) => {
                    tracing::info!("Stripe integration enabled");
                    Some(Arc::new(client) as Arc<dyn PaymentGateway>)
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create Stripe client");
                    None
                }
            }
        });

        if gateway.is_none() {
            tracing::warn!("Stripe not configured - payments will not be available");
        }

        Self::with_gateway(store, config, gateway)
    }

    /// Create application state around an explicit gateway.
    #[must_use]
    pub fn with_gateway(
        store: Arc<dyn Store>,
        config: ServiceConfig,
        gateway: Option<Arc<dyn PaymentGateway>>,
    ) -> Self {
        let events = EventLifecycle::new(store.clone());
        let payments = PaymentWorkflow::new(
            store.clone(),
            events.clone(),
            gateway,
            PaymentSettings::from_config(&config),
        );
        let ingestor = WebhookIngestor::new(
            payments.clone(),
            config.stripe_webhook_secret.clone(),
            config.webhook_tolerance_seconds,
        );
        let uploads = UploadService::new(config.upload_dir.clone(), config.max_upload_bytes);

        Self {
            store,
            config,
            events,
            payments,
            ingestor,
            uploads,
        }
    }

    /// Check if a payment gateway is configured.
    #[must_use]
    pub fn has_payments(&self) -> bool {
        self.payments.has_gateway()
    }
}
