//! Payment workflow.
//!
//! Opens hosted checkout sessions for the posting fee and reconciles their
//! asynchronous outcomes. A confirmed payment is the only thing that publishes
//! an event.
//!
//! # Idempotency
//!
//! Notifications arrive at least once and possibly concurrently. The payment
//! status write is a compare-and-set (`pending -> completed`), so exactly one
//! delivery performs the transition. Deliveries that find the payment already
//! terminal short-circuit before calling the gateway. A redelivery for a
//! completed payment whose event is still unpublished publishes it.
//!
//! # Partial failure
//!
//! The payment status is written before the event is published. A crash in
//! between leaves a completed payment with an unpublished event. The failed
//! delivery answers with an error, and the redelivery publishes the event.
//! [`PaymentWorkflow::find_stalled`] and
//! [`PaymentWorkflow::reconcile_stalled`] cover deliveries that never come.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use zenbali_core::{
    Actor, AdminId, CreatorId, Event, EventId, MarketError, NewPayment, Page, Payment,
    PaymentFilter, PaymentQuery, PaymentStatus, Result,
};
use zenbali_store::Store;

use crate::config::ServiceConfig;
use crate::events::EventLifecycle;
use crate::gateway::{CheckoutRequest, GatewayError, PaymentGateway};

/// Metadata key carrying the event ID on checkout sessions.
pub const METADATA_EVENT_ID: &str = "event_id";

/// Metadata key carrying the creator ID on checkout sessions.
pub const METADATA_CREATOR_ID: &str = "creator_id";

/// Posting-fee and gateway settings.
#[derive(Debug, Clone)]
pub struct PaymentSettings {
    /// Posting fee in minor currency units.
    pub posting_fee_cents: i64,
    /// Lower-case ISO currency code.
    pub currency: String,
    /// Bound on each gateway call.
    pub gateway_timeout: Duration,
    /// Public base URL for checkout redirects.
    pub base_url: String,
}

impl PaymentSettings {
    /// Settings taken from the service configuration.
    #[must_use]
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            posting_fee_cents: config.posting_fee_cents,
            currency: config.currency.clone(),
            gateway_timeout: Duration::from_secs(config.gateway_timeout_seconds),
            base_url: config.base_url.clone(),
        }
    }

    /// Redirect URLs for an event's checkout: `(success, cancel)`.
    #[must_use]
    pub fn redirect_urls(&self, event_id: EventId) -> (String, String) {
        (
            format!(
                "{}/creator/payment-success.html?event_id={event_id}",
                self.base_url
            ),
            format!(
                "{}/creator/payment-cancel.html?event_id={event_id}",
                self.base_url
            ),
        )
    }
}

/// A checkout session the payer should be redirected to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutLink {
    /// External session ID.
    pub session_id: String,
    /// Hosted payment page.
    pub session_url: String,
}

/// What a notification did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// This call performed the transition.
    Applied,
    /// The payment was already in a terminal state; nothing changed.
    AlreadyHandled,
}

/// Result of a reconciliation sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Stalled payments found.
    pub examined: usize,
    /// Events published by this sweep.
    pub repaired: usize,
    /// Events that could not be published.
    pub failed: usize,
}

/// Payment workflow manager.
#[derive(Clone)]
pub struct PaymentWorkflow {
    store: Arc<dyn Store>,
    events: EventLifecycle,
    gateway: Option<Arc<dyn PaymentGateway>>,
    settings: PaymentSettings,
}

impl PaymentWorkflow {
    /// Create a workflow. Without a gateway, checkout fails with
    /// `PaymentsUnavailable`.
    pub fn new(
        store: Arc<dyn Store>,
        events: EventLifecycle,
        gateway: Option<Arc<dyn PaymentGateway>>,
        settings: PaymentSettings,
    ) -> Self {
        Self {
            store,
            events,
            gateway,
            settings,
        }
    }

    /// Posting-fee settings.
    #[must_use]
    pub fn settings(&self) -> &PaymentSettings {
        &self.settings
    }

    /// Whether a gateway is configured.
    #[must_use]
    pub fn has_gateway(&self) -> bool {
        self.gateway.is_some()
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Open a checkout for an event the actor manages, with the standard
    /// redirect URLs.
    ///
    /// # Errors
    ///
    /// Returns `EventNotFound` or `NotOwner`, then the errors of
    /// [`Self::create_checkout_session`].
    pub async fn start_checkout(&self, event_id: EventId, actor: Actor) -> Result<CheckoutLink> {
        let event = self.events.get_managed(event_id, actor).await?;
        let (success_url, cancel_url) = self.settings.redirect_urls(event_id);
        self.create_checkout_session(&event, &success_url, &cancel_url)
            .await
    }

    /// Open a hosted checkout session for the posting fee and record a pending
    /// payment.
    ///
    /// Every call opens a new session; retries leave extra pending payments.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyPaid` for a paid event, `PaymentsUnavailable` without a
    /// gateway, `ExternalService` if the gateway fails or times out, or a
    /// storage error.
    pub async fn create_checkout_session(
        &self,
        event: &Event,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutLink> {
        if event.is_paid {
            return Err(MarketError::AlreadyPaid);
        }
        let gateway = self
            .gateway
            .as_ref()
            .ok_or(MarketError::PaymentsUnavailable)?;

        let request = CheckoutRequest {
            amount_cents: self.settings.posting_fee_cents,
            currency: self.settings.currency.clone(),
            product_name: format!("Event Posting Fee - {}", event.title),
            description: "Zen Bali event posting fee".to_string(),
            success_url: success_url.to_string(),
            cancel_url: cancel_url.to_string(),
            metadata: vec![
                (METADATA_EVENT_ID.to_string(), event.id.to_string()),
                (METADATA_CREATOR_ID.to_string(), event.creator_id.to_string()),
            ],
        };

        let opened = self
            .bounded(gateway.name(), gateway.create_session(&request))
            .await?;

        let payment = NewPayment::pending(
            event.id,
            event.creator_id,
            opened.session_id.clone(),
            self.settings.posting_fee_cents,
            &self.settings.currency,
        );
        self.store.insert_payment(&payment).await?;

        tracing::info!(
            event_id = %event.id,
            creator_id = %event.creator_id,
            session_id = %opened.session_id,
            amount_cents = self.settings.posting_fee_cents,
            "Checkout session opened"
        );

        Ok(CheckoutLink {
            session_id: opened.session_id,
            session_url: opened.redirect_url,
        })
    }

    // =========================================================================
    // Outcomes
    // =========================================================================

    /// Confirm a paid session: complete the payment, then publish the event.
    ///
    /// Safe to call any number of times, including concurrently.
    ///
    /// # Errors
    ///
    /// Returns `PaymentNotFound` for an unknown session, `ExternalService` if
    /// the gateway lookup fails, or a storage error. All are worth a
    /// redelivery.
    pub async fn handle_successful_payment(&self, session_id: &str) -> Result<PaymentOutcome> {
        let payment = self.payment_for_session(session_id).await?;

        if payment.status == PaymentStatus::Completed {
            return self.finish_completed(&payment).await;
        }

        if payment.status.is_terminal() {
            tracing::info!(
                session_id = %session_id,
                payment_status = %payment.status,
                "Payment already handled"
            );
            return Ok(PaymentOutcome::AlreadyHandled);
        }

        let payment_intent_id = match &self.gateway {
            Some(gateway) => {
                self.bounded(gateway.name(), gateway.get_session(session_id))
                    .await?
                    .payment_intent_id
            }
            None => {
                tracing::warn!(
                    session_id = %session_id,
                    "No payment gateway configured - completing without a payment intent"
                );
                None
            }
        };

        let applied = self
            .store
            .transition_payment(
                session_id,
                PaymentStatus::Pending,
                PaymentStatus::Completed,
                payment_intent_id.as_deref(),
            )
            .await?;

        if !applied {
            tracing::info!(
                session_id = %session_id,
                "Concurrent delivery completed the payment first"
            );
            return Ok(PaymentOutcome::AlreadyHandled);
        }

        tracing::info!(
            session_id = %session_id,
            event_id = %payment.event_id,
            payment_intent_id = ?payment_intent_id,
            payment_status = %PaymentStatus::Completed,
            "Payment completed"
        );

        self.events.mark_paid_and_publish(payment.event_id).await?;

        Ok(PaymentOutcome::Applied)
    }

    /// Record that a session expired or its payment failed.
    ///
    /// The event is left untouched so the creator can retry.
    ///
    /// # Errors
    ///
    /// Returns `PaymentNotFound` for an unknown session, or a storage error.
    pub async fn handle_failed_payment(&self, session_id: &str) -> Result<PaymentOutcome> {
        let payment = self.payment_for_session(session_id).await?;

        let applied = self
            .store
            .transition_payment(
                session_id,
                PaymentStatus::Pending,
                PaymentStatus::Failed,
                None,
            )
            .await?;

        if applied {
            tracing::info!(
                session_id = %session_id,
                event_id = %payment.event_id,
                payment_status = %PaymentStatus::Failed,
                "Payment failed"
            );
            Ok(PaymentOutcome::Applied)
        } else {
            tracing::info!(
                session_id = %session_id,
                payment_status = %payment.status,
                "Payment already handled"
            );
            Ok(PaymentOutcome::AlreadyHandled)
        }
    }

    // =========================================================================
    // Listings
    // =========================================================================

    /// A creator's payments, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn list_by_creator(
        &self,
        creator_id: CreatorId,
        filter: &PaymentFilter,
    ) -> Result<Page<Payment>> {
        let mut query = PaymentQuery::from(filter);
        query.creator_id = Some(creator_id);
        self.run(query).await
    }

    /// All payments, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn list_all(&self, admin: AdminId, filter: &PaymentFilter) -> Result<Page<Payment>> {
        tracing::debug!(admin_id = %admin, "Listing all payments");
        self.run(PaymentQuery::from(filter)).await
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    /// Completed payments whose event never got published.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn find_stalled(&self) -> Result<Vec<Payment>> {
        Ok(self.store.list_completed_unpublished().await?)
    }

    /// Publish the events of all stalled payments.
    ///
    /// Failures are counted and logged; the sweep continues.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the stalled payments cannot be listed.
    pub async fn reconcile_stalled(&self, admin: AdminId) -> Result<ReconcileReport> {
        let stalled = self.find_stalled().await?;
        let mut report = ReconcileReport {
            examined: stalled.len(),
            ..ReconcileReport::default()
        };

        for payment in &stalled {
            match self.events.mark_paid_and_publish(payment.event_id).await {
                Ok(()) => report.repaired += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(
                        error = %e,
                        session_id = %payment.session_id,
                        event_id = %payment.event_id,
                        "Failed to publish stalled event"
                    );
                }
            }
        }

        tracing::info!(
            admin_id = %admin,
            examined = report.examined,
            repaired = report.repaired,
            failed = report.failed,
            "Stalled publication sweep finished"
        );

        Ok(report)
    }

    /// Redelivery for a completed payment. Publishes the event if an earlier
    /// delivery completed the payment but failed before publishing; the
    /// payment transition itself was not performed here, so the outcome is
    /// still `AlreadyHandled`.
    async fn finish_completed(&self, payment: &Payment) -> Result<PaymentOutcome> {
        let event = self.events.get(payment.event_id).await?;
        if event.is_published {
            tracing::info!(
                session_id = %payment.session_id,
                payment_status = %payment.status,
                "Payment already handled"
            );
            return Ok(PaymentOutcome::AlreadyHandled);
        }

        self.events.mark_paid_and_publish(payment.event_id).await?;
        tracing::info!(
            session_id = %payment.session_id,
            event_id = %payment.event_id,
            "Published event of a completed payment on redelivery"
        );
        Ok(PaymentOutcome::AlreadyHandled)
    }

    async fn payment_for_session(&self, session_id: &str) -> Result<Payment> {
        self.store
            .get_payment_by_session(session_id)
            .await?
            .ok_or_else(|| MarketError::PaymentNotFound {
                session_id: session_id.to_string(),
            })
    }

    async fn run(&self, query: PaymentQuery) -> Result<Page<Payment>> {
        let (payments, total) = self.store.list_payments(&query).await?;
        Ok(Page::new(payments, total, query.pagination))
    }

    /// Run a gateway call under the configured timeout.
    async fn bounded<T>(
        &self,
        service: &str,
        call: impl Future<Output = std::result::Result<T, GatewayError>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.settings.gateway_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, service = %service, "Payment gateway call failed");
                Err(MarketError::external(service, e))
            }
            Err(_) => {
                tracing::warn!(
                    service = %service,
                    timeout_ms = u64::try_from(self.settings.gateway_timeout.as_millis())
                        .unwrap_or(u64::MAX),
                    "Payment gateway call timed out"
                );
                Err(MarketError::external(service, "request timed out"))
            }
        }
    }
}
