//! Zenbali Service - HTTP API for the events marketplace.
//!
//! Creators submit events, pay a posting fee through Stripe Checkout, and the
//! event is published once Stripe confirms the payment.
//!
//! # Modules
//!
//! - [`events`]: event lifecycle (creation, edits, deletion, publication)
//! - [`payments`]: checkout sessions and payment outcome reconciliation
//! - [`ingest`]: verified, idempotent Stripe webhook dispatch
//! - [`gateway`] / [`stripe`]: the hosted-checkout processor
//! - [`auth`], [`upload`], [`routes`], [`handlers`]: the HTTP shell
//!
//! # Authentication
//!
//! - **Creator / admin endpoints**: `Authorization: Bearer <HS256 JWT>`
//! - **Webhooks**: `Stripe-Signature` header verification

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::unused_async)]

pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod gateway;
pub mod handlers;
pub mod ingest;
pub mod payments;
pub mod routes;
pub mod state;
pub mod stripe;
pub mod upload;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use events::EventLifecycle;
pub use gateway::{CheckoutRequest, GatewayError, OpenedSession, PaymentGateway, SessionDetails};
pub use ingest::{Disposition, IngestError, WebhookIngestor};
pub use payments::{CheckoutLink, PaymentOutcome, PaymentSettings, PaymentWorkflow, ReconcileReport};
pub use routes::create_router;
pub use state::AppState;
