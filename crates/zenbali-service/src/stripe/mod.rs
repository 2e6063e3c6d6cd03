//! Stripe integration for posting-fee payments.
//!
//! Stripe handles:
//! - Hosted Checkout sessions for the posting fee
//! - Session lookups when a payment is confirmed
//! - Signed webhook notifications

pub mod client;
pub mod types;
pub mod webhook;

pub use client::{StripeClient, StripeError};
pub use types::*;
pub use webhook::{construct_event, signature_header, verify_signature};
