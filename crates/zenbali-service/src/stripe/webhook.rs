//! Stripe webhook signature verification.
//!
//! The `Stripe-Signature` header looks like `t=1700000000,v1=<hex>,v1=<hex>`.
//! Each `v1` value is an HMAC-SHA256 over `"{t}.{raw body}"` keyed with the
//! endpoint's signing secret. Any one matching `v1` is accepted.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::client::StripeError;
use super::types::WebhookEvent;

type HmacSha256 = Hmac<Sha256>;

/// MAC over the signed payload `"{timestamp}.{payload}"`.
///
/// # Panics
///
/// Never in practice: HMAC-SHA256 accepts keys of any length (RFC 2104), so
/// `new_from_slice` cannot fail.
fn signed_payload_mac(secret: &str, timestamp: &str, payload: &str) -> HmacSha256 {
    // INVARIANT: HMAC accepts keys of any length.
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC-SHA256 accepts any key size");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload.as_bytes());
    mac
}

/// Build a `Stripe-Signature` header value for `payload`.
///
/// Used to sign test deliveries and local replays.
#[must_use]
pub fn signature_header(secret: &str, timestamp: i64, payload: &str) -> String {
    let timestamp = timestamp.to_string();
    let signature = signed_payload_mac(secret, &timestamp, payload)
        .finalize()
        .into_bytes();
    format!("t={timestamp},v1={}", hex::encode(signature))
}

/// Verify a `Stripe-Signature` header against the raw request body.
///
/// `now` is the current Unix time; a signature whose timestamp is more than
/// `tolerance_seconds` away from it is rejected. A tolerance of zero disables
/// the freshness check.
///
/// # Errors
///
/// Returns `StripeError::InvalidSignature` if the header is malformed, stale,
/// or carries no matching signature.
pub fn verify_signature(
    payload: &str,
    header: &str,
    secret: &str,
    tolerance_seconds: i64,
    now: i64,
) -> Result<(), StripeError> {
    let mut timestamp: Option<&str> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", ts)) => timestamp = Some(ts),
            Some(("v1", sig)) => signatures.push(sig),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(StripeError::InvalidSignature)?;
    let issued_at: i64 = timestamp
        .parse()
        .map_err(|_| StripeError::InvalidSignature)?;

    if tolerance_seconds > 0 && (now - issued_at).abs() > tolerance_seconds {
        tracing::debug!(
            issued_at = issued_at,
            now = now,
            tolerance_seconds = tolerance_seconds,
            "Webhook signature timestamp outside tolerance"
        );
        return Err(StripeError::InvalidSignature);
    }

    let valid = signatures.iter().any(|sig| {
        hex::decode(sig).is_ok_and(|expected| {
            signed_payload_mac(secret, timestamp, payload)
                .verify_slice(&expected)
                .is_ok()
        })
    });

    if valid {
        Ok(())
    } else {
        Err(StripeError::InvalidSignature)
    }
}

/// Verify a delivery and parse it into a [`WebhookEvent`].
///
/// # Errors
///
/// Returns `InvalidSignature` for an unverifiable delivery and `Serialization`
/// if the verified body is not a Stripe event.
pub fn construct_event(
    payload: &str,
    header: &str,
    secret: &str,
    tolerance_seconds: i64,
    now: i64,
) -> Result<WebhookEvent, StripeError> {
    verify_signature(payload, header, secret, tolerance_seconds, now)?;
    Ok(serde_json::from_str(payload)?)
}
