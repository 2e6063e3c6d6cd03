//! API handlers.

pub mod admin;
pub mod creator;
pub mod health;
pub mod public;
pub mod webhooks;

use serde::Serialize;

use crate::error::ApiError;

/// Response for endpoints that only confirm an action.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable confirmation.
    pub message: String,
}

impl MessageResponse {
    /// Wrap a confirmation message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Parse a path segment as an ID, rejecting malformed values with 400.
pub(crate) fn parse_id<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid {what} ID")))
}
