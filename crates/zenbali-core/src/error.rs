//! Error types for zenbali.

use crate::ids::IdError;

/// Result type for zenbali operations.
pub type Result<T> = std::result::Result<T, MarketError>;

/// Errors that can occur in event and payment operations.
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    /// Event does not exist.
    #[error("event not found: {event_id}")]
    EventNotFound {
        /// The event ID that was not found.
        event_id: String,
    },

    /// No payment is recorded for the external checkout session.
    #[error("payment not found for session: {session_id}")]
    PaymentNotFound {
        /// The external session ID that was looked up.
        session_id: String,
    },

    /// Creator account does not exist.
    #[error("creator not found: {creator_id}")]
    CreatorNotFound {
        /// The creator ID that was not found.
        creator_id: String,
    },

    /// The requester does not own the event.
    #[error("not the owner of this event")]
    NotOwner,

    /// The event date is before today and the requester is not an admin.
    #[error("cannot modify past events")]
    EventInPast,

    /// A date string could not be parsed as a calendar date.
    #[error("invalid date format (expected YYYY-MM-DD): {0}")]
    InvalidDate(String),

    /// A required field is absent or empty.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// A monetary amount is out of range.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// A referenced location, event type, entrance type or account does not exist.
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// A reference-data row does not exist.
    #[error("{kind} not found: {id}")]
    ReferenceNotFound {
        /// Which table was searched.
        kind: String,
        /// The row ID that was not found.
        id: String,
    },

    /// A unique value is already taken.
    #[error("duplicate: {0}")]
    Duplicate(String),

    /// The event's posting fee has already been paid.
    #[error("event already paid")]
    AlreadyPaid,

    /// The authenticated account is missing or deactivated.
    #[error("account is inactive")]
    AccountInactive,

    /// No payment gateway is configured.
    #[error("payments are not configured")]
    PaymentsUnavailable,

    /// An external service failed or timed out. Safe to retry.
    #[error("external service error: {service} - {message}")]
    ExternalService {
        /// The service that failed.
        service: String,
        /// Error message.
        message: String,
    },

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Stored data could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}

impl MarketError {
    /// Stable, machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EventNotFound { .. } => "event_not_found",
            Self::PaymentNotFound { .. } => "payment_not_found",
            Self::CreatorNotFound { .. } => "creator_not_found",
            Self::NotOwner => "not_owner",
            Self::EventInPast => "event_in_past",
            Self::InvalidDate(_) => "invalid_date",
            Self::MissingField(_) => "missing_field",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::InvalidReference(_) => "invalid_reference",
            Self::ReferenceNotFound { .. } => "reference_not_found",
            Self::Duplicate(_) => "duplicate",
            Self::AlreadyPaid => "already_paid",
            Self::AccountInactive => "account_inactive",
            Self::PaymentsUnavailable => "payments_unavailable",
            Self::ExternalService { .. } => "external_service_error",
            Self::Storage(_) | Self::Serialization(_) => "internal_error",
            Self::InvalidId(_) => "invalid_id",
        }
    }

    /// Whether the failure is transient and the caller may retry.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::ExternalService { .. } | Self::Storage(_))
    }

    /// Shorthand for an `EventNotFound` error.
    #[must_use]
    pub fn event_not_found(event_id: impl ToString) -> Self {
        Self::EventNotFound {
            event_id: event_id.to_string(),
        }
    }

    /// Shorthand for an `ExternalService` error.
    #[must_use]
    pub fn external(service: &str, message: impl ToString) -> Self {
        Self::ExternalService {
            service: service.to_string(),
            message: message.to_string(),
        }
    }
}
