//! Payment types for zenbali.
//!
//! A payment row records one hosted-checkout attempt for an event's posting
//! fee. It is created `pending` and moves to `completed` or `failed` exactly
//! once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::pagination::Pagination;
use crate::{CreatorId, EventId, MarketError, PaymentId};

/// Status of a payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Checkout session opened, outcome unknown.
    Pending,
    /// Processor confirmed the charge.
    Completed,
    /// Session expired or the charge failed.
    Failed,
    /// Refunded by an administrator outside the normal flow.
    Refunded,
}

impl PaymentStatus {
    /// Database and wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }

    /// Terminal statuses never transition again through normal flow.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            other => Err(MarketError::Serialization(format!(
                "unknown payment status: {other}"
            ))),
        }
    }
}

/// A payment attempt joined with its event title and creator name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Payment ID.
    pub id: PaymentId,
    /// Event the posting fee is for.
    pub event_id: EventId,
    /// Creator who opened the checkout.
    pub creator_id: CreatorId,
    /// External checkout session ID. Unique.
    pub session_id: String,
    /// External payment intent ID, known once the charge is confirmed.
    pub payment_intent_id: Option<String>,
    /// Amount in minor currency units.
    pub amount_cents: i64,
    /// ISO currency code, upper case.
    pub currency: String,
    /// Current status.
    pub status: PaymentStatus,
    /// When the checkout was opened.
    pub created_at: DateTime<Utc>,
    /// When the status last changed.
    pub updated_at: DateTime<Utc>,

    /// Event title.
    pub event_title: String,
    /// Creator display name.
    pub creator_name: String,
}

/// A pending payment to record after a checkout session is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    /// Payment ID.
    pub id: PaymentId,
    /// Event the posting fee is for.
    pub event_id: EventId,
    /// Creator who opened the checkout.
    pub creator_id: CreatorId,
    /// External checkout session ID.
    pub session_id: String,
    /// Amount in minor currency units.
    pub amount_cents: i64,
    /// ISO currency code, upper case.
    pub currency: String,
}

impl NewPayment {
    /// A new pending payment for `session_id`.
    #[must_use]
    pub fn pending(
        event_id: EventId,
        creator_id: CreatorId,
        session_id: impl Into<String>,
        amount_cents: i64,
        currency: &str,
    ) -> Self {
        Self {
            id: PaymentId::generate(),
            event_id,
            creator_id,
            session_id: session_id.into(),
            amount_cents,
            currency: currency.to_uppercase(),
        }
    }
}

/// Listing filter supplied by callers (query string).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PaymentFilter {
    /// Only payments in this status.
    pub status: Option<PaymentStatus>,
    /// 1-based page number.
    pub page: Option<u32>,
    /// Page size.
    pub limit: Option<u32>,
}

/// A resolved payment query as executed by the store.
///
/// Results are ordered newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentQuery {
    /// Restrict to one creator.
    pub creator_id: Option<CreatorId>,
    /// Restrict to one event.
    pub event_id: Option<EventId>,
    /// Restrict to one status.
    pub status: Option<PaymentStatus>,
    /// Page window.
    pub pagination: Pagination,
}

impl From<&PaymentFilter> for PaymentQuery {
    fn from(filter: &PaymentFilter) -> Self {
        Self {
            creator_id: None,
            event_id: None,
            status: filter.status,
            pagination: Pagination::new(filter.page, filter.limit),
        }
    }
}

impl PaymentQuery {
    /// Whether `payment` satisfies every predicate of this query.
    #[must_use]
    pub fn matches(&self, payment: &Payment) -> bool {
        self.creator_id.map_or(true, |id| id == payment.creator_id)
            && self.event_id.map_or(true, |id| id == payment.event_id)
            && self.status.map_or(true, |s| s == payment.status)
    }
}
