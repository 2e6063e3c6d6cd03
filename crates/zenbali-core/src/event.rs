//! Event types for zenbali.
//!
//! An event is created unpaid and unpublished. It becomes publicly listed only
//! through the payment workflow, which flips `is_paid` and `is_published`
//! together in a single store write.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::pagination::Pagination;
use crate::{CreatorId, EventId, MarketError, Result};

/// Calendar date format accepted on input and emitted on output.
pub const EVENT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` calendar date.
///
/// # Errors
///
/// Returns `MarketError::InvalidDate` if the string is not a valid date.
pub fn parse_event_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), EVENT_DATE_FORMAT)
        .map_err(|_| MarketError::InvalidDate(raw.to_string()))
}

// ============================================================================
// Read model
// ============================================================================

/// A persisted event joined with its creator and reference-data names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event ID.
    pub id: EventId,
    /// Owning creator.
    pub creator_id: CreatorId,
    /// Title shown in listings.
    pub title: String,
    /// Calendar date the event takes place on.
    pub event_date: NaiveDate,
    /// Free-form time of day, e.g. `"18:30"`.
    pub event_time: Option<String>,
    /// Location reference.
    pub location_id: i32,
    /// Event type reference.
    pub event_type_id: i32,
    /// Entrance type reference.
    pub entrance_type_id: i32,
    /// Entrance fee charged to attendees. Never negative.
    pub entrance_fee: Decimal,
    /// Free-form duration, e.g. `"2 hours"`.
    pub duration: Option<String>,
    /// Intended audience, e.g. `"women only"`.
    pub participant_group_type: Option<String>,
    /// Name of the facilitator.
    pub lead_by: Option<String>,
    /// Contact email for attendees.
    pub contact_email: String,
    /// Contact phone for attendees.
    pub contact_mobile: Option<String>,
    /// Free-text notes.
    pub notes: Option<String>,
    /// Public URL of the event image.
    pub image_url: Option<String>,
    /// Posting fee has been paid.
    pub is_paid: bool,
    /// Event is publicly listed. Implies `is_paid`.
    pub is_published: bool,
    /// When the event was created.
    pub created_at: DateTime<Utc>,
    /// When the event was last modified.
    pub updated_at: DateTime<Utc>,

    /// Creator display name.
    pub creator_name: String,
    /// Creator organization, if any.
    pub organization_name: Option<String>,
    /// Location name.
    pub location_name: String,
    /// Event type name.
    pub event_type_name: String,
    /// Entrance type name.
    pub entrance_type_name: String,
}

impl Event {
    /// Whether the event date is strictly before `today`.
    #[must_use]
    pub fn is_past(&self, today: NaiveDate) -> bool {
        self.event_date < today
    }

    /// Whether the publication invariant holds for this record.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        !self.is_published || self.is_paid
    }

    /// Lifecycle state, given whether a checkout is currently open for it.
    #[must_use]
    pub const fn state(&self, has_pending_payment: bool) -> EventState {
        if self.is_paid {
            EventState::Published
        } else if has_pending_payment {
            EventState::PendingPayment
        } else {
            EventState::Draft
        }
    }
}

/// Lifecycle state of an event.
///
/// `Draft -> PendingPayment -> Published`. Only a confirmed payment advances an
/// event to `Published` and nothing moves it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventState {
    /// Unpaid and unpublished with no open checkout.
    Draft,
    /// Unpaid with at least one pending checkout session.
    PendingPayment,
    /// Paid and publicly listed.
    Published,
}

// ============================================================================
// Write model
// ============================================================================

/// Event fields supplied by a creator when submitting a new event.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventFields {
    /// Title. Required.
    pub title: String,
    /// Date as `YYYY-MM-DD`. Required.
    pub event_date: String,
    /// Time of day.
    pub event_time: Option<String>,
    /// Location reference. Required, positive.
    pub location_id: i32,
    /// Event type reference. Required, positive.
    pub event_type_id: i32,
    /// Entrance type reference. Required, positive.
    pub entrance_type_id: i32,
    /// Entrance fee, zero when omitted.
    pub entrance_fee: Decimal,
    /// Duration.
    pub duration: Option<String>,
    /// Intended audience.
    pub participant_group_type: Option<String>,
    /// Facilitator.
    pub lead_by: Option<String>,
    /// Contact email. Required.
    pub contact_email: String,
    /// Contact phone.
    pub contact_mobile: Option<String>,
    /// Notes.
    pub notes: Option<String>,
}

impl EventFields {
    /// Validate the submission and produce a storable event owned by `creator_id`.
    ///
    /// # Errors
    ///
    /// Returns `MissingField`, `InvalidDate` or `InvalidAmount` when the
    /// submission is incomplete or malformed.
    pub fn into_new_event(self, creator_id: CreatorId) -> Result<NewEvent> {
        let event = NewEvent {
            id: EventId::generate(),
            creator_id,
            title: self.title.trim().to_string(),
            event_date: parse_event_date(&self.event_date)?,
            event_time: clean(self.event_time),
            location_id: self.location_id,
            event_type_id: self.event_type_id,
            entrance_type_id: self.entrance_type_id,
            entrance_fee: self.entrance_fee,
            duration: clean(self.duration),
            participant_group_type: clean(self.participant_group_type),
            lead_by: clean(self.lead_by),
            contact_email: self.contact_email.trim().to_string(),
            contact_mobile: clean(self.contact_mobile),
            notes: clean(self.notes),
        };
        event.validate()?;
        Ok(event)
    }
}

/// The business fields of an event, as written to the store.
///
/// Carries no payment or publication flags: those are written only by the
/// mark-paid-and-publish transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    /// Event ID.
    pub id: EventId,
    /// Owning creator. Ignored on update.
    pub creator_id: CreatorId,
    /// Title.
    pub title: String,
    /// Date.
    pub event_date: NaiveDate,
    /// Time of day.
    pub event_time: Option<String>,
    /// Location reference.
    pub location_id: i32,
    /// Event type reference.
    pub event_type_id: i32,
    /// Entrance type reference.
    pub entrance_type_id: i32,
    /// Entrance fee.
    pub entrance_fee: Decimal,
    /// Duration.
    pub duration: Option<String>,
    /// Intended audience.
    pub participant_group_type: Option<String>,
    /// Facilitator.
    pub lead_by: Option<String>,
    /// Contact email.
    pub contact_email: String,
    /// Contact phone.
    pub contact_mobile: Option<String>,
    /// Notes.
    pub notes: Option<String>,
}

impl NewEvent {
    /// Check required fields, reference ids and the fee.
    ///
    /// Reference ids must be positive; whether they exist is left to the store.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` or `InvalidAmount`.
    pub fn validate(&self) -> Result<()> {
        if self.title.is_empty() {
            return Err(MarketError::MissingField("title"));
        }
        if self.contact_email.is_empty() {
            return Err(MarketError::MissingField("contact_email"));
        }
        if self.location_id <= 0 {
            return Err(MarketError::MissingField("location_id"));
        }
        if self.event_type_id <= 0 {
            return Err(MarketError::MissingField("event_type_id"));
        }
        if self.entrance_type_id <= 0 {
            return Err(MarketError::MissingField("entrance_type_id"));
        }
        if self.entrance_fee < Decimal::ZERO {
            return Err(MarketError::InvalidAmount(format!(
                "entrance fee must not be negative: {}",
                self.entrance_fee
            )));
        }
        Ok(())
    }
}

impl From<&Event> for NewEvent {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id,
            creator_id: event.creator_id,
            title: event.title.clone(),
            event_date: event.event_date,
            event_time: event.event_time.clone(),
            location_id: event.location_id,
            event_type_id: event.event_type_id,
            entrance_type_id: event.entrance_type_id,
            entrance_fee: event.entrance_fee,
            duration: event.duration.clone(),
            participant_group_type: event.participant_group_type.clone(),
            lead_by: event.lead_by.clone(),
            contact_email: event.contact_email.clone(),
            contact_mobile: event.contact_mobile.clone(),
            notes: event.notes.clone(),
        }
    }
}

/// A partial update to an event.
///
/// Absent fields are left unchanged. Nullable text fields use a nested
/// `Option`: `None` is absent, `Some(None)` clears the value (JSON `null`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventChanges {
    /// New title.
    #[serde(default)]
    pub title: Option<String>,
    /// New date as `YYYY-MM-DD`.
    #[serde(default)]
    pub event_date: Option<String>,
    /// New time of day.
    #[serde(default, deserialize_with = "deserialize_some")]
    pub event_time: Option<Option<String>>,
    /// New location reference.
    #[serde(default)]
    pub location_id: Option<i32>,
    /// New event type reference.
    #[serde(default)]
    pub event_type_id: Option<i32>,
    /// New entrance type reference.
    #[serde(default)]
    pub entrance_type_id: Option<i32>,
    /// New entrance fee. `Some(0)` is a real value.
    #[serde(default)]
    pub entrance_fee: Option<Decimal>,
    /// New duration.
    #[serde(default, deserialize_with = "deserialize_some")]
    pub duration: Option<Option<String>>,
    /// New intended audience.
    #[serde(default, deserialize_with = "deserialize_some")]
    pub participant_group_type: Option<Option<String>>,
    /// New facilitator.
    #[serde(default, deserialize_with = "deserialize_some")]
    pub lead_by: Option<Option<String>>,
    /// New contact email.
    #[serde(default)]
    pub contact_email: Option<String>,
    /// New contact phone.
    #[serde(default, deserialize_with = "deserialize_some")]
    pub contact_mobile: Option<Option<String>>,
    /// New notes.
    #[serde(default, deserialize_with = "deserialize_some")]
    pub notes: Option<Option<String>>,
}

impl EventChanges {
    /// Apply the provided fields on top of `event` and re-validate.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDate` for a malformed date, or the errors of
    /// [`NewEvent::validate`] for the merged result.
    pub fn apply(self, event: &mut NewEvent) -> Result<()> {
        if let Some(title) = self.title {
            event.title = title.trim().to_string();
        }
        if let Some(raw) = self.event_date {
            event.event_date = parse_event_date(&raw)?;
        }
        if let Some(time) = self.event_time {
            event.event_time = clean(time);
        }
        if let Some(id) = self.location_id {
            event.location_id = id;
        }
        if let Some(id) = self.event_type_id {
            event.event_type_id = id;
        }
        if let Some(id) = self.entrance_type_id {
            event.entrance_type_id = id;
        }
        if let Some(fee) = self.entrance_fee {
            event.entrance_fee = fee;
        }
        if let Some(duration) = self.duration {
            event.duration = clean(duration);
        }
        if let Some(group) = self.participant_group_type {
            event.participant_group_type = clean(group);
        }
        if let Some(lead) = self.lead_by {
            event.lead_by = clean(lead);
        }
        if let Some(email) = self.contact_email {
            event.contact_email = email.trim().to_string();
        }
        if let Some(mobile) = self.contact_mobile {
            event.contact_mobile = clean(mobile);
        }
        if let Some(notes) = self.notes {
            event.notes = clean(notes);
        }
        event.validate()
    }
}

/// Distinguish an explicit `null` from an absent field.
fn deserialize_some<'de, T, D>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Trim, and treat blank text as absent.
fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// ============================================================================
// Queries
// ============================================================================

/// Listing filter supplied by callers (query string).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventFilter {
    /// Only events at this location.
    pub location_id: Option<i32>,
    /// Only events of this type.
    pub event_type_id: Option<i32>,
    /// Only events with this entrance type.
    pub entrance_type_id: Option<i32>,
    /// Earliest event date, inclusive.
    pub date_from: Option<String>,
    /// Latest event date, inclusive.
    pub date_to: Option<String>,
    /// Case-insensitive substring over title, creator name, organization and notes.
    pub search: Option<String>,
    /// Include events dated before today.
    pub include_past: Option<bool>,
    /// 1-based page number.
    pub page: Option<u32>,
    /// Page size.
    pub limit: Option<u32>,
}

/// A resolved event query as executed by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    /// Location filter.
    pub location_id: Option<i32>,
    /// Event type filter.
    pub event_type_id: Option<i32>,
    /// Entrance type filter.
    pub entrance_type_id: Option<i32>,
    /// Earliest event date, inclusive.
    pub date_from: Option<NaiveDate>,
    /// Latest event date, inclusive.
    pub date_to: Option<NaiveDate>,
    /// Lower-cased search needle.
    pub search: Option<String>,
    /// Restrict to one creator.
    pub creator_id: Option<CreatorId>,
    /// Restrict to published events.
    pub only_published: bool,
    /// Exclude events dated before this day.
    pub not_before: Option<NaiveDate>,
    /// Page window.
    pub pagination: Pagination,
}

impl EventQuery {
    /// Resolve a caller filter. Scope (`creator_id`, `only_published`,
    /// `not_before`) is left open for the caller to set.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDate` for a malformed date bound.
    pub fn from_filter(filter: &EventFilter) -> Result<Self> {
        let date_from = filter.date_from.as_deref().map(parse_event_date).transpose()?;
        let date_to = filter.date_to.as_deref().map(parse_event_date).transpose()?;
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        Ok(Self {
            location_id: filter.location_id,
            event_type_id: filter.event_type_id,
            entrance_type_id: filter.entrance_type_id,
            date_from,
            date_to,
            search,
            creator_id: None,
            only_published: false,
            not_before: None,
            pagination: Pagination::new(filter.page, filter.limit),
        })
    }

    /// Whether `event` satisfies every predicate of this query.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        if self.location_id.is_some_and(|id| id != event.location_id)
            || self.event_type_id.is_some_and(|id| id != event.event_type_id)
            || self
                .entrance_type_id
                .is_some_and(|id| id != event.entrance_type_id)
            || self.creator_id.is_some_and(|id| id != event.creator_id)
        {
            return false;
        }
        if self.only_published && !event.is_published {
            return false;
        }
        if self.date_from.is_some_and(|d| event.event_date < d)
            || self.date_to.is_some_and(|d| event.event_date > d)
            || self.not_before.is_some_and(|d| event.event_date < d)
        {
            return false;
        }
        match &self.search {
            None => true,
            Some(needle) => [
                Some(event.title.as_str()),
                Some(event.creator_name.as_str()),
                event.organization_name.as_deref(),
                event.notes.as_deref(),
            ]
            .into_iter()
            .flatten()
            .any(|hay| hay.to_lowercase().contains(needle)),
        }
    }
}
