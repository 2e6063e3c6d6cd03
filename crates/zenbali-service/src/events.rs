//! Event lifecycle.
//!
//! Owns every business-rule mutation of an event: creation, edits, deletion and
//! the ownership and past-date checks guarding them. The paid-and-published
//! transition is exposed only to the payment workflow.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use zenbali_core::{
    Actor, AdminId, CreatorId, Event, EventChanges, EventFields, EventFilter, EventId,
    EventQuery, EventState, MarketError, NewEvent, Page, PaymentQuery, PaymentStatus, Result,
};
use zenbali_store::Store;

/// Current calendar day in UTC.
#[must_use]
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Event lifecycle manager.
#[derive(Clone)]
pub struct EventLifecycle {
    store: Arc<dyn Store>,
}

impl EventLifecycle {
    /// Create a lifecycle manager over `store`.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Validate and persist a new unpaid, unpublished event.
    ///
    /// # Errors
    ///
    /// Returns a validation error for incomplete fields, `InvalidReference` for
    /// an unknown location, type or entrance type, or a storage error.
    pub async fn create(&self, creator_id: CreatorId, fields: EventFields) -> Result<Event> {
        let new_event = fields.into_new_event(creator_id)?;
        let event = self.store.insert_event(&new_event).await?;

        tracing::info!(
            event_id = %event.id,
            creator_id = %creator_id,
            event_date = %event.event_date,
            "Event created"
        );

        Ok(event)
    }

    /// Get an event by ID.
    ///
    /// # Errors
    ///
    /// Returns `EventNotFound` if no such event exists.
    pub async fn get(&self, id: EventId) -> Result<Event> {
        self.store
            .get_event(id)
            .await?
            .ok_or_else(|| MarketError::event_not_found(id))
    }

    /// Get an event visible to the public.
    ///
    /// # Errors
    ///
    /// Returns `EventNotFound` for missing and unpublished events alike.
    pub async fn get_published(&self, id: EventId) -> Result<Event> {
        let event = self.get(id).await?;
        if !event.is_published {
            return Err(MarketError::event_not_found(id));
        }
        Ok(event)
    }

    /// Get an event the actor may manage.
    ///
    /// # Errors
    ///
    /// Returns `EventNotFound` or `NotOwner`.
    pub async fn get_managed(&self, id: EventId, actor: Actor) -> Result<Event> {
        let event = self.get(id).await?;
        if !actor.may_manage(event.creator_id) {
            return Err(MarketError::NotOwner);
        }
        Ok(event)
    }

    /// Lifecycle state of `event`, checking for an open checkout.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn state_of(&self, event: &Event) -> Result<EventState> {
        if event.is_paid {
            return Ok(EventState::Published);
        }
        let query = PaymentQuery {
            event_id: Some(event.id),
            status: Some(PaymentStatus::Pending),
            ..PaymentQuery::default()
        };
        let (_, pending) = self.store.list_payments(&query).await?;
        Ok(event.state(pending > 0))
    }

    /// Apply a partial update.
    ///
    /// Creators may edit only their own events, and only while the event date
    /// is today or later. Admins bypass both checks.
    ///
    /// # Errors
    ///
    /// Returns `EventNotFound`, `NotOwner`, `EventInPast`, a validation error
    /// for the merged fields, or a storage error.
    pub async fn update(&self, id: EventId, actor: Actor, changes: EventChanges) -> Result<Event> {
        let current = self.get_managed(id, actor).await?;

        if !actor.is_admin() && current.is_past(today()) {
            return Err(MarketError::EventInPast);
        }

        let mut merged = NewEvent::from(&current);
        changes.apply(&mut merged)?;
        let event = self.store.update_event(&merged).await?;

        tracing::info!(event_id = %id, admin = actor.is_admin(), "Event updated");

        Ok(event)
    }

    /// Delete an event and its payment attempts. No past-date restriction.
    ///
    /// Returns the deleted record so the caller can release its image.
    ///
    /// # Errors
    ///
    /// Returns `EventNotFound`, `NotOwner`, or a storage error.
    pub async fn delete(&self, id: EventId, actor: Actor) -> Result<Event> {
        let event = self.get_managed(id, actor).await?;
        self.store.delete_event(id).await?;

        tracing::info!(event_id = %id, admin = actor.is_admin(), "Event deleted");

        Ok(event)
    }

    /// Point the event at a newly stored image.
    ///
    /// Returns the previous image URL, if any.
    ///
    /// # Errors
    ///
    /// Returns `EventNotFound`, `NotOwner`, or a storage error.
    pub async fn attach_image(
        &self,
        id: EventId,
        actor: Actor,
        image_url: &str,
    ) -> Result<(Event, Option<String>)> {
        let current = self.get_managed(id, actor).await?;
        let event = self.store.set_event_image(id, image_url).await?;

        tracing::debug!(event_id = %id, image_url = %image_url, "Event image attached");

        Ok((event, current.image_url))
    }

    /// Set `is_paid` and `is_published` together. Idempotent.
    pub(crate) async fn mark_paid_and_publish(&self, id: EventId) -> Result<()> {
        self.store.mark_event_paid_and_published(id).await?;
        tracing::info!(event_id = %id, "Event paid and published");
        Ok(())
    }

    /// Published events dated today or later.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDate` for a malformed date bound, or a storage error.
    pub async fn list_public(&self, filter: &EventFilter) -> Result<Page<Event>> {
        let mut query = EventQuery::from_filter(filter)?;
        query.only_published = true;
        query.not_before = Some(today());
        self.run(query).await
    }

    /// A creator's own events. Past events are included only on request.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDate` for a malformed date bound, or a storage error.
    pub async fn list_by_creator(
        &self,
        creator_id: CreatorId,
        filter: &EventFilter,
    ) -> Result<Page<Event>> {
        let mut query = EventQuery::from_filter(filter)?;
        query.creator_id = Some(creator_id);
        if !filter.include_past.unwrap_or(false) {
            query.not_before = Some(today());
        }
        self.run(query).await
    }

    /// Every event, past and unpublished included.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDate` for a malformed date bound, or a storage error.
    pub async fn list_all(&self, admin: AdminId, filter: &EventFilter) -> Result<Page<Event>> {
        let query = EventQuery::from_filter(filter)?;
        tracing::debug!(admin_id = %admin, "Listing all events");
        self.run(query).await
    }

    async fn run(&self, query: EventQuery) -> Result<Page<Event>> {
        let (events, total) = self.store.list_events(&query).await?;
        Ok(Page::new(events, total, query.pagination))
    }
}
