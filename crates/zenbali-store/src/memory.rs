//! In-memory storage backend.
//!
//! Mirrors the PostgreSQL backend's semantics, including foreign keys, cascade
//! deletes, joined display names and the conditional payment transition, so
//! service tests exercise the same contract.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use zenbali_core::{
    slugify, Admin, AdminId, Creator, CreatorId, Event, EventId, EventQuery, NewEvent,
    NewPayment, Pagination, Payment, PaymentQuery, PaymentStatus, ReferenceItem, ReferenceKind,
};

use crate::error::{Result, StoreError};
use crate::schema::{SEED_ENTRANCE_TYPES, SEED_EVENT_TYPES, SEED_LOCATIONS};
use crate::Store;

struct StoredEvent {
    fields: NewEvent,
    image_url: Option<String>,
    is_paid: bool,
    is_published: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

struct StoredPayment {
    payment: NewPayment,
    payment_intent_id: Option<String>,
    status: PaymentStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    creators: HashMap<CreatorId, Creator>,
    admins: HashMap<AdminId, Admin>,
    references: HashMap<ReferenceKind, Vec<ReferenceItem>>,
    next_reference_id: i32,
    events: HashMap<EventId, StoredEvent>,
    payments: HashMap<String, StoredPayment>,
}

impl Inner {
    fn reference(&self, kind: ReferenceKind, id: i32) -> Option<&ReferenceItem> {
        self.references
            .get(&kind)
            .and_then(|items| items.iter().find(|item| item.id == id))
    }

    fn insert_reference(&mut self, kind: ReferenceKind, name: &str) -> Result<ReferenceItem> {
        let slug = slugify(name);
        let items = self.references.entry(kind).or_default();
        if items.iter().any(|item| item.slug == slug) {
            return Err(StoreError::Conflict(format!("{}_slug_key", kind.table())));
        }
        self.next_reference_id += 1;
        let item = ReferenceItem {
            id: self.next_reference_id,
            name: name.to_string(),
            slug,
            is_active: true,
        };
        items.push(item.clone());
        Ok(item)
    }

    fn check_references(&self, event: &NewEvent) -> Result<()> {
        let checks = [
            (ReferenceKind::Location, event.location_id),
            (ReferenceKind::EventType, event.event_type_id),
            (ReferenceKind::EntranceType, event.entrance_type_id),
        ];
        for (kind, id) in checks {
            if self.reference(kind, id).is_none() {
                return Err(StoreError::InvalidReference(format!(
                    "events_{}_id_fkey",
                    kind.label()
                )));
            }
        }
        Ok(())
    }

    fn join_event(&self, stored: &StoredEvent) -> Result<Event> {
        let f = &stored.fields;
        let creator = self
            .creators
            .get(&f.creator_id)
            .ok_or_else(|| StoreError::Database(format!("dangling creator {}", f.creator_id)))?;
        let name = |kind: ReferenceKind, id: i32| {
            self.reference(kind, id)
                .map(|item| item.name.clone())
                .ok_or_else(|| StoreError::Database(format!("dangling {} {id}", kind.label())))
        };

        Ok(Event {
            id: f.id,
            creator_id: f.creator_id,
            title: f.title.clone(),
            event_date: f.event_date,
            event_time: f.event_time.clone(),
            location_id: f.location_id,
            event_type_id: f.event_type_id,
            entrance_type_id: f.entrance_type_id,
            entrance_fee: f.entrance_fee,
            duration: f.duration.clone(),
            participant_group_type: f.participant_group_type.clone(),
            lead_by: f.lead_by.clone(),
            contact_email: f.contact_email.clone(),
            contact_mobile: f.contact_mobile.clone(),
            notes: f.notes.clone(),
            image_url: stored.image_url.clone(),
            is_paid: stored.is_paid,
            is_published: stored.is_published,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
            creator_name: creator.name.clone(),
            organization_name: creator.organization_name.clone(),
            location_name: name(ReferenceKind::Location, f.location_id)?,
            event_type_name: name(ReferenceKind::EventType, f.event_type_id)?,
            entrance_type_name: name(ReferenceKind::EntranceType, f.entrance_type_id)?,
        })
    }

    fn event(&self, id: EventId) -> Result<Event> {
        let stored = self
            .events
            .get(&id)
            .ok_or_else(|| StoreError::not_found("event", id))?;
        self.join_event(stored)
    }

    fn join_payment(&self, stored: &StoredPayment) -> Payment {
        let p = &stored.payment;
        let event_title = self
            .events
            .get(&p.event_id)
            .map(|e| e.fields.title.clone())
            .unwrap_or_default();
        let creator_name = self
            .creators
            .get(&p.creator_id)
            .map(|c| c.name.clone())
            .unwrap_or_default();

        Payment {
            id: p.id,
            event_id: p.event_id,
            creator_id: p.creator_id,
            session_id: p.session_id.clone(),
            payment_intent_id: stored.payment_intent_id.clone(),
            amount_cents: p.amount_cents,
            currency: p.currency.clone(),
            status: stored.status,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
            event_title,
            creator_name,
        }
    }
}

/// In-memory store.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store with no reference data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the same reference data a fresh database is
    /// migrated with.
    #[must_use]
    pub fn with_reference_data() -> Self {
        let mut inner = Inner::default();
        let seeds = [
            (ReferenceKind::Location, SEED_LOCATIONS),
            (ReferenceKind::EventType, SEED_EVENT_TYPES),
            (ReferenceKind::EntranceType, SEED_ENTRANCE_TYPES),
        ];
        for (kind, names) in seeds {
            for name in names {
                // Seed names are distinct, so slugs never collide.
                let _ = inner.insert_reference(kind, name);
            }
        }
        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Insert or replace a creator account.
    pub async fn put_creator(&self, creator: Creator) {
        self.inner.write().await.creators.insert(creator.id, creator);
    }

    /// Insert or replace an admin account.
    pub async fn put_admin(&self, admin: Admin) {
        self.inner.write().await.admins.insert(admin.id, admin);
    }

    /// Force both publication flags on an event, bypassing the paired
    /// transition. Lets tests construct the states an interrupted write leaves
    /// behind.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the event doesn't exist.
    pub async fn set_event_flags(&self, id: EventId, is_paid: bool, is_published: bool) -> Result<()> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .events
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("event", id))?;
        stored.is_paid = is_paid;
        stored.is_published = is_published;
        Ok(())
    }

    /// Number of payment rows recorded for an event.
    pub async fn payment_count(&self, event_id: EventId) -> usize {
        self.inner
            .read()
            .await
            .payments
            .values()
            .filter(|p| p.payment.event_id == event_id)
            .count()
    }
}

fn page<T>(mut items: Vec<T>, offset: u64, limit: u32) -> (Vec<T>, u64) {
    let total = items.len() as u64;
    let start = usize::try_from(offset).unwrap_or(usize::MAX).min(items.len());
    let end = start.saturating_add(limit as usize).min(items.len());
    (items.drain(start..end).collect(), total)
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn get_creator(&self, id: CreatorId) -> Result<Option<Creator>> {
        Ok(self.inner.read().await.creators.get(&id).cloned())
    }

    async fn get_admin(&self, id: AdminId) -> Result<Option<Admin>> {
        Ok(self.inner.read().await.admins.get(&id).cloned())
    }

    async fn list_creators(&self, window: Pagination) -> Result<(Vec<Creator>, u64)> {
        let inner = self.inner.read().await;
        let mut creators: Vec<Creator> = inner.creators.values().cloned().collect();
        creators.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(page(creators, window.offset(), window.limit()))
    }

    async fn set_creator_active(&self, id: CreatorId, is_active: bool) -> Result<Creator> {
        let mut inner = self.inner.write().await;
        let creator = inner
            .creators
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("creator", id))?;
        creator.is_active = is_active;
        Ok(creator.clone())
    }

    async fn update_creator_profile(&self, update: &Creator) -> Result<Creator> {
        let mut inner = self.inner.write().await;
        let creator = inner
            .creators
            .get_mut(&update.id)
            .ok_or_else(|| StoreError::not_found("creator", update.id))?;
        creator.name.clone_from(&update.name);
        creator.organization_name.clone_from(&update.organization_name);
        Ok(creator.clone())
    }

    async fn list_reference(
        &self,
        kind: ReferenceKind,
        only_active: bool,
    ) -> Result<Vec<ReferenceItem>> {
        let inner = self.inner.read().await;
        let mut items: Vec<ReferenceItem> = inner
            .references
            .get(&kind)
            .into_iter()
            .flatten()
            .filter(|item| !only_active || item.is_active)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn create_reference(&self, kind: ReferenceKind, name: &str) -> Result<ReferenceItem> {
        self.inner.write().await.insert_reference(kind, name)
    }

    async fn update_reference(
        &self,
        kind: ReferenceKind,
        id: i32,
        name: &str,
        is_active: bool,
    ) -> Result<ReferenceItem> {
        let slug = slugify(name);
        let mut inner = self.inner.write().await;
        let items = inner.references.entry(kind).or_default();
        if items.iter().any(|item| item.slug == slug && item.id != id) {
            return Err(StoreError::Conflict(format!("{}_slug_key", kind.table())));
        }
        let item = items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| StoreError::not_found(kind.label(), id))?;
        item.name = name.to_string();
        item.slug = slug;
        item.is_active = is_active;
        Ok(item.clone())
    }

    async fn insert_event(&self, event: &NewEvent) -> Result<Event> {
        let mut inner = self.inner.write().await;
        if !inner.creators.contains_key(&event.creator_id) {
            return Err(StoreError::InvalidReference(
                "events_creator_id_fkey".to_string(),
            ));
        }
        inner.check_references(event)?;
        if inner.events.contains_key(&event.id) {
            return Err(StoreError::Conflict("events_pkey".to_string()));
        }

        let now = Utc::now();
        inner.events.insert(
            event.id,
            StoredEvent {
                fields: event.clone(),
                image_url: None,
                is_paid: false,
                is_published: false,
                created_at: now,
                updated_at: now,
            },
        );
        inner.event(event.id)
    }

    async fn get_event(&self, id: EventId) -> Result<Option<Event>> {
        let inner = self.inner.read().await;
        inner
            .events
            .get(&id)
            .map(|stored| inner.join_event(stored))
            .transpose()
    }

    async fn update_event(&self, event: &NewEvent) -> Result<Event> {
        let mut inner = self.inner.write().await;
        if !inner.events.contains_key(&event.id) {
            return Err(StoreError::not_found("event", event.id));
        }
        inner.check_references(event)?;

        if let Some(stored) = inner.events.get_mut(&event.id) {
            let creator_id = stored.fields.creator_id;
            stored.fields = NewEvent {
                creator_id,
                ..event.clone()
            };
            stored.updated_at = Utc::now();
        }
        inner.event(event.id)
    }

    async fn set_event_image(&self, id: EventId, image_url: &str) -> Result<Event> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .events
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("event", id))?;
        stored.image_url = Some(image_url.to_string());
        stored.updated_at = Utc::now();
        inner.event(id)
    }

    async fn delete_event(&self, id: EventId) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.events.remove(&id).is_none() {
            return Err(StoreError::not_found("event", id));
        }
        inner.payments.retain(|_, p| p.payment.event_id != id);
        Ok(())
    }

    async fn mark_event_paid_and_published(&self, id: EventId) -> Result<()> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .events
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("event", id))?;
        stored.is_paid = true;
        stored.is_published = true;
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn list_events(&self, query: &EventQuery) -> Result<(Vec<Event>, u64)> {
        let inner = self.inner.read().await;
        let mut events = Vec::new();
        for stored in inner.events.values() {
            let event = inner.join_event(stored)?;
            if query.matches(&event) {
                events.push(event);
            }
        }
        events.sort_by(|a, b| {
            a.event_date
                .cmp(&b.event_date)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(page(
            events,
            query.pagination.offset(),
            query.pagination.limit(),
        ))
    }

    async fn insert_payment(&self, payment: &NewPayment) -> Result<Payment> {
        let mut inner = self.inner.write().await;
        if !inner.events.contains_key(&payment.event_id) {
            return Err(StoreError::InvalidReference(
                "payments_event_id_fkey".to_string(),
            ));
        }
        if !inner.creators.contains_key(&payment.creator_id) {
            return Err(StoreError::InvalidReference(
                "payments_creator_id_fkey".to_string(),
            ));
        }
        if inner.payments.contains_key(&payment.session_id) {
            return Err(StoreError::Conflict(
                "payments_stripe_session_id_key".to_string(),
            ));
        }

        let now = Utc::now();
        let stored = StoredPayment {
            payment: payment.clone(),
            payment_intent_id: None,
            status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        let joined = inner.join_payment(&stored);
        inner.payments.insert(payment.session_id.clone(), stored);
        Ok(joined)
    }

    async fn get_payment_by_session(&self, session_id: &str) -> Result<Option<Payment>> {
        let inner = self.inner.read().await;
        Ok(inner
            .payments
            .get(session_id)
            .map(|stored| inner.join_payment(stored)))
    }

    async fn transition_payment(
        &self,
        session_id: &str,
        from: PaymentStatus,
        to: PaymentStatus,
        payment_intent_id: Option<&str>,
    ) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let Some(stored) = inner.payments.get_mut(session_id) else {
            return Ok(false);
        };
        if stored.status != from {
            return Ok(false);
        }
        stored.status = to;
        if let Some(intent) = payment_intent_id {
            stored.payment_intent_id = Some(intent.to_string());
        }
        stored.updated_at = Utc::now();
        Ok(true)
    }

    async fn list_payments(&self, query: &PaymentQuery) -> Result<(Vec<Payment>, u64)> {
        let inner = self.inner.read().await;
        let mut payments: Vec<Payment> = inner
            .payments
            .values()
            .map(|stored| inner.join_payment(stored))
            .filter(|p| query.matches(p))
            .collect();
        payments.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(page(
            payments,
            query.pagination.offset(),
            query.pagination.limit(),
        ))
    }

    async fn list_completed_unpublished(&self) -> Result<Vec<Payment>> {
        let inner = self.inner.read().await;
        let mut stalled: Vec<Payment> = inner
            .payments
            .values()
            .filter(|stored| stored.status == PaymentStatus::Completed)
            .filter(|stored| {
                inner
                    .events
                    .get(&stored.payment.event_id)
                    .is_some_and(|e| !e.is_published)
            })
            .map(|stored| inner.join_payment(stored))
            .collect();
        stalled.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(stalled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use zenbali_core::{EventFilter, Pagination};

    async fn seeded() -> (MemoryStore, Creator) {
        let store = MemoryStore::with_reference_data();
        let creator = Creator::new("Made", "made@example.com");
        store.put_creator(creator.clone()).await;
        (store, creator)
    }

    fn new_event(creator_id: CreatorId, date: NaiveDate) -> NewEvent {
        NewEvent {
            id: EventId::generate(),
            creator_id,
            title: "Kirtan night".into(),
            event_date: date,
            event_time: None,
            location_id: 1,
            event_type_id: SEED_LOCATIONS.len() as i32 + 1,
            entrance_type_id: (SEED_LOCATIONS.len() + SEED_EVENT_TYPES.len()) as i32 + 1,
            entrance_fee: Decimal::ZERO,
            duration: None,
            participant_group_type: None,
            lead_by: None,
            contact_email: "made@example.com".into(),
            contact_mobile: None,
            notes: None,
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2031, 1, d).unwrap()
    }

    #[tokio::test]
    async fn insert_joins_reference_names() {
        let (store, creator) = seeded().await;
        let event = store.insert_event(&new_event(creator.id, date(5))).await.unwrap();

        assert_eq!(event.creator_name, "Made");
        assert_eq!(event.location_name, SEED_LOCATIONS[0]);
        assert_eq!(event.event_type_name, SEED_EVENT_TYPES[0]);
        assert_eq!(event.entrance_type_name, SEED_ENTRANCE_TYPES[0]);
        assert!(!event.is_paid && !event.is_published);
    }

    #[tokio::test]
    async fn unknown_reference_is_rejected() {
        let (store, creator) = seeded().await;
        let mut event = new_event(creator.id, date(5));
        event.location_id = 999;
        assert!(matches!(
            store.insert_event(&event).await,
            Err(StoreError::InvalidReference(_))
        ));

        let stranger = new_event(CreatorId::generate(), date(5));
        assert!(matches!(
            store.insert_event(&stranger).await,
            Err(StoreError::InvalidReference(_))
        ));
    }

    #[tokio::test]
    async fn update_keeps_owner_and_flags() {
        let (store, creator) = seeded().await;
        let original = new_event(creator.id, date(5));
        store.insert_event(&original).await.unwrap();
        store.mark_event_paid_and_published(original.id).await.unwrap();

        let mut changed = original.clone();
        changed.title = "Kirtan & cacao".into();
        changed.creator_id = CreatorId::generate();
        let updated = store.update_event(&changed).await.unwrap();

        assert_eq!(updated.title, "Kirtan & cacao");
        assert_eq!(updated.creator_id, creator.id);
        assert!(updated.is_paid && updated.is_published);
    }

    #[tokio::test]
    async fn transition_is_compare_and_set() {
        let (store, creator) = seeded().await;
        let event = new_event(creator.id, date(5));
        store.insert_event(&event).await.unwrap();
        store
            .insert_payment(&NewPayment::pending(event.id, creator.id, "cs_1", 1000, "usd"))
            .await
            .unwrap();

        let first = store
            .transition_payment("cs_1", PaymentStatus::Pending, PaymentStatus::Completed, Some("pi_1"))
            .await
            .unwrap();
        let second = store
            .transition_payment("cs_1", PaymentStatus::Pending, PaymentStatus::Completed, Some("pi_2"))
            .await
            .unwrap();
        assert!(first);
        assert!(!second);

        let payment = store.get_payment_by_session("cs_1").await.unwrap().unwrap();
        assert_eq!(payment.status, PaymentStatus::Completed);
        assert_eq!(payment.payment_intent_id.as_deref(), Some("pi_1"));
        assert_eq!(payment.event_title, "Kirtan night");
    }

    #[tokio::test]
    async fn duplicate_session_is_a_conflict() {
        let (store, creator) = seeded().await;
        let event = new_event(creator.id, date(5));
        store.insert_event(&event).await.unwrap();
        let payment = NewPayment::pending(event.id, creator.id, "cs_dup", 1000, "usd");
        store.insert_payment(&payment).await.unwrap();

        let again = NewPayment::pending(event.id, creator.id, "cs_dup", 1000, "usd");
        assert!(matches!(
            store.insert_payment(&again).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn delete_cascades_to_payments() {
        let (store, creator) = seeded().await;
        let event = new_event(creator.id, date(5));
        store.insert_event(&event).await.unwrap();
        store
            .insert_payment(&NewPayment::pending(event.id, creator.id, "cs_9", 1000, "usd"))
            .await
            .unwrap();

        store.delete_event(event.id).await.unwrap();
        assert_eq!(store.payment_count(event.id).await, 0);
        assert!(matches!(
            store.delete_event(event.id).await,
            Err(StoreError::NotFound { entity: "event", .. })
        ));
    }

    #[tokio::test]
    async fn listing_orders_by_date_then_newest() {
        let (store, creator) = seeded().await;
        let late = new_event(creator.id, date(20));
        let early = new_event(creator.id, date(2));
        store.insert_event(&late).await.unwrap();
        store.insert_event(&early).await.unwrap();

        let query = EventQuery::from_filter(&EventFilter::default()).unwrap();
        let (events, total) = store.list_events(&query).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(events[0].id, early.id);
        assert_eq!(events[1].id, late.id);
    }

    #[tokio::test]
    async fn listing_pages_past_the_end_are_empty() {
        let (store, creator) = seeded().await;
        store.insert_event(&new_event(creator.id, date(2))).await.unwrap();

        let mut query = EventQuery::from_filter(&EventFilter::default()).unwrap();
        query.pagination = Pagination::new(Some(4), Some(10));
        let (events, total) = store.list_events(&query).await.unwrap();
        assert!(events.is_empty());
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn stalled_payments_are_detectable() {
        let (store, creator) = seeded().await;
        let event = new_event(creator.id, date(5));
        store.insert_event(&event).await.unwrap();
        store
            .insert_payment(&NewPayment::pending(event.id, creator.id, "cs_s", 1000, "usd"))
            .await
            .unwrap();
        store
            .transition_payment("cs_s", PaymentStatus::Pending, PaymentStatus::Completed, None)
            .await
            .unwrap();

        let stalled = store.list_completed_unpublished().await.unwrap();
        assert_eq!(stalled.len(), 1);

        store.mark_event_paid_and_published(event.id).await.unwrap();
        assert!(store.list_completed_unpublished().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reference_slug_conflicts_and_updates() {
        let store = MemoryStore::with_reference_data();
        assert!(matches!(
            store.create_reference(ReferenceKind::Location, "ubud").await,
            Err(StoreError::Conflict(_))
        ));

        let created = store
            .create_reference(ReferenceKind::Location, "Lovina")
            .await
            .unwrap();
        let updated = store
            .update_reference(ReferenceKind::Location, created.id, "Lovina Beach", false)
            .await
            .unwrap();
        assert_eq!(updated.slug, "lovina-beach");

        let active = store.list_reference(ReferenceKind::Location, true).await.unwrap();
        assert!(active.iter().all(|item| item.id != created.id));
    }

    #[tokio::test]
    async fn creators_page_newest_first() {
        let store = MemoryStore::new();
        let mut older = Creator::new("Older", "older@example.com");
        older.created_at -= chrono::Duration::days(2);
        let newer = Creator::new("Newer", "newer@example.com");
        store.put_creator(older.clone()).await;
        store.put_creator(newer.clone()).await;

        let (first, total) = store
            .list_creators(Pagination::new(Some(1), Some(1)))
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(first[0].id, newer.id);

        let (second, _) = store
            .list_creators(Pagination::new(Some(2), Some(1)))
            .await
            .unwrap();
        assert_eq!(second[0].id, older.id);
    }

    #[tokio::test]
    async fn creator_moderation_and_profile_writes() {
        let (store, creator) = seeded().await;

        let deactivated = store.set_creator_active(creator.id, false).await.unwrap();
        assert!(!deactivated.is_active);
        assert!(!store.get_creator(creator.id).await.unwrap().unwrap().is_active);

        let mut edited = creator.clone();
        edited.name = "Made Wirawan".into();
        edited.organization_name = Some("Ubud Kirtan".into());
        edited.email = "ignored@example.com".into();
        let saved = store.update_creator_profile(&edited).await.unwrap();
        assert_eq!(saved.name, "Made Wirawan");
        assert_eq!(saved.organization_name.as_deref(), Some("Ubud Kirtan"));
        assert_eq!(saved.email, "made@example.com");
        assert!(!saved.is_active);

        assert!(matches!(
            store.set_creator_active(CreatorId::generate(), true).await,
            Err(StoreError::NotFound { entity: "creator", .. })
        ));
    }
}
