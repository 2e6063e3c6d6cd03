//! PostgreSQL backend tests.
//!
//! Run against a disposable database:
//! `DATABASE_URL=postgres://... cargo test -p zenbali-store -- --ignored`

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;
use zenbali_core::{
    CreatorId, EventFilter, EventId, EventQuery, NewEvent, NewPayment, PaymentStatus,
    ReferenceKind,
};
use zenbali_store::{PgStore, Store, StoreError};

async fn connect() -> PgStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let store = PgStore::connect(&url, 5).await.expect("connect");
    store.migrate().await.expect("migrate");
    store
}

async fn seed_creator(store: &PgStore) -> CreatorId {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO creators (id, name, email) VALUES ($1, $2, $3)")
        .bind(id)
        .bind("Nyoman")
        .bind(format!("{id}@example.com"))
        .execute(store.pool())
        .await
        .expect("insert creator");
    CreatorId::from_uuid(id)
}

async fn new_event(store: &PgStore, creator_id: CreatorId) -> NewEvent {
    let first = |items: Vec<zenbali_core::ReferenceItem>| items[0].id;
    NewEvent {
        id: EventId::generate(),
        creator_id,
        title: "Temple cleanup".into(),
        event_date: (Utc::now() + Duration::days(10)).date_naive(),
        event_time: Some("08:00".into()),
        location_id: first(store.list_reference(ReferenceKind::Location, true).await.unwrap()),
        event_type_id: first(store.list_reference(ReferenceKind::EventType, true).await.unwrap()),
        entrance_type_id: first(
            store
                .list_reference(ReferenceKind::EntranceType, true)
                .await
                .unwrap(),
        ),
        entrance_fee: Decimal::new(7500, 2),
        duration: None,
        participant_group_type: None,
        lead_by: None,
        contact_email: "nyoman@example.com".into(),
        contact_mobile: None,
        notes: Some("Sarongs provided".into()),
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn event_round_trip_and_publication() {
    let store = connect().await;
    let creator = seed_creator(&store).await;
    let event = new_event(&store, creator).await;

    let inserted = store.insert_event(&event).await.unwrap();
    assert_eq!(inserted.entrance_fee, Decimal::new(7500, 2));
    assert!(!inserted.is_published);

    store.mark_event_paid_and_published(event.id).await.unwrap();
    store.mark_event_paid_and_published(event.id).await.unwrap();
    let published = store.get_event(event.id).await.unwrap().unwrap();
    assert!(published.is_paid && published.is_published);

    let mut query = EventQuery::from_filter(&EventFilter {
        search: Some("sarong".into()),
        ..EventFilter::default()
    })
    .unwrap();
    query.creator_id = Some(creator);
    let (events, total) = store.list_events(&query).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(events[0].id, event.id);

    store.delete_event(event.id).await.unwrap();
    assert!(store.get_event(event.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn payment_transition_applies_once() {
    let store = connect().await;
    let creator = seed_creator(&store).await;
    let event = new_event(&store, creator).await;
    store.insert_event(&event).await.unwrap();

    let session = format!("cs_test_{}", Uuid::new_v4().simple());
    store
        .insert_payment(&NewPayment::pending(event.id, creator, &session, 1000, "usd"))
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        store.transition_payment(&session, PaymentStatus::Pending, PaymentStatus::Completed, Some("pi_a")),
        store.transition_payment(&session, PaymentStatus::Pending, PaymentStatus::Completed, Some("pi_b")),
    );
    assert!(a.unwrap() ^ b.unwrap());

    let stalled = store.list_completed_unpublished().await.unwrap();
    assert!(stalled.iter().any(|p| p.session_id == session));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn unknown_location_is_an_invalid_reference() {
    let store = connect().await;
    let creator = seed_creator(&store).await;
    let mut event = new_event(&store, creator).await;
    event.location_id = i32::MAX;

    assert!(matches!(
        store.insert_event(&event).await,
        Err(StoreError::InvalidReference(_))
    ));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn creator_moderation_round_trip() {
    let store = connect().await;
    let id = seed_creator(&store).await;

    let deactivated = store.set_creator_active(id, false).await.unwrap();
    assert!(!deactivated.is_active);

    let mut creator = store.get_creator(id).await.unwrap().unwrap();
    creator.organization_name = Some("Bali Beach Crew".into());
    let saved = store.update_creator_profile(&creator).await.unwrap();
    assert_eq!(saved.organization_name.as_deref(), Some("Bali Beach Crew"));
    assert!(!saved.is_active);

    let (page, total) = store
        .list_creators(zenbali_core::Pagination::new(Some(1), Some(100)))
        .await
        .unwrap();
    assert!(total >= 1);
    assert!(!page.is_empty());

    assert!(matches!(
        store.set_creator_active(CreatorId::generate(), true).await,
        Err(StoreError::NotFound { .. })
    ));
}
