//! Integration tests for the payment workflow.

mod common;

use axum::http::StatusCode;
use common::{days_from_today, Options, TestHarness};
use serde_json::Value;
use zenbali_core::{EventState, PaymentStatus};
use zenbali_service::PaymentOutcome;
use zenbali_store::Store;

async fn open_checkout(harness: &TestHarness, event_id: zenbali_core::EventId) -> String {
    let (name, value) = harness.creator_auth();
    let response = harness
        .server
        .post(&format!("/v1/creator/events/{event_id}/checkout"))
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    let link: Value = response.json();
    assert!(link["session_url"]
        .as_str()
        .unwrap()
        .starts_with("https://checkout.stripe.test/"));
    link["session_id"].as_str().unwrap().to_string()
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
async fn test_paid_event_becomes_public() {
    let harness = TestHarness::new().await;
    let event = harness.create_event("Yoga", days_from_today(10)).await;

    let session_id = open_checkout(&harness, event.id).await;

    let payment = harness
        .store
        .get_payment_by_session(&session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert_eq!(payment.amount_cents, 1000);
    assert_eq!(payment.event_id, event.id);
    let event = harness.state.events.get(event.id).await.unwrap();
    assert_eq!(
        harness.state.events.state_of(&event).await.unwrap(),
        EventState::PendingPayment
    );

    let outcome = harness
        .state
        .payments
        .handle_successful_payment(&session_id)
        .await
        .unwrap();
    assert_eq!(outcome, PaymentOutcome::Applied);

    let payment = harness
        .store
        .get_payment_by_session(&session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert_eq!(
        payment.payment_intent_id.as_deref(),
        Some(format!("pi_{session_id}").as_str())
    );

    let event = harness.state.events.get(event.id).await.unwrap();
    assert!(event.is_paid);
    assert!(event.is_published);

    let response = harness.server.get("/v1/events").await;
    response.assert_status_ok();
    let page: Value = response.json();
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["id"], event.id.to_string());

    let response = harness
        .server
        .get(&format!("/v1/events/{}", event.id))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_checkout_request_carries_fee_and_metadata() {
    let harness = TestHarness::new().await;
    let event = harness.create_event("Sound Healing", days_from_today(3)).await;

    open_checkout(&harness, event.id).await;

    let request = harness.gateway.last_request().unwrap();
    assert_eq!(request.amount_cents, 1000);
    assert_eq!(request.currency, "usd");
    assert_eq!(request.product_name, "Event Posting Fee - Sound Healing");
    assert_eq!(
        request.success_url,
        format!(
            "https://zenbali.test/creator/payment-success.html?event_id={}",
            event.id
        )
    );
    assert!(request
        .metadata
        .contains(&("event_id".to_string(), event.id.to_string())));
    assert!(request
        .metadata
        .contains(&("creator_id".to_string(), harness.creator.id.to_string())));
}

#[tokio::test]
async fn test_checkout_for_paid_event_is_rejected() {
    let harness = TestHarness::new().await;
    let event = harness.create_event("Paid Already", days_from_today(3)).await;
    let session_id = open_checkout(&harness, event.id).await;
    harness
        .state
        .payments
        .handle_successful_payment(&session_id)
        .await
        .unwrap();
    let sessions_before = harness.gateway.sessions_created();

    let (name, value) = harness.creator_auth();
    let response = harness
        .server
        .post(&format!("/v1/creator/events/{}/checkout", event.id))
        .add_header(name, value)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let error: Value = response.json();
    assert_eq!(error["error"]["code"], "already_paid");
    assert_eq!(harness.gateway.sessions_created(), sessions_before);
    assert_eq!(harness.store.payment_count(event.id).await, 1);
}

#[tokio::test]
async fn test_checkout_for_foreign_event_is_forbidden() {
    let harness = TestHarness::new().await;
    let event = harness
        .create_event_for(&harness.other_creator, "Not Yours", days_from_today(3))
        .await;

    let (name, value) = harness.creator_auth();
    let response = harness
        .server
        .post(&format!("/v1/creator/events/{}/checkout", event.id))
        .add_header(name, value)
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(harness.gateway.sessions_created(), 0);
}

#[tokio::test]
async fn test_checkout_without_gateway_is_unavailable() {
    let harness = TestHarness::with_options(Options {
        gateway: false,
        ..Options::default()
    })
    .await;
    let event = harness.create_event("Offline", days_from_today(3)).await;

    let (name, value) = harness.creator_auth();
    let response = harness
        .server
        .post(&format!("/v1/creator/events/{}/checkout", event.id))
        .add_header(name, value)
        .await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let error: Value = response.json();
    assert_eq!(error["error"]["code"], "payments_unavailable");
    assert_eq!(harness.store.payment_count(event.id).await, 0);
}

#[tokio::test]
async fn test_repeated_checkout_opens_new_sessions() {
    let harness = TestHarness::new().await;
    let event = harness.create_event("Try Twice", days_from_today(3)).await;

    let first = open_checkout(&harness, event.id).await;
    let second = open_checkout(&harness, event.id).await;

    assert_ne!(first, second);
    assert_eq!(harness.store.payment_count(event.id).await, 2);
}

// ============================================================================
// Outcomes
// ============================================================================

#[tokio::test]
async fn test_redelivered_success_is_idempotent() {
    let harness = TestHarness::new().await;
    let event = harness.create_event("Twice Told", days_from_today(3)).await;
    let session_id = open_checkout(&harness, event.id).await;
    let payments = &harness.state.payments;

    let first = payments.handle_successful_payment(&session_id).await.unwrap();
    let second = payments.handle_successful_payment(&session_id).await.unwrap();

    assert_eq!(first, PaymentOutcome::Applied);
    assert_eq!(second, PaymentOutcome::AlreadyHandled);
    // The terminal check runs before the gateway lookup.
    assert_eq!(harness.gateway.lookups(), 1);

    let event = harness.state.events.get(event.id).await.unwrap();
    assert!(event.is_paid && event.is_published);
}

#[tokio::test]
async fn test_concurrent_success_applies_once() {
    let harness = TestHarness::new().await;
    let event = harness.create_event("Race", days_from_today(3)).await;
    let session_id = open_checkout(&harness, event.id).await;
    let payments = harness.state.payments.clone();

    let (a, b) = tokio::join!(
        payments.handle_successful_payment(&session_id),
        payments.handle_successful_payment(&session_id),
    );
    let outcomes = [a.unwrap(), b.unwrap()];

    let applied = outcomes
        .iter()
        .filter(|o| **o == PaymentOutcome::Applied)
        .count();
    assert_eq!(applied, 1);
    assert!(outcomes.contains(&PaymentOutcome::AlreadyHandled));

    let payment = harness
        .store
        .get_payment_by_session(&session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);
}

#[tokio::test]
async fn test_gateway_failure_leaves_payment_pending() {
    let harness = TestHarness::new().await;
    let event = harness.create_event("Flaky", days_from_today(3)).await;
    let session_id = open_checkout(&harness, event.id).await;
    harness.gateway.fail_lookups(true);

    let err = harness
        .state
        .payments
        .handle_successful_payment(&session_id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "external_service_error");
    assert!(err.is_transient());

    let payment = harness
        .store
        .get_payment_by_session(&session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert!(!harness.state.events.get(event.id).await.unwrap().is_paid);

    // The redelivery after recovery applies.
    harness.gateway.fail_lookups(false);
    let outcome = harness
        .state
        .payments
        .handle_successful_payment(&session_id)
        .await
        .unwrap();
    assert_eq!(outcome, PaymentOutcome::Applied);
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let harness = TestHarness::new().await;
    let payments = &harness.state.payments;

    let err = payments
        .handle_successful_payment("cs_unknown")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "payment_not_found");

    let err = payments
        .handle_failed_payment("cs_unknown")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "payment_not_found");
    assert_eq!(harness.gateway.lookups(), 0);
}

#[tokio::test]
async fn test_failed_payment_allows_retry() {
    let harness = TestHarness::new().await;
    let event = harness.create_event("Second Chance", days_from_today(3)).await;
    let expired = open_checkout(&harness, event.id).await;
    let payments = &harness.state.payments;

    let outcome = payments.handle_failed_payment(&expired).await.unwrap();
    assert_eq!(outcome, PaymentOutcome::Applied);

    let event_after = harness.state.events.get(event.id).await.unwrap();
    assert!(!event_after.is_paid);
    assert_eq!(
        harness.state.events.state_of(&event_after).await.unwrap(),
        EventState::Draft
    );

    // A late success for the expired session changes nothing.
    let outcome = payments.handle_successful_payment(&expired).await.unwrap();
    assert_eq!(outcome, PaymentOutcome::AlreadyHandled);
    assert!(!harness.state.events.get(event.id).await.unwrap().is_paid);

    let retry = open_checkout(&harness, event.id).await;
    let outcome = payments.handle_successful_payment(&retry).await.unwrap();
    assert_eq!(outcome, PaymentOutcome::Applied);
    assert!(harness.state.events.get(event.id).await.unwrap().is_published);
}

#[tokio::test]
async fn test_failure_after_completion_is_ignored() {
    let harness = TestHarness::new().await;
    let event = harness.create_event("Settled", days_from_today(3)).await;
    let session_id = open_checkout(&harness, event.id).await;
    let payments = &harness.state.payments;
    payments.handle_successful_payment(&session_id).await.unwrap();

    let outcome = payments.handle_failed_payment(&session_id).await.unwrap();

    assert_eq!(outcome, PaymentOutcome::AlreadyHandled);
    let payment = harness
        .store
        .get_payment_by_session(&session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);
}

#[tokio::test]
async fn test_success_without_gateway_completes_without_intent() {
    let harness = TestHarness::with_options(Options {
        gateway: false,
        ..Options::default()
    })
    .await;
    let event = harness.create_event("Manual", days_from_today(3)).await;
    harness
        .store
        .insert_payment(&zenbali_core::NewPayment::pending(
            event.id,
            harness.creator.id,
            "cs_manual".to_string(),
            1000,
            "usd",
        ))
        .await
        .unwrap();

    let outcome = harness
        .state
        .payments
        .handle_successful_payment("cs_manual")
        .await
        .unwrap();

    assert_eq!(outcome, PaymentOutcome::Applied);
    let payment = harness
        .store
        .get_payment_by_session("cs_manual")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert!(payment.payment_intent_id.is_none());
}

// ============================================================================
// Listings and reconciliation
// ============================================================================

#[tokio::test]
async fn test_payment_listings_are_scoped() {
    let harness = TestHarness::new().await;
    let mine = harness.create_event("Mine", days_from_today(3)).await;
    let theirs = harness
        .create_event_for(&harness.other_creator, "Theirs", days_from_today(3))
        .await;
    let session_id = open_checkout(&harness, mine.id).await;
    harness
        .state
        .payments
        .start_checkout(theirs.id, zenbali_core::Actor::Creator(harness.other_creator.id))
        .await
        .unwrap();
    harness
        .state
        .payments
        .handle_successful_payment(&session_id)
        .await
        .unwrap();

    let (name, value) = harness.creator_auth();
    let response = harness
        .server
        .get("/v1/creator/payments")
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    let page: Value = response.json();
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["event_title"], "Mine");

    let (name, value) = harness.admin_auth();
    let response = harness
        .server
        .get("/v1/admin/payments")
        .add_header(name.clone(), value.clone())
        .await;
    let page: Value = response.json();
    assert_eq!(page["total"], 2);

    let response = harness
        .server
        .get("/v1/admin/payments?status=completed")
        .add_header(name, value)
        .await;
    let page: Value = response.json();
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["status"], "completed");
}

#[tokio::test]
async fn test_reconcile_publishes_stalled_events() {
    let harness = TestHarness::new().await;
    let event = harness.create_event("Interrupted", days_from_today(3)).await;
    let session_id = open_checkout(&harness, event.id).await;

    // Payment completed but the publication write never landed.
    let moved = harness
        .store
        .transition_payment(
            &session_id,
            PaymentStatus::Pending,
            PaymentStatus::Completed,
            Some("pi_interrupted"),
        )
        .await
        .unwrap();
    assert!(moved);
    assert_eq!(harness.state.payments.find_stalled().await.unwrap().len(), 1);

    let (name, value) = harness.admin_auth();
    let response = harness
        .server
        .post("/v1/admin/payments/reconcile")
        .add_header(name, value)
        .await;

    response.assert_status_ok();
    let report: Value = response.json();
    assert_eq!(report["examined"], 1);
    assert_eq!(report["repaired"], 1);
    assert_eq!(report["failed"], 0);

    let event = harness.state.events.get(event.id).await.unwrap();
    assert!(event.is_paid && event.is_published);
    assert!(harness.state.payments.find_stalled().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_redelivery_publishes_event_left_unpublished() {
    let harness = TestHarness::new().await;
    let event = harness.create_event("Half Done", days_from_today(3)).await;
    let session_id = open_checkout(&harness, event.id).await;

    // An earlier delivery completed the payment, then failed to publish.
    harness
        .store
        .transition_payment(
            &session_id,
            PaymentStatus::Pending,
            PaymentStatus::Completed,
            Some("pi_half_done"),
        )
        .await
        .unwrap();

    let outcome = harness
        .state
        .payments
        .handle_successful_payment(&session_id)
        .await
        .unwrap();

    assert_eq!(outcome, PaymentOutcome::AlreadyHandled);
    assert_eq!(harness.gateway.lookups(), 0);
    let event = harness.state.events.get(event.id).await.unwrap();
    assert!(event.is_paid && event.is_published);
    assert!(harness.state.payments.find_stalled().await.unwrap().is_empty());

    let again = harness
        .state
        .payments
        .handle_successful_payment(&session_id)
        .await
        .unwrap();
    assert_eq!(again, PaymentOutcome::AlreadyHandled);
}

#[tokio::test]
async fn test_reconcile_requires_admin() {
    let harness = TestHarness::new().await;
    let (name, value) = harness.creator_auth();

    let response = harness
        .server
        .post("/v1/admin/payments/reconcile")
        .add_header(name, value)
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}
