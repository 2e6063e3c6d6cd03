//! Integration tests for creator profiles and admin moderation of creators.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::{json, Value};
use zenbali_store::Store;

// ============================================================================
// Profile
// ============================================================================

#[tokio::test]
async fn test_creator_reads_own_profile() {
    let harness = TestHarness::new().await;
    let (name, value) = harness.creator_auth();

    let response = harness
        .server
        .get("/v1/creator/profile")
        .add_header(name, value)
        .await;

    response.assert_status_ok();
    let profile: Value = response.json();
    assert_eq!(profile["id"], harness.creator.id.to_string());
    assert_eq!(profile["name"], "Wayan");
    assert_eq!(profile["email"], "wayan@example.com");
    assert_eq!(profile["is_active"], true);
}

#[tokio::test]
async fn test_profile_update_changes_only_given_fields() {
    let harness = TestHarness::new().await;
    let (name, value) = harness.creator_auth();

    let response = harness
        .server
        .put("/v1/creator/profile")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "organization_name": "Ubud Breath Collective" }))
        .await;

    response.assert_status_ok();
    let profile: Value = response.json();
    assert_eq!(profile["name"], "Wayan");
    assert_eq!(profile["organization_name"], "Ubud Breath Collective");

    let response = harness
        .server
        .put("/v1/creator/profile")
        .add_header(name, value)
        .json(&json!({ "name": "  " }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let error: Value = response.json();
    assert_eq!(error["error"]["code"], "missing_field");

    let stored = harness
        .store
        .get_creator(harness.creator.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.name, "Wayan");
    assert_eq!(
        stored.organization_name.as_deref(),
        Some("Ubud Breath Collective")
    );
}

#[tokio::test]
async fn test_profile_requires_creator_token() {
    let harness = TestHarness::new().await;

    harness
        .server
        .get("/v1/creator/profile")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let (name, value) = harness.admin_auth();
    harness
        .server
        .get("/v1/creator/profile")
        .add_header(name, value)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

// ============================================================================
// Moderation
// ============================================================================

#[tokio::test]
async fn test_admin_lists_creators() {
    let harness = TestHarness::new().await;
    let (name, value) = harness.admin_auth();

    let response = harness
        .server
        .get("/v1/admin/creators?limit=1")
        .add_header(name.clone(), value.clone())
        .await;

    response.assert_status_ok();
    let page: Value = response.json();
    assert_eq!(page["total"], 2);
    assert_eq!(page["total_pages"], 2);
    assert_eq!(page["items"].as_array().unwrap().len(), 1);

    let response = harness
        .server
        .get("/v1/admin/creators")
        .add_header(name, value)
        .await;
    let page: Value = response.json();
    let ids: Vec<&str> = page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&harness.creator.id.to_string().as_str()));
    assert!(ids.contains(&harness.other_creator.id.to_string().as_str()));
}

#[tokio::test]
async fn test_deactivated_creator_is_refused_until_reactivated() {
    let harness = TestHarness::new().await;
    let (admin_name, admin_value) = harness.admin_auth();
    let (name, value) = harness.creator_auth();

    let response = harness
        .server
        .put(&format!("/v1/admin/creators/{}", harness.creator.id))
        .add_header(admin_name.clone(), admin_value.clone())
        .json(&json!({ "is_active": false }))
        .await;

    response.assert_status_ok();
    let updated: Value = response.json();
    assert_eq!(updated["is_active"], false);

    let response = harness
        .server
        .get("/v1/creator/events")
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    let error: Value = response.json();
    assert_eq!(error["error"]["code"], "account_inactive");

    // Other creators are unaffected.
    let (other_name, other_value) = harness.other_creator_auth();
    harness
        .server
        .get("/v1/creator/events")
        .add_header(other_name, other_value)
        .await
        .assert_status_ok();

    harness
        .server
        .put(&format!("/v1/admin/creators/{}", harness.creator.id))
        .add_header(admin_name, admin_value)
        .json(&json!({ "is_active": true }))
        .await
        .assert_status_ok();

    harness
        .server
        .get("/v1/creator/events")
        .add_header(name, value)
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_update_without_flag_returns_creator_unchanged() {
    let harness = TestHarness::new().await;
    let (name, value) = harness.admin_auth();

    let response = harness
        .server
        .put(&format!("/v1/admin/creators/{}", harness.creator.id))
        .add_header(name, value)
        .json(&json!({}))
        .await;

    response.assert_status_ok();
    let creator: Value = response.json();
    assert_eq!(creator["is_active"], true);
}

#[tokio::test]
async fn test_moderating_unknown_creator() {
    let harness = TestHarness::new().await;
    let (name, value) = harness.admin_auth();

    let response = harness
        .server
        .put(&format!(
            "/v1/admin/creators/{}",
            zenbali_core::CreatorId::generate()
        ))
        .add_header(name.clone(), value.clone())
        .json(&json!({ "is_active": false }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    let error: Value = response.json();
    assert_eq!(error["error"]["code"], "creator_not_found");

    let response = harness
        .server
        .put("/v1/admin/creators/not-a-uuid")
        .add_header(name, value)
        .json(&json!({ "is_active": false }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_creator_moderation_requires_admin() {
    let harness = TestHarness::new().await;
    let (name, value) = harness.creator_auth();

    let response = harness
        .server
        .put(&format!("/v1/admin/creators/{}", harness.other_creator.id))
        .add_header(name, value)
        .json(&json!({ "is_active": false }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    let other = harness
        .store
        .get_creator(harness.other_creator.id)
        .await
        .unwrap()
        .unwrap();
    assert!(other.is_active);
}
