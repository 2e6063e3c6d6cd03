//! Common test utilities for zenbali integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use axum_test::TestServer;
use chrono::{Duration, NaiveDate};
use tempfile::TempDir;

use zenbali_core::{Admin, Creator, Event, EventFields, ReferenceKind};
use zenbali_service::auth::{issue_token, UserType};
use zenbali_service::{
    create_router, AppState, CheckoutRequest, GatewayError, OpenedSession, PaymentGateway,
    ServiceConfig, SessionDetails,
};
use zenbali_store::{MemoryStore, Store};

pub const JWT_SECRET: &str = "test-jwt-secret";
pub const WEBHOOK_SECRET: &str = "whsec_test_secret";

/// Payment gateway that records calls instead of talking to Stripe.
#[derive(Default)]
pub struct FakeGateway {
    sessions_created: AtomicUsize,
    lookups: AtomicUsize,
    fail_lookups: AtomicBool,
    requests: std::sync::Mutex<Vec<CheckoutRequest>>,
}

impl FakeGateway {
    pub fn sessions_created(&self) -> usize {
        self.sessions_created.load(Ordering::SeqCst)
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    pub fn last_request(&self) -> Option<CheckoutRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn create_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<OpenedSession, GatewayError> {
        let n = self.sessions_created.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().unwrap().push(request.clone());
        let session_id = format!("cs_test_{n}_{}", uuid::Uuid::new_v4().simple());
        Ok(OpenedSession {
            redirect_url: format!("https://checkout.stripe.test/pay/{session_id}"),
            session_id,
        })
    }

    async fn get_session(&self, session_id: &str) -> Result<SessionDetails, GatewayError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(GatewayError("stripe unavailable".into()));
        }
        Ok(SessionDetails {
            payment_intent_id: Some(format!("pi_{session_id}")),
            payment_status: Some("paid".into()),
        })
    }
}

/// Harness options.
pub struct Options {
    pub gateway: bool,
    pub webhook_secret: Option<&'static str>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            gateway: true,
            webhook_secret: Some(WEBHOOK_SECRET),
        }
    }
}

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The state behind the server, for driving workflows directly.
    pub state: AppState,
    /// The backing store.
    pub store: Arc<MemoryStore>,
    /// The fake payment gateway.
    pub gateway: Arc<FakeGateway>,
    /// Event owner.
    pub creator: Creator,
    /// A second creator.
    pub other_creator: Creator,
    /// An administrator.
    pub admin: Admin,
    /// Upload directory (kept alive for test duration).
    pub _upload_dir: TempDir,
}

impl TestHarness {
    /// Harness with a gateway and a webhook signing secret.
    pub async fn new() -> Self {
        Self::with_options(Options::default()).await
    }

    pub async fn with_options(options: Options) -> Self {
        let upload_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Arc::new(MemoryStore::with_reference_data());

        let creator = Creator::new("Wayan", "wayan@example.com");
        let other_creator = Creator::new("Ketut", "ketut@example.com");
        let admin = Admin::new("Made", "made@example.com");
        store.put_creator(creator.clone()).await;
        store.put_creator(other_creator.clone()).await;
        store.put_admin(admin.clone()).await;

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            base_url: "https://zenbali.test".into(),
            jwt_secret: JWT_SECRET.into(),
            stripe_webhook_secret: options.webhook_secret.map(String::from),
            upload_dir: upload_dir.path().to_path_buf(),
            max_upload_bytes: 1024,
            ..ServiceConfig::default()
        };

        let gateway = Arc::new(FakeGateway::default());
        let state = AppState::with_gateway(
            store.clone(),
            config,
            options
                .gateway
                .then(|| gateway.clone() as Arc<dyn PaymentGateway>),
        );
        let router: Router = create_router(state.clone());
        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            state,
            store,
            gateway,
            creator,
            other_creator,
            admin,
            _upload_dir: upload_dir,
        }
    }

    pub fn creator_auth(&self) -> (HeaderName, HeaderValue) {
        bearer(&self.creator.id.to_string(), UserType::Creator)
    }

    pub fn other_creator_auth(&self) -> (HeaderName, HeaderValue) {
        bearer(&self.other_creator.id.to_string(), UserType::Creator)
    }

    pub fn admin_auth(&self) -> (HeaderName, HeaderValue) {
        bearer(&self.admin.id.to_string(), UserType::Admin)
    }

    /// First active id of each reference table: (location, event type, entrance type).
    pub async fn reference_ids(&self) -> (i32, i32, i32) {
        let first = |items: Vec<zenbali_core::ReferenceItem>| items[0].id;
        (
            first(self.store.list_reference(ReferenceKind::Location, true).await.unwrap()),
            first(self.store.list_reference(ReferenceKind::EventType, true).await.unwrap()),
            first(
                self.store
                    .list_reference(ReferenceKind::EntranceType, true)
                    .await
                    .unwrap(),
            ),
        )
    }

    /// Valid submission JSON for an event on `date`.
    pub async fn event_json(&self, title: &str, date: NaiveDate) -> serde_json::Value {
        let (location_id, event_type_id, entrance_type_id) = self.reference_ids().await;
        serde_json::json!({
            "title": title,
            "event_date": date.format("%Y-%m-%d").to_string(),
            "event_time": "18:00",
            "location_id": location_id,
            "event_type_id": event_type_id,
            "entrance_type_id": entrance_type_id,
            "entrance_fee": 0,
            "contact_email": "wayan@example.com",
        })
    }

    /// Create an event for `creator` directly through the lifecycle manager.
    pub async fn create_event_for(&self, creator: &Creator, title: &str, date: NaiveDate) -> Event {
        let fields: EventFields =
            serde_json::from_value(self.event_json(title, date).await).unwrap();
        self.state.events.create(creator.id, fields).await.unwrap()
    }

    /// Create an event owned by the primary creator.
    pub async fn create_event(&self, title: &str, date: NaiveDate) -> Event {
        self.create_event_for(&self.creator, title, date).await
    }
}

/// Days from today.
pub fn days_from_today(days: i64) -> NaiveDate {
    zenbali_service::events::today() + Duration::days(days)
}

/// Authorization header with a fresh token.
pub fn bearer(subject: &str, user_type: UserType) -> (HeaderName, HeaderValue) {
    let token = issue_token(JWT_SECRET, subject, user_type, Duration::hours(1)).unwrap();
    (
        HeaderName::from_static("authorization"),
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    )
}

/// A Stripe checkout notification body.
pub fn checkout_notification(event_type: &str, session_id: &str, payment_status: &str) -> String {
    serde_json::json!({
        "id": format!("evt_{}", uuid::Uuid::new_v4().simple()),
        "object": "event",
        "type": event_type,
        "created": chrono::Utc::now().timestamp(),
        "data": {
            "object": {
                "id": session_id,
                "object": "checkout.session",
                "payment_status": payment_status,
                "metadata": {}
            }
        }
    })
    .to_string()
}

/// A valid `Stripe-Signature` header for `body`.
pub fn sign(body: &str) -> String {
    zenbali_service::stripe::signature_header(WEBHOOK_SECRET, chrono::Utc::now().timestamp(), body)
}
