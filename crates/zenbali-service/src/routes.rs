//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::{Extension, Router};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use zenbali_core::ReferenceKind;

use crate::handlers::{admin, creator, health, public, webhooks};
use crate::state::AppState;

// ============================================================================
// Limits
// ============================================================================

/// Maximum concurrent requests for API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 100;

/// Maximum webhook body size. Stripe events are far smaller.
pub const WEBHOOK_MAX_BODY_BYTES: usize = 64 * 1024;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `GET /v1/events`, `GET /v1/events/:id` - Published upcoming events
/// - `GET /v1/locations`, `/v1/event-types`, `/v1/entrance-types` - Active reference data
/// - `GET /uploads/*` - Stored event images
///
/// ## Creator (bearer JWT, creator)
/// - `GET|PUT /v1/creator/profile`
/// - `GET|POST /v1/creator/events`
/// - `GET|PUT|DELETE /v1/creator/events/:id`
/// - `POST /v1/creator/events/:id/image` - Multipart image upload
/// - `POST /v1/creator/events/:id/checkout` - Open a posting-fee checkout
/// - `GET /v1/creator/payments`
///
/// ## Admin (bearer JWT, admin)
/// - `GET /v1/admin/events`, `PUT|DELETE /v1/admin/events/:id`
/// - `GET /v1/admin/creators`, `PUT /v1/admin/creators/:id`
/// - `GET /v1/admin/payments`, `POST /v1/admin/payments/reconcile`
/// - `GET|POST /v1/admin/{locations,event-types,entrance-types}`
/// - `PUT /v1/admin/{locations,event-types,entrance-types}/:id`
///
/// ## Webhooks (signature verification)
/// - `POST /webhooks/stripe`
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;
    let upload_dir = state.uploads.dir().to_path_buf();

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let creator_routes = Router::new()
        .route(
            "/profile",
            get(creator::get_profile).put(creator::update_profile),
        )
        .route(
            "/events",
            get(creator::list_events).post(creator::create_event),
        )
        .route(
            "/events/:id",
            get(creator::get_event)
                .put(creator::update_event)
                .delete(creator::delete_event),
        )
        .route("/events/:id/image", post(creator::upload_image))
        .route("/events/:id/checkout", post(creator::create_checkout))
        .route("/payments", get(creator::list_payments));

    let mut admin_routes = Router::new()
        .route("/events", get(admin::list_events))
        .route(
            "/events/:id",
            put(admin::update_event).delete(admin::delete_event),
        )
        .route("/creators", get(admin::list_creators))
        .route("/creators/:id", put(admin::update_creator))
        .route("/payments", get(admin::list_payments))
        .route("/payments/reconcile", post(admin::reconcile_payments));
    for kind in ReferenceKind::ALL {
        admin_routes = admin_routes.nest(&format!("/{}", kind.path()), reference_routes(kind));
    }

    let api_routes = Router::new()
        // Public
        .route("/events", get(public::list_events))
        .route("/events/:id", get(public::get_event))
        .route("/locations", get(public::list_locations))
        .route("/event-types", get(public::list_event_types))
        .route("/entrance-types", get(public::list_entrance_types))
        .nest("/creator", creator_routes)
        .nest("/admin", admin_routes)
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    // Webhooks (no rate limit - controlled by Stripe)
    let webhook_routes = Router::new()
        .route("/stripe", post(webhooks::stripe_webhook))
        .layer(RequestBodyLimitLayer::new(WEBHOOK_MAX_BODY_BYTES));

    Router::new()
        .route("/health", get(health::health))
        .nest("/v1", api_routes)
        .nest("/webhooks", webhook_routes)
        .nest_service("/uploads", ServeDir::new(upload_dir))
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Admin CRUD routes for one reference table.
fn reference_routes(kind: ReferenceKind) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            get(admin::list_reference).post(admin::create_reference),
        )
        .route("/:id", put(admin::update_reference))
        .layer(Extension(kind))
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
