//! Admin endpoints: event and creator moderation, payment oversight and
//! reference data.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;

use zenbali_core::{
    Creator, CreatorFilter, CreatorId, Event, EventChanges, EventFilter, EventId, MarketError,
    Page, Payment, PaymentFilter, ReferenceItem, ReferenceKind,
};
use zenbali_store::Store;

use super::{parse_id, MessageResponse};
use crate::auth::AdminAuth;
use crate::error::ApiError;
use crate::payments::ReconcileReport;
use crate::state::AppState;

// ============================================================================
// Events
// ============================================================================

/// List all events, past and unpublished included.
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    auth: AdminAuth,
    Query(filter): Query<EventFilter>,
) -> Result<Json<Page<Event>>, ApiError> {
    Ok(Json(state.events.list_all(auth.id(), &filter).await?))
}

/// Update any event.
pub async fn update_event(
    State(state): State<Arc<AppState>>,
    auth: AdminAuth,
    Path(id): Path<String>,
    Json(changes): Json<EventChanges>,
) -> Result<Json<Event>, ApiError> {
    let id: EventId = parse_id(&id, "event")?;
    Ok(Json(state.events.update(id, auth.actor(), changes).await?))
}

/// Delete any event.
pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    auth: AdminAuth,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id: EventId = parse_id(&id, "event")?;
    let deleted = state.events.delete(id, auth.actor()).await?;
    if let Some(image_url) = &deleted.image_url {
        state.uploads.delete_image(image_url).await;
    }
    Ok(Json(MessageResponse::new("Event deleted successfully")))
}

// ============================================================================
// Creators
// ============================================================================

/// Request body for moderating a creator.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateCreatorRequest {
    /// New active flag. Absent leaves the account as it is.
    pub is_active: Option<bool>,
}

/// List creator accounts, newest first.
pub async fn list_creators(
    State(state): State<Arc<AppState>>,
    _auth: AdminAuth,
    Query(filter): Query<CreatorFilter>,
) -> Result<Json<Page<Creator>>, ApiError> {
    let window = filter.pagination();
    let (creators, total) = state.store.list_creators(window).await?;
    Ok(Json(Page::new(creators, total, window)))
}

/// Activate or deactivate a creator. Deactivated creators are refused on
/// their next request.
pub async fn update_creator(
    State(state): State<Arc<AppState>>,
    auth: AdminAuth,
    Path(id): Path<String>,
    Json(request): Json<UpdateCreatorRequest>,
) -> Result<Json<Creator>, ApiError> {
    let id: CreatorId = parse_id(&id, "creator")?;

    let creator = match request.is_active {
        Some(is_active) => {
            let creator = state.store.set_creator_active(id, is_active).await?;
            tracing::info!(
                admin_id = %auth.id(),
                creator_id = %id,
                is_active = is_active,
                "Creator status updated"
            );
            creator
        }
        None => state
            .store
            .get_creator(id)
            .await?
            .ok_or_else(|| MarketError::CreatorNotFound {
                creator_id: id.to_string(),
            })?,
    };

    Ok(Json(creator))
}

// ============================================================================
// Payments
// ============================================================================

/// List all payments, optionally by status.
pub async fn list_payments(
    State(state): State<Arc<AppState>>,
    auth: AdminAuth,
    Query(filter): Query<PaymentFilter>,
) -> Result<Json<Page<Payment>>, ApiError> {
    Ok(Json(state.payments.list_all(auth.id(), &filter).await?))
}

/// Publish events whose payment completed but whose publication never landed.
pub async fn reconcile_payments(
    State(state): State<Arc<AppState>>,
    auth: AdminAuth,
) -> Result<Json<ReconcileReport>, ApiError> {
    Ok(Json(state.payments.reconcile_stalled(auth.id()).await?))
}

// ============================================================================
// Reference Data
// ============================================================================

/// Request body for creating a reference item.
#[derive(Debug, Deserialize)]
pub struct CreateReferenceRequest {
    /// Display name.
    pub name: String,
}

/// Request body for updating a reference item.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateReferenceRequest {
    /// New display name.
    pub name: Option<String>,
    /// New active flag.
    pub is_active: Option<bool>,
}

/// List every item of a reference table, inactive included.
pub async fn list_reference(
    State(state): State<Arc<AppState>>,
    _auth: AdminAuth,
    Extension(kind): Extension<ReferenceKind>,
) -> Result<Json<Vec<ReferenceItem>>, ApiError> {
    Ok(Json(state.store.list_reference(kind, false).await?))
}

/// Add an item to a reference table.
pub async fn create_reference(
    State(state): State<Arc<AppState>>,
    auth: AdminAuth,
    Extension(kind): Extension<ReferenceKind>,
    Json(request): Json<CreateReferenceRequest>,
) -> Result<(StatusCode, Json<ReferenceItem>), ApiError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(MarketError::MissingField("name").into());
    }

    let item = state.store.create_reference(kind, name).await?;
    tracing::info!(admin_id = %auth.id(), kind = %kind, id = item.id, "Reference item created");

    Ok((StatusCode::CREATED, Json(item)))
}

/// Rename or (de)activate a reference item.
pub async fn update_reference(
    State(state): State<Arc<AppState>>,
    auth: AdminAuth,
    Extension(kind): Extension<ReferenceKind>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateReferenceRequest>,
) -> Result<Json<ReferenceItem>, ApiError> {
    let current = state
        .store
        .list_reference(kind, false)
        .await?
        .into_iter()
        .find(|item| item.id == id)
        .ok_or_else(|| MarketError::ReferenceNotFound {
            kind: kind.label().to_string(),
            id: id.to_string(),
        })?;

    let name = match request.name {
        Some(name) if name.trim().is_empty() => {
            return Err(MarketError::MissingField("name").into());
        }
        Some(name) => name.trim().to_string(),
        None => current.name,
    };
    let is_active = request.is_active.unwrap_or(current.is_active);

    let item = state
        .store
        .update_reference(kind, id, &name, is_active)
        .await?;
    tracing::info!(
        admin_id = %auth.id(),
        kind = %kind,
        id = id,
        is_active = is_active,
        "Reference item updated"
    );

    Ok(Json(item))
}
