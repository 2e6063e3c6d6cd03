//! Public read endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;

use zenbali_core::{Event, EventFilter, EventId, Page, ReferenceItem, ReferenceKind};
use zenbali_store::Store;

use super::parse_id;
use crate::error::ApiError;
use crate::state::AppState;

/// List published upcoming events.
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<EventFilter>,
) -> Result<Json<Page<Event>>, ApiError> {
    Ok(Json(state.events.list_public(&filter).await?))
}

/// Get a published event.
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Event>, ApiError> {
    let id: EventId = parse_id(&id, "event")?;
    Ok(Json(state.events.get_published(id).await?))
}

async fn active_reference(
    state: &AppState,
    kind: ReferenceKind,
) -> Result<Json<Vec<ReferenceItem>>, ApiError> {
    Ok(Json(state.store.list_reference(kind, true).await?))
}

/// List active locations.
pub async fn list_locations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ReferenceItem>>, ApiError> {
    active_reference(&state, ReferenceKind::Location).await
}

/// List active event types.
pub async fn list_event_types(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ReferenceItem>>, ApiError> {
    active_reference(&state, ReferenceKind::EventType).await
}

/// List active entrance types.
pub async fn list_entrance_types(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ReferenceItem>>, ApiError> {
    active_reference(&state, ReferenceKind::EntranceType).await
}
