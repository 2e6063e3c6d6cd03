//! Creator endpoints: profile, own events, image upload, checkout and payment
//! history.

use std::sync::Arc;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use zenbali_core::{
    Creator, Event, EventChanges, EventFields, EventFilter, EventId, EventState, Page, Payment,
    PaymentFilter, ProfileChanges,
};
use zenbali_store::Store;

use super::{parse_id, MessageResponse};
use crate::auth::CreatorAuth;
use crate::error::ApiError;
use crate::payments::CheckoutLink;
use crate::state::AppState;

/// Multipart field carrying the image.
const IMAGE_FIELD: &str = "image";

/// An event with its lifecycle state.
#[derive(Debug, Serialize)]
pub struct EventDetail {
    /// The event.
    #[serde(flatten)]
    pub event: Event,
    /// Draft, pending payment or published.
    pub state: EventState,
}

/// Response for an image upload.
#[derive(Debug, Serialize)]
pub struct ImageResponse {
    /// Public URL of the stored image.
    pub image_url: String,
}

/// The authenticated creator's profile.
pub async fn get_profile(auth: CreatorAuth) -> Json<Creator> {
    Json(auth.creator)
}

/// Edit the authenticated creator's name or organization.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    auth: CreatorAuth,
    Json(changes): Json<ProfileChanges>,
) -> Result<Json<Creator>, ApiError> {
    let mut creator = auth.creator;
    changes.apply(&mut creator)?;
    let saved = state.store.update_creator_profile(&creator).await?;
    tracing::info!(creator_id = %saved.id, "Creator profile updated");
    Ok(Json(saved))
}

/// List the creator's events.
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    auth: CreatorAuth,
    Query(filter): Query<EventFilter>,
) -> Result<Json<Page<Event>>, ApiError> {
    Ok(Json(
        state
            .events
            .list_by_creator(auth.creator.id, &filter)
            .await?,
    ))
}

/// Submit a new event.
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    auth: CreatorAuth,
    Json(fields): Json<EventFields>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    let event = state.events.create(auth.creator.id, fields).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// Get one of the creator's events.
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    auth: CreatorAuth,
    Path(id): Path<String>,
) -> Result<Json<EventDetail>, ApiError> {
    let id: EventId = parse_id(&id, "event")?;
    let event = state.events.get_managed(id, auth.actor()).await?;
    let lifecycle = state.events.state_of(&event).await?;
    Ok(Json(EventDetail {
        event,
        state: lifecycle,
    }))
}

/// Partially update one of the creator's events.
pub async fn update_event(
    State(state): State<Arc<AppState>>,
    auth: CreatorAuth,
    Path(id): Path<String>,
    Json(changes): Json<EventChanges>,
) -> Result<Json<Event>, ApiError> {
    let id: EventId = parse_id(&id, "event")?;
    Ok(Json(state.events.update(id, auth.actor(), changes).await?))
}

/// Delete one of the creator's events.
pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    auth: CreatorAuth,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id: EventId = parse_id(&id, "event")?;
    let deleted = state.events.delete(id, auth.actor()).await?;
    if let Some(image_url) = &deleted.image_url {
        state.uploads.delete_image(image_url).await;
    }
    Ok(Json(MessageResponse::new("Event deleted successfully")))
}

/// Upload an image for one of the creator's events (multipart field `image`).
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    auth: CreatorAuth,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<ImageResponse>, ApiError> {
    let id: EventId = parse_id(&id, "event")?;

    // Reject foreign events before touching the disk.
    state.events.get_managed(id, auth.actor()).await?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() == Some(IMAGE_FIELD) {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            upload = Some((filename, bytes));
            break;
        }
    }
    let (filename, bytes) =
        upload.ok_or_else(|| ApiError::BadRequest("No image file provided".into()))?;

    let image_url = state.uploads.save_image(&bytes, &filename).await?;

    match state.events.attach_image(id, auth.actor(), &image_url).await {
        Ok((_, previous)) => {
            if let Some(previous) = previous.filter(|p| *p != image_url) {
                state.uploads.delete_image(&previous).await;
            }
            Ok(Json(ImageResponse { image_url }))
        }
        Err(e) => {
            state.uploads.delete_image(&image_url).await;
            Err(e.into())
        }
    }
}

/// Open a posting-fee checkout for one of the creator's events.
pub async fn create_checkout(
    State(state): State<Arc<AppState>>,
    auth: CreatorAuth,
    Path(id): Path<String>,
) -> Result<Json<CheckoutLink>, ApiError> {
    let id: EventId = parse_id(&id, "event")?;
    Ok(Json(state.payments.start_checkout(id, auth.actor()).await?))
}

/// List the creator's payments.
pub async fn list_payments(
    State(state): State<Arc<AppState>>,
    auth: CreatorAuth,
    Query(filter): Query<PaymentFilter>,
) -> Result<Json<Page<Payment>>, ApiError> {
    Ok(Json(
        state
            .payments
            .list_by_creator(auth.creator.id, &filter)
            .await?,
    ))
}
