use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::api_base::ApiBase;
use crate::extractors::json::AppJson;
use crate::models::event::{CreateEventRequest, CreateEventResponse, EventConfigResponse};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/events",
    tag = "Events",
    operation_id = "createEvent",
    summary = "Create an event",
    description = "Creates an event with default limits (4 uploads per device per 24 hours). \
        The body is optional; omitted fields take their defaults. \
        Returns the guest share link and the link the owner uses to connect Google Drive.",
    request_body = CreateEventRequest,
    responses(
        (status = 200, description = "Event created", body = CreateEventResponse),
        (status = 400, description = "Malformed body (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, base, payload))]
pub async fn create_event(
    State(state): State<AppState>,
    base: ApiBase,
    payload: Option<AppJson<CreateEventRequest>>,
) -> Result<Json<CreateEventResponse>, AppError> {
    let payload = payload.map(|AppJson(p)| p).unwrap_or_default();
    let event = state
        .events()
        .create(
            payload.into(),
            &state.config.events.fallback_drive_folder_id,
        )
        .await?;

    let public_base = state.config.server.public_base_url.trim_end_matches('/');
    Ok(Json(CreateEventResponse {
        ok: true,
        event_id: event.id,
        public_url: format!("{public_base}/?e={}", event.id),
        connect_url: base.connect_url(event.id),
        drive_folder_id: event.drive_folder_id,
    }))
}

#[utoipa::path(
    get,
    path = "/events/{event_id}",
    tag = "Events",
    operation_id = "getEventConfig",
    summary = "Get event configuration",
    description = "Returns the upload limits and whether Drive is connected for the event.",
    params(("event_id" = String, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event configuration", body = EventConfigResponse),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_event_config(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<EventConfigResponse>, AppError> {
    let event = state.events().find(&event_id).await?;
    Ok(Json(EventConfigResponse::new(&event, &state.credentials)))
}
