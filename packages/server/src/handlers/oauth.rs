use axum::extract::{Query, State};
use axum::response::Redirect;
use tracing::{info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::models::auth::{ConnectQuery, OAuthCallbackQuery};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/auth/google/start",
    tag = "Drive Authorization",
    operation_id = "startGoogleAuth",
    summary = "Begin owner Drive authorization",
    description = "Redirects the event owner to Google's consent screen. The event id is carried \
        through the handshake as the OAuth `state`.",
    params(ConnectQuery),
    responses(
        (status = 303, description = "Redirect to the consent screen"),
        (status = 400, description = "Missing eventId (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query), fields(event_id = ?query.event_id))]
pub async fn start_google_auth(
    State(state): State<AppState>,
    Query(query): Query<ConnectQuery>,
) -> Result<Redirect, AppError> {
    let event_id = query
        .event_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("Missing eventId".into()))?;

    let event = state.events().find(event_id).await?;
    let url = state.consent.consent_url(&event.id.to_string())?;
    Ok(Redirect::to(&url))
}

#[utoipa::path(
    get,
    path = "/oauth2/callback",
    tag = "Drive Authorization",
    operation_id = "handleOAuthCallback",
    summary = "Complete owner Drive authorization",
    description = "Exchanges the authorization code for a refresh token, stores it on the event \
        (replacing any earlier one), then redirects back to the guest page.",
    params(OAuthCallbackQuery),
    responses(
        (status = 303, description = "Redirect to the event page"),
        (status = 400, description = "Missing code/state (VALIDATION_ERROR) or no refresh token (NO_REFRESH_TOKEN)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "Token exchange failed (UPSTREAM_FAILURE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query), fields(event_id = ?query.state))]
pub async fn handle_oauth_callback(
    State(state): State<AppState>,
    Query(query): Query<OAuthCallbackQuery>,
) -> Result<Redirect, AppError> {
    if let Some(reason) = query.error.as_deref() {
        return Err(AppError::Validation(format!(
            "Authorization was not granted: {reason}"
        )));
    }

    let (Some(code), Some(event_ref)) = (
        query.code.as_deref().filter(|c| !c.is_empty()),
        query.state.as_deref().filter(|s| !s.is_empty()),
    ) else {
        return Err(AppError::Validation("Missing code/state".into()));
    };

    let event = state.events().find(event_ref).await?;
    let grant = state.consent.exchange_code(code).await?;
    let refresh_token = grant.refresh_token.ok_or(AppError::MissingRefreshToken)?;

    state
        .events()
        .set_owner_token(event.id, &refresh_token)
        .await?;
    info!(event_id = %event.id, "Owner connected Google Drive");

    let public_base = state.config.server.public_base_url.trim_end_matches('/');
    Ok(Redirect::to(&format!("{public_base}/?e={}", event.id)))
}
