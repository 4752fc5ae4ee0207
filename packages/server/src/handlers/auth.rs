use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::auth::{AdminCheckRequest, AdminCheckResponse, passcode_matches};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/auth/admin-check",
    tag = "Auth",
    operation_id = "checkAdminPasscode",
    summary = "Check the admin passcode",
    description = "Gates the event-creation screen in the UI. No other endpoint requires it.",
    request_body = AdminCheckRequest,
    responses(
        (status = 200, description = "Passcode accepted", body = AdminCheckResponse),
        (status = 401, description = "Wrong or empty passcode (INVALID_PASSCODE)", body = ErrorBody),
        (status = 500, description = "No passcode configured (NOT_CONFIGURED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn admin_check(
    State(state): State<AppState>,
    AppJson(payload): AppJson<AdminCheckRequest>,
) -> Result<Json<AdminCheckResponse>, AppError> {
    let expected = state
        .config
        .admin
        .passcode
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::NotConfigured("Admin passcode not configured".into()))?;

    let provided = payload.passcode.as_deref().map(str::trim).unwrap_or_default();
    if provided.is_empty() || !passcode_matches(expected, provided) {
        return Err(AppError::InvalidPasscode);
    }

    Ok(Json(AdminCheckResponse { ok: true }))
}
