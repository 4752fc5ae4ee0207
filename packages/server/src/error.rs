use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `NOT_FOUND`,
    /// `FORBIDDEN`, `NOT_CONNECTED`, `LIMIT_EXCEEDED`, `INVALID_CONTENT`,
    /// `UPSTREAM_FAILURE`, `NO_REFRESH_TOKEN`, `INVALID_PASSCODE`,
    /// `NOT_CONFIGURED`, `INTERNAL_ERROR`.
    #[schema(example = "LIMIT_EXCEEDED")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Upload limit reached for this device")]
    pub message: String,
    /// Where the event owner can (re)authorize Drive access. Only sent with `NOT_CONNECTED`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_url: Option<String>,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    NotFound(String),
    /// The calling device does not own the record, or the record belongs elsewhere.
    Forbidden(String),
    /// No Drive credential is usable for the event.
    NotConnected {
        connect_url: Option<String>,
    },
    /// Per-device upload limit reached. Contains seconds until a slot frees up.
    LimitExceeded {
        retry_after: u64,
    },
    InvalidContent(String),
    /// The blob store or token endpoint failed.
    Upstream(String),
    /// Consent completed without offline access.
    MissingRefreshToken,
    InvalidPasscode,
    NotConfigured(String),
    Internal(String),
}

impl AppError {
    /// Attach the authorization-start link to a `NotConnected` error.
    pub fn with_connect_url(self, url: impl Into<String>) -> Self {
        match self {
            AppError::NotConnected { .. } => AppError::NotConnected {
                connect_url: Some(url.into()),
            },
            other => other,
        }
    }

    /// Machine-readable code, as sent in [`ErrorBody::code`].
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotConnected { .. } => "NOT_CONNECTED",
            AppError::LimitExceeded { .. } => "LIMIT_EXCEEDED",
            AppError::InvalidContent(_) => "INVALID_CONTENT",
            AppError::Upstream(_) => "UPSTREAM_FAILURE",
            AppError::MissingRefreshToken => "NO_REFRESH_TOKEN",
            AppError::InvalidPasscode => "INVALID_PASSCODE",
            AppError::NotConfigured(_) => "NOT_CONFIGURED",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        let code = self.code();
        let mut connect_url = None;
        let (status, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotConnected { connect_url: url } => {
                connect_url = url;
                (
                    StatusCode::CONFLICT,
                    "Drive not connected for this event yet. Owner must connect Google Drive first."
                        .into(),
                )
            }
            AppError::LimitExceeded { retry_after } => (
                StatusCode::TOO_MANY_REQUESTS,
                format!(
                    "Upload limit reached for this device. Try again in {} seconds",
                    retry_after
                ),
            ),
            AppError::InvalidContent(msg) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, msg),
            AppError::Upstream(detail) => {
                tracing::error!("Upstream failure: {}", detail);
                (
                    StatusCode::BAD_GATEWAY,
                    "The storage provider failed to complete the request".into(),
                )
            }
            AppError::MissingRefreshToken => (
                StatusCode::BAD_REQUEST,
                "No refresh token returned. Remove app access from your Google Account and try again."
                    .into(),
            ),
            AppError::InvalidPasscode => (StatusCode::UNAUTHORIZED, "Invalid passcode".into()),
            AppError::NotConfigured(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".into(),
                )
            }
        };

        (
            status,
            ErrorBody {
                code,
                message,
                connect_url,
            },
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let retry_after = if let AppError::LimitExceeded { retry_after } = &self {
            Some(*retry_after)
        } else {
            None
        };

        let (status, body) = self.status_and_body();

        if let Some(seconds) = retry_after {
            (status, [("Retry-After", seconds.to_string())], Json(body)).into_response()
        } else {
            (status, Json(body)).into_response()
        }
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(detail) => {
                tracing::warn!("Blob not found upstream: {detail}");
                AppError::NotFound("File not found".into())
            }
            other => AppError::Upstream(other.to_string()),
        }
    }
}
