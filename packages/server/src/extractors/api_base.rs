use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use uuid::Uuid;

use crate::state::AppState;

/// Public base URL of this API, used to build links handed back to clients.
///
/// Taken from `server.api_public_base_url` when configured, otherwise from the
/// forwarding headers of the request.
#[derive(Debug, Clone)]
pub struct ApiBase(pub String);

impl ApiBase {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let proto = header("X-Forwarded-Proto").unwrap_or("http");
        let host = header("X-Forwarded-Host")
            .or_else(|| header(header::HOST.as_str()))
            .unwrap_or("localhost");
        Self(format!("{proto}://{host}"))
    }

    pub fn connect_url(&self, event_id: Uuid) -> String {
        format!("{}/auth/google/start?eventId={event_id}", self.0)
    }

    pub fn file_url(&self, event_id: Uuid, blob_id: &str) -> String {
        format!("{}/events/{event_id}/files/{blob_id}", self.0)
    }
}

impl FromRequestParts<AppState> for ApiBase {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match state.config.server.api_public_base_url.as_deref() {
            Some(base) if !base.trim().is_empty() => {
                Ok(Self(base.trim().trim_end_matches('/').to_string()))
            }
            _ => Ok(Self::from_headers(&parts.headers)),
        }
    }
}
