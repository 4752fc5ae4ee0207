use serde::{Deserialize, Serialize};

/// Query of `GET /auth/google/start`.
#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct ConnectQuery {
    pub event_id: Option<String>,
}

/// Query of the OAuth redirect.
#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    /// Event id, echoed back by the provider.
    pub state: Option<String>,
    /// Set by the provider when the owner declined.
    pub error: Option<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct AdminCheckRequest {
    #[schema(example = "letmein")]
    pub passcode: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AdminCheckResponse {
    pub ok: bool,
}

/// Constant-time comparison so the check does not leak prefix matches.
pub fn passcode_matches(expected: &str, given: &str) -> bool {
    let (a, b) = (expected.as_bytes(), given.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
