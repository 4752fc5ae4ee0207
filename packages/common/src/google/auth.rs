use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GoogleConfig;
use crate::consent::{OwnerConsent, TokenGrant};
use crate::storage::{DriveCredential, ServiceAccountKey, StorageError};

/// Per-file Drive access: the app only sees files it created.
pub const DRIVE_FILE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Base URLs of the Google services used by this crate.
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub authorize: String,
    pub token: String,
    /// Drive v3 metadata API, e.g. `https://www.googleapis.com/drive/v3`.
    pub drive: String,
    /// Drive v3 media upload API.
    pub drive_upload: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            authorize: "https://accounts.google.com/o/oauth2/v2/auth".into(),
            token: "https://oauth2.googleapis.com/token".into(),
            drive: "https://www.googleapis.com/drive/v3".into(),
            drive_upload: "https://www.googleapis.com/upload/drive/v3".into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// Client for Google's OAuth endpoints.
///
/// Access tokens are minted per call and never cached.
pub struct GoogleAuth {
    http: reqwest::Client,
    config: GoogleConfig,
    endpoints: GoogleEndpoints,
}

impl GoogleAuth {
    pub fn new(http: reqwest::Client, config: GoogleConfig) -> Self {
        Self {
            http,
            config,
            endpoints: GoogleEndpoints::default(),
        }
    }

    pub fn with_endpoints(mut self, endpoints: GoogleEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn endpoints(&self) -> &GoogleEndpoints {
        &self.endpoints
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Build the consent URL. Offline access and a forced consent prompt are
    /// requested so the callback carries a refresh token.
    pub fn authorize_url(&self, state: &str) -> Result<String, StorageError> {
        let url = reqwest::Url::parse_with_params(
            &self.endpoints.authorize,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", DRIVE_FILE_SCOPE),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", state),
            ],
        )
        .map_err(|e| StorageError::Credential(format!("invalid authorization endpoint: {e}")))?;
        Ok(url.into())
    }

    /// Exchange a credential for a short-lived access token.
    pub async fn access_token(&self, credential: &DriveCredential) -> Result<String, StorageError> {
        debug!(kind = credential.kind(), "Minting access token");
        let response = match credential {
            DriveCredential::OwnerToken(refresh_token) => {
                self.request_token(
                    &self.endpoints.token,
                    &[
                        ("grant_type", "refresh_token"),
                        ("refresh_token", refresh_token.as_str()),
                        ("client_id", self.config.client_id.as_str()),
                        ("client_secret", self.config.client_secret.as_str()),
                    ],
                )
                .await?
            }
            DriveCredential::ServiceAccount(key) => {
                let assertion = service_account_assertion(key, Utc::now().timestamp())?;
                self.request_token(
                    &key.token_uri,
                    &[
                        ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                        ("assertion", assertion.as_str()),
                    ],
                )
                .await?
            }
        };
        Ok(response.access_token)
    }

    async fn request_token(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<TokenResponse, StorageError> {
        let response = self.http.post(url).form(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StorageError::Credential(format!(
                "token endpoint returned {}: {message}",
                status.as_u16()
            )));
        }
        Ok(response.json::<TokenResponse>().await?)
    }
}

#[async_trait]
impl OwnerConsent for GoogleAuth {
    fn consent_url(&self, state: &str) -> Result<String, StorageError> {
        self.authorize_url(state)
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, StorageError> {
        let response = self
            .request_token(
                &self.endpoints.token,
                &[
                    ("grant_type", "authorization_code"),
                    ("code", code),
                    ("client_id", self.config.client_id.as_str()),
                    ("client_secret", self.config.client_secret.as_str()),
                    ("redirect_uri", self.config.redirect_uri.as_str()),
                ],
            )
            .await?;
        Ok(TokenGrant {
            refresh_token: response.refresh_token.filter(|t| !t.is_empty()),
        })
    }
}

/// Sign the RS256 JWT a service account presents to the token endpoint.
pub fn service_account_assertion(
    key: &ServiceAccountKey,
    issued_at: i64,
) -> Result<String, StorageError> {
    let claims = AssertionClaims {
        iss: &key.client_email,
        scope: DRIVE_FILE_SCOPE,
        aud: &key.token_uri,
        iat: issued_at,
        exp: issued_at + ASSERTION_LIFETIME_SECS,
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| StorageError::Credential(format!("invalid service account key: {e}")))?;

    encode(&header, &claims, &signing_key)
        .map_err(|e| StorageError::Credential(format!("failed to sign assertion: {e}")))
}
