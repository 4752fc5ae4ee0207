use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

/// The identity a store call is made with.
#[derive(Clone, PartialEq, Eq)]
pub enum DriveCredential {
    /// Long-lived refresh token granted by an event owner.
    OwnerToken(String),
    /// Operator-wide service account.
    ServiceAccount(Arc<ServiceAccountKey>),
}

impl DriveCredential {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OwnerToken(_) => "owner",
            Self::ServiceAccount(_) => "service_account",
        }
    }
}

impl fmt::Debug for DriveCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OwnerToken(_) => f.write_str("OwnerToken(<redacted>)"),
            Self::ServiceAccount(key) => write!(f, "ServiceAccount({})", key.client_email),
        }
    }
}

/// The subset of a Google service-account key file needed to mint tokens.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    /// PEM-encoded RSA private key.
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".into()
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}
