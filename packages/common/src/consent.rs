use async_trait::async_trait;

use crate::storage::StorageError;

/// Outcome of exchanging an authorization code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenGrant {
    /// Absent when the provider did not grant offline access.
    pub refresh_token: Option<String>,
}

/// The provider-side half of the owner authorization handshake.
#[async_trait]
pub trait OwnerConsent: Send + Sync {
    /// URL the owner is sent to. `state` comes back unchanged on the callback.
    fn consent_url(&self, state: &str) -> Result<String, StorageError>;

    /// Trade the callback's authorization code for tokens.
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, StorageError>;
}
