use std::sync::Arc;

use common::storage::{DriveCredential, ServiceAccountKey};

use crate::entity::event;
use crate::error::AppError;

/// Which trust path an event's Drive calls would use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource<'a> {
    /// The event owner's own refresh token.
    OwnerToken(&'a str),
    /// The operator-wide service account.
    ServiceAccount,
    None,
}

/// Chooses the Drive credential for an event.
///
/// The service account is a deployment-time fact injected at construction, so
/// independent resolvers can hold independent configurations.
#[derive(Debug, Clone, Default)]
pub struct CredentialResolver {
    service_account: Option<Arc<ServiceAccountKey>>,
}

impl CredentialResolver {
    pub fn new(service_account: Option<ServiceAccountKey>) -> Self {
        Self {
            service_account: service_account.map(Arc::new),
        }
    }

    pub fn has_service_account(&self) -> bool {
        self.service_account.is_some()
    }

    /// Classify without building anything. Owner consent wins over the service account.
    pub fn source<'a>(&self, event: &'a event::Model) -> CredentialSource<'a> {
        match (event.owner_token(), &self.service_account) {
            (Some(token), _) => CredentialSource::OwnerToken(token),
            (None, Some(_)) => CredentialSource::ServiceAccount,
            (None, None) => CredentialSource::None,
        }
    }

    /// Build the credential for one operation.
    pub fn resolve(&self, event: &event::Model) -> Result<DriveCredential, AppError> {
        match (self.source(event), &self.service_account) {
            (CredentialSource::OwnerToken(token), _) => {
                Ok(DriveCredential::OwnerToken(token.to_string()))
            }
            (CredentialSource::ServiceAccount, Some(key)) => {
                Ok(DriveCredential::ServiceAccount(Arc::clone(key)))
            }
            _ => Err(AppError::NotConnected { connect_url: None }),
        }
    }

    /// Whether any credential path is usable. No side effects, no network.
    pub fn is_connected(&self, event: &event::Model) -> bool {
        self.source(event) != CredentialSource::None
    }

    /// Whether this event's owner has authorized, ignoring the service account.
    pub fn is_owner_connected(event: &event::Model) -> bool {
        event.owner_token().is_some()
    }
}
