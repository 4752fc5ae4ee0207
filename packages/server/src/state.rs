use std::sync::Arc;

use common::consent::OwnerConsent;
use common::storage::BlobStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::services::{BlobProxy, CredentialResolver, EventStore, UploadLedger};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub blob_store: Arc<dyn BlobStore>,
    pub consent: Arc<dyn OwnerConsent>,
    pub credentials: CredentialResolver,
}

impl AppState {
    pub fn events(&self) -> EventStore<'_, DatabaseConnection> {
        EventStore::new(&self.db)
    }

    pub fn ledger(&self) -> UploadLedger<'_, DatabaseConnection> {
        UploadLedger::new(&self.db)
    }

    pub fn proxy(&self) -> BlobProxy<'_, DatabaseConnection> {
        BlobProxy::new(&self.db, self.blob_store.as_ref(), &self.credentials)
    }
}
