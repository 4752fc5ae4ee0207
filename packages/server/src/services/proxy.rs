use bytes::Bytes;
use chrono::Utc;
use common::storage::{BlobStore, BlobStream, NewBlob};
use sea_orm::ConnectionTrait;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entity::{event, upload};
use crate::error::AppError;
use crate::services::ledger::{COMMENT_MAX_CHARS, NewUpload, UPLOADER_NAME_MAX_CHARS, clip};
use crate::services::{CredentialResolver, DeviceHash, EventStore, UploadLedger, best_effort};

/// File bytes as received from a guest.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub data: Bytes,
    pub mime_type: String,
}

impl UploadFile {
    pub fn is_image(&self) -> bool {
        self.mime_type
            .trim()
            .to_ascii_lowercase()
            .starts_with("image/")
    }
}

/// Blob name for a fresh upload: `snap-<uuid v7>.<ext>`.
pub fn blob_name(mime_type: &str) -> String {
    let ext = match mime_type {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => "jpg",
        other => mime_guess::get_mime_extensions_str(other)
            .and_then(|exts| exts.first().copied())
            .unwrap_or("bin"),
    };
    format!("snap-{}.{ext}", Uuid::now_v7())
}

/// Mediates every blob-store call for an event, enforcing existence,
/// connectivity, ownership and rate-limit preconditions first.
pub struct BlobProxy<'a, C: ConnectionTrait> {
    conn: &'a C,
    store: &'a dyn BlobStore,
    credentials: &'a CredentialResolver,
}

impl<'a, C: ConnectionTrait> BlobProxy<'a, C> {
    pub fn new(
        conn: &'a C,
        store: &'a dyn BlobStore,
        credentials: &'a CredentialResolver,
    ) -> Self {
        Self {
            conn,
            store,
            credentials,
        }
    }

    fn events(&self) -> EventStore<'a, C> {
        EventStore::new(self.conn)
    }

    fn ledger(&self) -> UploadLedger<'a, C> {
        UploadLedger::new(self.conn)
    }

    /// Load an event that has a usable Drive credential.
    pub async fn connected_event(&self, event_id: Uuid) -> Result<event::Model, AppError> {
        let event = self.events().get(event_id).await?;
        if !self.credentials.is_connected(&event) {
            return Err(AppError::NotConnected { connect_url: None });
        }
        Ok(event)
    }

    /// Store a guest's photo and record it.
    ///
    /// Nothing is persisted when the store write fails, so a failed attempt
    /// does not use up a rate-limit slot.
    pub async fn upload(
        &self,
        event_id: Uuid,
        device: &DeviceHash,
        file: UploadFile,
        uploader_name: Option<&str>,
    ) -> Result<upload::Model, AppError> {
        let event = self.connected_event(event_id).await?;

        if !file.is_image() {
            return Err(AppError::InvalidContent("Only images allowed".into()));
        }

        let now = Utc::now();
        self.ledger().check_rate_limit(&event, device, now).await?;

        let credential = self.credentials.resolve(&event)?;
        let mime_type = file.mime_type.trim().to_ascii_lowercase();
        let blob = NewBlob {
            container: event.drive_folder_id.clone(),
            name: blob_name(&mime_type),
            mime_type,
            data: file.data,
        };
        let size = blob.data.len();
        let blob_id = self
            .store
            .create(&credential, blob)
            .await
            .map_err(|e| AppError::Upstream(format!("blob create failed: {e}")))?;

        let record = self
            .ledger()
            .create(NewUpload {
                event_id: event.id,
                device_hash: device.clone(),
                blob_id: Some(blob_id),
                uploader_name: clip(uploader_name, UPLOADER_NAME_MAX_CHARS),
                created_at: now,
            })
            .await?;

        info!(
            event_id = %event.id,
            upload_id = %record.id,
            credential = credential.kind(),
            size,
            "Upload stored"
        );
        Ok(record)
    }

    /// Remove an upload owned by `device`. The remote blob delete is best-effort;
    /// the ledger record is removed regardless.
    pub async fn delete(
        &self,
        event_id: Uuid,
        upload_id: Uuid,
        device: &DeviceHash,
    ) -> Result<(), AppError> {
        let event = self.events().get(event_id).await?;
        let record = self.ledger().find_owned(event.id, upload_id, device).await?;

        if let Some(blob_id) = record.blob_id.as_deref().filter(|id| !id.is_empty()) {
            match self.credentials.resolve(&event) {
                Ok(credential) => {
                    best_effort("Drive delete", self.store.delete(&credential, blob_id)).await;
                }
                Err(_) => warn!(
                    event_id = %event.id,
                    blob_id,
                    "No Drive credential, leaving remote blob in place"
                ),
            }
        }

        self.ledger().delete(record.id).await?;
        info!(event_id = %event.id, upload_id = %record.id, "Upload deleted");
        Ok(())
    }

    /// Replace the comment on an upload owned by `device`.
    pub async fn set_comment(
        &self,
        event_id: Uuid,
        upload_id: Uuid,
        device: &DeviceHash,
        text: Option<&str>,
    ) -> Result<upload::Model, AppError> {
        let event = self.events().get(event_id).await?;
        let record = self.ledger().find_owned(event.id, upload_id, device).await?;
        self.ledger()
            .set_comment(record, clip(text, COMMENT_MAX_CHARS), Utc::now())
            .await
    }

    /// Open a blob for streaming. Only blobs recorded under this event are served.
    pub async fn stream_source(
        &self,
        event_id: Uuid,
        blob_id: &str,
    ) -> Result<BlobStream, AppError> {
        let event = self.connected_event(event_id).await?;

        if blob_id.is_empty() || !self.ledger().has_blob(event.id, blob_id).await? {
            return Err(AppError::NotFound("File not found for this event".into()));
        }

        let credential = self.credentials.resolve(&event)?;
        Ok(self.store.get_stream(&credential, blob_id).await?)
    }
}
