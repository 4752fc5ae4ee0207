use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;

use super::credential::DriveCredential;
use super::error::StorageError;
use super::traits::{BlobStore, BlobStream, NewBlob};

const CHUNK_SIZE: usize = 64 * 1024;

/// A blob held by [`MemoryBlobStore`].
#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub container: String,
    pub name: String,
    pub mime_type: String,
    pub data: Bytes,
}

/// In-process blob store.
///
/// Ids are sequential (`mem-1`, `mem-2`, ...). Create and delete failures can be
/// switched on to exercise the caller's failure paths, and every credential
/// presented to the store is recorded.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, StoredBlob>>,
    next_id: AtomicUsize,
    fail_creates: AtomicBool,
    fail_deletes: AtomicBool,
    credentials_seen: Mutex<Vec<DriveCredential>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `create` fail with an upstream error.
    pub fn fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `delete` fail with an upstream error.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Insert a blob directly, bypassing credentials. Returns its id.
    pub fn insert(&self, blob: NewBlob) -> String {
        let id = self.allocate_id();
        self.lock_blobs().insert(
            id.clone(),
            StoredBlob {
                container: blob.container,
                name: blob.name,
                mime_type: blob.mime_type,
                data: blob.data,
            },
        );
        id
    }

    pub fn blob(&self, blob_id: &str) -> Option<StoredBlob> {
        self.lock_blobs().get(blob_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock_blobs().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The credential presented by the most recent call, if any.
    pub fn last_credential(&self) -> Option<DriveCredential> {
        self.credentials_seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }

    fn allocate_id(&self) -> String {
        format!("mem-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn lock_blobs(&self) -> std::sync::MutexGuard<'_, HashMap<String, StoredBlob>> {
        self.blobs.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, credential: &DriveCredential) {
        self.credentials_seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(credential.clone());
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn create(
        &self,
        credential: &DriveCredential,
        blob: NewBlob,
    ) -> Result<String, StorageError> {
        self.record(credential);
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(StorageError::Upstream {
                status: 503,
                message: "memory store configured to fail creates".into(),
            });
        }
        Ok(self.insert(blob))
    }

    async fn get_stream(
        &self,
        credential: &DriveCredential,
        blob_id: &str,
    ) -> Result<BlobStream, StorageError> {
        self.record(credential);
        let blob = self
            .blob(blob_id)
            .ok_or_else(|| StorageError::NotFound(blob_id.to_string()))?;

        let chunks: Vec<Result<Bytes, StorageError>> = blob
            .data
            .chunks(CHUNK_SIZE)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();

        Ok(BlobStream {
            content_type: Some(blob.mime_type),
            body: Box::pin(stream::iter(chunks)),
        })
    }

    async fn delete(
        &self,
        credential: &DriveCredential,
        blob_id: &str,
    ) -> Result<(), StorageError> {
        self.record(credential);
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::Upstream {
                status: 503,
                message: "memory store configured to fail deletes".into(),
            });
        }
        match self.lock_blobs().remove(blob_id) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(blob_id.to_string())),
        }
    }
}
