use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;

use super::credential::DriveCredential;
use super::error::StorageError;

/// Boxed stream of body chunks coming back from a store.
pub type ByteStream = BoxStream<'static, Result<Bytes, StorageError>>;

/// A blob to be written into a container.
#[derive(Debug, Clone)]
pub struct NewBlob {
    /// Container (folder) the blob is placed into.
    pub container: String,
    /// Display name inside the container. Only uniqueness matters.
    pub name: String,
    pub mime_type: String,
    pub data: Bytes,
}

/// A blob being read back from a store.
pub struct BlobStream {
    /// Content type reported by the store, if any.
    pub content_type: Option<String>,
    pub body: ByteStream,
}

/// Container-scoped blob storage addressed by store-assigned ids.
///
/// Every call carries the credential it must act with; implementations do not
/// cache credentials between calls.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write a blob and return the identifier the store assigned to it.
    async fn create(
        &self,
        credential: &DriveCredential,
        blob: NewBlob,
    ) -> Result<String, StorageError>;

    /// Open a blob as a stream of chunks.
    ///
    /// Dropping the returned stream aborts the underlying read.
    async fn get_stream(
        &self,
        credential: &DriveCredential,
        blob_id: &str,
    ) -> Result<BlobStream, StorageError>;

    /// Read a whole blob into memory.
    async fn get(
        &self,
        credential: &DriveCredential,
        blob_id: &str,
    ) -> Result<Vec<u8>, StorageError> {
        let mut stream = self.get_stream(credential, blob_id).await?;
        let mut buf = Vec::new();
        while let Some(chunk) = stream.body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf)
    }

    /// Remove a blob.
    async fn delete(
        &self,
        credential: &DriveCredential,
        blob_id: &str,
    ) -> Result<(), StorageError>;
}
