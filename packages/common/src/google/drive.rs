use std::sync::Arc;

use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use futures::TryStreamExt;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::auth::GoogleAuth;
use crate::storage::{BlobStore, BlobStream, DriveCredential, NewBlob, StorageError};

#[derive(Debug, Deserialize)]
struct CreatedFile {
    id: String,
}

/// Google Drive v3 as a blob store. Containers are folder ids.
pub struct DriveBlobStore {
    auth: Arc<GoogleAuth>,
}

impl DriveBlobStore {
    pub fn new(auth: Arc<GoogleAuth>) -> Self {
        Self { auth }
    }

    fn file_url(&self, blob_id: &str) -> String {
        format!("{}/files/{}", self.auth.endpoints().drive, blob_id)
    }
}

/// Encode a `multipart/related` upload body: JSON metadata part, then media part.
///
/// Returns the body and the matching `Content-Type` header value.
fn multipart_related(blob: &NewBlob, boundary: &str) -> (Bytes, String) {
    let metadata = json!({
        "name": blob.name,
        "parents": [blob.container],
        "mimeType": blob.mime_type,
    });

    let mut body = BytesMut::with_capacity(blob.data.len() + 512);
    body.put_slice(format!("--{boundary}\r\n").as_bytes());
    body.put_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.put_slice(metadata.to_string().as_bytes());
    body.put_slice(format!("\r\n--{boundary}\r\n").as_bytes());
    body.put_slice(format!("Content-Type: {}\r\n\r\n", blob.mime_type).as_bytes());
    body.put_slice(&blob.data);
    body.put_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    (
        body.freeze(),
        format!("multipart/related; boundary={boundary}"),
    )
}

#[async_trait]
impl BlobStore for DriveBlobStore {
    #[instrument(skip(self, credential, blob), fields(container = %blob.container, size = blob.data.len()))]
    async fn create(
        &self,
        credential: &DriveCredential,
        blob: NewBlob,
    ) -> Result<String, StorageError> {
        let token = self.auth.access_token(credential).await?;
        let boundary = format!("candid-{}", Uuid::new_v4().simple());
        let (body, content_type) = multipart_related(&blob, &boundary);

        let response = self
            .auth
            .http()
            .post(format!("{}/files", self.auth.endpoints().drive_upload))
            .query(&[("uploadType", "multipart"), ("fields", "id")])
            .bearer_auth(token)
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StorageError::from_response(response).await);
        }

        let created: CreatedFile = response.json().await?;
        debug!(blob_id = %created.id, "Drive file created");
        Ok(created.id)
    }

    #[instrument(skip(self, credential))]
    async fn get_stream(
        &self,
        credential: &DriveCredential,
        blob_id: &str,
    ) -> Result<BlobStream, StorageError> {
        let token = self.auth.access_token(credential).await?;
        let response = self
            .auth
            .http()
            .get(self.file_url(blob_id))
            .query(&[("alt", "media")])
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StorageError::from_response(response).await);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v: &HeaderValue| v.to_str().ok())
            .map(str::to_string);

        Ok(BlobStream {
            content_type,
            body: Box::pin(response.bytes_stream().map_err(StorageError::from)),
        })
    }

    #[instrument(skip(self, credential))]
    async fn delete(
        &self,
        credential: &DriveCredential,
        blob_id: &str,
    ) -> Result<(), StorageError> {
        let token = self.auth.access_token(credential).await?;
        let response = self
            .auth
            .http()
            .delete(self.file_url(blob_id))
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StorageError::from_response(response).await);
        }
        Ok(())
    }
}
