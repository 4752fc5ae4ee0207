use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::upload;
use crate::error::AppError;
use crate::extractors::api_base::ApiBase;
use crate::services::ledger::{UPLOADER_NAME_MAX_CHARS, clamp_limit, clip};

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListUploadsQuery {
    /// Page size, clamped to 1-200. Defaults to 80.
    pub limit: Option<i64>,
}

impl ListUploadsQuery {
    pub fn limit(&self) -> u64 {
        clamp_limit(self.limit)
    }
}

/// One upload as shown in a gallery.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    pub id: Uuid,
    /// Blob id in Drive.
    pub drive_file_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub uploader_name: String,
    pub comment: String,
    /// Streamable link for the photo.
    pub url: String,
}

impl UploadSummary {
    pub fn new(model: upload::Model, base: &ApiBase) -> Self {
        let drive_file_id = model.blob_id.unwrap_or_default();
        Self {
            url: base.file_url(model.event_id, &drive_file_id),
            id: model.id,
            drive_file_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
            uploader_name: model.uploader_name,
            comment: model.comment,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadListResponse {
    pub ok: bool,
    pub items: Vec<UploadSummary>,
}

impl UploadListResponse {
    pub fn new(models: Vec<upload::Model>, base: &ApiBase) -> Self {
        Self {
            ok: true,
            items: models
                .into_iter()
                .map(|m| UploadSummary::new(m, base))
                .collect(),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub ok: bool,
    pub upload_id: Uuid,
    pub drive_file_id: String,
    pub url: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateCommentRequest {
    /// New comment. Trimmed and capped at 200 characters; empty clears it.
    #[schema(example = "First dance!")]
    pub comment: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CommentResponse {
    pub ok: bool,
    pub comment: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenameUploaderRequest {
    #[schema(example = "Aunt May")]
    pub uploader_name: String,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenameUploaderResponse {
    pub ok: bool,
    pub uploader_name: String,
    /// Number of this device's uploads that were renamed.
    pub updated: u64,
}

/// Normalize a new uploader name. Blank names are rejected.
pub fn validate_uploader_name(raw: &str) -> Result<String, AppError> {
    let name = clip(Some(raw), UPLOADER_NAME_MAX_CHARS);
    if name.is_empty() {
        return Err(AppError::Validation("Uploader name must not be empty".into()));
    }
    Ok(name)
}
