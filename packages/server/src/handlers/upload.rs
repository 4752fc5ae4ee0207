use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::Json;
use axum::response::Response;
use bytes::Bytes;
use futures::TryStreamExt;
use tracing::{instrument, warn};

use crate::error::{AppError, ErrorBody};
use crate::extractors::api_base::ApiBase;
use crate::extractors::device::uploader_name;
use crate::extractors::json::AppJson;
use crate::models::upload::{
    CommentResponse, ListUploadsQuery, OkResponse, RenameUploaderRequest, RenameUploaderResponse,
    UpdateCommentRequest, UploadListResponse, UploadResponse, validate_uploader_name,
};
use crate::services::events::parse_id;
use crate::services::{DeviceHash, UploadFile};
use crate::state::AppState;

const MULTIPART_OVERHEAD: usize = 64 * 1024;
const DEFAULT_STREAM_CONTENT_TYPE: &str = "image/jpeg";
const STREAM_CACHE_CONTROL: &str = "public, max-age=300";

/// Body limit for the upload route: the configured file size plus form overhead.
pub fn upload_body_limit(max_file_bytes: usize) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_file_bytes.saturating_add(MULTIPART_OVERHEAD))
}

#[utoipa::path(
    get,
    path = "/events/{event_id}/uploads",
    tag = "Uploads",
    operation_id = "listUploads",
    summary = "List the event's photos, newest first",
    params(("event_id" = String, Path, description = "Event ID"), ListUploadsQuery),
    responses(
        (status = 200, description = "Uploads", body = UploadListResponse),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, base, query))]
pub async fn list_uploads(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Query(query): Query<ListUploadsQuery>,
    base: ApiBase,
) -> Result<Json<UploadListResponse>, AppError> {
    let event = state.events().find(&event_id).await?;
    let uploads = state.ledger().list_all(event.id, query.limit()).await?;
    Ok(Json(UploadListResponse::new(uploads, &base)))
}

#[utoipa::path(
    get,
    path = "/events/{event_id}/my-uploads",
    tag = "Uploads",
    operation_id = "listMyUploads",
    summary = "List this device's photos, oldest first",
    description = "The device is identified by the `X-Device-Id` header, falling back to the peer address.",
    params(("event_id" = String, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Uploads from this device", body = UploadListResponse),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, base))]
pub async fn list_my_uploads(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    device: DeviceHash,
    base: ApiBase,
) -> Result<Json<UploadListResponse>, AppError> {
    let event = state.events().find(&event_id).await?;
    let uploads = state.ledger().list_mine(event.id, &device).await?;
    Ok(Json(UploadListResponse::new(uploads, &base)))
}

#[utoipa::path(
    post,
    path = "/events/{event_id}/upload",
    tag = "Uploads",
    operation_id = "uploadPhoto",
    summary = "Upload a photo",
    description = "Stores one image in the event's Drive folder. The `file` multipart field is required. \
        The uploader's display name comes from the `X-Uploader-Name` header or an `uploaderName` field.",
    params(("event_id" = String, Path, description = "Event ID")),
    request_body(content_type = "multipart/form-data", description = "Image upload"),
    responses(
        (status = 200, description = "Photo stored", body = UploadResponse),
        (status = 400, description = "Missing or oversized file (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Drive not connected (NOT_CONNECTED)", body = ErrorBody),
        (status = 415, description = "Not an image (INVALID_CONTENT)", body = ErrorBody),
        (status = 429, description = "Upload limit reached (LIMIT_EXCEEDED)", body = ErrorBody),
        (status = 502, description = "Drive write failed (UPSTREAM_FAILURE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, base, headers, multipart))]
pub async fn upload_photo(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    device: DeviceHash,
    base: ApiBase,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let event_id = parse_id(&event_id, "Event not found")?;
    let max_bytes = state.config.upload.max_file_bytes;

    // Refuse before buffering the body.
    state
        .proxy()
        .connected_event(event_id)
        .await
        .map_err(|e| e.with_connect_url(base.connect_url(event_id)))?;

    let mut file: Option<UploadFile> = None;
    let mut name = uploader_name(&headers);

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let mime_type = field
                    .content_type()
                    .map(str::to_string)
                    .or_else(|| {
                        field
                            .file_name()
                            .and_then(|n| mime_guess::from_path(n).first_raw())
                            .map(str::to_string)
                    })
                    .unwrap_or_default();

                let mut data = Vec::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
                {
                    if data.len() + chunk.len() > max_bytes {
                        return Err(AppError::Validation(format!(
                            "File exceeds maximum size of {max_bytes} bytes"
                        )));
                    }
                    data.extend_from_slice(&chunk);
                }

                file = Some(UploadFile {
                    data: Bytes::from(data),
                    mime_type,
                });
            }
            Some("uploaderName") if name.is_none() => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read uploaderName: {e}")))?;
                name = Some(text);
            }
            _ => {} // Ignore unknown fields.
        }
    }

    let file = file.ok_or_else(|| AppError::Validation("Missing file".into()))?;

    let record = state
        .proxy()
        .upload(event_id, &device, file, name.as_deref())
        .await
        .map_err(|e| e.with_connect_url(base.connect_url(event_id)))?;

    let drive_file_id = record.blob_id.unwrap_or_default();
    Ok(Json(UploadResponse {
        ok: true,
        upload_id: record.id,
        url: base.file_url(event_id, &drive_file_id),
        drive_file_id,
    }))
}

#[utoipa::path(
    delete,
    path = "/events/{event_id}/uploads/{upload_id}",
    tag = "Uploads",
    operation_id = "deleteUpload",
    summary = "Delete one of this device's photos",
    description = "Removes the upload record. Removing the Drive file is attempted but not guaranteed.",
    params(
        ("event_id" = String, Path, description = "Event ID"),
        ("upload_id" = String, Path, description = "Upload ID"),
    ),
    responses(
        (status = 200, description = "Deleted", body = OkResponse),
        (status = 403, description = "Not this device's upload (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Event or upload not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_upload(
    State(state): State<AppState>,
    Path((event_id, upload_id)): Path<(String, String)>,
    device: DeviceHash,
) -> Result<Json<OkResponse>, AppError> {
    let event_id = parse_id(&event_id, "Event not found")?;
    let upload_id = parse_id(&upload_id, "Upload not found")?;

    state.proxy().delete(event_id, upload_id, &device).await?;
    Ok(Json(OkResponse { ok: true }))
}

#[utoipa::path(
    patch,
    path = "/events/{event_id}/uploads/{upload_id}/comment",
    tag = "Uploads",
    operation_id = "updateComment",
    summary = "Set the comment on one of this device's photos",
    params(
        ("event_id" = String, Path, description = "Event ID"),
        ("upload_id" = String, Path, description = "Upload ID"),
    ),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Comment stored", body = CommentResponse),
        (status = 403, description = "Not this device's upload (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Event or upload not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn update_comment(
    State(state): State<AppState>,
    Path((event_id, upload_id)): Path<(String, String)>,
    device: DeviceHash,
    AppJson(payload): AppJson<UpdateCommentRequest>,
) -> Result<Json<CommentResponse>, AppError> {
    let event_id = parse_id(&event_id, "Event not found")?;
    let upload_id = parse_id(&upload_id, "Upload not found")?;

    let record = state
        .proxy()
        .set_comment(event_id, upload_id, &device, payload.comment.as_deref())
        .await?;
    Ok(Json(CommentResponse {
        ok: true,
        comment: record.comment,
    }))
}

#[utoipa::path(
    patch,
    path = "/events/{event_id}/uploader-name",
    tag = "Uploads",
    operation_id = "updateUploaderName",
    summary = "Rename this device's uploads",
    description = "Sets the uploader display name on every upload this device made in the event.",
    params(("event_id" = String, Path, description = "Event ID")),
    request_body = RenameUploaderRequest,
    responses(
        (status = 200, description = "Uploads renamed", body = RenameUploaderResponse),
        (status = 400, description = "Empty name (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn update_uploader_name(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    device: DeviceHash,
    AppJson(payload): AppJson<RenameUploaderRequest>,
) -> Result<Json<RenameUploaderResponse>, AppError> {
    let uploader_name = validate_uploader_name(&payload.uploader_name)?;
    let event = state.events().find(&event_id).await?;

    let updated = state
        .ledger()
        .rename_uploader(event.id, &device, &uploader_name)
        .await?;
    Ok(Json(RenameUploaderResponse {
        ok: true,
        uploader_name,
        updated,
    }))
}

#[utoipa::path(
    get,
    path = "/events/{event_id}/files/{file_id}",
    tag = "Uploads",
    operation_id = "streamFile",
    summary = "Stream a photo",
    description = "Proxies the photo bytes from Drive. Only files recorded under this event are served.",
    params(
        ("event_id" = String, Path, description = "Event ID"),
        ("file_id" = String, Path, description = "Drive file ID"),
    ),
    responses(
        (status = 200, description = "Photo bytes with the content type reported by Drive"),
        (status = 404, description = "Event or file not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Drive not connected (NOT_CONNECTED)", body = ErrorBody),
        (status = 502, description = "Drive read failed (UPSTREAM_FAILURE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, base))]
pub async fn stream_file(
    State(state): State<AppState>,
    Path((event_id, file_id)): Path<(String, String)>,
    base: ApiBase,
) -> Result<Response, AppError> {
    let event_id = parse_id(&event_id, "Event not found")?;

    let source = state
        .proxy()
        .stream_source(event_id, file_id.trim())
        .await
        .map_err(|e| e.with_connect_url(base.connect_url(event_id)))?;

    let content_type = source
        .content_type
        .filter(|ct| !ct.is_empty())
        .unwrap_or_else(|| DEFAULT_STREAM_CONTENT_TYPE.to_string());

    // Errors after the first chunk end the response early.
    let body = Body::from_stream(
        source
            .body
            .inspect_err(move |e| warn!(%event_id, "Drive stream error: {e}")),
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, STREAM_CACHE_CONTROL)
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}
