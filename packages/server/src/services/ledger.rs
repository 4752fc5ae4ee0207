use std::cmp;

use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set, sea_query::Expr,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::entity::{event, upload};
use crate::error::AppError;
use crate::services::DeviceHash;

pub const DEFAULT_LIST_LIMIT: u64 = 80;
pub const MAX_LIST_LIMIT: u64 = 200;
pub const UPLOADER_NAME_MAX_CHARS: usize = 80;
pub const COMMENT_MAX_CHARS: usize = 200;

/// Trim and cap free text. Missing input becomes the empty string.
pub fn clip(raw: Option<&str>, max_chars: usize) -> String {
    raw.map(|s| s.trim().chars().take(max_chars).collect())
        .unwrap_or_default()
}

/// Clamp a requested page size into `1..=200`, defaulting to 80.
pub fn clamp_limit(requested: Option<i64>) -> u64 {
    match requested {
        Some(n) => n.clamp(1, MAX_LIST_LIMIT as i64) as u64,
        None => DEFAULT_LIST_LIMIT,
    }
}

/// Length of an event's rolling window.
pub fn window_duration(window_hours: f64) -> Duration {
    Duration::milliseconds((window_hours * 3_600_000.0).round() as i64)
}

#[derive(Debug, Clone)]
pub struct NewUpload {
    pub event_id: Uuid,
    pub device_hash: DeviceHash,
    pub blob_id: Option<String>,
    pub uploader_name: String,
    pub created_at: DateTime<Utc>,
}

/// Persistent record of accepted uploads. Also serves as the rate limiter's history.
pub struct UploadLedger<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> UploadLedger<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn create(&self, new: NewUpload) -> Result<upload::Model, AppError> {
        let model = upload::ActiveModel {
            id: Set(Uuid::now_v7()),
            event_id: Set(new.event_id),
            device_hash: Set(new.device_hash.as_str().to_string()),
            blob_id: Set(new.blob_id),
            uploader_name: Set(new.uploader_name),
            comment: Set(String::new()),
            created_at: Set(new.created_at),
            updated_at: Set(None),
        };
        let created = model.insert(self.conn).await?;
        debug!(upload_id = %created.id, event_id = %created.event_id, "Upload recorded");
        Ok(created)
    }

    fn recent(
        &self,
        event_id: Uuid,
        device: &DeviceHash,
        since: DateTime<Utc>,
    ) -> Select<upload::Entity> {
        upload::Entity::find()
            .filter(upload::Column::EventId.eq(event_id))
            .filter(upload::Column::DeviceHash.eq(device.as_str()))
            .filter(upload::Column::CreatedAt.gte(since))
    }

    /// Uploads by `device` whose timestamp falls inside the window ending at `now`.
    /// The window start is inclusive.
    pub async fn count_recent(
        &self,
        event_id: Uuid,
        device: &DeviceHash,
        window_hours: f64,
        now: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let since = now - window_duration(window_hours);
        Ok(self.recent(event_id, device, since).count(self.conn).await?)
    }

    /// Reject when the device has used up its window allowance.
    ///
    /// Count-then-insert is not atomic, so concurrent uploads from one device can
    /// overshoot the limit slightly.
    pub async fn check_rate_limit(
        &self,
        event: &event::Model,
        device: &DeviceHash,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let count = self
            .count_recent(event.id, device, event.window_hours, now)
            .await?;
        if count < event.upload_limit.max(0) as u64 {
            return Ok(());
        }

        let window = window_duration(event.window_hours);
        let oldest = self
            .recent(event.id, device, now - window)
            .order_by_asc(upload::Column::CreatedAt)
            .one(self.conn)
            .await?;

        let retry_after = oldest
            .map(|u| {
                let expires = u.created_at + window;
                cmp::max((expires - now).num_seconds(), 1) as u64
            })
            .unwrap_or_else(|| cmp::max(window.num_seconds(), 1) as u64);

        info!(event_id = %event.id, device = ?device, count, "Upload limit reached");
        Err(AppError::LimitExceeded { retry_after })
    }

    /// Newest-first uploads that have a blob.
    pub async fn list_all(
        &self,
        event_id: Uuid,
        limit: u64,
    ) -> Result<Vec<upload::Model>, AppError> {
        Ok(upload::Entity::find()
            .filter(upload::Column::EventId.eq(event_id))
            .filter(upload::Column::BlobId.is_not_null())
            .filter(upload::Column::BlobId.ne(""))
            .order_by_desc(upload::Column::CreatedAt)
            .order_by_desc(upload::Column::Id)
            .limit(limit.clamp(1, MAX_LIST_LIMIT))
            .all(self.conn)
            .await?)
    }

    /// Oldest-first uploads from one device that have a blob.
    pub async fn list_mine(
        &self,
        event_id: Uuid,
        device: &DeviceHash,
    ) -> Result<Vec<upload::Model>, AppError> {
        Ok(upload::Entity::find()
            .filter(upload::Column::EventId.eq(event_id))
            .filter(upload::Column::DeviceHash.eq(device.as_str()))
            .filter(upload::Column::BlobId.is_not_null())
            .filter(upload::Column::BlobId.ne(""))
            .order_by_asc(upload::Column::CreatedAt)
            .order_by_asc(upload::Column::Id)
            .all(self.conn)
            .await?)
    }

    pub async fn find(&self, upload_id: Uuid) -> Result<upload::Model, AppError> {
        upload::Entity::find_by_id(upload_id)
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Upload not found".into()))
    }

    /// Load an upload for mutation by `device`. Records from another event or
    /// another device are forbidden.
    pub async fn find_owned(
        &self,
        event_id: Uuid,
        upload_id: Uuid,
        device: &DeviceHash,
    ) -> Result<upload::Model, AppError> {
        let record = self.find(upload_id).await?;
        if record.event_id != event_id {
            return Err(AppError::Forbidden("Upload belongs to a different event".into()));
        }
        if record.device_hash != device.as_str() {
            return Err(AppError::Forbidden("Not allowed".into()));
        }
        Ok(record)
    }

    /// Whether `blob_id` was recorded under `event_id`.
    pub async fn has_blob(&self, event_id: Uuid, blob_id: &str) -> Result<bool, AppError> {
        let count = upload::Entity::find()
            .filter(upload::Column::EventId.eq(event_id))
            .filter(upload::Column::BlobId.eq(blob_id))
            .count(self.conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn set_comment(
        &self,
        record: upload::Model,
        comment: String,
        now: DateTime<Utc>,
    ) -> Result<upload::Model, AppError> {
        let mut active = record.into_active_model();
        active.comment = Set(comment);
        active.updated_at = Set(Some(now));
        Ok(active.update(self.conn).await?)
    }

    /// Rename every upload `device` made in `event_id`. Returns the number of rows touched.
    pub async fn rename_uploader(
        &self,
        event_id: Uuid,
        device: &DeviceHash,
        uploader_name: &str,
    ) -> Result<u64, AppError> {
        let result = upload::Entity::update_many()
            .col_expr(upload::Column::UploaderName, Expr::value(uploader_name))
            .filter(upload::Column::EventId.eq(event_id))
            .filter(upload::Column::DeviceHash.eq(device.as_str()))
            .exec(self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn delete(&self, upload_id: Uuid) -> Result<(), AppError> {
        upload::Entity::delete_by_id(upload_id)
            .exec(self.conn)
            .await?;
        Ok(())
    }
}
