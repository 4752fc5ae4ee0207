use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, IntoActiveModel, Set};
use tracing::info;
use uuid::Uuid;

use crate::entity::event;
use crate::error::AppError;

pub const DEFAULT_EVENT_NAME: &str = "Wedding";
pub const DEFAULT_UPLOAD_LIMIT: i32 = 4;
pub const DEFAULT_WINDOW_HOURS: f64 = 24.0;

/// Input for creating an event. Every field is optional.
#[derive(Debug, Clone, Default)]
pub struct NewEvent {
    pub name: Option<String>,
    pub drive_folder_id: Option<String>,
    pub upload_limit: Option<i32>,
    pub window_hours: Option<f64>,
}

/// Parse a path id, treating anything malformed as an unknown record.
pub fn parse_id(raw: &str, not_found: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::NotFound(not_found.into()))
}

pub struct EventStore<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> EventStore<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Create an event, filling in defaults. Blank strings count as omitted and
    /// non-positive limits fall back to the defaults.
    pub async fn create(
        &self,
        input: NewEvent,
        fallback_folder: &str,
    ) -> Result<event::Model, AppError> {
        let name = non_blank(input.name).unwrap_or_else(|| DEFAULT_EVENT_NAME.to_string());
        let drive_folder_id =
            non_blank(input.drive_folder_id).unwrap_or_else(|| fallback_folder.to_string());
        let upload_limit = input
            .upload_limit
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_UPLOAD_LIMIT);
        let window_hours = input
            .window_hours
            .filter(|h| h.is_finite() && *h > 0.0)
            .unwrap_or(DEFAULT_WINDOW_HOURS);

        let model = event::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(name),
            drive_folder_id: Set(drive_folder_id),
            upload_limit: Set(upload_limit),
            window_hours: Set(window_hours),
            owner_refresh_token: Set(None),
            created_at: Set(Utc::now()),
        };

        let created = model.insert(self.conn).await?;
        info!(event_id = %created.id, folder = %created.drive_folder_id, "Event created");
        Ok(created)
    }

    pub async fn get(&self, id: Uuid) -> Result<event::Model, AppError> {
        event::Entity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".into()))
    }

    /// Look up an event by its textual id.
    pub async fn find(&self, raw_id: &str) -> Result<event::Model, AppError> {
        self.get(parse_id(raw_id, "Event not found")?).await
    }

    /// Store the owner's refresh token. Last write wins.
    pub async fn set_owner_token(&self, id: Uuid, token: &str) -> Result<event::Model, AppError> {
        let mut active = self.get(id).await?.into_active_model();
        active.owner_refresh_token = Set(Some(token.to_string()));
        let updated = active.update(self.conn).await?;
        info!(event_id = %id, "Owner Drive authorization stored");
        Ok(updated)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
