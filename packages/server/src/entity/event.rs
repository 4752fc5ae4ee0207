use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: String,

    /// Drive folder uploads are written into. Fixed at creation.
    pub drive_folder_id: String,

    /// Maximum uploads per device inside one rolling window.
    pub upload_limit: i32,

    /// Rolling window length in hours.
    pub window_hours: f64,

    /// Set once the owner completes the consent handshake.
    #[serde(skip_serializing)]
    pub owner_refresh_token: Option<String>,

    pub created_at: DateTimeUtc,
}

impl Model {
    /// The owner's refresh token, ignoring empty values.
    pub fn owner_token(&self) -> Option<&str> {
        self.owner_refresh_token
            .as_deref()
            .filter(|token| !token.is_empty())
    }
}

impl ActiveModelBehavior for ActiveModel {}
