use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "upload")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning event. Never changes.
    pub event_id: Uuid,

    /// Fingerprint of the uploading device. Sole credential for later mutation.
    pub device_hash: String,

    /// Identifier assigned by the blob store. Records without one are never listed.
    pub blob_id: Option<String>,

    pub uploader_name: String,

    pub comment: String,

    pub created_at: DateTimeUtc,

    /// Last comment edit.
    pub updated_at: Option<DateTimeUtc>,
}

impl ActiveModelBehavior for ActiveModel {}
