use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::event;
use crate::services::{CredentialResolver, NewEvent};

/// Request body for creating an event. Every field is optional.
#[derive(Deserialize, Default, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    /// Display name. Defaults to `Wedding`.
    #[schema(example = "Ana & Ben")]
    pub name: Option<String>,
    /// Drive folder uploads go into. Defaults to the configured fallback folder.
    pub drive_folder_id: Option<String>,
}

impl From<CreateEventRequest> for NewEvent {
    fn from(req: CreateEventRequest) -> Self {
        NewEvent {
            name: req.name,
            drive_folder_id: req.drive_folder_id,
            ..Default::default()
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventResponse {
    pub ok: bool,
    pub event_id: Uuid,
    pub drive_folder_id: String,
    /// Guest-facing share link.
    #[schema(example = "https://candidsnaps.netlify.app/?e=0190f0b4-6a4e-7c1d-9f3b-2a7d5e8c1b00")]
    pub public_url: String,
    /// Where the owner starts Drive authorization.
    pub connect_url: String,
}

/// Public configuration of an event.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventConfigResponse {
    pub ok: bool,
    pub name: String,
    #[schema(example = 4)]
    pub upload_limit: i32,
    #[schema(example = 24.0)]
    pub window_hours: f64,
    /// Uploads can be accepted right now.
    pub is_connected: bool,
    /// The event owner completed Drive authorization.
    pub is_owner_connected: bool,
    /// A service account is configured for this deployment.
    pub is_service_account_active: bool,
}

impl EventConfigResponse {
    pub fn new(event: &event::Model, credentials: &CredentialResolver) -> Self {
        Self {
            ok: true,
            name: event.name.clone(),
            upload_limit: event.upload_limit,
            window_hours: event.window_hours,
            is_connected: credentials.is_connected(event),
            is_owner_connected: CredentialResolver::is_owner_connected(event),
            is_service_account_active: credentials.has_service_account(),
        }
    }
}
