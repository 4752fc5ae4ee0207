use std::path::PathBuf;

use serde::Deserialize;
use tracing::warn;

use crate::storage::ServiceAccountKey;

/// Google OAuth client and service-account settings.
#[derive(Debug, Deserialize, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Must match the redirect URI registered for the OAuth client.
    pub redirect_uri: String,
    /// Service-account key file contents, inline. Takes precedence over the path.
    #[serde(default)]
    pub service_account_json: Option<String>,
    #[serde(default)]
    pub service_account_json_path: Option<PathBuf>,
}

impl GoogleConfig {
    /// Load the configured service-account key.
    ///
    /// Malformed or unreadable input is logged and treated as "not configured".
    pub fn load_service_account(&self) -> Option<ServiceAccountKey> {
        if let Some(raw) = self.service_account_json.as_deref().filter(|s| !s.is_empty()) {
            return serde_json::from_str(raw)
                .map_err(|e| warn!("Invalid inline service account JSON: {e}"))
                .ok();
        }

        let path = self.service_account_json_path.as_ref()?;
        let raw = std::fs::read_to_string(path)
            .map_err(|e| warn!("Cannot read service account file {}: {e}", path.display()))
            .ok()?;
        serde_json::from_str(&raw)
            .map_err(|e| warn!("Invalid service account file {}: {e}", path.display()))
            .ok()
    }
}
