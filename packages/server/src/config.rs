use common::config::GoogleConfig;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
    /// Guest-facing frontend, used for share links and the post-consent redirect.
    pub public_base_url: String,
    /// Public URL of this API. Derived from request headers when unset.
    #[serde(default)]
    pub api_public_base_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EventConfig {
    /// Drive folder used when an event is created without one.
    pub fallback_drive_folder_id: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    pub max_file_bytes: usize,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AdminConfig {
    #[serde(default)]
    pub passcode: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub google: GoogleConfig,
    pub events: EventConfig,
    pub upload: UploadConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

pub const DEFAULT_FALLBACK_DRIVE_FOLDER_ID: &str = "1b9PoSR_UxREh5QuCOwR2i7hm3V5Y0XMt";

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", vec!["https://candidsnaps.netlify.app"])?
            .set_default("server.cors.max_age", 3600)?
            .set_default("server.public_base_url", "https://candidsnaps.netlify.app")?
            .set_default("events.fallback_drive_folder_id", DEFAULT_FALLBACK_DRIVE_FOLDER_ID)?
            .set_default("upload.max_file_bytes", 2 * 1024 * 1024)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., CANDID__GOOGLE__CLIENT_ID)
            .add_source(
                Environment::with_prefix("CANDID")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}
