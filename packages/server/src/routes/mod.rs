use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::config::{AppConfig, CorsConfig};
use crate::handlers;
use crate::handlers::upload::upload_body_limit;
use crate::state::AppState;

pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::health::health))
        .merge(event_routes(config))
        .merge(auth_routes())
}

fn event_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let upload = OpenApiRouter::new()
        .routes(routes!(handlers::upload::upload_photo))
        .layer(upload_body_limit(config.upload.max_file_bytes));

    OpenApiRouter::new()
        .routes(routes!(handlers::event::create_event))
        .routes(routes!(handlers::event::get_event_config))
        .routes(routes!(handlers::upload::list_uploads))
        .routes(routes!(handlers::upload::list_my_uploads))
        .routes(routes!(handlers::upload::stream_file))
        .routes(routes!(handlers::upload::delete_upload))
        .routes(routes!(handlers::upload::update_comment))
        .routes(routes!(handlers::upload::update_uploader_name))
        .merge(upload)
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::oauth::start_google_auth))
        .routes(routes!(handlers::oauth::handle_oauth_callback))
        .routes(routes!(handlers::auth::admin_check))
}

/// CORS for the guest frontend. `*` allows any origin.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origin = if config.allow_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = config
            .allow_origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o.trim_end_matches('/')) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Ignoring invalid CORS origin {o:?}: {e}");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-device-id"),
            HeaderName::from_static("x-uploader-name"),
        ])
        .max_age(Duration::from_secs(config.max_age))
}
