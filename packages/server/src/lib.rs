pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable as ScalarServable};

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Candid Snaps API",
        version = "1.0.0",
        description = "Guest photo uploads for weddings, stored in the couple's Google Drive"
    ),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Events", description = "Event creation and configuration"),
        (name = "Uploads", description = "Guest uploads, galleries and photo streaming"),
        (name = "Drive Authorization", description = "Owner Google Drive consent flow"),
        (name = "Auth", description = "Admin passcode gate"),
    ),
)]
struct ApiDoc;

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let cors = routes::cors_layer(&state.config.server.cors);
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(routes::api_routes(&state.config))
        .split_for_parts();

    router
        .with_state(state)
        .merge(Scalar::with_url("/scalar", api))
        .layer(cors)
}
