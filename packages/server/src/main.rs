use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use common::google::{DriveBlobStore, GoogleAuth};
use tracing::info;
use tracing_subscriber::EnvFilter;

use candid_server::config::AppConfig;
use candid_server::database::init_db;
use candid_server::services::CredentialResolver;
use candid_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load()?;
    let db = init_db(&config.database.url).await?;

    let service_account = config.google.load_service_account();
    match &service_account {
        Some(key) => info!(client_email = %key.client_email, "Service account loaded"),
        None => info!("No service account configured, uploads need owner authorization"),
    }
    let credentials = CredentialResolver::new(service_account);

    let http = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()?;
    let google = Arc::new(GoogleAuth::new(http, config.google.clone()));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let state = AppState {
        db,
        config: Arc::new(config),
        blob_store: Arc::new(DriveBlobStore::new(Arc::clone(&google))),
        consent: google,
        credentials,
    };

    let app = candid_server::build_router(state);

    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
