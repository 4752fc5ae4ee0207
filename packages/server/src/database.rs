use std::time::Duration;

use sea_orm::sea_query::{
    Index, IndexCreateStatement, MysqlQueryBuilder, PostgresQueryBuilder, SqliteQueryBuilder,
};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr};
use tracing::{info, warn};

use crate::entity::upload;

pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    // Set connection pool options
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .max_lifetime(Duration::from_secs(8))
        .sqlx_logging(true);

    let db = Database::connect(opt).await?;
    sync_schema(&db).await?;

    Ok(db)
}

/// Create missing tables and indexes.
pub async fn sync_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.get_schema_registry("candid_server::entity::*")
        .sync(db)
        .await?;
    ensure_indexes(db).await
}

/// Ensure composite indexes exist.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Rate limiting:
    // SELECT COUNT(*) FROM upload WHERE event_id = ? AND device_hash = ? AND created_at >= ?
    let device_window = Index::create()
        .if_not_exists()
        .name("idx_upload_event_device_created")
        .table(upload::Entity)
        .col(upload::Column::EventId)
        .col(upload::Column::DeviceHash)
        .col(upload::Column::CreatedAt)
        .to_owned();
    create_index(db, "idx_upload_event_device_created", &device_window).await;

    // Stream authorization: does (event_id, blob_id) exist?
    let event_blob = Index::create()
        .if_not_exists()
        .name("idx_upload_event_blob")
        .table(upload::Entity)
        .col(upload::Column::EventId)
        .col(upload::Column::BlobId)
        .to_owned();
    create_index(db, "idx_upload_event_blob", &event_blob).await;

    Ok(())
}

async fn create_index(db: &DatabaseConnection, name: &str, stmt: &IndexCreateStatement) {
    let sql = match db.get_database_backend() {
        DbBackend::Postgres => stmt.to_string(PostgresQueryBuilder),
        DbBackend::Sqlite => stmt.to_string(SqliteQueryBuilder),
        _ => stmt.to_string(MysqlQueryBuilder),
    };

    match db.execute_unprepared(&sql).await {
        Ok(_) => info!("Ensured index {name} exists"),
        Err(e) => warn!("Failed to create index {name}: {e}"),
    }
}
