//! Storage implementations.

use std::sync::Arc;

use tracing::{error, info};

use crate::config::{Config, StorageType};
use crate::interfaces::{RecordStore, StorageError};

pub mod mock;
#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub mod schema;
#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub mod sql;

pub use mock::MockRecordStore;

#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub use schema::TableSchema;
#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub use sql::SqlRecordStore;

#[cfg(feature = "postgres")]
pub use sql::postgres::PostgresRecordStore;
#[cfg(feature = "sqlite")]
pub use sql::sqlite::SqliteRecordStore;

/// Initialize storage based on configuration.
///
/// Connects to the configured backend, creates the positioned table if it
/// does not exist, and returns the record store.
pub async fn init_storage(config: &Config) -> Result<Arc<dyn RecordStore>, StorageError> {
    let storage = &config.storage;
    info!(
        "Storage: {} table {}",
        storage.storage_type, storage.table.name
    );

    match storage.storage_type {
        #[cfg(feature = "sqlite")]
        StorageType::Sqlite => {
            use std::str::FromStr;
            use std::time::Duration;

            use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

            let path = &storage.sqlite.path;
            if let Some(parent) = std::path::Path::new(path).parent() {
                std::fs::create_dir_all(parent)?;
            }

            let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
                .create_if_missing(true)
                .busy_timeout(Duration::from_secs(5));
            let pool = SqlitePoolOptions::new().connect_with(options).await?;

            let store = SqliteRecordStore::new(pool, TableSchema::new(&storage.table, &config.positioning));
            store.init().await?;
            info!("SQLite storage at {}", path);
            Ok(Arc::new(store))
        }
        #[cfg(feature = "postgres")]
        StorageType::Postgres => {
            use sqlx::postgres::PgPoolOptions;

            use crate::utils::bootstrap::connect_with_retry;

            let uri = &storage.postgres.uri;
            let pool = connect_with_retry("postgres", uri, || {
                PgPoolOptions::new()
                    .max_connections(storage.postgres.max_connections)
                    .connect(uri)
            })
            .await?;

            let store = PostgresRecordStore::new(pool, TableSchema::new(&storage.table, &config.positioning));
            store.init().await?;
            Ok(Arc::new(store))
        }
        #[allow(unreachable_patterns)]
        other => {
            error!("{} storage requested but '{}' feature is not enabled", other, other);
            Err(StorageError::UnsupportedBackend(other.to_string()))
        }
    }
}
