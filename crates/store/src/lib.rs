//! Relational access for isoview.
//!
//! This crate provides the read side of the transcript database:
//! - Gene lookups and database-side gene search
//! - Expression matrix reads joined with sample metadata
//! - Table discovery and the schema registry used to build SQL safely
//! - SQLite and PostgreSQL backends with dynamic row decoding

pub mod dialect;
pub mod error;
pub mod postgres;
pub mod query;
pub mod repos;
pub mod schema;
pub mod store;

mod decode;

pub use dialect::{Dialect, quote_ident};
pub use error::{StoreError, StoreResult};
pub use postgres::PostgresStore;
pub use query::{BindValue, Query};
pub use repos::{CatalogRepo, ExpressionRepo, FrameSource, GeneRepo, TableInfo};
pub use schema::{SchemaRegistry, TableSchema};
pub use store::{SqliteStore, TranscriptStore};

use isoview_core::config::DatabaseConfig;
use std::sync::Arc;

/// Create a transcript store from configuration.
pub async fn from_config(config: &DatabaseConfig) -> StoreResult<Arc<dyn TranscriptStore>> {
    match config {
        DatabaseConfig::Sqlite {
            path,
            busy_timeout_secs,
        } => {
            let store = SqliteStore::new(path, *busy_timeout_secs).await?;
            Ok(Arc::new(store) as Arc<dyn TranscriptStore>)
        }
        DatabaseConfig::Postgres {
            url,
            host,
            port,
            username,
            password,
            database,
            ssl_mode,
            max_connections,
            statement_timeout_ms,
        } => {
            let store = if let Some(url) = url {
                tracing::info!("Connecting to PostgreSQL using connection URL");
                PostgresStore::from_url(url, *max_connections, *statement_timeout_ms).await?
            } else if let (Some(host), Some(database)) = (host.as_ref(), database.as_ref()) {
                PostgresStore::from_params(
                    host,
                    port.unwrap_or(5432),
                    username.as_deref(),
                    password.as_deref(),
                    database,
                    *ssl_mode,
                    *max_connections,
                    *statement_timeout_ms,
                )
                .await?
            } else {
                return Err(StoreError::Config(
                    "postgres config requires either 'url' or 'host' + 'database'".to_string(),
                ));
            };
            Ok(Arc::new(store) as Arc<dyn TranscriptStore>)
        }
    }
}
