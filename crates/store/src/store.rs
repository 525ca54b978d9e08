//! Transcript store trait and the SQLite implementation.

use crate::decode::sqlite_frame;
use crate::dialect::Dialect;
use crate::error::{StoreError, StoreResult};
use crate::query::{BindValue, Query};
use crate::repos::{CatalogRepo, ExpressionRepo, FrameSource, GeneRepo};
use async_trait::async_trait;
use isoview_core::Frame;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Combined transcript store trait.
#[async_trait]
pub trait TranscriptStore: GeneRepo + ExpressionRepo + CatalogRepo + Send + Sync {
    /// Check database connectivity and health.
    async fn health_check(&self) -> StoreResult<()>;

    /// Close the connection pool. Later queries fail.
    async fn close(&self);
}

/// SQLite-based transcript store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Open an existing SQLite database file.
    ///
    /// A missing file is an error rather than a fresh empty database.
    pub async fn new(path: impl AsRef<Path>, busy_timeout_secs: u64) -> StoreResult<Self> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(StoreError::NotFound(format!(
                "SQLite database {}",
                path.display()
            )));
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rw", path.display()))?
            .create_if_missing(false)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(busy_timeout_secs));

        let pool = SqlitePoolOptions::new()
            // A single connection keeps schema changes and reads on one
            // handle and avoids "database is locked" under concurrency.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        tracing::info!(path = %path.display(), "Opened SQLite transcript store");
        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl FrameSource for SqliteStore {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn fetch_frame(&self, query: &Query) -> StoreResult<Frame> {
        let sql = self.dialect().translate(&query.sql);
        tracing::trace!(sql = %sql, binds = query.binds.len(), "sqlite query");
        let mut statement = sqlx::query(&sql);
        for bind in &query.binds {
            statement = match bind {
                BindValue::Text(text) => statement.bind(text.clone()),
                BindValue::Int(value) => statement.bind(*value),
            };
        }
        let rows = statement.fetch_all(&self.pool).await?;
        sqlite_frame(&rows, &query.columns)
    }
}

impl GeneRepo for SqliteStore {}
impl ExpressionRepo for SqliteStore {}
impl CatalogRepo for SqliteStore {}

#[async_trait]
impl TranscriptStore for SqliteStore {
    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
