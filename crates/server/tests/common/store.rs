//! Transcript store test utilities.

use super::fixtures::{seed_postgres, seed_sqlite};
use async_trait::async_trait;
use isoview_core::Frame;
use isoview_store::{
    CatalogRepo, Dialect, ExpressionRepo, FrameSource, GeneRepo, PostgresStore, Query,
    SqliteStore, StoreError, StoreResult, TranscriptStore,
};
use sqlx::{Pool, Sqlite};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;

/// A seeded SQLite store that cleans up on drop.
#[allow(dead_code)]
pub struct TestStore {
    pub store: Arc<dyn TranscriptStore>,
    pub(crate) sqlite_store: Arc<SqliteStore>,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestStore {
    /// Create a SQLite store in a temp directory and load the fixtures.
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let path = temp_dir.path().join("isoview.db");
        // SQLite treats an empty file as an empty database.
        std::fs::File::create(&path).expect("Failed to create database file");
        let store = SqliteStore::new(&path, 5)
            .await
            .expect("Failed to create SQLite store");
        seed_sqlite(&store).await;
        let arc_store = Arc::new(store);

        Self {
            store: arc_store.clone(),
            sqlite_store: arc_store,
            _temp_dir: temp_dir,
        }
    }

    pub fn store(&self) -> Arc<dyn TranscriptStore> {
        self.store.clone()
    }

    /// Raw pool, for altering fixtures mid-test.
    pub fn pool(&self) -> &Pool<Sqlite> {
        self.sqlite_store.pool()
    }

    pub async fn execute(&self, statement: &str) {
        sqlx::query(statement)
            .execute(self.pool())
            .await
            .expect("Failed to execute statement");
    }
}

/// PostgreSQL store backed by a testcontainer.
#[allow(dead_code)]
pub struct PostgresTestStore {
    pub store: Arc<dyn TranscriptStore>,
    _container: ContainerAsync<Postgres>,
}

#[allow(dead_code)]
impl PostgresTestStore {
    pub async fn new() -> StoreResult<Self> {
        let container = Postgres::default()
            .with_tag("15-alpine")
            .start()
            .await
            .map_err(|e| {
                StoreError::Internal(format!("Failed to start PostgreSQL container: {e}"))
            })?;

        let host = container.get_host().await.expect("Failed to get host");
        let port = container
            .get_host_port_ipv4(5432)
            .await
            .expect("Failed to get port");

        // Default credentials from testcontainers-modules postgres
        let url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

        let store = PostgresStore::from_url(&url, 5, Some(30_000)).await?;
        seed_postgres(&store).await;

        Ok(Self {
            store: Arc::new(store),
            _container: container,
        })
    }

    pub fn store(&self) -> Arc<dyn TranscriptStore> {
        self.store.clone()
    }
}

/// Run a test against both SQLite and PostgreSQL backends.
#[allow(dead_code)]
pub async fn run_store_test_both<F, Fut>(test_fn: F)
where
    F: Fn(Arc<dyn TranscriptStore>) -> Fut + Clone,
    Fut: std::future::Future<Output = ()>,
{
    let sqlite = TestStore::new().await;
    test_fn.clone()(sqlite.store()).await;

    // PostgreSQL requires Docker
    if std::env::var("SKIP_POSTGRES_TESTS").is_err() {
        match PostgresTestStore::new().await {
            Ok(postgres) => {
                test_fn(postgres.store()).await;
            }
            Err(err) => {
                eprintln!("Skipping PostgreSQL store tests: {err}");
            }
        }
    }
}

/// Wraps a store, counting statements and optionally failing some of them.
#[allow(dead_code)]
pub struct CountingStore {
    inner: Arc<dyn TranscriptStore>,
    queries: AtomicUsize,
    fail_matching: Mutex<Option<String>>,
}

#[allow(dead_code)]
impl CountingStore {
    pub fn new(inner: Arc<dyn TranscriptStore>) -> Self {
        Self {
            inner,
            queries: AtomicUsize::new(0),
            fail_matching: Mutex::new(None),
        }
    }

    /// Statements executed so far, failed ones included.
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Fail every statement whose SQL contains `needle`. An empty needle
    /// fails everything.
    pub fn fail_when(&self, needle: &str) {
        *self.fail_matching.lock().unwrap() = Some(needle.to_string());
    }

    pub fn stop_failing(&self) {
        *self.fail_matching.lock().unwrap() = None;
    }
}

#[async_trait]
impl FrameSource for CountingStore {
    fn dialect(&self) -> Dialect {
        self.inner.dialect()
    }

    async fn fetch_frame(&self, query: &Query) -> StoreResult<Frame> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let fail = self
            .fail_matching
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|needle| query.sql.contains(needle.as_str()));
        if fail {
            return Err(StoreError::Internal("injected failure".to_string()));
        }
        self.inner.fetch_frame(query).await
    }
}

impl GeneRepo for CountingStore {}
impl ExpressionRepo for CountingStore {}
impl CatalogRepo for CountingStore {}

#[async_trait]
impl TranscriptStore for CountingStore {
    async fn health_check(&self) -> StoreResult<()> {
        self.inner.health_check().await
    }

    async fn close(&self) {
        self.inner.close().await;
    }
}
