//! Application state shared across handlers.

use crate::cache::{ClearedEntries, DataCache};
use crate::expression::ExpressionService;
use crate::gene_index::GeneIndex;
use crate::metrics;
use crate::search::GeneSearch;
use isoview_core::config::AppConfig;
use isoview_store::{SchemaRegistry, StoreResult, TranscriptStore};
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Relational store.
    pub store: Arc<dyn TranscriptStore>,
    /// Table and column snapshot used to build SQL.
    pub registry: Arc<SchemaRegistry>,
    /// Gene, expression and search result caches.
    pub cache: Arc<DataCache>,
    /// In-memory gene index.
    pub index: Arc<GeneIndex>,
    pub search: Arc<GeneSearch>,
    pub expression: Arc<ExpressionService>,
}

impl AppState {
    /// Build the state and take the initial schema snapshot.
    ///
    /// The gene index starts unloaded; call [`GeneIndex::start_background_load`]
    /// to populate it.
    pub async fn new(config: AppConfig, store: Arc<dyn TranscriptStore>) -> StoreResult<Self> {
        let registry = Arc::new(SchemaRegistry::load(store.as_ref()).await?);
        let matrices = registry.matrix_tables();
        tracing::info!(matrix_tables = ?matrices, "Schema snapshot loaded");

        let cache = Arc::new(DataCache::new());
        let index = Arc::new(GeneIndex::new(Arc::clone(&store)));
        let search = Arc::new(GeneSearch::new(
            Arc::clone(&index),
            Arc::clone(&store),
            Arc::clone(&cache),
            config.gene_index.search_limit,
        ));
        let expression = Arc::new(ExpressionService::new(
            Arc::clone(&store),
            Arc::clone(&cache),
            Arc::clone(&registry),
        ));

        Ok(Self {
            config: Arc::new(config),
            store,
            registry,
            cache,
            index,
            search,
            expression,
        })
    }

    /// Drop every cached result, empty the gene index and reload it in the
    /// background. The schema snapshot is refreshed too.
    pub async fn clear_cache(&self) -> ClearedEntries {
        let cleared = self.cache.clear();
        self.index.clear();
        metrics::CACHE_CLEARS.inc();

        if let Err(e) = self.registry.refresh(self.store.as_ref()).await {
            tracing::warn!(error = %e, "Failed to refresh schema snapshot, keeping previous one");
        }

        tracing::info!(
            gene_info = cleared.gene_info,
            matrix = cleared.matrix,
            search = cleared.search,
            "Caches cleared"
        );
        self.index.start_background_load();
        cleared
    }

    /// Release caches and close the connection pool.
    pub async fn cleanup(&self) {
        self.cache.clear();
        self.index.clear();
        self.store.close().await;
        tracing::info!("Application state cleaned up");
    }
}
