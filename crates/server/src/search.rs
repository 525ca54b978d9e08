//! Gene search backed by the in-memory index, with a database fallback.

use crate::cache::DataCache;
use crate::gene_index::GeneIndex;
use crate::metrics;
use isoview_core::search::normalize_query;
use isoview_core::{GeneOption, dedupe_genes, rank_genes};
use isoview_store::TranscriptStore;
use std::sync::Arc;

pub struct GeneSearch {
    index: Arc<GeneIndex>,
    store: Arc<dyn TranscriptStore>,
    cache: Arc<DataCache>,
    limit: usize,
}

impl GeneSearch {
    pub fn new(
        index: Arc<GeneIndex>,
        store: Arc<dyn TranscriptStore>,
        cache: Arc<DataCache>,
        limit: usize,
    ) -> Self {
        Self {
            index,
            store,
            cache,
            limit,
        }
    }

    /// Options matching `query`, best first.
    ///
    /// `previous_query` is accepted for interface compatibility and ignored.
    /// Only results computed from the index are cached; database fallback
    /// results are recomputed on every call.
    pub async fn search_genes(
        &self,
        query: &str,
        _previous_query: Option<&str>,
    ) -> Arc<[GeneOption]> {
        let Some(query) = normalize_query(query) else {
            metrics::record_search("empty");
            return Arc::from(Vec::new());
        };

        if let Some(hit) = self.cache.searches.get(&query) {
            metrics::record_search("cache");
            return hit;
        }

        self.index.ensure_loaded().await;
        let genes = self.index.genes();
        if genes.is_empty() {
            metrics::record_search("database");
            return Arc::from(self.search_database(&query).await);
        }

        let options: Arc<[GeneOption]> = rank_genes(&genes, &query, self.limit)
            .into_iter()
            .map(|gene| gene.to_option())
            .collect();
        self.cache.searches.insert(query, Arc::clone(&options));
        metrics::record_search("index");
        options
    }

    async fn search_database(&self, query: &str) -> Vec<GeneOption> {
        match self.store.search_genes(query, self.limit).await {
            Ok(genes) => dedupe_genes(genes)
                .iter()
                .take(self.limit)
                .map(|gene| gene.to_option())
                .collect(),
            Err(e) => {
                tracing::warn!(query, error = %e, "Database gene search failed");
                Vec::new()
            }
        }
    }
}
