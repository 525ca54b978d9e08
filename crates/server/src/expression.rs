//! Per-gene expression retrieval with a metadata join and a plain fallback.

use crate::cache::DataCache;
use crate::error::{ServiceError, ServiceResult};
use crate::metrics;
use isoview_core::{Frame, FrameKind, Gene};
use isoview_store::{SchemaRegistry, StoreResult, TableSchema, TranscriptStore};
use serde::Serialize;
use std::sync::Arc;

/// Prefix of the reason attached to results served without the metadata join.
/// The join error follows it.
pub const FALLBACK_REASON: &str = "Used direct query fallback (no metadata join)";

/// Expression rows for one gene.
#[derive(Clone, Debug, Serialize)]
pub struct ExpressionData {
    #[serde(skip)]
    pub frame: Frame,
    pub kind: FrameKind,
    /// Whether the metadata join succeeded.
    pub metadata_joined: bool,
    /// Set when the result came from the fallback query.
    pub degraded_reason: Option<String>,
}

/// Cache key for an expression request. A missing limit is spelled `all`.
pub fn cache_key(gene_id: &str, table: &str, limit: Option<u32>, kind: FrameKind) -> String {
    let limit = limit.map_or_else(|| "all".to_string(), |n| n.to_string());
    format!("{gene_id}_{table}_{limit}_{kind}")
}

pub struct ExpressionService {
    store: Arc<dyn TranscriptStore>,
    cache: Arc<DataCache>,
    registry: Arc<SchemaRegistry>,
}

impl ExpressionService {
    pub fn new(
        store: Arc<dyn TranscriptStore>,
        cache: Arc<DataCache>,
        registry: Arc<SchemaRegistry>,
    ) -> Self {
        Self {
            store,
            cache,
            registry,
        }
    }

    /// Look up a gene by id, consulting the gene cache first.
    pub async fn resolve_gene(&self, gene_id: &str) -> ServiceResult<Gene> {
        if let Some(gene) = self.cache.genes.get(gene_id) {
            return Ok(gene);
        }
        let gene = self
            .store
            .find_gene(gene_id)
            .await?
            .ok_or_else(|| ServiceError::GeneNotFound(gene_id.to_string()))?;
        self.cache.genes.insert(gene_id, gene.clone());
        Ok(gene)
    }

    /// Resolve a matrix table name against the schema snapshot.
    pub async fn resolve_table(&self, table: &str) -> ServiceResult<TableSchema> {
        Ok(self.registry.resolve_matrix(self.store.as_ref(), table).await?)
    }

    /// Expression rows for `gene_id` from `table`, joined with sample metadata
    /// when possible.
    ///
    /// If the joined query fails the plain query is tried and the result is
    /// marked degraded. Both kinds of result are cached.
    pub async fn get_gene_data_with_metadata(
        &self,
        gene_id: &str,
        table: &str,
        kind: FrameKind,
        limit: Option<u32>,
    ) -> ServiceResult<Arc<ExpressionData>> {
        let key = cache_key(gene_id, table, limit, kind);
        if let Some(hit) = self.cache.matrices.get(&key) {
            return Ok(hit);
        }

        let schema = self.resolve_table(table).await?;
        self.resolve_gene(gene_id).await?;

        let data = match self.joined(&schema, gene_id, limit).await {
            Ok(frame) => ExpressionData {
                frame,
                kind,
                metadata_joined: true,
                degraded_reason: None,
            },
            Err(joined) => {
                tracing::warn!(
                    gene_id,
                    table = %schema.name,
                    error = %joined,
                    "Metadata join failed, falling back to direct query"
                );
                metrics::EXPRESSION_FALLBACKS.inc();
                match self.store.expression(&schema, gene_id, limit).await {
                    Ok(frame) => ExpressionData {
                        frame,
                        kind,
                        metadata_joined: false,
                        degraded_reason: Some(format!("{FALLBACK_REASON}: {joined}")),
                    },
                    Err(fallback) => {
                        metrics::EXPRESSION_FAILURES.inc();
                        tracing::error!(
                            gene_id,
                            table = %schema.name,
                            error = %fallback,
                            "Direct expression query failed"
                        );
                        return Err(ServiceError::Retrieval {
                            joined: joined.to_string(),
                            fallback: fallback.to_string(),
                        });
                    }
                }
            }
        };

        tracing::debug!(
            gene_id,
            table = %schema.name,
            rows = data.frame.height(),
            metadata_joined = data.metadata_joined,
            "Expression data retrieved"
        );
        let data = Arc::new(data);
        self.cache.matrices.insert(key, Arc::clone(&data));
        Ok(data)
    }

    async fn joined(
        &self,
        schema: &TableSchema,
        gene_id: &str,
        limit: Option<u32>,
    ) -> StoreResult<Frame> {
        let metadata = self.registry.resolve_metadata(self.store.as_ref()).await?;
        self.store
            .joined_expression(schema, &metadata, gene_id, limit)
            .await
    }

    /// Number of expression rows stored for `gene_id` in `table`.
    pub async fn count_rows(&self, table: &str, gene_id: &str) -> ServiceResult<u64> {
        let schema = self.resolve_table(table).await?;
        Ok(self.store.count_gene_rows(&schema, gene_id).await?)
    }

    /// Transcript structure rows for `gene_id`.
    pub async fn annotation(&self, gene_id: &str) -> ServiceResult<Frame> {
        Ok(self.store.annotation(gene_id).await?)
    }
}
