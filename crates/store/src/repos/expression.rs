//! Expression matrix and annotation reads.

use super::FrameSource;
use crate::error::StoreResult;
use crate::query::{
    annotation_query, count_gene_rows_query, expression_query, joined_expression_query,
};
use crate::schema::TableSchema;
use async_trait::async_trait;
use isoview_core::{Frame, Value};

/// Repository for per-gene expression data.
#[async_trait]
pub trait ExpressionRepo: FrameSource {
    /// Expression rows for `gene_id` left-joined with sample metadata.
    async fn joined_expression(
        &self,
        table: &TableSchema,
        metadata: &TableSchema,
        gene_id: &str,
        limit: Option<u32>,
    ) -> StoreResult<Frame> {
        let query = joined_expression_query(
            &table.name,
            &table.columns,
            &metadata.columns,
            gene_id,
            limit,
        );
        self.fetch_frame(&query).await
    }

    /// Expression rows for `gene_id` without metadata.
    async fn expression(
        &self,
        table: &TableSchema,
        gene_id: &str,
        limit: Option<u32>,
    ) -> StoreResult<Frame> {
        let query = expression_query(&table.name, &table.columns, gene_id, limit);
        self.fetch_frame(&query).await
    }

    /// Transcript structure rows for `gene_id`.
    async fn annotation(&self, gene_id: &str) -> StoreResult<Frame> {
        self.fetch_frame(&annotation_query(gene_id)).await
    }

    /// Number of expression rows stored for `gene_id`.
    async fn count_gene_rows(&self, table: &TableSchema, gene_id: &str) -> StoreResult<u64> {
        let frame = self
            .fetch_frame(&count_gene_rows_query(&table.name, gene_id))
            .await?;
        Ok(first_count(&frame))
    }
}

pub(crate) fn first_count(frame: &Frame) -> u64 {
    match frame.get(0, "row_count") {
        Some(Value::Int(n)) => u64::try_from(*n).unwrap_or(0),
        Some(Value::Float(n)) => *n as u64,
        _ => 0,
    }
}
