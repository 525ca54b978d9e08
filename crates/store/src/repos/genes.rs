//! Gene lookups against the annotation table.

use super::FrameSource;
use crate::error::StoreResult;
use crate::query::{find_gene_query, gene_index_query, gene_search_query};
use async_trait::async_trait;
use isoview_core::{Frame, Gene};

fn genes_from_frame(frame: &Frame) -> Vec<Gene> {
    let (Some(id_idx), Some(name_idx)) =
        (frame.column_index("gene_id"), frame.column_index("gene_name"))
    else {
        return Vec::new();
    };
    frame
        .rows()
        .iter()
        .filter(|row| !row[id_idx].is_null())
        .map(|row| Gene::new(row[id_idx].to_string(), row[name_idx].to_string()))
        .collect()
}

/// Repository for genes listed in the annotation table.
#[async_trait]
pub trait GeneRepo: FrameSource {
    /// Every distinct (gene_id, gene_name) pair, ordered by name.
    async fn load_genes(&self) -> StoreResult<Vec<Gene>> {
        let frame = self.fetch_frame(&gene_index_query()).await?;
        Ok(genes_from_frame(&frame))
    }

    /// Look up a single gene by id.
    async fn find_gene(&self, gene_id: &str) -> StoreResult<Option<Gene>> {
        let frame = self.fetch_frame(&find_gene_query(gene_id)).await?;
        Ok(genes_from_frame(&frame).into_iter().next())
    }

    /// Ranked database search. `query` must be trimmed and lower-cased.
    async fn search_genes(&self, query: &str, limit: usize) -> StoreResult<Vec<Gene>> {
        let frame = self.fetch_frame(&gene_search_query(query, limit)).await?;
        Ok(genes_from_frame(&frame))
    }
}
