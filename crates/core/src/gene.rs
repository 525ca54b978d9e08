//! Gene identifiers and search options.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A gene as listed in the annotation table.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Gene {
    /// Stable external identifier (e.g. an Ensembl id).
    pub gene_id: String,
    /// Display name.
    pub gene_name: String,
}

impl Gene {
    pub fn new(gene_id: impl Into<String>, gene_name: impl Into<String>) -> Self {
        Self {
            gene_id: gene_id.into(),
            gene_name: gene_name.into(),
        }
    }

    /// Label shown in the search dropdown, e.g. `APOE (ENSG00000130203)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.gene_name, self.gene_id)
    }

    pub fn to_option(&self) -> GeneOption {
        GeneOption {
            label: self.label(),
            value: self.gene_id.clone(),
        }
    }
}

/// One entry of a search result list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneOption {
    pub label: String,
    pub value: String,
}

/// Deduplicate by `gene_id`, keeping the first name seen and the input order.
pub fn dedupe_genes<I>(genes: I) -> Vec<Gene>
where
    I: IntoIterator<Item = Gene>,
{
    let mut seen = HashSet::new();
    genes
        .into_iter()
        .filter(|gene| seen.insert(gene.gene_id.clone()))
        .collect()
}
