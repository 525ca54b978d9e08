//! Core domain types and shared logic for the isoform expression viewer.
//!
//! This crate defines the data model used across all other crates:
//! - Genes, search options and in-memory ranking
//! - Expression matrix kinds and table naming
//! - The dynamically typed [`Frame`] used for query results
//! - Transcript ordering, aggregation and chart input preparation
//! - Configuration

pub mod aggregate;
pub mod config;
pub mod error;
pub mod frame;
pub mod gene;
pub mod matrix;
pub mod ordering;
pub mod plot;
pub mod search;

pub use error::{Error, Result};
pub use frame::{Frame, FrameKind, Value};
pub use gene::{Gene, GeneOption, dedupe_genes};
pub use matrix::{MatrixKind, MatrixOption, is_matrix_table_name, matrix_dropdown_options};
pub use ordering::{TopN, order_transcripts_by_expression};
pub use search::{DEFAULT_SEARCH_LIMIT, rank_genes};

/// Transcript structure table, one row per exon/feature.
pub const ANNOTATION_TABLE: &str = "transcript_annotation";

/// Per-sample metadata table.
pub const METADATA_TABLE: &str = "metadata";

/// Metadata column matched against the expression sample id.
pub const METADATA_JOIN_KEY: &str = "sample_and_flowcell_id";

/// Expression column matched against the metadata key.
pub const EXPRESSION_JOIN_KEY: &str = "sample_id";

/// Metadata columns whose presence marks a frame as joined with metadata.
pub const METADATA_COLUMNS: [&str; 9] = [
    "diagnosis",
    "age",
    "pmi",
    "sex",
    "apoe",
    "braak_tangle_score",
    "mapping_rate",
    "tin_median",
    "rin",
];

/// Whether any known metadata column is present in `frame`.
pub fn has_metadata_columns(frame: &Frame) -> bool {
    METADATA_COLUMNS.iter().any(|c| frame.has_column(c))
}
