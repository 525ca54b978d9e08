//! HTTP data service for the isoform expression dashboard.
//!
//! This crate provides:
//! - The in-memory gene index and gene search
//! - Expression retrieval with a metadata join and fallback
//! - Result caches with explicit invalidation
//! - The JSON router consumed by the presentation layer

pub mod cache;
pub mod error;
pub mod expression;
pub mod gene_index;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod search;
pub mod state;

pub use error::{ApiError, ServiceError};
pub use expression::{ExpressionData, ExpressionService};
pub use gene_index::{GeneIndex, LoadState};
pub use routes::create_router;
pub use search::GeneSearch;
pub use state::AppState;
