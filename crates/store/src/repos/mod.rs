//! Repository traits for transcript data.
//!
//! Backends only implement [`FrameSource`]; the repositories build their
//! statements with [`crate::query`] and run them through it.

pub mod catalog;
pub mod expression;
pub mod genes;

pub use catalog::{CatalogRepo, TableInfo};
pub use expression::ExpressionRepo;
pub use genes::GeneRepo;

use crate::dialect::Dialect;
use crate::error::StoreResult;
use crate::query::Query;
use async_trait::async_trait;
use isoview_core::Frame;

/// Executes statements and materialises their rows.
#[async_trait]
pub trait FrameSource: Send + Sync {
    fn dialect(&self) -> Dialect;

    /// Run `query` and decode every row.
    async fn fetch_frame(&self, query: &Query) -> StoreResult<Frame>;
}
