//! Administrative endpoints.

use crate::cache::ClearedEntries;
use crate::error::ApiResult;
use crate::gene_index::LoadState;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ClearCacheResponse {
    pub cleared: ClearedEntries,
    pub gene_index: LoadState,
}

/// POST /v1/admin/cache/clear - Drop cached results and reload the gene index.
pub async fn clear_cache(State(state): State<AppState>) -> ApiResult<Json<ClearCacheResponse>> {
    let cleared = state.clear_cache().await;
    Ok(Json(ClearCacheResponse {
        cleared,
        gene_index: state.index.state(),
    }))
}
