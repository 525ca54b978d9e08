//! Health endpoint.

use crate::error::ApiResult;
use crate::gene_index::LoadState;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use serde::Serialize;
use time::format_description::well_known::Rfc3339;

#[derive(Debug, Serialize)]
pub struct GeneIndexStatus {
    pub state: LoadState,
    pub genes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loaded_at: Option<String>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub backend: &'static str,
    pub gene_index: GeneIndexStatus,
}

/// GET /v1/health - Store connectivity and gene index status.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    state.store.health_check().await?;

    let loaded_at = state
        .index
        .loaded_at()
        .and_then(|at| at.format(&Rfc3339).ok());

    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        backend: state.store.dialect().as_str(),
        gene_index: GeneIndexStatus {
            state: state.index.state(),
            genes: state.index.len(),
            loaded_at,
        },
    }))
}
