//! Expression matrix discovery.

use crate::error::ApiResult;
use crate::handlers::common::parse_format;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, Query, State};
use isoview_core::{MatrixOption, matrix_dropdown_options};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Serialize)]
pub struct MatricesResponse {
    pub options: Vec<MatrixOption>,
}

/// GET /v1/matrices - Matrix tables available in the database.
pub async fn list_matrices(State(state): State<AppState>) -> ApiResult<Json<MatricesResponse>> {
    let tables = state.store.list_matrix_tables().await?;
    tracing::debug!(tables = ?tables, "Matrix tables discovered");
    Ok(Json(MatricesResponse {
        options: matrix_dropdown_options(&tables),
    }))
}

#[derive(Debug, Deserialize)]
pub struct TableInfoParams {
    pub format: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TableInfoResponse {
    pub table: String,
    pub row_count: u64,
    pub col_count: usize,
    pub preview: JsonValue,
}

/// GET /v1/matrices/{table} - Row and column counts plus the first rows.
pub async fn get_table_info(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(params): Query<TableInfoParams>,
) -> ApiResult<Json<TableInfoResponse>> {
    let kind = parse_format(params.format.as_deref())?;
    let schema = state
        .registry
        .resolve_matrix(state.store.as_ref(), &table)
        .await?;
    let info = state
        .store
        .table_info(&schema, state.config.server.preview_rows)
        .await?;

    Ok(Json(TableInfoResponse {
        preview: info.preview.render(kind),
        table: info.table,
        row_count: info.row_count,
        col_count: info.col_count,
    }))
}
