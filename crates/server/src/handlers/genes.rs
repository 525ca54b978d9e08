//! Gene search, expression and transcript endpoints.

use crate::error::{ApiError, ApiResult};
use crate::handlers::common::{
    default_table, parse_format, parse_limit, parse_optional, parse_or_default, split_list,
};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, Query, State};
use isoview_core::aggregate::{
    aggregate_transcript_expression, filter_expression_by_threshold, pivot_expression_data,
};
use isoview_core::ordering::TRANSCRIPT_ID_COLUMN;
use isoview_core::plot::{PlotInput, PlotOptions, prepare_plot_input};
use isoview_core::{FrameKind, GeneOption, TopN, has_metadata_columns, order_transcripts_by_expression};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashSet;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub previous: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub options: Vec<GeneOption>,
}

/// GET /v1/genes/search - Ranked gene options for a dropdown.
pub async fn search_genes(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResponse> {
    let options = state
        .search
        .search_genes(&params.q, params.previous.as_deref())
        .await;
    Json(SearchResponse {
        options: options.to_vec(),
    })
}

#[derive(Debug, Deserialize)]
pub struct ExpressionParams {
    pub table: Option<String>,
    pub limit: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExpressionResponse {
    pub gene_id: String,
    pub gene_name: String,
    pub table: String,
    pub total_rows: u64,
    pub returned_rows: usize,
    pub metadata_joined: bool,
    pub has_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded_reason: Option<String>,
    pub message: String,
    pub warnings: Vec<String>,
    pub data: JsonValue,
}

/// GET /v1/genes/{gene_id}/expression - Expression rows joined with sample
/// metadata, with status for the caller to display.
pub async fn get_expression(
    State(state): State<AppState>,
    Path(gene_id): Path<String>,
    Query(params): Query<ExpressionParams>,
) -> ApiResult<Json<ExpressionResponse>> {
    let mut warnings = Vec::new();
    let kind = parse_format(params.format.as_deref())?;
    let table = params.table.unwrap_or_else(default_table);
    let limit = parse_limit(
        params.limit.as_deref(),
        state.config.server.default_row_limit,
        &mut warnings,
    );

    let data = state
        .expression
        .get_gene_data_with_metadata(&gene_id, &table, kind, limit)
        .await?;
    let gene = state.expression.resolve_gene(&gene_id).await?;
    let total_rows = state.expression.count_rows(&table, &gene_id).await?;
    if total_rows == 0 {
        return Err(ApiError::NotFound(format!(
            "no expression data for gene {gene_id} in {table}"
        )));
    }

    let has_metadata = has_metadata_columns(&data.frame);
    if !data.metadata_joined || !has_metadata {
        warnings.push(
            "Could not join with metadata table; showing expression data only".to_string(),
        );
    }
    if let Some(reason) = &data.degraded_reason {
        warnings.push(format!("Warning: {reason}"));
    }

    let returned_rows = data.frame.height();
    let message = if (returned_rows as u64) < total_rows {
        format!("Showing {returned_rows} of {total_rows} total rows")
    } else {
        format!("Showing data for {total_rows} total rows")
    };

    Ok(Json(ExpressionResponse {
        gene_id: gene.gene_id,
        gene_name: gene.gene_name,
        table,
        total_rows,
        returned_rows,
        metadata_joined: data.metadata_joined,
        has_metadata,
        degraded_reason: data.degraded_reason.clone(),
        message,
        warnings,
        data: data.frame.render(data.kind),
    }))
}

#[derive(Debug, Deserialize)]
pub struct TranscriptParams {
    pub table: Option<String>,
    pub column: Option<String>,
    pub top_n: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub log_transform: Option<String>,
    pub hue: Option<String>,
    pub format: Option<String>,
}

impl TranscriptParams {
    /// Transcript window from `start`/`end` or `top_n`, else `default`.
    fn window(&self, default: TopN, warnings: &mut Vec<String>) -> TopN {
        let start = parse_optional::<usize>(self.start.as_deref(), "start", warnings);
        let end = parse_optional::<usize>(self.end.as_deref(), "end", warnings);
        let top_n = parse_optional::<usize>(self.top_n.as_deref(), "top_n", warnings);

        match (start, end, top_n) {
            (Some(start), Some(end), _) if start < end => TopN::Range(start, end),
            (Some(start), Some(end), _) => {
                warnings.push(format!(
                    "Invalid transcript range {start}..{end}, using default"
                ));
                default
            }
            (Some(_), None, _) | (None, Some(_), _) => {
                warnings.push("start and end must be given together, using default".to_string());
                default
            }
            (None, None, Some(n)) => TopN::First(n),
            (None, None, None) => default,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub gene_id: String,
    pub gene_name: String,
    pub table: String,
    pub window: String,
    pub transcripts: usize,
    pub metadata_joined: bool,
    pub warnings: Vec<String>,
    pub annotation: JsonValue,
    pub expression: JsonValue,
    #[serde(flatten)]
    pub plot: PlotInput,
}

/// GET /v1/genes/{gene_id}/transcripts - Annotation and expression frames
/// ordered by total expression and ready for charting.
pub async fn get_transcripts(
    State(state): State<AppState>,
    Path(gene_id): Path<String>,
    Query(params): Query<TranscriptParams>,
) -> ApiResult<Json<TranscriptResponse>> {
    let mut warnings = Vec::new();
    let kind = parse_format(params.format.as_deref())?;
    let ordering = &state.config.ordering;
    let window = params.window(ordering.default_top_n, &mut warnings);
    let column = params
        .column
        .clone()
        .unwrap_or_else(|| ordering.expression_column.clone());
    let options = PlotOptions {
        log_transform: parse_or_default(
            params.log_transform.as_deref(),
            false,
            "log_transform",
            &mut warnings,
        ),
        hue: split_list(params.hue.as_deref()),
    };
    let table = params.table.clone().unwrap_or_else(default_table);

    let data = state
        .expression
        .get_gene_data_with_metadata(&gene_id, &table, FrameKind::Columnar, None)
        .await?;
    let gene = state.expression.resolve_gene(&gene_id).await?;
    let annotation = state.expression.annotation(&gene_id).await?;
    if annotation.is_empty() {
        return Err(ApiError::NotFound(format!(
            "no transcript annotation for gene {gene_id}"
        )));
    }
    if !data.metadata_joined {
        warnings.push(
            "Could not join with metadata table; showing expression data only".to_string(),
        );
    }
    for hue in &options.hue {
        if !data.frame.has_column(hue) {
            warnings.push(format!("Metadata column '{hue}' not available for colouring"));
        }
    }

    let (expression, annotation) =
        order_transcripts_by_expression(&annotation, &data.frame, &column, Some(window));
    let plot = prepare_plot_input(expression, &options)?;
    // Annotation carries one row per exon.
    let transcripts = annotation
        .column(TRANSCRIPT_ID_COLUMN)
        .map(|ids| ids.filter_map(|id| id.as_str()).collect::<HashSet<_>>().len())
        .unwrap_or(0);

    Ok(Json(TranscriptResponse {
        gene_id: gene.gene_id,
        gene_name: gene.gene_name,
        table,
        window: window.to_string(),
        transcripts,
        metadata_joined: data.metadata_joined,
        warnings,
        annotation: annotation.render(kind),
        expression: plot.expression.render(kind),
        plot,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SummaryParams {
    pub table: Option<String>,
    pub column: Option<String>,
    pub group_by: Option<String>,
    pub min_expression: Option<String>,
    /// When set, also return `column` pivoted to one column per value of
    /// this field.
    pub pivot: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub gene_id: String,
    pub table: String,
    pub group_by: String,
    pub value_column: String,
    pub rows_used: usize,
    pub warnings: Vec<String>,
    pub summary: JsonValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pivot: Option<JsonValue>,
}

/// GET /v1/genes/{gene_id}/summary - Per-transcript expression statistics.
pub async fn get_summary(
    State(state): State<AppState>,
    Path(gene_id): Path<String>,
    Query(params): Query<SummaryParams>,
) -> ApiResult<Json<SummaryResponse>> {
    let mut warnings = Vec::new();
    let kind = parse_format(params.format.as_deref())?;
    let table = params.table.unwrap_or_else(default_table);
    let column = params
        .column
        .unwrap_or_else(|| state.config.ordering.expression_column.clone());
    let group_by = params
        .group_by
        .unwrap_or_else(|| TRANSCRIPT_ID_COLUMN.to_string());
    let threshold =
        parse_optional::<f64>(params.min_expression.as_deref(), "min_expression", &mut warnings);

    let data = state
        .expression
        .get_gene_data_with_metadata(&gene_id, &table, FrameKind::Columnar, None)
        .await?;
    let frame = match threshold {
        Some(threshold) => filter_expression_by_threshold(&data.frame, &column, threshold),
        None => data.frame.clone(),
    };

    let summary = aggregate_transcript_expression(&frame, &group_by, &column).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "cannot summarise {column} by {group_by}: column not found"
        ))
    })?;
    let pivot = match params.pivot.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(pivot_col) => match pivot_expression_data(&frame, &group_by, &column, pivot_col) {
            Some(pivoted) => Some(pivoted.render(kind)),
            None => {
                warnings.push(format!("Cannot pivot on '{pivot_col}': column not found"));
                None
            }
        },
        None => None,
    };

    Ok(Json(SummaryResponse {
        gene_id,
        table,
        group_by,
        value_column: column,
        rows_used: frame.height(),
        warnings,
        summary: summary.render(kind),
        pivot,
    }))
}
