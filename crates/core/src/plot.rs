//! Inputs for the transcript structure/expression chart.
//!
//! Drawing is left to the caller. This module only derives the columns and
//! labels a chart needs from an ordered expression frame.

use crate::error::Result;
use crate::frame::{Frame, Value};
use serde::Serialize;

/// Columns that receive a `log_` twin when log scaling is requested.
pub const LOG_SOURCE_COLUMNS: [&str; 2] = ["counts", "cpm_normalized_tmm"];

/// Name of the synthetic hue column built from several metadata columns.
pub const COMBINED_HUE_COLUMN: &str = "combined_metadata";

const HUE_SEPARATOR: &str = " | ";

/// Chart options chosen by the caller.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlotOptions {
    pub log_transform: bool,
    /// Metadata columns used to colour expression points.
    pub hue: Vec<String>,
}

/// Everything the chart needs besides the annotation frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlotInput {
    #[serde(skip)]
    pub expression: Frame,
    pub expression_columns: Vec<String>,
    pub expression_hue: Option<String>,
    pub subplot_titles: Vec<String>,
}

/// Append `log_<col>` = `log10(col + 1)` for each present source column.
/// Null and non-numeric cells stay null.
pub fn add_log_columns(mut frame: Frame) -> Result<Frame> {
    for source in LOG_SOURCE_COLUMNS {
        let Ok(cells) = frame.column(source) else {
            continue;
        };
        let logged: Vec<Value> = cells
            .map(|v| Value::from(v.as_f64().map(|x| (x + 1.0).log10())))
            .collect();
        frame = frame.with_column(&format!("log_{source}"), logged)?;
    }
    Ok(frame)
}

/// Resolve the hue column, adding `combined_metadata` when several metadata
/// columns are selected. Unknown columns are skipped with a warning.
pub fn apply_hue(frame: Frame, hue: &[String]) -> Result<(Frame, Option<String>)> {
    let present: Vec<&String> = hue
        .iter()
        .filter(|name| {
            let found = frame.has_column(name);
            if !found {
                tracing::warn!(column = %name, "Hue column not found in expression data");
            }
            found
        })
        .collect();

    match present.as_slice() {
        [] => Ok((frame, None)),
        [single] => {
            let name = single.to_string();
            Ok((frame, Some(name)))
        }
        many => {
            let indices: Vec<usize> = many
                .iter()
                .filter_map(|name| frame.column_index(name))
                .collect();
            let combined: Vec<Value> = frame
                .rows()
                .iter()
                .map(|row| {
                    if indices.iter().any(|&i| row[i].is_null()) {
                        return Value::Null;
                    }
                    let parts: Vec<String> = indices.iter().map(|&i| row[i].to_string()).collect();
                    Value::Text(parts.join(HUE_SEPARATOR))
                })
                .collect();
            let frame = frame.with_column(COMBINED_HUE_COLUMN, combined)?;
            Ok((frame, Some(COMBINED_HUE_COLUMN.to_string())))
        }
    }
}

/// Expression columns plotted in the three expression panels.
pub fn expression_columns(log_transform: bool) -> Vec<String> {
    let cols: [&str; 3] = if log_transform {
        ["log_counts", "log_cpm_normalized_tmm", "relative_abundance"]
    } else {
        ["counts", "cpm_normalized_tmm", "relative_abundance"]
    };
    cols.iter().map(|c| c.to_string()).collect()
}

pub fn subplot_titles(log_transform: bool) -> Vec<String> {
    let titles: [&str; 4] = if log_transform {
        ["Transcript Structure", "Log Counts", "Log TMM", "Relative Abundance"]
    } else {
        ["Transcript Structure", "Counts", "TMM", "Relative Abundance"]
    };
    titles.iter().map(|t| t.to_string()).collect()
}

/// Derive chart inputs from an already ordered expression frame.
pub fn prepare_plot_input(expression: Frame, options: &PlotOptions) -> Result<PlotInput> {
    let (expression, expression_hue) = apply_hue(expression, &options.hue)?;
    let expression = if options.log_transform {
        add_log_columns(expression)?
    } else {
        expression
    };
    Ok(PlotInput {
        expression,
        expression_columns: expression_columns(options.log_transform),
        expression_hue,
        subplot_titles: subplot_titles(options.log_transform),
    })
}
