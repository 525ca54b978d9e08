//! Transcript ordering for structure and expression plots.
//!
//! Transcripts are ranked by their total expression across samples, a window
//! of that ranking is selected, and both frames are re-sorted so the lowest
//! expressed transcript of the window comes first (charts stack rows bottom to
//! top).

use crate::frame::{Frame, Value};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

pub const TRANSCRIPT_ID_COLUMN: &str = "transcript_id";
pub const TOTAL_EXPRESSION_COLUMN: &str = "total_expression";
pub const DEFAULT_EXPRESSION_COLUMN: &str = "cpm_normalized_tmm";

/// Which slice of the ranking to keep.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TopN {
    /// The `n` most expressed transcripts.
    First(usize),
    /// Ranking positions `start..end` (0-indexed, end exclusive).
    Range(usize, usize),
}

impl fmt::Display for TopN {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First(n) => write!(f, "{n}"),
            Self::Range(start, end) => write!(f, "[{start}, {end}]"),
        }
    }
}

impl TopN {
    /// Select from `ranked`, or `None` if the window does not fit.
    fn select<'a>(&self, ranked: &'a [String]) -> Option<&'a [String]> {
        match *self {
            Self::First(0) => None,
            Self::First(n) => Some(&ranked[..n.min(ranked.len())]),
            Self::Range(start, end) if start < end && end <= ranked.len() => {
                Some(&ranked[start..end])
            }
            Self::Range(..) => None,
        }
    }
}

fn transcript_key(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn transcript_ids(frame: &Frame) -> HashSet<String> {
    frame
        .column(TRANSCRIPT_ID_COLUMN)
        .map(|cells| cells.filter_map(transcript_key).collect())
        .unwrap_or_default()
}

/// Total of `expression_column` per transcript, restricted to `keep`.
///
/// Sorted by total descending, ties by transcript id ascending. Null and
/// non-numeric cells count as zero.
pub fn rank_transcripts(
    expression: &Frame,
    expression_column: &str,
    keep: &HashSet<String>,
) -> Vec<(String, f64)> {
    let (Some(id_idx), Some(value_idx)) = (
        expression.column_index(TRANSCRIPT_ID_COLUMN),
        expression.column_index(expression_column),
    ) else {
        return Vec::new();
    };

    let mut totals: HashMap<String, f64> = HashMap::new();
    for row in expression.rows() {
        let Some(id) = transcript_key(&row[id_idx]) else {
            continue;
        };
        if !keep.contains(&id) {
            continue;
        }
        *totals.entry(id).or_insert(0.0) += row[value_idx].as_f64().unwrap_or(0.0);
    }

    let mut ranked: Vec<(String, f64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

/// Keep rows of `frame` whose transcript is in `totals`, sorted ascending by
/// total then transcript id. Rows of one transcript keep their input order.
fn reorder(frame: &Frame, totals: &HashMap<String, f64>) -> Frame {
    let Some(id_idx) = frame.column_index(TRANSCRIPT_ID_COLUMN) else {
        return frame.clone();
    };

    let mut keyed: Vec<(usize, &str, f64)> = frame
        .rows()
        .iter()
        .enumerate()
        .filter_map(|(idx, row)| {
            let id = transcript_key(&row[id_idx])?;
            let (key, total) = totals.get_key_value(&id)?;
            Some((idx, key.as_str(), *total))
        })
        .collect();

    // Stable: rows of one transcript keep their relative order.
    keyed.sort_by(|a, b| a.2.total_cmp(&b.2).then_with(|| a.1.cmp(b.1)));

    let order: Vec<usize> = keyed.iter().map(|(idx, _, _)| *idx).collect();
    let out = frame.take_rows(&order);
    if !frame.has_column(TOTAL_EXPRESSION_COLUMN) {
        return out;
    }

    let values = keyed
        .iter()
        .map(|(_, _, total)| Value::Float(*total))
        .collect();
    match out.with_column(TOTAL_EXPRESSION_COLUMN, values) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!(error = %e, "Could not refresh total_expression column");
            frame.take_rows(&order)
        }
    }
}

/// Order transcripts by total expression and select a window of them.
///
/// Returns `(expression, annotation)` restricted to the selected transcripts
/// and sorted ascending by total expression, ties broken by ascending
/// transcript id. When `expression_column` is missing both frames are returned
/// unchanged. An invalid `top_n` keeps every transcript.
pub fn order_transcripts_by_expression(
    annotation: &Frame,
    expression: &Frame,
    expression_column: &str,
    top_n: Option<TopN>,
) -> (Frame, Frame) {
    if !expression.has_column(expression_column) {
        tracing::warn!(
            column = expression_column,
            "Expression column not found, keeping original transcript order"
        );
        return (expression.clone(), annotation.clone());
    }
    if !annotation.has_column(TRANSCRIPT_ID_COLUMN)
        || !expression.has_column(TRANSCRIPT_ID_COLUMN)
    {
        tracing::warn!("transcript_id column missing, keeping original transcript order");
        return (expression.clone(), annotation.clone());
    }

    let annotation_ids = transcript_ids(annotation);
    let expression_ids = transcript_ids(expression);
    let common: HashSet<String> = annotation_ids
        .intersection(&expression_ids)
        .cloned()
        .collect();

    if common.len() < annotation_ids.len() {
        tracing::warn!(
            missing = annotation_ids.len() - common.len(),
            "Annotated transcripts missing from expression data"
        );
    }

    let ranked = rank_transcripts(expression, expression_column, &common);
    let ordered_ids: Vec<String> = ranked.iter().map(|(id, _)| id.clone()).collect();

    let selected = match top_n {
        None => &ordered_ids[..],
        Some(window) => match window.select(&ordered_ids) {
            Some(slice) => slice,
            None => {
                tracing::warn!(
                    top_n = %window,
                    transcripts = ordered_ids.len(),
                    "Invalid transcript window, using all transcripts"
                );
                &ordered_ids[..]
            }
        },
    };

    let selected: HashSet<&String> = selected.iter().collect();
    let totals: HashMap<String, f64> = ranked
        .into_iter()
        .filter(|(id, _)| selected.contains(id))
        .collect();

    (reorder(expression, &totals), reorder(annotation, &totals))
}
