//! Per-transcript summaries and reshaping of expression frames.

use crate::frame::{Frame, Value};
use std::collections::HashMap;

fn first_seen_groups(frame: &Frame, idx: usize) -> (Vec<Value>, HashMap<String, usize>) {
    let mut keys = Vec::new();
    let mut positions = HashMap::new();
    for row in frame.rows() {
        let key = row[idx].to_string();
        if !positions.contains_key(&key) {
            positions.insert(key, keys.len());
            keys.push(row[idx].clone());
        }
    }
    (keys, positions)
}

fn median(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    Some(if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    })
}

/// Summarise `value_column` per `group_by` value.
///
/// Output columns: `group_by`, `sum_<v>`, `mean_<v>`, `median_<v>`, `min_<v>`,
/// `max_<v>`, `sample_count`. Groups appear in first-seen order. Null cells are
/// ignored; a group with no numeric cell has a zero sum and null statistics.
/// Returns `None` when either column is missing.
pub fn aggregate_transcript_expression(
    frame: &Frame,
    group_by: &str,
    value_column: &str,
) -> Option<Frame> {
    let Some(group_idx) = frame.column_index(group_by) else {
        tracing::warn!(column = group_by, "Group column not found in expression data");
        return None;
    };
    let Some(value_idx) = frame.column_index(value_column) else {
        tracing::warn!(column = value_column, "Value column not found in expression data");
        return None;
    };

    let (keys, positions) = first_seen_groups(frame, group_idx);
    let mut values: Vec<Vec<f64>> = vec![Vec::new(); keys.len()];
    for row in frame.rows() {
        if let Some(v) = row[value_idx].as_f64() {
            values[positions[&row[group_idx].to_string()]].push(v);
        }
    }

    let mut out = Frame::new([
        group_by.to_string(),
        format!("sum_{value_column}"),
        format!("mean_{value_column}"),
        format!("median_{value_column}"),
        format!("min_{value_column}"),
        format!("max_{value_column}"),
        "sample_count".to_string(),
    ]);

    for (key, mut group) in keys.into_iter().zip(values) {
        group.sort_by(f64::total_cmp);
        let sum: f64 = group.iter().sum();
        let count = group.len();
        let mean = (count > 0).then(|| sum / count as f64);
        let row = vec![
            key,
            Value::Float(sum),
            Value::from(mean),
            Value::from(median(&group)),
            Value::from(group.first().copied()),
            Value::from(group.last().copied()),
            Value::Int(count as i64),
        ];
        // Row width matches the header above.
        if out.push_row(row).is_err() {
            return None;
        }
    }
    Some(out)
}

/// Keep rows whose `column` is numeric and at least `threshold`.
///
/// An unknown column leaves the frame unchanged.
pub fn filter_expression_by_threshold(frame: &Frame, column: &str, threshold: f64) -> Frame {
    let Some(idx) = frame.column_index(column) else {
        tracing::warn!(column, "Threshold column not found in expression data");
        return frame.clone();
    };
    frame.filter_rows(|row| row[idx].as_f64().is_some_and(|v| v >= threshold))
}

/// Reshape to one row per `index_col` value and one column per `pivot_col`
/// value, filled from `value_col`. The first value wins when a cell repeats.
pub fn pivot_expression_data(
    frame: &Frame,
    index_col: &str,
    value_col: &str,
    pivot_col: &str,
) -> Option<Frame> {
    let mut indices = Vec::with_capacity(3);
    for name in [index_col, value_col, pivot_col] {
        match frame.column_index(name) {
            Some(idx) => indices.push(idx),
            None => {
                tracing::warn!(column = name, "Pivot column not found in expression data");
                return None;
            }
        }
    }
    let (index_idx, value_idx, pivot_idx) = (indices[0], indices[1], indices[2]);

    let (row_keys, row_pos) = first_seen_groups(frame, index_idx);
    let (col_keys, col_pos) = first_seen_groups(frame, pivot_idx);

    let mut cells: Vec<Vec<Option<Value>>> = vec![vec![None; col_keys.len()]; row_keys.len()];
    for row in frame.rows() {
        let r = row_pos[&row[index_idx].to_string()];
        let c = col_pos[&row[pivot_idx].to_string()];
        if cells[r][c].is_none() {
            cells[r][c] = Some(row[value_idx].clone());
        }
    }

    let mut columns = vec![index_col.to_string()];
    columns.extend(col_keys.iter().map(|k| k.to_string()));

    let rows = row_keys
        .into_iter()
        .zip(cells)
        .map(|(key, row)| {
            std::iter::once(key)
                .chain(row.into_iter().map(|c| c.unwrap_or(Value::Null)))
                .collect()
        })
        .collect();

    Frame::from_rows(columns, rows).ok()
}
