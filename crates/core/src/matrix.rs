//! Expression matrix tables.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Substring shared by every expression matrix table name.
pub const MATRIX_TABLE_PATTERN: &str = "transcript_data";

/// The logical matrix kinds offered to users, in display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixKind {
    Total,
    Unique,
    FullLength,
}

impl MatrixKind {
    pub const ALL: [MatrixKind; 3] = [Self::Total, Self::Unique, Self::FullLength];

    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Total => "total_transcript_data",
            Self::Unique => "unique_transcript_data",
            Self::FullLength => "fulllength_transcript_data",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Total => "Total Counts",
            Self::Unique => "Unique Counts",
            Self::FullLength => "Full Length Counts",
        }
    }

    /// Case-insensitive lookup by table name.
    pub fn from_table_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.table_name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for MatrixKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

impl FromStr for MatrixKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_table_name(s).ok_or_else(|| Error::InvalidMatrixKind(s.to_string()))
    }
}

/// Dropdown entry for a matrix table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixOption {
    pub label: String,
    pub value: String,
}

/// Whether a table name looks like an expression matrix.
pub fn is_matrix_table_name(name: &str) -> bool {
    name.to_ascii_lowercase().contains(MATRIX_TABLE_PATTERN)
}

/// Dropdown options for the known matrix kinds that exist in `tables`.
///
/// Order follows [`MatrixKind::ALL`], not the order of `tables`.
pub fn matrix_dropdown_options(tables: &[String]) -> Vec<MatrixOption> {
    MatrixKind::ALL
        .into_iter()
        .filter(|kind| {
            tables
                .iter()
                .any(|t| t.eq_ignore_ascii_case(kind.table_name()))
        })
        .map(|kind| MatrixOption {
            label: kind.label().to_string(),
            value: kind.table_name().to_string(),
        })
        .collect()
}
