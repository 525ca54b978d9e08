//! Shared handler helpers.

use crate::error::ApiResult;
use isoview_core::{FrameKind, MatrixKind};
use std::str::FromStr;

/// Matrix used when a request names none.
pub fn default_table() -> String {
    MatrixKind::Total.table_name().to_string()
}

/// Parse an optional query parameter leniently.
///
/// Blank values yield `None`. Values that fail to parse also yield `None` and
/// append a warning for the caller.
pub fn parse_optional<T: FromStr>(
    raw: Option<&str>,
    name: &str,
    warnings: &mut Vec<String>,
) -> Option<T> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(param = name, value = raw, "Invalid query parameter, using default");
            warnings.push(format!("Invalid value '{raw}' for {name}, using default"));
            None
        }
    }
}

/// Like [`parse_optional`], falling back to `default`.
pub fn parse_or_default<T: FromStr>(
    raw: Option<&str>,
    default: T,
    name: &str,
    warnings: &mut Vec<String>,
) -> T {
    parse_optional(raw, name, warnings).unwrap_or(default)
}

/// Row limit from a `limit` parameter: `all` means no limit, missing means
/// `default`.
pub fn parse_limit(raw: Option<&str>, default: u32, warnings: &mut Vec<String>) -> Option<u32> {
    match raw.map(str::trim) {
        Some(s) if s.eq_ignore_ascii_case("all") => None,
        other => match parse_or_default(other, default, "limit", warnings) {
            0 => None,
            n => Some(n),
        },
    }
}

/// Output shape from a `format` parameter. Unknown formats are rejected.
pub fn parse_format(raw: Option<&str>) -> ApiResult<FrameKind> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => Ok(s.parse()?),
        None => Ok(FrameKind::default()),
    }
}

/// Split a comma separated list, dropping blanks.
pub fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
