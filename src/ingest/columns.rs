//! Column resolution and value coercion for raw source rows.
//!
//! Sources disagree on header spelling (`Year` vs `year`, `doy` vs
//! `DayOfYear`). Headers are resolved once per batch against the alias tables
//! in `variables`, so an unknown layout fails here with a `Schema` error
//! instead of surfacing as missing values deep inside a statistic.

use serde_json::Value;

use crate::model::{PipelineError, RawRow, Result};
use crate::variables::ColumnAlias;

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Finds the header that `alias` resolves to in this batch.
///
/// Every header seen in any row is a candidate. Aliases are tried in table
/// order and compared case-insensitively; the first alias with a matching
/// header wins.
pub fn resolve_column(rows: &[RawRow], alias: &ColumnAlias, input: &str) -> Result<String> {
    find_column(rows, alias).ok_or_else(|| PipelineError::Schema {
        input: input.to_string(),
        column: alias.canonical.to_string(),
        aliases: alias.aliases.join(", "),
    })
}

/// Like `resolve_column` but for columns a source may legitimately omit.
pub fn find_column(rows: &[RawRow], alias: &ColumnAlias) -> Option<String> {
    let headers = headers(rows);
    for candidate in alias.aliases {
        if let Some(found) = headers.iter().find(|h| h.eq_ignore_ascii_case(candidate)) {
            return Some(found.clone());
        }
    }
    None
}

/// All distinct headers in first-seen order.
pub fn headers(rows: &[RawRow]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !seen.iter().any(|s| s == key) {
                seen.push(key.clone());
            }
        }
    }
    seen
}

// ---------------------------------------------------------------------------
// Coercion
// ---------------------------------------------------------------------------

/// Coerces a cell to a finite float.
///
/// Numbers and numeric strings are accepted; null, empty strings, sentinel
/// text such as `"***"`, and non-finite values become `None`.
pub fn coerce_f64(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

/// Coerces a cell to an integer. Floats are accepted only when integral,
/// so `"1980"`, `1980` and `1980.0` all yield `1980`.
pub fn coerce_i64(value: Option<&Value>) -> Option<i64> {
    if let Some(Value::Number(n)) = value {
        if let Some(i) = n.as_i64() {
            return Some(i);
        }
    }
    let f = coerce_f64(value)?;
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Coerces a cell to trimmed text; numbers are rendered as written.
pub fn coerce_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parses an integer year from a column header such as `"1979"`.
pub fn header_year(header: &str) -> Option<i32> {
    let trimmed = header.trim();
    if trimmed.len() != 4 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
