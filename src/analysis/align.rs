//! Year-keyed joins across independently sourced annual series.
//!
//! Every input must already be unique on year. Duplicates are reported as
//! `DuplicateKey` instead of being averaged, so any averaging (for example
//! of several emission entities per year) has to happen in an explicit
//! aggregation step before the join.

use std::collections::{BTreeMap, HashMap};

use crate::logging::{self, Stage};
use crate::model::{AnnualRecord, AnnualSeries, JoinMode, PipelineError, Result};

/// Fails with `DuplicateKey` if any year appears twice in `series`.
pub fn ensure_unique_years(series: &AnnualSeries) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for record in &series.records {
        if !seen.insert(record.year) {
            return Err(PipelineError::DuplicateKey {
                input: series.label.clone(),
                key: format!("year {}", record.year),
            });
        }
    }
    Ok(())
}

/// Joins `others` onto `primary` by year.
///
/// - `Inner`: only years present in `primary` and every other input.
/// - `Left`: every year of `primary`; metrics of an input lacking that year
///   are present with a null value, never dropped.
///
/// Output is sorted by year. A metric name provided by two inputs is a
/// `DuplicateKey` error, since the join would otherwise silently overwrite
/// one of them.
pub fn align_series(
    primary: &AnnualSeries,
    others: &[&AnnualSeries],
    mode: JoinMode,
) -> Result<Vec<AnnualRecord>> {
    ensure_unique_years(primary)?;
    for other in others {
        ensure_unique_years(other)?;
    }

    let mut owners: HashMap<String, String> = primary
        .metric_names()
        .into_iter()
        .map(|name| (name, primary.label.clone()))
        .collect();
    let mut other_columns: Vec<Vec<String>> = Vec::with_capacity(others.len());
    for other in others {
        let names = other.metric_names();
        for name in &names {
            if let Some(owner) = owners.get(name) {
                return Err(PipelineError::DuplicateKey {
                    input: other.label.clone(),
                    key: format!("column '{}' also provided by {}", name, owner),
                });
            }
        }
        for name in &names {
            owners.insert(name.clone(), other.label.clone());
        }
        other_columns.push(names);
    }

    let indexed: Vec<BTreeMap<i32, &AnnualRecord>> = others
        .iter()
        .map(|s| s.records.iter().map(|r| (r.year, r)).collect())
        .collect();

    let mut primary_records: Vec<&AnnualRecord> = primary.records.iter().collect();
    primary_records.sort_by_key(|r| r.year);

    let mut aligned = Vec::with_capacity(primary_records.len());
    for record in primary_records {
        if mode == JoinMode::Inner && indexed.iter().any(|idx| !idx.contains_key(&record.year)) {
            continue;
        }
        let mut merged = record.clone();
        for (idx, columns) in indexed.iter().zip(&other_columns) {
            match idx.get(&record.year) {
                Some(found) => {
                    for column in columns {
                        merged.metrics.insert(column.clone(), found.get(column));
                    }
                }
                None => {
                    for column in columns {
                        merged.metrics.insert(column.clone(), None);
                    }
                }
            }
        }
        aligned.push(merged);
    }

    let labels: Vec<&str> = others.iter().map(|s| s.label.as_str()).collect();
    logging::debug(
        Stage::Align,
        Some(&primary.label),
        &format!(
            "{:?} join with [{}]: {} of {} years kept",
            mode,
            labels.join(", "),
            aligned.len(),
            primary.records.len()
        ),
    );

    Ok(aligned)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
