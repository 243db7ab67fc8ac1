//! Explicit reshape steps between wide and long tables.
//!
//! Contracts:
//! - `melt`: id columns are copied onto every output row; each remaining
//!   selected column becomes one row with the header under `var_name` and
//!   the cell under `value_name`.
//! - `sea_ice_sheet_to_daily`: a daily extent sheet laid out as
//!   `{Month, Day, 1979, 1980, ...}` becomes long rows
//!   `{Year, DayOfYear, Extent}` with raw (leap-inclusive) day numbers.
//! - `annual_table`: a wide annual table keyed by year becomes an annual
//!   series with one metric per remaining column.
//! - `pivot_entities`: long emission rows `{Entity, Year, emissions_total}`
//!   become one annual series with a column per entity.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use serde_json::Value;

use crate::ingest::columns::{coerce_f64, coerce_i64, coerce_text, header_year, headers, resolve_column};
use crate::logging::{self, Stage};
use crate::model::{AnnualRecord, AnnualSeries, PipelineError, RawRow, Result};
use crate::variables::{DAY, EMISSIONS, ENTITY, MONTH, YEAR};

const SHEET_INPUT: &str = "sea ice sheet";

// ---------------------------------------------------------------------------
// Wide to long
// ---------------------------------------------------------------------------

/// Unpivots `value_columns` into `(var_name, value_name)` pairs.
pub fn melt(
    rows: &[RawRow],
    id_columns: &[&str],
    value_columns: &[String],
    var_name: &str,
    value_name: &str,
) -> Vec<RawRow> {
    let mut long = Vec::with_capacity(rows.len() * value_columns.len());
    for row in rows {
        for column in value_columns {
            let mut out = RawRow::new();
            for id in id_columns {
                out.insert((*id).to_string(), row.get(*id).cloned().unwrap_or(Value::Null));
            }
            out.insert(var_name.to_string(), Value::String(column.clone()));
            out.insert(value_name.to_string(), row.get(column).cloned().unwrap_or(Value::Null));
            long.push(out);
        }
    }
    long
}

/// Converts the wide daily extent sheet into long daily rows.
///
/// The month cell is only filled on the first day of each month in the
/// source sheet, so it is forward-filled before melting. Every column whose
/// header is a four-digit year is treated as data; anything else (notes,
/// climatology columns) is ignored. Impossible dates such as 29 February of
/// a non-leap year and empty cells are dropped.
pub fn sea_ice_sheet_to_daily(rows: &[RawRow]) -> Result<Vec<RawRow>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let month_col = resolve_column(rows, &MONTH, SHEET_INPUT)?;
    let day_col = resolve_column(rows, &DAY, SHEET_INPUT)?;
    let year_cols: Vec<String> = headers(rows)
        .into_iter()
        .filter(|h| header_year(h).is_some())
        .collect();
    if year_cols.is_empty() {
        return Err(PipelineError::Schema {
            input: SHEET_INPUT.to_string(),
            column: "year columns".to_string(),
            aliases: "four-digit year headers".to_string(),
        });
    }

    let mut filled = Vec::with_capacity(rows.len());
    let mut last_month: Option<Value> = None;
    for row in rows {
        let mut row = row.clone();
        match coerce_text(row.get(&month_col)) {
            Some(month) => last_month = Some(Value::String(month)),
            None => {
                if let Some(month) = &last_month {
                    row.insert(month_col.clone(), month.clone());
                }
            }
        }
        filled.push(row);
    }

    let long = melt(
        &filled,
        &[month_col.as_str(), day_col.as_str()],
        &year_cols,
        "Year",
        "Extent",
    );

    let mut daily = Vec::with_capacity(long.len());
    for row in &long {
        let Some(extent) = coerce_f64(row.get("Extent")) else {
            continue;
        };
        let year = coerce_text(row.get("Year")).and_then(|y| header_year(&y));
        let month = coerce_text(row.get(&month_col));
        let day = coerce_i64(row.get(&day_col));
        let (Some(year), Some(month), Some(day)) = (year, month, day) else {
            continue;
        };
        let Some(date) = parse_sheet_date(day, &month, year) else {
            continue;
        };
        let mut out = RawRow::new();
        out.insert("Year".to_string(), Value::from(year));
        out.insert("DayOfYear".to_string(), Value::from(date.ordinal()));
        out.insert("Extent".to_string(), Value::from(extent));
        daily.push(out);
    }

    logging::debug(
        Stage::Ingest,
        Some(SHEET_INPUT),
        &format!(
            "melted {} sheet rows x {} year columns into {} daily rows",
            rows.len(),
            year_cols.len(),
            daily.len()
        ),
    );

    Ok(daily)
}

/// Builds a date from sheet cells, accepting full or abbreviated month names.
fn parse_sheet_date(day: i64, month: &str, year: i32) -> Option<NaiveDate> {
    let text = format!("{day} {month} {year}");
    NaiveDate::parse_from_str(&text, "%d %B %Y")
        .or_else(|_| NaiveDate::parse_from_str(&text, "%d %b %Y"))
        .ok()
}

// ---------------------------------------------------------------------------
// Annual tables
// ---------------------------------------------------------------------------

/// Reads an already-wide annual table (one row per year, e.g. the zonal
/// temperature table) into an annual series.
///
/// The year column is resolved through its aliases and every other column
/// becomes a metric; cells that are not numeric, like `"***"`, are null.
/// Rows without a usable year are skipped, and a repeated year is a
/// `DuplicateKey` error.
pub fn annual_table(rows: &[RawRow], input: &str) -> Result<AnnualSeries> {
    if rows.is_empty() {
        return Ok(AnnualSeries::new(input, Vec::new()));
    }
    let year_col = resolve_column(rows, &YEAR, input)?;
    let metrics: Vec<String> = headers(rows).into_iter().filter(|h| *h != year_col).collect();

    let mut by_year: BTreeMap<i32, AnnualRecord> = BTreeMap::new();
    for row in rows {
        let Some(year) = coerce_i64(row.get(&year_col)).and_then(|y| i32::try_from(y).ok()) else {
            continue;
        };
        if by_year.contains_key(&year) {
            return Err(PipelineError::DuplicateKey {
                input: input.to_string(),
                key: format!("year {year}"),
            });
        }
        let record = metrics.iter().fold(AnnualRecord::new(year), |record, m| {
            let value = coerce_f64(row.get(m));
            record.with(m, value)
        });
        by_year.insert(year, record);
    }

    Ok(AnnualSeries::new(input, by_year.into_values().collect()))
}

// ---------------------------------------------------------------------------
// Long to wide
// ---------------------------------------------------------------------------

/// Pivots emission rows into one column per entity.
///
/// Each year gets a value (possibly null) for every entity seen anywhere in
/// the batch. Two rows for the same `(year, entity)` are a `DuplicateKey`
/// error rather than being averaged.
pub fn pivot_entities(rows: &[RawRow], input: &str) -> Result<AnnualSeries> {
    if rows.is_empty() {
        return Ok(AnnualSeries::new(input, Vec::new()));
    }
    let year_col = resolve_column(rows, &YEAR, input)?;
    let entity_col = resolve_column(rows, &ENTITY, input)?;
    let value_col = resolve_column(rows, &EMISSIONS, input)?;

    let mut by_year: BTreeMap<i32, AnnualRecord> = BTreeMap::new();
    let mut entities: BTreeSet<String> = BTreeSet::new();

    for row in rows {
        let year = coerce_i64(row.get(&year_col)).and_then(|y| i32::try_from(y).ok());
        let (Some(year), Some(entity)) = (year, coerce_text(row.get(&entity_col))) else {
            continue;
        };
        let value = coerce_f64(row.get(&value_col));
        let record = by_year.entry(year).or_insert_with(|| AnnualRecord::new(year));
        if record.metrics.contains_key(&entity) {
            return Err(PipelineError::DuplicateKey {
                input: input.to_string(),
                key: format!("year {year}, entity '{entity}'"),
            });
        }
        record.metrics.insert(entity.clone(), value);
        entities.insert(entity);
    }

    let records = by_year
        .into_values()
        .map(|mut record| {
            for entity in &entities {
                record.metrics.entry(entity.clone()).or_insert(None);
            }
            record
        })
        .collect();

    Ok(AnnualSeries::new(input, records))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
