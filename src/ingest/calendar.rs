//! Calendar normalization onto the 365-day reference calendar.
//!
//! A raw `(year, day number)` pair is turned into a real date by adding
//! `day - 1` days to Jan 1 of the record's year. That date is then
//! re-expressed against `REFERENCE_YEAR`, a fixed non-leap year, so that
//! 1 March is day 60 in every year and seasons line up across leap and
//! non-leap years. Feb-29 has no counterpart in the reference year and is
//! dropped.

use chrono::{Datelike, Days, NaiveDate};

use crate::ingest::columns::{coerce_f64, coerce_i64, resolve_column};
use crate::logging::{self, Stage};
use crate::model::{DAYS_IN_CALENDAR, Observation, PipelineError, REFERENCE_YEAR, RawRow, Result};
use crate::variables::DailySchema;

/// Maps a raw day number of `year` onto the reference calendar.
///
/// Returns the real date and its reference day-of-year, or `None` when the
/// day number falls outside the year or lands on Feb-29.
pub fn reference_day(year: i32, day_number: i64) -> Option<(NaiveDate, u16)> {
    if !(1..=366).contains(&day_number) {
        return None;
    }
    let jan1 = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let date = jan1.checked_add_days(Days::new((day_number - 1) as u64))?;
    if date.year() != year || (date.month() == 2 && date.day() == 29) {
        return None;
    }
    let reference = NaiveDate::from_ymd_opt(REFERENCE_YEAR, date.month(), date.day())?;
    Some((date, reference.ordinal() as u16))
}

/// Human-readable label of a reference day, e.g. 45 → `"14-Feb"`.
pub fn day_label(day_of_year: u16) -> Option<String> {
    if day_of_year == 0 || day_of_year > DAYS_IN_CALENDAR {
        return None;
    }
    NaiveDate::from_yo_opt(REFERENCE_YEAR, u32::from(day_of_year))
        .map(|d| d.format("%d-%b").to_string())
}

/// Normalizes a batch of daily rows.
///
/// Columns are resolved once through `schema`; rows whose year, day or value
/// cannot be coerced are dropped, as are rows outside `[yr_min, yr_max]` and
/// leap days. Output is sorted by `(year, day_of_year)`.
pub fn normalize_daily(
    rows: &[RawRow],
    schema: &DailySchema,
    yr_min: i32,
    yr_max: i32,
) -> Result<Vec<Observation>> {
    if yr_min > yr_max {
        return Err(PipelineError::Configuration(format!(
            "year range is empty: yrMin {yr_min} > yrMax {yr_max}"
        )));
    }
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let year_col = resolve_column(rows, schema.year, schema.input)?;
    let doy_col = resolve_column(rows, schema.day_of_year, schema.input)?;
    let value_col = resolve_column(rows, schema.value, schema.input)?;

    let mut observations = Vec::with_capacity(rows.len());
    let mut incomplete = 0usize;
    let mut elided = 0usize;

    for row in rows {
        let year = coerce_i64(row.get(&year_col)).and_then(|y| i32::try_from(y).ok());
        let day = coerce_i64(row.get(&doy_col));
        let value = coerce_f64(row.get(&value_col));
        let (Some(year), Some(day), Some(value)) = (year, day, value) else {
            incomplete += 1;
            continue;
        };
        if year < yr_min || year > yr_max {
            continue;
        }
        match reference_day(year, day) {
            Some((date, day_of_year)) => observations.push(Observation {
                year,
                day_of_year,
                date,
                value: Some(value),
            }),
            None => elided += 1,
        }
    }

    observations.sort_by_key(|o| (o.year, o.day_of_year));

    logging::debug(
        Stage::Calendar,
        Some(schema.input),
        &format!(
            "{} rows in, {} kept, {} incomplete, {} leap/out-of-year",
            rows.len(),
            observations.len(),
            incomplete,
            elided
        ),
    );

    Ok(observations)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::SEA_ICE_DAILY;
    use serde_json::{Value, json};

    fn rows(values: Vec<Value>) -> Vec<RawRow> {
        values
            .into_iter()
            .map(|v| v.as_object().cloned().expect("test row must be an object"))
            .collect()
    }

    #[test]
    fn test_leap_year_march_first_maps_to_day_60() {
        // 2020-03-01 is raw day 61 in a leap year.
        let (date, doy) = reference_day(2020, 61).expect("valid day");
        assert_eq!(date, NaiveDate::from_ymd_opt(2020, 3, 1).unwrap());
        assert_eq!(doy, 60);
    }

    #[test]
    fn test_non_leap_year_is_unchanged() {
        let (_, doy) = reference_day(2019, 61).expect("valid day");
        assert_eq!(doy, 61);
    }

    #[test]
    fn test_feb_29_is_dropped() {
        assert!(reference_day(2020, 60).is_none(), "2020 day 60 is Feb-29");
    }

    #[test]
    fn test_day_366_of_leap_year_becomes_365() {
        let (_, doy) = reference_day(2020, 366).expect("Dec 31 of a leap year");
        assert_eq!(doy, 365);
    }

    #[test]
    fn test_day_366_of_non_leap_year_is_rejected() {
        assert!(reference_day(2019, 366).is_none());
        assert!(reference_day(2019, 0).is_none());
    }

    #[test]
    fn test_day_label_uses_reference_year() {
        assert_eq!(day_label(45).as_deref(), Some("14-Feb"));
        assert_eq!(day_label(60).as_deref(), Some("01-Mar"));
        assert_eq!(day_label(0), None);
        assert_eq!(day_label(366), None);
    }

    #[test]
    fn test_normalize_never_emits_day_366_or_leap_day() {
        let input: Vec<Value> = (1..=366)
            .map(|d| json!({"Year": 2020, "DayOfYear": d, "Extent": 10.0}))
            .collect();
        let out = normalize_daily(&rows(input), &SEA_ICE_DAILY, 1980, 2100).unwrap();
        assert_eq!(out.len(), 365, "Feb-29 should be the only dropped day");
        assert!(out.iter().all(|o| (1..=365).contains(&o.day_of_year)));
        assert!(out.iter().all(|o| !(o.date.month() == 2 && o.date.day() == 29)));
    }

    #[test]
    fn test_normalize_filters_year_range_and_incomplete_rows() {
        let input = rows(vec![
            json!({"year": 1979, "doy": 1, "value": 1.0}),
            json!({"year": 1980, "doy": 1, "value": 2.0}),
            json!({"year": 1980, "doy": 2, "value": null}),
            json!({"year": 1980, "doy": "x", "value": 3.0}),
        ]);
        let out = normalize_daily(&input, &SEA_ICE_DAILY, 1980, 2100).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].year, 1980);
        assert_eq!(out[0].value, Some(2.0));
    }

    #[test]
    fn test_normalize_sorts_by_year_then_day() {
        let input = rows(vec![
            json!({"Year": 2001, "DayOfYear": 2, "Extent": 1.0}),
            json!({"Year": 2000, "DayOfYear": 5, "Extent": 1.0}),
            json!({"Year": 2001, "DayOfYear": 1, "Extent": 1.0}),
        ]);
        let out = normalize_daily(&input, &SEA_ICE_DAILY, 1980, 2100).unwrap();
        let keys: Vec<_> = out.iter().map(|o| (o.year, o.day_of_year)).collect();
        assert_eq!(keys, vec![(2000, 5), (2001, 1), (2001, 2)]);
    }

    #[test]
    fn test_missing_value_column_is_schema_error() {
        let input = rows(vec![json!({"Year": 2000, "DayOfYear": 1, "Area": 3.0})]);
        let err = normalize_daily(&input, &SEA_ICE_DAILY, 1980, 2100).unwrap_err();
        assert!(matches!(err, PipelineError::Schema { .. }), "got {err:?}");
    }

    #[test]
    fn test_inverted_year_range_is_configuration_error() {
        let err = normalize_daily(&[], &SEA_ICE_DAILY, 2000, 1990).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }

    #[test]
    fn test_empty_batch_yields_empty_output() {
        let out = normalize_daily(&[], &SEA_ICE_DAILY, 1980, 2100).unwrap();
        assert!(out.is_empty());
    }
}
