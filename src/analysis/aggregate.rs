//! Grouped order statistics.
//!
//! Rows are grouped by any ordered key (day-of-year, `(decade, day)`,
//! `(period, day)`, year) and each group is summarised as a `GroupStats`.
//! Null values are skipped; a group left with no members is absent from the
//! result rather than present with null fields.

use std::collections::BTreeMap;

use crate::analysis::stats::{mean, quantile_sorted, round_to, sample_sd};
use crate::ingest::columns::{coerce_f64, coerce_i64, resolve_column};
use crate::model::{AnnualRecord, AnnualSeries, GroupStats, IqrStats, Observation, RawRow, Result};
use crate::variables::{EMISSIONS, GLOBAL_CO2_MEAN, SEA_ICE_MEAN, YEAR};

/// Summarises one group. `None` for an empty group.
pub fn group_stats(values: &[f64]) -> Option<GroupStats> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let first = *sorted.first()?;
    let last = *sorted.last()?;
    Some(GroupStats {
        min: first,
        p25: quantile_sorted(&sorted, 0.25)?,
        p75: quantile_sorted(&sorted, 0.75)?,
        max: last,
        mean: mean(&sorted)?,
        sd: sample_sd(&sorted),
        count: sorted.len(),
    })
}

/// Groups `(key, value)` pairs and summarises each non-empty group.
pub fn aggregate_by<K, I>(items: I) -> BTreeMap<K, GroupStats>
where
    K: Ord,
    I: IntoIterator<Item = (K, Option<f64>)>,
{
    let mut groups: BTreeMap<K, Vec<f64>> = BTreeMap::new();
    for (key, value) in items {
        if let Some(v) = value {
            groups.entry(key).or_default().push(v);
        }
    }
    groups
        .into_iter()
        .filter_map(|(key, values)| group_stats(&values).map(|stats| (key, stats)))
        .collect()
}

/// Per-day band of the daily series across all years.
pub fn iqr_by_day(observations: &[Observation]) -> Vec<IqrStats> {
    aggregate_by(observations.iter().map(|o| (o.day_of_year, o.value)))
        .into_iter()
        .map(|(day_of_year, s)| IqrStats {
            day_of_year,
            min: s.min,
            q25: s.p25,
            q75: s.p75,
            mean: s.mean,
        })
        .collect()
}

/// Collapses `(year, value)` pairs into a one-metric annual series holding
/// each year's mean, optionally rounded.
pub fn yearly_mean<I>(input: &str, metric: &str, items: I, decimals: Option<u32>) -> AnnualSeries
where
    I: IntoIterator<Item = (i32, Option<f64>)>,
{
    let records = aggregate_by(items)
        .into_iter()
        .map(|(year, s)| {
            let value = decimals.map_or(s.mean, |d| round_to(s.mean, d));
            AnnualRecord::new(year).with(metric, Some(value))
        })
        .collect();
    AnnualSeries::new(input, records)
}

/// `SeaIceMean`: the mean normalized daily extent of each year.
pub fn annual_sea_ice_mean(observations: &[Observation]) -> AnnualSeries {
    yearly_mean(
        "sea ice annual mean",
        SEA_ICE_MEAN,
        observations.iter().map(|o| (o.year, o.value)),
        None,
    )
}

/// `GlobalCO2Mean`: the mean of every entity's emissions in each year.
///
/// This is the explicit aggregation step that makes the emissions table
/// unique on year before it is joined.
pub fn global_emissions_mean(rows: &[RawRow], input: &str, decimals: u32) -> Result<AnnualSeries> {
    if rows.is_empty() {
        return Ok(AnnualSeries::new(input, Vec::new()));
    }
    let year_col = resolve_column(rows, &YEAR, input)?;
    let value_col = resolve_column(rows, &EMISSIONS, input)?;
    let items = rows.iter().filter_map(|row| {
        let year = coerce_i64(row.get(&year_col)).and_then(|y| i32::try_from(y).ok())?;
        Some((year, coerce_f64(row.get(&value_col))))
    });
    Ok(yearly_mean(input, GLOBAL_CO2_MEAN, items, Some(decimals)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
