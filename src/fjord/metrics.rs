//! Per-year fjord summaries: spring anomaly, sunlit mean fraction and the
//! daily record itself.

use std::collections::BTreeSet;

use crate::analysis::aggregate::aggregate_by;
use crate::analysis::stats::{mean, round_to};
use crate::model::{FjordDailyRow, MeanFraction, Observation, SpringAnomaly};

const SPRING_ANOMALY_DECIMALS: u32 = 1;
const MEAN_FRACTION_DECIMALS: u32 = 4;

fn window_means(observations: &[Observation], start: u16, end: u16) -> Vec<(i32, f64)> {
    aggregate_by(
        observations
            .iter()
            .filter(|o| (start..=end).contains(&o.day_of_year))
            .map(|o| (o.year, o.value)),
    )
    .into_iter()
    .map(|(year, s)| (year, s.mean))
    .collect()
}

/// Spring ice area relative to the early-cohort baseline.
///
/// Each year's mean fraction over `[start, end]` is compared with the mean of
/// those yearly means over the baseline years that are present, and the
/// difference is scaled to km² by `area_km2`. Every anomaly is null when no
/// baseline year has spring data.
pub fn spring_anomalies(
    observations: &[Observation],
    start: u16,
    end: u16,
    baseline_years: &[i32],
    area_km2: f64,
) -> Vec<SpringAnomaly> {
    let yearly = window_means(observations, start, end);
    let baseline_set: BTreeSet<i32> = baseline_years.iter().copied().collect();
    let baseline_values: Vec<f64> = yearly
        .iter()
        .filter(|(year, _)| baseline_set.contains(year))
        .map(|(_, m)| *m)
        .collect();
    let baseline = mean(&baseline_values);

    yearly
        .into_iter()
        .map(|(year, m)| SpringAnomaly {
            year,
            anomaly: baseline.map(|b| round_to((m - b) * area_km2, SPRING_ANOMALY_DECIMALS)),
        })
        .collect()
}

/// Mean fraction of each year over `[start, end]`, rounded to four decimals.
pub fn mean_fractions(observations: &[Observation], start: u16, end: u16) -> Vec<MeanFraction> {
    window_means(observations, start, end)
        .into_iter()
        .map(|(year, m)| MeanFraction {
            year,
            mean: Some(round_to(m, MEAN_FRACTION_DECIMALS)),
        })
        .collect()
}

pub fn daily_rows(observations: &[Observation]) -> Vec<FjordDailyRow> {
    observations
        .iter()
        .map(|o| FjordDailyRow {
            date: o.date,
            year: o.year,
            doy: o.day_of_year,
            frac: o.value,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
