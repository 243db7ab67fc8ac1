//! Baseline-relative anomalies and z-scores.
//!
//! Daily anomalies are computed against a climatology: the mean value of
//! each day-of-year over a fixed range of baseline years. Observations are
//! pre-smoothed within each year before both the climatology and the
//! anomalies are taken, so the two sides of the subtraction see the same
//! filter.

use std::collections::BTreeMap;

use crate::analysis::aggregate::aggregate_by;
use crate::analysis::smoothing::{full_year_curve, rolling_centered, smooth_circular};
use crate::analysis::stats::{mean, sample_sd};
use crate::logging::{self, Stage};
use crate::model::{
    AnnualAnomaly, AnnualRecord, DAYS_IN_CALENDAR, DailyAnomaly, DecadalAnomaly, Observation,
    PipelineError, Result,
};

// ---------------------------------------------------------------------------
// Daily anomalies
// ---------------------------------------------------------------------------

fn check_baseline(base_start: i32, base_end: i32) -> Result<()> {
    if base_end < base_start {
        return Err(PipelineError::Configuration(format!(
            "baseline end {base_end} is before baseline start {base_start}"
        )));
    }
    Ok(())
}

/// Applies `rolling_centered` separately to each year's observations.
///
/// Output keeps one entry per input observation, ordered by year then day.
pub fn presmooth_by_year(observations: &[Observation], window: usize) -> Vec<Observation> {
    let mut by_year: BTreeMap<i32, Vec<&Observation>> = BTreeMap::new();
    for obs in observations {
        by_year.entry(obs.year).or_default().push(obs);
    }

    let mut smoothed = Vec::with_capacity(observations.len());
    for (_, mut year_obs) in by_year {
        year_obs.sort_by_key(|o| o.day_of_year);
        let values: Vec<Option<f64>> = year_obs.iter().map(|o| o.value).collect();
        let rolled = rolling_centered(&values, window);
        smoothed.extend(year_obs.into_iter().zip(rolled).map(|(o, value)| Observation {
            value,
            ..o.clone()
        }));
    }
    smoothed
}

/// Mean value per day-of-year over `[base_start, base_end]`.
///
/// Days with no baseline observation are absent from the map.
pub fn climatology(
    observations: &[Observation],
    base_start: i32,
    base_end: i32,
) -> Result<BTreeMap<u16, f64>> {
    check_baseline(base_start, base_end)?;
    let baseline = observations
        .iter()
        .filter(|o| (base_start..=base_end).contains(&o.year))
        .map(|o| (o.day_of_year, o.value));
    Ok(aggregate_by(baseline)
        .into_iter()
        .map(|(day, stats)| (day, stats.mean))
        .collect())
}

/// Anomaly of every observation against the baseline climatology.
///
/// A day with no baseline data gets a null climatology and a null anomaly;
/// the rest of the run is unaffected.
pub fn daily_anomalies(
    observations: &[Observation],
    base_start: i32,
    base_end: i32,
    pre_smooth_window: usize,
) -> Result<Vec<DailyAnomaly>> {
    check_baseline(base_start, base_end)?;
    let smoothed = presmooth_by_year(observations, pre_smooth_window);
    let clim = climatology(&smoothed, base_start, base_end)?;

    let missing_days = (1..=DAYS_IN_CALENDAR).filter(|d| !clim.contains_key(d)).count();
    if missing_days > 0 {
        logging::debug(
            Stage::Anomaly,
            None,
            &format!(
                "baseline {base_start}-{base_end} has no data for {missing_days} days; their anomalies are null"
            ),
        );
    }

    Ok(smoothed
        .into_iter()
        .map(|o| {
            let climatology = clim.get(&o.day_of_year).copied();
            let anomaly = match (o.value, climatology) {
                (Some(v), Some(c)) => Some(v - c),
                _ => None,
            };
            DailyAnomaly {
                year: o.year,
                day: o.day_of_year,
                value: o.value,
                climatology,
                anomaly,
            }
        })
        .collect())
}

/// Mean daily anomaly of each year. Years without any anomaly are omitted.
pub fn annual_anomalies(daily: &[DailyAnomaly]) -> Vec<AnnualAnomaly> {
    aggregate_by(daily.iter().map(|d| (d.year, d.anomaly)))
        .into_iter()
        .map(|(year, stats)| AnnualAnomaly {
            year,
            anomaly: stats.mean,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Decadal anomalies
// ---------------------------------------------------------------------------

/// Decade a year belongs to, e.g. 1987 → `"1980s"`.
pub fn decade_label(year: i32) -> String {
    format!("{}s", year.div_euclid(10) * 10)
}

/// Seasonal anomaly curve per decade.
///
/// Daily anomalies are grouped by `(decade, day)`; each decade's mean curve
/// is placed on the full 365-day domain and circular-smoothed with
/// `post_smooth_window`. Every decade yields 365 rows. `sd` and `n` come
/// from the unsmoothed group and are null for days the decade never
/// observed.
///
/// Fails with `InsufficientData` when no anomaly is available at all.
pub fn decadal_anomalies(
    daily: &[DailyAnomaly],
    post_smooth_window: usize,
) -> Result<Vec<DecadalAnomaly>> {
    let grouped = aggregate_by(
        daily
            .iter()
            .map(|d| ((d.year.div_euclid(10), d.day), d.anomaly)),
    );
    if grouped.is_empty() {
        return Err(PipelineError::InsufficientData {
            what: "decadal anomaly".to_string(),
            needed: 1,
            got: 0,
        });
    }

    let mut decades: BTreeMap<i32, BTreeMap<u16, _>> = BTreeMap::new();
    for ((decade, day), stats) in grouped {
        decades.entry(decade).or_default().insert(day, stats);
    }

    let mut rows = Vec::with_capacity(decades.len() * usize::from(DAYS_IN_CALENDAR));
    for (decade, days) in decades {
        let label = decade_label(decade * 10);
        let curve = full_year_curve(days.iter().map(|(day, s)| (*day, Some(s.mean))));
        let smoothed = smooth_circular(&curve, post_smooth_window);
        for day in 1..=DAYS_IN_CALENDAR {
            let stats = days.get(&day);
            rows.push(DecadalAnomaly {
                decade: label.clone(),
                day,
                anomaly: smoothed[usize::from(day - 1)],
                sd: stats.and_then(|s| s.sd),
                n: stats.map(|s| s.count),
            });
        }
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Z-scores
// ---------------------------------------------------------------------------

/// Standardizes `values` against their own sample mean and sample sd.
///
/// Nulls stay null. With fewer than two values, or zero spread, every
/// output is null. `inverted` negates the score.
pub fn z_scores(values: &[Option<f64>], inverted: bool) -> Vec<Option<f64>> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    let (Some(m), Some(sd)) = (mean(&present), sample_sd(&present)) else {
        return vec![None; values.len()];
    };
    if sd == 0.0 {
        return vec![None; values.len()];
    }
    let sign = if inverted { -1.0 } else { 1.0 };
    values
        .iter()
        .map(|v| v.map(|v| sign * (v - m) / sd))
        .collect()
}

/// Returns a copy of `records` with a z-score column `output` computed from
/// the `source` metric.
pub fn with_z_score(
    records: &[AnnualRecord],
    source: &str,
    output: &str,
    inverted: bool,
) -> Vec<AnnualRecord> {
    let values: Vec<Option<f64>> = records.iter().map(|r| r.get(source)).collect();
    let present = values.iter().flatten().count();
    if present < 2 {
        logging::debug(
            Stage::Anomaly,
            Some(output),
            &PipelineError::InsufficientData {
                what: format!("z-score of {source}"),
                needed: 2,
                got: present,
            }
            .to_string(),
        );
    }
    records
        .iter()
        .zip(z_scores(&values, inverted))
        .map(|(r, z)| r.clone().with(output, z))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
