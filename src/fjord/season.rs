//! Early/late cohort comparison over the sunlit window.
//!
//! Each cohort is a set of years. For every day of the window the cohort's
//! fractions are summarised, then both cohorts are laid side by side in one
//! row per day, and a single loss percentage is derived from the pair of
//! means.

use std::collections::{BTreeMap, BTreeSet};

use crate::analysis::aggregate::aggregate_by;
use crate::analysis::stats::mean;
use crate::ingest::calendar::day_label;
use crate::model::{FjordSeasonRow, GroupStats, Observation};

/// Per-day statistics of one cohort, restricted to `[start, end]`.
///
/// Days where the cohort has no value are absent from the map.
pub fn season_band(
    observations: &[Observation],
    years: &[i32],
    start: u16,
    end: u16,
) -> BTreeMap<u16, GroupStats> {
    let cohort: BTreeSet<i32> = years.iter().copied().collect();
    aggregate_by(
        observations
            .iter()
            .filter(|o| cohort.contains(&o.year) && (start..=end).contains(&o.day_of_year))
            .map(|o| (o.day_of_year, o.value)),
    )
}

/// Merged season rows plus the derived loss percentage.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonComparison {
    pub rows: Vec<FjordSeasonRow>,
    pub season_loss_pct: Option<f64>,
}

/// One row per day present in either band, sorted by day.
pub fn merge_seasons(
    early: &BTreeMap<u16, GroupStats>,
    late: &BTreeMap<u16, GroupStats>,
) -> SeasonComparison {
    let days: BTreeSet<u16> = early.keys().chain(late.keys()).copied().collect();
    let rows: Vec<FjordSeasonRow> = days
        .into_iter()
        .map(|doy| {
            let e = early.get(&doy);
            let l = late.get(&doy);
            FjordSeasonRow {
                doy,
                day: day_label(doy).unwrap_or_else(|| doy.to_string()),
                early_mean: e.map(|s| s.mean),
                early_p25: e.map(|s| s.p25),
                early_p75: e.map(|s| s.p75),
                late_mean: l.map(|s| s.mean),
                late_p25: l.map(|s| s.p25),
                late_p75: l.map(|s| s.p75),
            }
        })
        .collect();
    let season_loss_pct = season_loss_pct(&rows);
    SeasonComparison {
        rows,
        season_loss_pct,
    }
}

/// Mean of the per-day relative drop `(early - late) / early`, in percent.
///
/// Days lacking either mean, or with an early mean of zero, are skipped.
/// The ratio is taken per day and then averaged; this differs from the
/// ratio of the averaged means. `None` when no day qualifies.
pub fn season_loss_pct(rows: &[FjordSeasonRow]) -> Option<f64> {
    let drops: Vec<f64> = rows
        .iter()
        .filter_map(|r| match (r.early_mean, r.late_mean) {
            (Some(e), Some(l)) if e != 0.0 => Some((e - l) / e * 100.0),
            _ => None,
        })
        .collect();
    mean(&drops)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
