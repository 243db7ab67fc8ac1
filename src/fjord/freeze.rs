//! Freeze and breakup dates from a daily ice-fraction series.
//!
//! A day counts as frozen when its fraction is at or above the threshold.
//! The freeze date is the first frozen day of the year and the breakup date
//! the last one. There is no edge detection: a dip below the threshold in
//! mid-season does not end the season, a later frozen day still moves the
//! breakup date forward.

use std::collections::BTreeMap;

use crate::model::{FreezeBreakup, Observation};

/// Scans one year's `(day_of_year, fraction)` points against `threshold`.
///
/// Null fractions never count as frozen. Input order does not matter.
pub fn detect_freeze_breakup(year: i32, days: &[(u16, Option<f64>)], threshold: f64) -> FreezeBreakup {
    let frozen = days
        .iter()
        .filter(|(_, frac)| frac.is_some_and(|f| f >= threshold))
        .map(|(day, _)| *day);

    let (freeze_doy, breakup_doy) = frozen.fold((None, None), |(first, last), day| {
        (
            Some(first.map_or(day, |f: u16| f.min(day))),
            Some(last.map_or(day, |l: u16| l.max(day))),
        )
    });

    FreezeBreakup {
        year,
        freeze_doy,
        breakup_doy,
    }
}

/// Freeze/breakup for every year present in `observations`, sorted by year.
///
/// Years with no frozen day are kept with both dates null.
pub fn freeze_breakup_by_year(observations: &[Observation], threshold: f64) -> Vec<FreezeBreakup> {
    let mut by_year: BTreeMap<i32, Vec<(u16, Option<f64>)>> = BTreeMap::new();
    for o in observations {
        by_year.entry(o.year).or_default().push((o.day_of_year, o.value));
    }
    by_year
        .iter()
        .map(|(year, days)| detect_freeze_breakup(*year, days, threshold))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
