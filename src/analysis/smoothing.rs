//! Smoothing filters.
//!
//! Two filters with different boundary rules:
//! - `rolling_centered` works inside a single year, so the window is simply
//!   truncated at the edges (edge extension) and leftover gaps are
//!   back/forward-filled.
//! - `smooth_circular` works on a full seasonal cycle, where day 365 is the
//!   neighbour of day 1, so padding wraps around the boundary.

use crate::analysis::stats::round_to;
use crate::model::DAYS_IN_CALENDAR;

/// Decimal places kept in circular smoothing output.
const SMOOTHED_DECIMALS: u32 = 3;

// ---------------------------------------------------------------------------
// Centered rolling mean (within one year)
// ---------------------------------------------------------------------------

/// Centered rolling mean with truncated edges.
///
/// A position gets a value when at least half the window (rounded up) holds
/// non-null values. For even widths the window extends one further to the
/// left than to the right. Remaining nulls are back-filled then
/// forward-filled, so only an all-null input stays null.
pub fn rolling_centered(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window <= 1 || values.is_empty() {
        return values.to_vec();
    }
    let left = window / 2;
    let right = if window % 2 == 0 { left - 1 } else { left };
    let min_periods = window.div_ceil(2);
    let n = values.len();

    let rolled: Vec<Option<f64>> = (0..n)
        .map(|i| {
            let lo = i.saturating_sub(left);
            let hi = (i + right).min(n - 1);
            let present: Vec<f64> = values[lo..=hi].iter().flatten().copied().collect();
            if present.len() >= min_periods {
                Some(present.iter().sum::<f64>() / present.len() as f64)
            } else {
                None
            }
        })
        .collect();

    forward_fill(&back_fill(&rolled))
}

fn back_fill(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = values.to_vec();
    let mut next = None;
    for slot in out.iter_mut().rev() {
        match slot {
            Some(v) => next = Some(*v),
            None => *slot = next,
        }
    }
    out
}

fn forward_fill(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = values.to_vec();
    let mut prev = None;
    for slot in out.iter_mut() {
        match slot {
            Some(v) => prev = Some(*v),
            None => *slot = prev,
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Circular smoothing (full seasonal cycle)
// ---------------------------------------------------------------------------

/// Places `(day_of_year, value)` points on a 365-slot curve; days without a
/// point stay `None`. Out-of-range days are ignored.
pub fn full_year_curve<I>(points: I) -> Vec<Option<f64>>
where
    I: IntoIterator<Item = (u16, Option<f64>)>,
{
    let mut curve = vec![None; usize::from(DAYS_IN_CALENDAR)];
    for (day, value) in points {
        if (1..=DAYS_IN_CALENDAR).contains(&day) {
            curve[usize::from(day - 1)] = value;
        }
    }
    curve
}

/// Normalized Hamming window of odd length `len`.
pub fn hamming_kernel(len: usize) -> Vec<f64> {
    if len <= 1 {
        return vec![1.0];
    }
    let denom = (len - 1) as f64;
    let raw: Vec<f64> = (0..len)
        .map(|k| 0.54 - 0.46 * (2.0 * std::f64::consts::PI * k as f64 / denom).cos())
        .collect();
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|w| w / total).collect()
}

/// Fills gaps by linear interpolation between the nearest known neighbours,
/// treating the curve as periodic. A gap spanning the end of the curve is
/// interpolated between the last and first known values.
///
/// Returns `None` only when no value is known at all.
pub fn interpolate_circular(curve: &[Option<f64>]) -> Option<Vec<f64>> {
    let known: Vec<usize> = curve
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|_| i))
        .collect();
    let first = *known.first()?;
    let n = curve.len();
    let value_at = |i: usize| curve[i % n].unwrap_or_default();

    let mut filled: Vec<f64> = curve.iter().map(|v| v.unwrap_or_default()).collect();
    if known.len() == 1 {
        return Some(vec![value_at(first); n]);
    }

    // Consecutive known pairs, closing the cycle with (last, first + n).
    let mut bounds: Vec<(usize, usize)> = known.windows(2).map(|w| (w[0], w[1])).collect();
    if let Some(&last) = known.last() {
        bounds.push((last, first + n));
    }
    for (a, b) in bounds {
        let (va, vb) = (value_at(a), value_at(b));
        let span = (b - a) as f64;
        for pos in (a + 1)..b {
            filled[pos % n] = va + (vb - va) * (pos - a) as f64 / span;
        }
    }
    Some(filled)
}

/// Smooths a periodic curve with a Hamming window.
///
/// Gaps are interpolated circularly first. The curve is then padded with
/// `⌊len/2⌋` points wrapped around from the opposite end, convolved with the
/// normalized kernel, and trimmed back to the input length. Even window
/// widths are bumped to the next odd width. Output values are rounded to
/// three decimals.
///
/// A window of 1 or less, or an all-null curve, is returned unchanged.
pub fn smooth_circular(curve: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window <= 1 {
        return curve.to_vec();
    }
    let Some(filled) = interpolate_circular(curve) else {
        return curve.to_vec();
    };

    let len = if window % 2 == 0 { window + 1 } else { window };
    let half = len / 2;
    let kernel = hamming_kernel(len);
    let n = filled.len();

    let mut padded = Vec::with_capacity(n + 2 * half);
    padded.extend((0..half).map(|k| filled[(k + n - half % n) % n]));
    padded.extend_from_slice(&filled);
    padded.extend((0..half).map(|k| filled[k % n]));

    padded
        .windows(len)
        .map(|w| {
            let acc: f64 = w.iter().zip(&kernel).map(|(x, k)| x * k).sum();
            Some(round_to(acc, SMOOTHED_DECIMALS))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(value: f64) -> Vec<Option<f64>> {
        vec![Some(value); 365]
    }

    #[test]
    fn test_constant_series_is_unchanged() {
        let out = smooth_circular(&constant(5.0), 15);
        assert_eq!(out, constant(5.0));
    }

    #[test]
    fn test_spike_at_day_365_reaches_day_1() {
        let baseline = smooth_circular(&constant(0.0), 15);
        let mut spiked = constant(0.0);
        spiked[364] = Some(10.0);
        let out = smooth_circular(&spiked, 15);
        let day1 = out[0].unwrap();
        assert!(
            day1 > baseline[0].unwrap(),
            "spike on day 365 should raise day 1 through wrap-around, got {day1}"
        );
        assert_eq!(out[180], Some(0.0), "mid-year should be untouched");
    }

    #[test]
    fn test_output_length_matches_input() {
        let out = smooth_circular(&constant(1.0), 7);
        assert_eq!(out.len(), 365);
    }

    #[test]
    fn test_even_window_is_bumped_to_odd() {
        let mut spiked = constant(0.0);
        spiked[100] = Some(1.0);
        assert_eq!(smooth_circular(&spiked, 4), smooth_circular(&spiked, 5));
    }

    #[test]
    fn test_degenerate_inputs_are_returned_unchanged() {
        let mut curve = constant(1.0);
        curve[3] = None;
        assert_eq!(smooth_circular(&curve, 1), curve);
        let empty = vec![None; 365];
        assert_eq!(smooth_circular(&empty, 15), empty);
    }

    #[test]
    fn test_gaps_are_interpolated_across_the_wrap() {
        let mut curve = vec![None; 10];
        curve[2] = Some(2.0);
        curve[8] = Some(8.0);
        let filled = interpolate_circular(&curve).unwrap();
        assert_eq!(filled[5], 5.0);
        // 8 -> 2 across the boundary over four steps: 9, 0, 1 lie between.
        assert_eq!(filled[9], 6.5);
        assert_eq!(filled[0], 5.0);
        assert_eq!(filled[1], 3.5);
    }

    #[test]
    fn test_smoothed_curve_has_no_gaps() {
        let mut curve = constant(2.0);
        for slot in curve.iter_mut().take(30) {
            *slot = None;
        }
        let out = smooth_circular(&curve, 15);
        assert!(out.iter().all(Option::is_some));
        assert_eq!(out[10], Some(2.0));
    }

    #[test]
    fn test_hamming_kernel_is_normalized_and_symmetric() {
        let k = hamming_kernel(15);
        let total: f64 = k.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        for i in 0..15 {
            assert!((k[i] - k[14 - i]).abs() < 1e-12);
        }
        assert!(k[7] > k[0], "centre must carry the largest weight");
    }

    #[test]
    fn test_rolling_centered_truncates_edges() {
        let values: Vec<Option<f64>> = [1.0, 2.0, 3.0, 4.0, 5.0].iter().map(|v| Some(*v)).collect();
        let out = rolling_centered(&values, 3);
        assert_eq!(out[0], Some(1.5), "edge uses only the two available values");
        assert_eq!(out[2], Some(3.0));
        assert_eq!(out[4], Some(4.5));
    }

    #[test]
    fn test_rolling_centered_min_periods_and_fill() {
        // Window 7 needs 4 values; a 3-value series never reaches that, so
        // the fill step has nothing to copy from and everything stays null.
        let values = vec![Some(1.0), Some(2.0), Some(3.0)];
        assert!(rolling_centered(&values, 7).iter().all(Option::is_none));

        // With one interior gap the neighbours still qualify and fill it.
        let gappy = vec![Some(1.0), Some(1.0), None, Some(1.0), Some(1.0), Some(1.0), Some(1.0)];
        let out = rolling_centered(&gappy, 3);
        assert!(out.iter().all(|v| *v == Some(1.0)), "got {out:?}");
    }

    #[test]
    fn test_rolling_window_of_one_is_identity() {
        let values = vec![Some(1.0), None, Some(3.0)];
        assert_eq!(rolling_centered(&values, 1), values);
    }
}
