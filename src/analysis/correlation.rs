//! Pearson correlation matrix over a fixed variable list.
//!
//! The matrix is emitted as flat `(row, col, value)` triples in row-major
//! order of the variable list, diagonal and both triangles included, so a
//! consumer can lay it out without further reshaping.

use crate::analysis::stats::mean;
use crate::logging::{self, Stage};
use crate::model::{AnnualRecord, CorrelationEntry, PipelineError};

/// Pearson coefficient of two equally long samples.
///
/// `None` with fewer than two pairs or when either side has zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mx = mean(xs)?;
    let my = mean(ys)?;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let (dx, dy) = (x - mx, y - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// Correlation of every ordered pair of `variables`.
///
/// Rows missing any selected variable are dropped first, so every pair is
/// computed over the same complete rows. With fewer than two complete rows
/// every entry is null. Otherwise self-pairs are exactly 1.0, even for a
/// constant variable, while an off-diagonal pair involving one is null.
/// `(a, b)` always equals `(b, a)`.
pub fn correlation_matrix(records: &[AnnualRecord], variables: &[String]) -> Vec<CorrelationEntry> {
    let complete: Vec<Vec<f64>> = records
        .iter()
        .filter_map(|r| variables.iter().map(|v| r.get(v)).collect::<Option<Vec<f64>>>())
        .collect();

    if complete.len() < 2 {
        logging::warn(
            Stage::Correlation,
            None,
            &PipelineError::InsufficientData {
                what: "correlation matrix".to_string(),
                needed: 2,
                got: complete.len(),
            }
            .to_string(),
        );
    }

    let columns: Vec<Vec<f64>> = (0..variables.len())
        .map(|j| complete.iter().map(|row| row[j]).collect())
        .collect();

    let k = variables.len();
    let mut values = vec![vec![None; k]; k];
    if complete.len() >= 2 {
        for i in 0..k {
            values[i][i] = Some(1.0);
            for j in (i + 1)..k {
                let r = pearson(&columns[i], &columns[j]);
                values[i][j] = r;
                values[j][i] = r;
            }
        }
    }

    let mut entries = Vec::with_capacity(k * k);
    for (i, row) in variables.iter().enumerate() {
        for (j, col) in variables.iter().enumerate() {
            entries.push(CorrelationEntry {
                row_label: row.clone(),
                col_label: col.clone(),
                value: values[i][j],
            });
        }
    }
    entries
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
