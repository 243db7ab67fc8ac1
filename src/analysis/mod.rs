//! Statistical transforms for the climate pipeline.
//!
//! Every function here is pure: it takes already-normalized records and
//! returns new ones. Nothing reads from or writes to storage.
//!
//! Submodules:
//! - `stats`:       mean, sample sd, linear quantiles, rounding.
//! - `aggregate`:   grouped order statistics and explicit yearly means.
//! - `align`:       year-keyed inner/left joins of annual series.
//! - `smoothing`:   in-year rolling mean and circular Hamming smoothing.
//! - `anomaly`:     climatology, daily/annual/decadal anomalies, z-scores.
//! - `correlation`: Pearson matrix as flat triples.

pub mod aggregate;
pub mod align;
pub mod anomaly;
pub mod correlation;
pub mod smoothing;
pub mod stats;
