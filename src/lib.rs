//! Climate statistics pipeline.
//!
//! Turns raw climate rows (annual temperature anomalies, daily sea-ice
//! extent, CO₂ emissions, fjord ice fractions) into the derived series a
//! dashboard renders: a merged annual table with z-scores, a correlation
//! matrix, inter-quartile bands, annual and decadal anomalies, and fjord
//! season summaries.
//!
//! Data flow: `ingest` (alias resolution, reshape, calendar) → `analysis`
//! (align, anomaly, aggregate, correlation) and `fjord`, orchestrated by
//! `pipeline`.

pub mod analysis;
pub mod config;
pub mod fjord;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod variables;
