//! Fjord ice-fraction summaries.
//!
//! Works on a single fjord's daily ice-fraction record, already normalized
//! onto the 365-day calendar by `ingest::calendar`.
//!
//! Submodules:
//! - `season`:  early/late cohort bands and the season loss percentage.
//! - `freeze`:  first/last day at or above the freeze threshold.
//! - `metrics`: spring anomaly, sunlit mean fraction, daily rows.

pub mod freeze;
pub mod metrics;
pub mod season;
