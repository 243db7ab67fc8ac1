/// Core data types for the climate statistics pipeline.
///
/// This module defines the shared domain model imported by all other modules:
/// the raw row shape handed over by ingestion, the immutable value records
/// produced by each stage, and the error taxonomy. It contains no logic
/// beyond small accessors.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Calendar constants
// ---------------------------------------------------------------------------

/// Number of days in the reference calendar (Feb-29 elided).
pub const DAYS_IN_CALENDAR: u16 = 365;

/// Fixed non-leap year used to re-express dates on the 365-day calendar.
pub const REFERENCE_YEAR: i32 = 2001;

// ---------------------------------------------------------------------------
// Input rows
// ---------------------------------------------------------------------------

/// A flat source row as delivered by the ingestion collaborator.
///
/// Column names are source-specific; `ingest::columns` resolves them against
/// the alias tables in `variables` before any arithmetic happens.
pub type RawRow = serde_json::Map<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// Daily observations
// ---------------------------------------------------------------------------

/// A single daily value placed on the 365-day reference calendar.
///
/// `date` is the real calendar date the value was observed on; `day_of_year`
/// is that date re-expressed against `REFERENCE_YEAR`, so it is always in
/// `1..=365` and never refers to a leap day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub year: i32,
    pub day_of_year: u16,
    pub date: NaiveDate,
    pub value: Option<f64>,
}

// ---------------------------------------------------------------------------
// Annual records
// ---------------------------------------------------------------------------

/// One row per year carrying any number of named metrics.
///
/// Serializes flat: `{"year": 1990, "Glob": 0.45, "SeaIceMean": 12.1, ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualRecord {
    pub year: i32,
    #[serde(flatten)]
    pub metrics: BTreeMap<String, Option<f64>>,
}

impl AnnualRecord {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            metrics: BTreeMap::new(),
        }
    }

    /// Value of a metric, `None` when absent or null.
    pub fn get(&self, metric: &str) -> Option<f64> {
        self.metrics.get(metric).copied().flatten()
    }

    pub fn with(mut self, metric: &str, value: Option<f64>) -> Self {
        self.metrics.insert(metric.to_string(), value);
        self
    }
}

/// A named annual series, e.g. the temperature table or the yearly sea-ice
/// mean. `label` identifies the input in error messages.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnualSeries {
    pub label: String,
    pub records: Vec<AnnualRecord>,
}

impl AnnualSeries {
    pub fn new(label: &str, records: Vec<AnnualRecord>) -> Self {
        Self {
            label: label.to_string(),
            records,
        }
    }

    /// Union of metric names over all records, in sorted order.
    pub fn metric_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .records
            .iter()
            .flat_map(|r| r.metrics.keys().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

/// Join semantics for `analysis::align::align_series`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMode {
    /// Keep only years present in every input.
    Inner,
    /// Keep every year of the primary input; absent values become null.
    Left,
}

// ---------------------------------------------------------------------------
// Derived series
// ---------------------------------------------------------------------------

/// Baseline-relative anomaly for one observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAnomaly {
    pub year: i32,
    pub day: u16,
    /// Pre-smoothed observation value.
    pub value: Option<f64>,
    pub climatology: Option<f64>,
    pub anomaly: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnualAnomaly {
    pub year: i32,
    pub anomaly: f64,
}

/// One point of a decade's smoothed seasonal anomaly curve.
///
/// Every decade carries all 365 days; `sd` and `n` are null for days that
/// had no observations before smoothing filled them in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecadalAnomaly {
    pub decade: String,
    pub day: u16,
    pub anomaly: Option<f64>,
    pub sd: Option<f64>,
    pub n: Option<usize>,
}

/// Order statistics of one group.
///
/// `sd` is the sample standard deviation and is null for single-member
/// groups. Groups with zero members are never materialised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupStats {
    pub min: f64,
    pub p25: f64,
    pub p75: f64,
    pub max: f64,
    pub mean: f64,
    pub sd: Option<f64>,
    pub count: usize,
}

/// Inter-quartile band of daily extent for one day-of-year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IqrStats {
    pub day_of_year: u16,
    pub min: f64,
    pub q25: f64,
    pub q75: f64,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationEntry {
    pub row_label: String,
    pub col_label: String,
    pub value: Option<f64>,
}

// ---------------------------------------------------------------------------
// Fjord records
// ---------------------------------------------------------------------------

/// Early and late cohort statistics for one calendar day, side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FjordSeasonRow {
    pub doy: u16,
    /// Calendar label on the reference year, e.g. `"14-Feb"`.
    pub day: String,
    #[serde(rename = "eMean")]
    pub early_mean: Option<f64>,
    #[serde(rename = "e25")]
    pub early_p25: Option<f64>,
    #[serde(rename = "e75")]
    pub early_p75: Option<f64>,
    #[serde(rename = "lMean")]
    pub late_mean: Option<f64>,
    #[serde(rename = "l25")]
    pub late_p25: Option<f64>,
    #[serde(rename = "l75")]
    pub late_p75: Option<f64>,
}

/// One day of the fjord ice-fraction record as served to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FjordDailyRow {
    pub date: NaiveDate,
    pub year: i32,
    pub doy: u16,
    pub frac: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreezeBreakup {
    pub year: i32,
    pub freeze_doy: Option<u16>,
    pub breakup_doy: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpringAnomaly {
    pub year: i32,
    pub anomaly: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanFraction {
    pub year: i32,
    pub mean: Option<f64>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised by the pipeline.
///
/// `Schema`, `DuplicateKey` and `Configuration` are structural and abort the
/// affected output. `InsufficientData` is normally absorbed into a null
/// field; it only surfaces as an `Err` from stages whose whole output is
/// undefined without data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// A required column could not be resolved under any alias.
    #[error("Schema error in {input}: column '{column}' not found (tried {aliases})")]
    Schema {
        input: String,
        column: String,
        aliases: String,
    },

    /// A key that must be unique appeared more than once.
    #[error("Duplicate key in {input}: {key}")]
    DuplicateKey { input: String, key: String },

    /// A statistic needs more observations than were available.
    #[error("Insufficient data for {what}: need at least {needed}, got {got}")]
    InsufficientData {
        what: String,
        needed: usize,
        got: usize,
    },

    /// A configuration value makes a window or bound invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
