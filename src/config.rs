//! Pipeline settings.
//!
//! Settings come from three layers, later ones winning:
//! 1. Built-in defaults (the `Default` impls below).
//! 2. An optional TOML file.
//! 3. Environment variables (a `.env` file is honoured via `dotenv`).
//!
//! The environment layer reads through an injected lookup so callers and
//! tests decide where values come from.

use std::path::Path;

use serde::Deserialize;

use crate::model::{PipelineError, Result};
use crate::variables::DEFAULT_CORRELATION_VARIABLES;

// ---------------------------------------------------------------------------
// Environment variable names
// ---------------------------------------------------------------------------

pub const ENV_YR_MIN: &str = "SEAICE_YR_MIN";
pub const ENV_YR_MAX: &str = "SEAICE_YR_MAX";
pub const ENV_BASELINE_START: &str = "SEAICE_ANOM_BASELINE_START";
pub const ENV_BASELINE_END: &str = "SEAICE_ANOM_BASELINE_END";
pub const ENV_PRE_SMOOTH: &str = "SEAICE_SMOOTH_WINDOW";
pub const ENV_POST_SMOOTH: &str = "SEAICE_DECADAL_SMOOTH";
pub const ENV_FREEZE_THRESHOLD: &str = "FJORD_FREEZE_THRESHOLD";

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Daily observations outside `[yr_min, yr_max]` are dropped at ingest.
    pub yr_min: i32,
    pub yr_max: i32,
    /// Inclusive year range of the anomaly climatology.
    pub baseline_start: i32,
    pub baseline_end: i32,
    /// Rolling window applied within each year before anomalies.
    pub pre_smooth_window: usize,
    /// Circular window applied to each decade's anomaly curve.
    pub post_smooth_window: usize,
    pub freeze_threshold: f64,
    pub correlation_variables: Vec<String>,
    /// Decimal places of `GlobalCO2Mean`.
    pub co2_decimals: u32,
    pub fjord: FjordConfig,
    pub logging: LoggingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            yr_min: 1980,
            yr_max: 2100,
            baseline_start: 1981,
            baseline_end: 2010,
            pre_smooth_window: 7,
            post_smooth_window: 15,
            freeze_threshold: 0.15,
            correlation_variables: DEFAULT_CORRELATION_VARIABLES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            co2_decimals: 0,
            fjord: FjordConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Windows and cohorts of the fjord summaries. Days are on the 365-day
/// calendar; the defaults are 14-Feb..29-Jun (sunlit) and 1-Mar..31-May
/// (spring).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FjordConfig {
    pub sun_start: u16,
    pub sun_end: u16,
    pub spring_start: u16,
    pub spring_end: u16,
    pub early_years: Vec<i32>,
    pub late_years: Vec<i32>,
    pub fjord_area_km2: f64,
}

impl Default for FjordConfig {
    fn default() -> Self {
        Self {
            sun_start: 45,
            sun_end: 180,
            spring_start: 60,
            spring_end: 151,
            early_years: (2017..=2020).collect(),
            late_years: (2021..=2025).collect(),
            fjord_area_km2: 3450.0,
        }
    }
}

/// Logger settings used by the binary.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// debug, info, warning or error
    pub level: String,
    pub file: Option<String>,
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            timestamps: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl PipelineConfig {
    /// Parses TOML; absent keys keep their defaults. Not validated.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| PipelineError::Configuration(format!("invalid TOML: {e}")))
    }

    /// Defaults, then `path` if given, then the process environment.
    /// The result is validated.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = match path {
            Some(p) => {
                let text = std::fs::read_to_string(p).map_err(|e| {
                    PipelineError::Configuration(format!("cannot read {}: {e}", p.display()))
                })?;
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Overrides scalar settings from `lookup`. Unset names are ignored;
    /// a set but unparseable value is a `Configuration` error.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        override_from(&lookup, ENV_YR_MIN, &mut self.yr_min)?;
        override_from(&lookup, ENV_YR_MAX, &mut self.yr_max)?;
        override_from(&lookup, ENV_BASELINE_START, &mut self.baseline_start)?;
        override_from(&lookup, ENV_BASELINE_END, &mut self.baseline_end)?;
        override_from(&lookup, ENV_PRE_SMOOTH, &mut self.pre_smooth_window)?;
        override_from(&lookup, ENV_POST_SMOOTH, &mut self.post_smooth_window)?;
        override_from(&lookup, ENV_FREEZE_THRESHOLD, &mut self.freeze_threshold)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| -> Result<()> { Err(PipelineError::Configuration(msg)) };

        if self.yr_min > self.yr_max {
            return fail(format!("yr_min {} > yr_max {}", self.yr_min, self.yr_max));
        }
        if self.baseline_end < self.baseline_start {
            return fail(format!(
                "baseline ends ({}) before it starts ({})",
                self.baseline_end, self.baseline_start
            ));
        }
        if self.pre_smooth_window == 0 || self.post_smooth_window == 0 {
            return fail("smoothing windows must be at least 1".to_string());
        }
        if !self.freeze_threshold.is_finite() || self.freeze_threshold < 0.0 {
            return fail(format!("freeze_threshold {} is not a fraction", self.freeze_threshold));
        }
        self.fjord.validate()
    }
}

impl FjordConfig {
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| -> Result<()> { Err(PipelineError::Configuration(msg)) };

        for (name, start, end) in [
            ("sunlit", self.sun_start, self.sun_end),
            ("spring", self.spring_start, self.spring_end),
        ] {
            if start == 0 || end > crate::model::DAYS_IN_CALENDAR || start > end {
                return fail(format!("{name} window {start}..={end} is not within 1..=365"));
            }
        }
        if self.early_years.is_empty() || self.late_years.is_empty() {
            return fail("fjord cohorts must name at least one year each".to_string());
        }
        if !(self.fjord_area_km2.is_finite() && self.fjord_area_km2 > 0.0) {
            return fail(format!("fjord_area_km2 {} must be positive", self.fjord_area_km2));
        }
        Ok(())
    }
}

fn override_from<F, T>(lookup: &F, name: &str, slot: &mut T) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    if let Some(raw) = lookup(name) {
        *slot = raw
            .trim()
            .parse()
            .map_err(|_| PipelineError::Configuration(format!("{name}={raw:?} is not valid")))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
