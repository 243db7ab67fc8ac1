//! One batch run, from raw rows to named outputs.
//!
//! `run_climate` and `run_fjord` are independent: each takes a complete
//! snapshot of rows plus settings and returns every output it owns. Nothing
//! is cached between runs and nothing here performs I/O.
//!
//! Structural errors (unresolvable columns, duplicate keys, bad settings)
//! abort the run. Outputs that merely lack data degrade to empty and are
//! logged.

use serde::{Deserialize, Serialize};

use crate::analysis::aggregate::{annual_sea_ice_mean, global_emissions_mean, iqr_by_day};
use crate::analysis::align::align_series;
use crate::analysis::anomaly::{annual_anomalies, daily_anomalies, decadal_anomalies, with_z_score};
use crate::analysis::correlation::correlation_matrix;
use crate::config::PipelineConfig;
use crate::fjord::freeze::freeze_breakup_by_year;
use crate::fjord::metrics::{daily_rows, mean_fractions, spring_anomalies};
use crate::fjord::season::{merge_seasons, season_band};
use crate::ingest::calendar::normalize_daily;
use crate::ingest::reshape::{annual_table, pivot_entities, sea_ice_sheet_to_daily};
use crate::logging::{self, Stage};
use crate::model::{
    AnnualAnomaly, AnnualRecord, AnnualSeries, CorrelationEntry, DAYS_IN_CALENDAR, DecadalAnomaly,
    FjordDailyRow, FjordSeasonRow, FreezeBreakup, IqrStats, JoinMode, MeanFraction, Observation,
    RawRow, Result, SpringAnomaly,
};
use crate::variables::{FJORD_DAILY, SEA_ICE_DAILY, Z_SCORE_REGISTRY};

const TEMPERATURE_INPUT: &str = "temperature";
const EMISSIONS_INPUT: &str = "emissions";
const ENTITY_INPUT: &str = "emissions by entity";

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// Raw rows of every climate source for one run.
///
/// `sea_ice_sheet` is the wide `{Month, Day, <year>...}` layout; it is only
/// read when `sea_ice_daily` is empty.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClimateBatch {
    #[serde(default)]
    pub temperature: Vec<RawRow>,
    #[serde(default)]
    pub sea_ice_daily: Vec<RawRow>,
    #[serde(default)]
    pub sea_ice_sheet: Vec<RawRow>,
    #[serde(default)]
    pub emissions: Vec<RawRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClimateOutputs {
    pub annual: Vec<AnnualRecord>,
    pub daily_sea_ice: Vec<Observation>,
    pub annual_anomaly: Vec<AnnualAnomaly>,
    pub decadal_anomaly: Vec<DecadalAnomaly>,
    pub corr_matrix: Vec<CorrelationEntry>,
    pub iqr_stats: Vec<IqrStats>,
    pub partial_year: Vec<Observation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FjordBundle {
    pub spring: Vec<SpringAnomaly>,
    pub season: Vec<FjordSeasonRow>,
    pub frac: Vec<MeanFraction>,
    pub freeze: Vec<FreezeBreakup>,
    pub daily: Vec<FjordDailyRow>,
    pub season_loss_pct: Option<f64>,
}

/// Everything the binary reads: the climate sources plus an optional fjord
/// record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineInput {
    #[serde(flatten)]
    pub climate: ClimateBatch,
    #[serde(default)]
    pub fjord_daily: Option<Vec<RawRow>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutput {
    pub climate: ClimateOutputs,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fjord: Option<FjordBundle>,
}

// ---------------------------------------------------------------------------
// Climate run
// ---------------------------------------------------------------------------

const CLIMATE_OUTPUTS: usize = 7;

/// Runs every climate output for one batch.
pub fn run_climate(batch: &ClimateBatch, config: &PipelineConfig) -> Result<ClimateOutputs> {
    config.validate()?;
    logging::info(
        Stage::System,
        None,
        &format!(
            "climate run: {} temperature rows, {} daily rows, {} sheet rows, {} emission rows",
            batch.temperature.len(),
            batch.sea_ice_daily.len(),
            batch.sea_ice_sheet.len(),
            batch.emissions.len()
        ),
    );

    let daily = normalize_daily(
        &sea_ice_rows(batch)?,
        &SEA_ICE_DAILY,
        config.yr_min,
        config.yr_max,
    )?;

    let annual = merge_annual(batch, &daily, config)?;

    let anomalies = daily_anomalies(
        &daily,
        config.baseline_start,
        config.baseline_end,
        config.pre_smooth_window,
    )?;
    let annual_anomaly = annual_anomalies(&anomalies);

    let mut degraded = 0;
    logging::debug(
        Stage::Smoothing,
        None,
        &format!("decadal curves use a {}-day circular window", config.post_smooth_window),
    );
    let decadal_anomaly = match decadal_anomalies(&anomalies, config.post_smooth_window) {
        Ok(rows) => rows,
        Err(err) => {
            logging::log_degraded(Stage::Anomaly, None, "decadalAnomaly", &err);
            degraded += 1;
            Vec::new()
        }
    };

    let corr_matrix = correlation_matrix(&annual, &config.correlation_variables);
    let iqr_stats = iqr_by_day(&daily);
    let partial_year = partial_year(&daily);

    let outputs = ClimateOutputs {
        annual,
        daily_sea_ice: daily,
        annual_anomaly,
        decadal_anomaly,
        corr_matrix,
        iqr_stats,
        partial_year,
    };
    logging::log_run_summary(Stage::System, CLIMATE_OUTPUTS, CLIMATE_OUTPUTS - degraded, degraded);
    Ok(outputs)
}

fn sea_ice_rows(batch: &ClimateBatch) -> Result<Vec<RawRow>> {
    if !batch.sea_ice_daily.is_empty() {
        if !batch.sea_ice_sheet.is_empty() {
            logging::warn(
                Stage::Ingest,
                Some(SEA_ICE_DAILY.input),
                "both daily rows and a sheet were supplied; the sheet is ignored",
            );
        }
        return Ok(batch.sea_ice_daily.clone());
    }
    sea_ice_sheet_to_daily(&batch.sea_ice_sheet)
}

/// Temperature ⋈inner SeaIceMean ⋈left GlobalCO2Mean ⋈left per-entity
/// emissions, then the registered z-score columns.
fn merge_annual(
    batch: &ClimateBatch,
    daily: &[Observation],
    config: &PipelineConfig,
) -> Result<Vec<AnnualRecord>> {
    let temperature = annual_table(&batch.temperature, TEMPERATURE_INPUT)?;
    let sea_ice = annual_sea_ice_mean(daily);
    let co2 = global_emissions_mean(&batch.emissions, EMISSIONS_INPUT, config.co2_decimals)?;
    let entities = pivot_entities(&batch.emissions, ENTITY_INPUT)?;

    let temp_ice = AnnualSeries::new(
        TEMPERATURE_INPUT,
        align_series(&temperature, &[&sea_ice], JoinMode::Inner)?,
    );
    let mut annual = align_series(&temp_ice, &[&co2, &entities], JoinMode::Left)?;

    for spec in Z_SCORE_REGISTRY {
        if annual.iter().any(|r| r.metrics.contains_key(spec.source)) {
            annual = with_z_score(&annual, spec.source, spec.output, spec.inverted);
        }
    }
    Ok(annual)
}

/// Observations of the latest year when that year is not yet complete.
pub fn partial_year(daily: &[Observation]) -> Vec<Observation> {
    let Some(latest) = daily.iter().map(|o| o.year).max() else {
        return Vec::new();
    };
    let current: Vec<Observation> = daily.iter().filter(|o| o.year == latest).cloned().collect();
    if current.len() < usize::from(DAYS_IN_CALENDAR) {
        current
    } else {
        Vec::new()
    }
}

// ---------------------------------------------------------------------------
// Fjord run
// ---------------------------------------------------------------------------

/// Runs every fjord output for one daily ice-fraction record.
pub fn run_fjord(rows: &[RawRow], config: &PipelineConfig) -> Result<FjordBundle> {
    config.validate()?;
    let f = &config.fjord;
    let daily = normalize_daily(rows, &FJORD_DAILY, config.yr_min, config.yr_max)?;
    if daily.is_empty() {
        logging::warn(Stage::Fjord, Some(FJORD_DAILY.input), "no usable fjord rows");
    }

    let early = season_band(&daily, &f.early_years, f.sun_start, f.sun_end);
    let late = season_band(&daily, &f.late_years, f.sun_start, f.sun_end);
    let comparison = merge_seasons(&early, &late);

    let bundle = FjordBundle {
        spring: spring_anomalies(&daily, f.spring_start, f.spring_end, &f.early_years, f.fjord_area_km2),
        season: comparison.rows,
        frac: mean_fractions(&daily, f.sun_start, f.sun_end),
        freeze: freeze_breakup_by_year(&daily, config.freeze_threshold),
        daily: daily_rows(&daily),
        season_loss_pct: comparison.season_loss_pct,
    };

    logging::info(
        Stage::Fjord,
        Some(FJORD_DAILY.input),
        &format!(
            "{} days, {} season rows, {} years with freeze dates",
            bundle.daily.len(),
            bundle.season.len(),
            bundle.freeze.iter().filter(|fb| fb.freeze_doy.is_some()).count()
        ),
    );
    Ok(bundle)
}

/// Climate outputs plus fjord outputs when a fjord record was supplied.
pub fn run(input: &PipelineInput, config: &PipelineConfig) -> Result<PipelineOutput> {
    let climate = run_climate(&input.climate, config)?;
    let fjord = input
        .fjord_daily
        .as_deref()
        .map(|rows| run_fjord(rows, config))
        .transpose()?;
    Ok(PipelineOutput { climate, fjord })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn obs(year: i32, day: u16) -> Observation {
        Observation {
            year,
            day_of_year: day,
            date: NaiveDate::from_yo_opt(year, u32::from(day)).unwrap(),
            value: Some(1.0),
        }
    }

    #[test]
    fn test_partial_year_is_latest_incomplete_year() {
        let mut daily: Vec<Observation> = (1..=365).map(|d| obs(2022, d)).collect();
        daily.extend((1..=40).map(|d| obs(2023, d)));
        let partial = partial_year(&daily);
        assert_eq!(partial.len(), 40);
        assert!(partial.iter().all(|o| o.year == 2023));
    }

    #[test]
    fn test_complete_latest_year_is_not_partial() {
        let daily: Vec<Observation> = (1..=365).map(|d| obs(2022, d)).collect();
        assert!(partial_year(&daily).is_empty());
        assert!(partial_year(&[]).is_empty());
    }

    #[test]
    fn test_empty_batch_gives_empty_outputs() {
        let out = run_climate(&ClimateBatch::default(), &PipelineConfig::default()).unwrap();
        assert!(out.annual.is_empty());
        assert!(out.daily_sea_ice.is_empty());
        assert!(out.decadal_anomaly.is_empty(), "decadal degrades to empty");
        assert!(out.corr_matrix.iter().all(|e| e.value.is_none()));
    }

    #[test]
    fn test_invalid_config_aborts_run() {
        let mut config = PipelineConfig::default();
        config.yr_min = 2030;
        config.yr_max = 2000;
        assert!(run_climate(&ClimateBatch::default(), &config).is_err());
        assert!(run_fjord(&[], &config).is_err());
    }

    #[test]
    fn test_input_file_shape() {
        let input: PipelineInput = serde_json::from_str(
            r#"{"temperature": [{"Year": 1990, "Glob": 0.4}], "seaIceDaily": [], "emissions": []}"#,
        )
        .unwrap();
        assert_eq!(input.climate.temperature.len(), 1);
        assert!(input.climate.sea_ice_sheet.is_empty());
        assert!(input.fjord_daily.is_none());
    }
}
