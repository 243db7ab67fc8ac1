//! Climate Pipeline Integration Tests
//!
//! End-to-end scenarios over synthetic batches: calendar normalization,
//! the annual merge, anomalies, correlation and the JSON output shape.
//! Everything runs in memory; no network or database is involved.

use climate_pipeline::analysis::anomaly::daily_anomalies;
use climate_pipeline::config::PipelineConfig;
use climate_pipeline::ingest::calendar::normalize_daily;
use climate_pipeline::model::{PipelineError, RawRow};
use climate_pipeline::pipeline::{self, ClimateBatch, PipelineInput, run_climate};
use climate_pipeline::variables::SEA_ICE_DAILY;
use serde_json::{Value, json};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn row(value: Value) -> RawRow {
    value.as_object().cloned().expect("fixture rows are objects")
}

/// One daily extent row per `(year, day)`; `value` decides the extent.
fn daily_rows(years: &[i32], days: u16, value: impl Fn(i32, u16) -> f64) -> Vec<RawRow> {
    years
        .iter()
        .flat_map(|&y| (1..=days).map(move |d| (y, d)))
        .map(|(y, d)| row(json!({"Year": y, "DayOfYear": d, "Extent": value(y, d)})))
        .collect()
}

fn temperature(years: &[i32]) -> Vec<RawRow> {
    years
        .iter()
        .map(|&y| {
            let t = f64::from(y - 1979) * 0.02;
            row(json!({
                "Year": y,
                "Glob": t,
                "NHem": t * 1.2,
                "SHem": t * 0.8 + if y % 2 == 0 { 0.01 } else { -0.01 },
                "64N-90N": t * 3.0 + if y % 3 == 0 { 0.05 } else { 0.0 },
            }))
        })
        .collect()
}

fn emissions(years: &[i32]) -> Vec<RawRow> {
    years
        .iter()
        .flat_map(|&y| {
            let base = f64::from(y - 1970);
            vec![
                row(json!({"Entity": "China", "Year": y, "emissions_total": base * 2.0})),
                row(json!({"Entity": "United States", "Year": y, "emissions_total": base + 1.0})),
            ]
        })
        .collect()
}

/// A config whose baseline covers the given years and that does no
/// in-year smoothing.
fn config(baseline: (i32, i32)) -> PipelineConfig {
    PipelineConfig {
        baseline_start: baseline.0,
        baseline_end: baseline.1,
        pre_smooth_window: 1,
        ..PipelineConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Anomaly scenarios
// ---------------------------------------------------------------------------

#[test]
fn test_single_day_offset_appears_only_on_that_day() {
    let rows = daily_rows(&[2001, 2002], 365, |y, d| if y == 2002 && d == 100 { 6.0 } else { 5.0 });
    let obs = normalize_daily(&rows, &SEA_ICE_DAILY, 1980, 2100).unwrap();
    let anomalies = daily_anomalies(&obs, 2001, 2001, 1).unwrap();

    assert_eq!(anomalies.len(), 730);
    for a in &anomalies {
        let expected = if a.year == 2002 && a.day == 100 { 1.0 } else { 0.0 };
        assert_eq!(a.anomaly, Some(expected), "year {} day {}", a.year, a.day);
    }
}

#[test]
fn test_default_presmoothing_spreads_the_offset_around_its_day() {
    let rows = daily_rows(&[2001, 2002], 365, |y, d| if y == 2002 && d == 100 { 6.0 } else { 5.0 });
    let obs = normalize_daily(&rows, &SEA_ICE_DAILY, 1980, 2100).unwrap();
    let anomalies = daily_anomalies(&obs, 2001, 2001, 7).unwrap();

    let test_year: Vec<_> = anomalies.iter().filter(|a| a.year == 2002).collect();
    for a in &test_year {
        let v = a.anomaly.expect("every day has a baseline");
        if (97..=103).contains(&a.day) {
            assert!((v - 1.0 / 7.0).abs() < 1e-9, "day {} got {v}", a.day);
        } else {
            assert!(v.abs() < 1e-9, "day {} should be flat, got {v}", a.day);
        }
    }
}

#[test]
fn test_pipeline_anomaly_outputs() {
    let batch = ClimateBatch {
        temperature: temperature(&[2001, 2002]),
        sea_ice_daily: daily_rows(&[2001, 2002], 365, |y, d| {
            if y == 2002 && d == 100 { 6.0 } else { 5.0 }
        }),
        ..ClimateBatch::default()
    };
    let out = run_climate(&batch, &config((2001, 2001))).unwrap();

    assert_eq!(out.annual_anomaly.len(), 2);
    assert_eq!(out.annual_anomaly[0].anomaly, 0.0);
    assert!((out.annual_anomaly[1].anomaly - 1.0 / 365.0).abs() < 1e-12);

    // Both years fall in the 2000s: one curve of 365 smoothed days.
    assert_eq!(out.decadal_anomaly.len(), 365);
    assert!(out.decadal_anomaly.iter().all(|d| d.decade == "2000s"));
    let peak = out
        .decadal_anomaly
        .iter()
        .max_by(|a, b| a.anomaly.unwrap().total_cmp(&b.anomaly.unwrap()))
        .unwrap();
    assert_eq!(peak.day, 100);
    assert_eq!(out.decadal_anomaly[0].anomaly, Some(0.0));
    assert_eq!(out.decadal_anomaly[99].n, Some(2));
}

#[test]
fn test_years_outside_baseline_still_get_anomalies() {
    let batch = ClimateBatch {
        sea_ice_daily: daily_rows(&[1985, 2015], 365, |y, _| if y == 2015 { 4.0 } else { 5.0 }),
        ..ClimateBatch::default()
    };
    let out = run_climate(&batch, &config((1981, 1990))).unwrap();
    let years: Vec<i32> = out.annual_anomaly.iter().map(|a| a.year).collect();
    assert_eq!(years, vec![1985, 2015]);
    assert_eq!(out.annual_anomaly[1].anomaly, -1.0);
    let decades: std::collections::BTreeSet<&str> =
        out.decadal_anomaly.iter().map(|d| d.decade.as_str()).collect();
    assert_eq!(decades.into_iter().collect::<Vec<_>>(), vec!["1980s", "2010s"]);
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

#[test]
fn test_leap_year_is_folded_onto_365_days() {
    let batch = ClimateBatch {
        sea_ice_daily: daily_rows(&[2004], 366, |_, d| f64::from(d)),
        ..ClimateBatch::default()
    };
    let out = run_climate(&batch, &config((2004, 2004))).unwrap();
    let days: Vec<u16> = out.daily_sea_ice.iter().map(|o| o.day_of_year).collect();
    assert_eq!(days.len(), 365);
    assert_eq!(days, (1..=365).collect::<Vec<u16>>());
    // Raw ordinal 61 is 1 March, which is reference day 60.
    assert_eq!(out.daily_sea_ice[59].value, Some(61.0));
    assert!(out.partial_year.is_empty(), "a folded leap year is complete");
}

#[test]
fn test_partial_latest_year_is_reported() {
    let mut rows = daily_rows(&[2019], 365, |_, _| 10.0);
    rows.extend(daily_rows(&[2020], 31, |_, _| 11.0));
    let batch = ClimateBatch {
        sea_ice_daily: rows,
        ..ClimateBatch::default()
    };
    let out = run_climate(&batch, &config((2019, 2019))).unwrap();
    assert_eq!(out.partial_year.len(), 31);
    assert_eq!(out.iqr_stats.len(), 365);
    let jan1 = &out.iqr_stats[0];
    assert_eq!((jan1.min, jan1.q25, jan1.q75, jan1.mean), (10.0, 10.25, 10.75, 10.5));
}

#[test]
fn test_year_range_filters_daily_rows() {
    let batch = ClimateBatch {
        sea_ice_daily: daily_rows(&[1978, 1980], 10, |_, _| 1.0),
        ..ClimateBatch::default()
    };
    let out = run_climate(&batch, &config((1980, 1980))).unwrap();
    assert!(out.daily_sea_ice.iter().all(|o| o.year == 1980));
}

// ---------------------------------------------------------------------------
// Annual merge and correlation
// ---------------------------------------------------------------------------

#[test]
fn test_annual_merge_join_semantics() {
    let batch = ClimateBatch {
        temperature: temperature(&[1979, 1980, 1981, 1982]),
        sea_ice_daily: daily_rows(&[1980, 1981, 1982], 30, |y, _| 20.0 - f64::from(y - 1980)),
        emissions: emissions(&[1980, 1981]),
        ..ClimateBatch::default()
    };
    let out = run_climate(&batch, &config((1980, 1981))).unwrap();

    let years: Vec<i32> = out.annual.iter().map(|r| r.year).collect();
    assert_eq!(years, vec![1980, 1981, 1982], "1979 has no sea ice and is dropped");

    let y1980 = &out.annual[0];
    assert_eq!(y1980.get("SeaIceMean"), Some(20.0));
    // (20 + 11) / 2 = 15.5, rounded to an integer.
    assert_eq!(y1980.get("GlobalCO2Mean"), Some(16.0));
    assert_eq!(y1980.get("China"), Some(20.0));

    let y1982 = &out.annual[2];
    assert!(y1982.metrics.contains_key("GlobalCO2Mean"));
    assert_eq!(y1982.get("GlobalCO2Mean"), None, "left join keeps the year with null");
    assert_eq!(y1982.get("United States"), None);

    assert!(out.annual.iter().all(|r| r.get("Arctic_z").is_some()));
    // Sea ice declines, so the inverted score rises.
    let z: Vec<f64> = out.annual.iter().map(|r| r.get("SeaIce_z_inv").unwrap()).collect();
    assert!(z[0] < z[1] && z[1] < z[2], "got {z:?}");
}

#[test]
fn test_correlation_matrix_from_pipeline() {
    let years: Vec<i32> = (1980..=1990).collect();
    let batch = ClimateBatch {
        temperature: temperature(&years),
        sea_ice_daily: daily_rows(&years, 20, |y, d| 15.0 - f64::from(y - 1980) * 0.1 + f64::from(d) * 0.01),
        emissions: emissions(&years),
        ..ClimateBatch::default()
    };
    let cfg = config((1980, 1985));
    let out = run_climate(&batch, &cfg).unwrap();

    let k = cfg.correlation_variables.len();
    assert_eq!(out.corr_matrix.len(), k * k);
    for e in &out.corr_matrix {
        let mirror = out
            .corr_matrix
            .iter()
            .find(|m| m.row_label == e.col_label && m.col_label == e.row_label)
            .unwrap();
        assert_eq!(e.value, mirror.value);
        if e.row_label == e.col_label {
            assert_eq!(e.value, Some(1.0));
        } else {
            let r = e.value.expect("all inputs vary");
            assert!((-1.0..=1.0).contains(&r));
        }
    }
}

// ---------------------------------------------------------------------------
// Structural errors
// ---------------------------------------------------------------------------

#[test]
fn test_duplicate_entity_year_aborts_run() {
    let mut rows = emissions(&[1980]);
    rows.push(row(json!({"Entity": "China", "Year": 1980, "emissions_total": 1.0})));
    let batch = ClimateBatch {
        emissions: rows,
        ..ClimateBatch::default()
    };
    let err = run_climate(&batch, &PipelineConfig::default()).unwrap_err();
    assert!(matches!(err, PipelineError::DuplicateKey { .. }), "got {err:?}");
}

#[test]
fn test_unresolvable_column_is_schema_error() {
    let batch = ClimateBatch {
        sea_ice_daily: vec![row(json!({"Year": 1990, "DayOfYear": 1, "area": 3.0}))],
        ..ClimateBatch::default()
    };
    match run_climate(&batch, &PipelineConfig::default()).unwrap_err() {
        PipelineError::Schema { input, .. } => assert_eq!(input, "daily sea ice"),
        other => panic!("expected Schema, got {other:?}"),
    }
}

#[test]
fn test_column_aliases_are_case_insensitive() {
    let batch = ClimateBatch {
        sea_ice_daily: vec![
            row(json!({"year": 1990, "doy": 1, "VALUE": 3.0})),
            row(json!({"year": 1990, "doy": 2, "VALUE": 4.0})),
        ],
        ..ClimateBatch::default()
    };
    let out = run_climate(&batch, &config((1990, 1990))).unwrap();
    assert_eq!(out.daily_sea_ice.len(), 2);
}

// ---------------------------------------------------------------------------
// Sheet input and JSON shape
// ---------------------------------------------------------------------------

#[test]
fn test_sheet_layout_is_used_when_no_daily_rows() {
    let batch = ClimateBatch {
        sea_ice_sheet: vec![
            row(json!({"Month": "January", "Day": 1, "1990": 14.0, "1991": 13.0})),
            row(json!({"Month": null, "Day": 2, "1990": 14.2, "1991": 13.2})),
        ],
        ..ClimateBatch::default()
    };
    let out = run_climate(&batch, &config((1990, 1990))).unwrap();
    assert_eq!(out.daily_sea_ice.len(), 4);
    assert_eq!(out.daily_sea_ice[1].day_of_year, 2);
    assert_eq!(out.daily_sea_ice[1].value, Some(14.2));
}

#[test]
fn test_output_json_shape() {
    let input: PipelineInput = serde_json::from_value(json!({
        "temperature": [{"Year": 1990, "Glob": 0.4}],
        "seaIceDaily": [{"Year": 1990, "DayOfYear": 1, "Extent": 14.0}],
        "emissions": []
    }))
    .unwrap();
    let out = pipeline::run(&input, &config((1990, 1990))).unwrap();
    let json = serde_json::to_value(&out).unwrap();

    assert!(json.get("fjord").is_none(), "no fjord rows, no fjord section");
    let climate = &json["climate"];
    for key in [
        "annual",
        "dailySeaIce",
        "annualAnomaly",
        "decadalAnomaly",
        "corrMatrix",
        "iqrStats",
        "partialYear",
    ] {
        assert!(climate.get(key).is_some(), "missing output {key}");
    }
    assert_eq!(climate["annual"][0]["year"], 1990);
    assert_eq!(climate["annual"][0]["SeaIceMean"], 14.0);
    assert!(climate["annual"][0]["GlobalCO2Mean"].is_null());
    assert_eq!(climate["dailySeaIce"][0]["dayOfYear"], 1);
    assert_eq!(climate["corrMatrix"][0]["rowLabel"], "Glob");
}
