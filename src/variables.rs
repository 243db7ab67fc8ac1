/// Variable registry for the climate pipeline.
///
/// Defines the canonical column names every stage works with, the source
/// aliases each one may arrive under, the z-score columns derived during the
/// annual merge, and the default correlation variable list. This is the
/// single source of truth for column names; other modules should reference
/// entries from here rather than hardcoding source headers.

// ---------------------------------------------------------------------------
// Column aliases
// ---------------------------------------------------------------------------

/// A canonical column and the source headers it may appear under.
///
/// Matching is case-insensitive; aliases are tried in order.
#[derive(Debug)]
pub struct ColumnAlias {
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
}

pub static YEAR: ColumnAlias = ColumnAlias {
    canonical: "year",
    aliases: &["Year", "yr"],
};

pub static DAY_OF_YEAR: ColumnAlias = ColumnAlias {
    canonical: "dayOfYear",
    aliases: &["DayOfYear", "doy", "day_of_year"],
};

pub static EXTENT: ColumnAlias = ColumnAlias {
    canonical: "extent",
    aliases: &["Extent", "value"],
};

/// Fjord ice fraction. The smoothed fraction is preferred when a source
/// carries both.
pub static FRACTION: ColumnAlias = ColumnAlias {
    canonical: "frac",
    aliases: &["frac_smooth", "frac", "fraction", "value"],
};

pub static MONTH: ColumnAlias = ColumnAlias {
    canonical: "month",
    aliases: &["Month"],
};

pub static DAY: ColumnAlias = ColumnAlias {
    canonical: "day",
    aliases: &["Day"],
};

pub static ENTITY: ColumnAlias = ColumnAlias {
    canonical: "entity",
    aliases: &["Entity", "region"],
};

pub static EMISSIONS: ColumnAlias = ColumnAlias {
    canonical: "emissions_total",
    aliases: &["emissions_total", "emissions", "value"],
};

/// Column set of a daily series: year, day number and value.
#[derive(Debug)]
pub struct DailySchema {
    pub input: &'static str,
    pub year: &'static ColumnAlias,
    pub day_of_year: &'static ColumnAlias,
    pub value: &'static ColumnAlias,
}

pub static SEA_ICE_DAILY: DailySchema = DailySchema {
    input: "daily sea ice",
    year: &YEAR,
    day_of_year: &DAY_OF_YEAR,
    value: &EXTENT,
};

pub static FJORD_DAILY: DailySchema = DailySchema {
    input: "fjord daily",
    year: &YEAR,
    day_of_year: &DAY_OF_YEAR,
    value: &FRACTION,
};

// ---------------------------------------------------------------------------
// Derived annual metrics
// ---------------------------------------------------------------------------

/// Metric name of the yearly mean sea-ice extent.
pub const SEA_ICE_MEAN: &str = "SeaIceMean";

/// Metric name of the yearly mean emissions across entities.
pub const GLOBAL_CO2_MEAN: &str = "GlobalCO2Mean";

/// A z-score column added to the merged annual table.
#[derive(Debug)]
pub struct ZScoreSpec {
    pub source: &'static str,
    pub output: &'static str,
    /// Negate z so that a decline reads as a positive warming signal.
    pub inverted: bool,
}

pub static Z_SCORE_REGISTRY: &[ZScoreSpec] = &[
    ZScoreSpec {
        source: "64N-90N",
        output: "Arctic_z",
        inverted: false,
    },
    ZScoreSpec {
        source: SEA_ICE_MEAN,
        output: "SeaIce_z_inv",
        inverted: true,
    },
];

/// Variables of the correlation matrix unless configured otherwise.
pub static DEFAULT_CORRELATION_VARIABLES: &[&str] = &[
    "Glob",
    "NHem",
    "SHem",
    "64N-90N",
    SEA_ICE_MEAN,
    GLOBAL_CO2_MEAN,
];

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
