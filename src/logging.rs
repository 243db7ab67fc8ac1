/// Structured logging for the climate statistics pipeline
///
/// Provides context-rich logging tagged with the pipeline stage and an
/// optional series key (input name, decade, year), with timestamps and
/// severity levels. Supports both console output and file-based logging
/// for scheduled runs.
///
/// Logging before `init_logger` is called is a silent no-op, so library
/// callers that never initialise a logger pay nothing.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use crate::model::PipelineError;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline Stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ingest,
    Calendar,
    Align,
    Anomaly,
    Smoothing,
    Aggregate,
    Correlation,
    Fjord,
    System,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Ingest => write!(f, "INGEST"),
            Stage::Calendar => write!(f, "CAL"),
            Stage::Align => write!(f, "ALIGN"),
            Stage::Anomaly => write!(f, "ANOM"),
            Stage::Smoothing => write!(f, "SMOOTH"),
            Stage::Aggregate => write!(f, "AGG"),
            Stage::Correlation => write!(f, "CORR"),
            Stage::Fjord => write!(f, "FJORD"),
            Stage::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected degradation - the batch simply lacks data for this output
    Expected,
    /// Unexpected failure - malformed input or configuration
    Unexpected,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn log(&self, level: LogLevel, stage: Stage, key: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");

        let key_part = key.map(|k| format!(" [{}]", k)).unwrap_or_default();
        let log_entry = format!("{} {} {}{}: {}", timestamp, level, stage, key_part, message);

        // Console output goes to stderr; stdout carries the JSON result.
        if self.console_timestamps {
            eprintln!("{}", log_entry);
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", stage, key_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", stage, key_part, message),
                LogLevel::Info => eprintln!("   {}", message),
                LogLevel::Debug => eprintln!("   [DEBUG] {}{}: {}", stage, key_part, message),
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn emit(level: LogLevel, stage: Stage, key: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, stage, key, message);
        }
    }
}

/// Log a general informational message
pub fn info(stage: Stage, key: Option<&str>, message: &str) {
    emit(LogLevel::Info, stage, key, message);
}

/// Log a warning message
pub fn warn(stage: Stage, key: Option<&str>, message: &str) {
    emit(LogLevel::Warning, stage, key, message);
}

/// Log an error message
pub fn error(stage: Stage, key: Option<&str>, message: &str) {
    emit(LogLevel::Error, stage, key, message);
}

/// Log a debug message
pub fn debug(stage: Stage, key: Option<&str>, message: &str) {
    emit(LogLevel::Debug, stage, key, message);
}

// ---------------------------------------------------------------------------
// Degradation Logging
// ---------------------------------------------------------------------------

/// Classify a pipeline error: missing data is routine, anything structural
/// points at bad input or settings.
pub fn classify_failure(err: &PipelineError) -> FailureType {
    match err {
        PipelineError::InsufficientData { .. } => FailureType::Expected,
        PipelineError::Schema { .. }
        | PipelineError::DuplicateKey { .. }
        | PipelineError::Configuration(_) => FailureType::Unexpected,
    }
}

/// Log an output that degraded to empty, at a level matching its cause.
///
/// Even expected degradations are logged as warnings: the caller receives an
/// empty series and should be able to see why.
pub fn log_degraded(stage: Stage, key: Option<&str>, output: &str, err: &PipelineError) {
    let failure_type = classify_failure(err);
    let message = format!("{} degraded to empty [{}]: {}", output, failure_type, err);

    match failure_type {
        FailureType::Expected => warn(stage, key, &message),
        FailureType::Unexpected => error(stage, key, &message),
    }
}

/// Log a summary of a stage run
pub fn log_run_summary(stage: Stage, total: usize, produced: usize, degraded: usize) {
    let message = format!(
        "Run complete: {}/{} outputs produced, {} degraded",
        produced, total, degraded
    );

    if degraded == 0 {
        info(stage, None, &message);
    } else if produced == 0 {
        error(stage, None, &message);
    } else {
        warn(stage, None, &message);
    }
}
