//! Command-line runner: reads one JSON batch, runs the pipeline, writes
//! the outputs as JSON.
//!
//! Usage: `climate_pipeline <input.json> [output.json] [--config file.toml]`

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use climate_pipeline::config::PipelineConfig;
use climate_pipeline::logging::{self, LogLevel, Stage};
use climate_pipeline::pipeline::{self, PipelineInput};

/// Runs the climate pipeline over one JSON batch.
#[derive(Parser, Debug)]
#[command(name = "climate_pipeline")]
#[command(about = "Derives climate dashboard series from a JSON batch")]
#[command(version)]
struct Args {
    /// JSON batch of raw rows
    input: PathBuf,

    /// Where to write the outputs (stdout when omitted)
    output: Option<PathBuf>,

    /// TOML settings file
    #[arg(long, env = "CLIMATE_PIPELINE_CONFIG")]
    config: Option<PathBuf>,
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let config = PipelineConfig::load(args.config.as_deref())?;
    let level: LogLevel = config.logging.level.parse()?;
    logging::init_logger(level, config.logging.file.as_deref(), config.logging.timestamps);

    let text = fs::read_to_string(&args.input)?;
    let input: PipelineInput = serde_json::from_str(&text)?;
    let output = pipeline::run(&input, &config)?;
    let json = serde_json::to_string_pretty(&output)?;

    match &args.output {
        Some(path) => {
            fs::write(path, json)?;
            logging::info(Stage::System, None, &format!("wrote {}", path.display()));
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(&args) {
        logging::error(Stage::System, None, &e.to_string());
        eprintln!("climate_pipeline: {e}");
        process::exit(1);
    }
}
