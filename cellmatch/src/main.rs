use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use common::log_setup::LogOptions;

use cellmatch::config::AssociationConfig;
use cellmatch::pipeline::AssociationPipeline;
use cellmatch::table::InputPaths;

#[derive(Parser, Debug)]
#[command(name = "cellmatch", version, about)]
struct Args {
    /// Support locations table.
    #[arg(long)]
    supports: PathBuf,

    /// Antennas per support, with azimuth.
    #[arg(long)]
    antennas: PathBuf,

    /// Declared transmitter powers per (support, antenna).
    #[arg(long)]
    transmitters: PathBuf,

    #[arg(long)]
    measurements: PathBuf,

    /// Association table to write.
    #[arg(long)]
    output: PathBuf,

    /// YAML or JSON configuration; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Matching threads. Overrides the configuration file.
    #[arg(long)]
    workers: Option<usize>,

    /// Only process the first N measurements. Overrides the configuration file.
    #[arg(long)]
    max_measurements: Option<usize>,

    /// Base log filter; RUST_LOG takes precedence.
    #[arg(long, default_value = "info")]
    log_level: String,

    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// Also write the run summary as JSON.
    #[arg(long)]
    summary: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    common::log_setup::setup_logging(&LogOptions {
        level: args.log_level.clone(),
        dir: args.log_dir.clone(),
        ..Default::default()
    })?;

    let mut config = match &args.config {
        Some(path) => AssociationConfig::load(path)?,
        None => AssociationConfig::default(),
    };
    if args.workers.is_some() {
        config.workers = args.workers;
    }
    if args.max_measurements.is_some() {
        config.max_measurements = args.max_measurements;
    }

    let pipeline = AssociationPipeline::new(config)?;
    let inputs = InputPaths {
        supports: args.supports,
        antennas: args.antennas,
        transmitters: args.transmitters,
        measurements: args.measurements,
    };

    let summary = pipeline.run_files(&inputs, &args.output).inspect_err(|err| {
        tracing::error!("Association failed: {}", err);
    })?;

    if let Some(path) = &args.summary {
        let json = common::serde::serialize(&summary, common::FileFormat::Json)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write summary to {}", path.display()))?;
    }

    Ok(())
}
