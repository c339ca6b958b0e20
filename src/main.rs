//! OÁSÎS - operator CLI
//!
//! `predict` and `status` start the scoring service the same way the HTTP
//! layer does; `generate` and `export` manage synthetic datasets.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;

use oasis_core::constants::{APP_NAME, APP_VERSION};
use oasis_core::logic::dataset::{self, export, DatasetWriter, Samples, SequenceGenerator};
use oasis_core::logic::features::FeatureVectorBuilder;
use oasis_core::{PredictorConfig, ScoringService};

#[derive(Parser)]
#[command(name = "oasis", version, about = "Burnout risk scoring")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score one day of work signals
    Predict(PredictArgs),
    /// Print the engine status as JSON
    Status,
    /// Write synthetic labelled sequences as JSONL
    Generate {
        #[arg(long, default_value_t = 1000)]
        samples: usize,
        /// Defaults to the local data directory
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Merge every JSONL file of a directory into one file
    Export {
        #[arg(long)]
        source: PathBuf,
        #[arg(long)]
        target: PathBuf,
    },
}

#[derive(Args)]
struct PredictArgs {
    #[arg(long, default_value_t = 8.0)]
    hours_worked: f32,
    #[arg(long, default_value_t = 0)]
    meetings_count: u32,
    /// Minutes between breaks
    #[arg(long, default_value_t = 90.0)]
    avg_time_between_breaks: f32,
    #[arg(long)]
    night_work: bool,
    #[arg(long)]
    weekend_work: bool,
    /// Minutes
    #[arg(long, default_value_t = 30.0)]
    avg_meeting_duration: f32,
    #[arg(long, default_value_t = 0.0)]
    meeting_overlap_rate: f32,
    /// Minutes before answering after hours
    #[arg(long, default_value_t = 90.0)]
    response_time_after_hours: f32,
    /// Fix the jitter for a reproducible score
    #[arg(long)]
    seed: Option<u64>,
}

fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Cli::parse()) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    log::info!("{} v{}", APP_NAME, APP_VERSION);

    match cli.command {
        Command::Predict(args) => predict(args),
        Command::Status => {
            let service = ScoringService::start(PredictorConfig::from_env()).context("starting scoring service")?;
            println!("{}", serde_json::to_string_pretty(&service.status())?);
            Ok(())
        }
        Command::Generate { samples, out, seed } => generate(samples, out, seed),
        Command::Export { source, target } => {
            let count = export::to_jsonl(&source, &target)
                .with_context(|| format!("exporting {} to {}", source.display(), target.display()))?;
            println!("Merged {} dataset files into {}", count, target.display());
            Ok(())
        }
    }
}

fn predict(args: PredictArgs) -> Result<()> {
    let features = FeatureVectorBuilder::new()
        .hours_worked(args.hours_worked)
        .meetings_count(args.meetings_count)
        .avg_time_between_breaks(args.avg_time_between_breaks)
        .night_work(args.night_work)
        .weekend_work(args.weekend_work)
        .avg_meeting_duration(args.avg_meeting_duration)
        .meeting_overlap_rate(args.meeting_overlap_rate)
        .response_time_after_hours(args.response_time_after_hours)
        .build();

    let service = ScoringService::start(PredictorConfig::from_env()).context("starting scoring service")?;
    let result = match args.seed {
        Some(seed) => service.predict_seeded(&features, seed),
        None => service.predict(&features),
    }
    .context("scoring features")?;

    let output = json!({
        "features": features.to_log_entry(),
        "prediction": result,
        "status": result.status(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn generate(n_samples: usize, out: Option<PathBuf>, seed: Option<u64>) -> Result<()> {
    let mut generator = match seed {
        Some(seed) => SequenceGenerator::with_seed(seed)?,
        None => SequenceGenerator::new()?,
    };
    let samples: Samples = generator.generate(n_samples).into();

    let dir = out.unwrap_or_else(dataset::get_dataset_dir);
    let writer = DatasetWriter::from_path(dir.clone()).with_context(|| format!("opening {}", dir.display()))?;
    let written = dataset::write_samples(&writer, &samples)?;

    let stats = writer.get_stats()?;
    println!(
        "Wrote {} records ({} files, {:.2} MB) to {}",
        written,
        stats.total_files,
        stats.total_size_mb,
        dir.display()
    );
    Ok(())
}
