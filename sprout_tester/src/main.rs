use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use log::info;
use sprout_vision::logging::setup_logging;
use sprout_vision::pipeline::PlantPhoto;
use sprout_vision::registry::parse_timestamp;
use sprout_vision::utils::image_helper::{save_png, synthetic_plant_rgb};
use sprout_vision::{DensityEstimator, ParallelDensityPipeline, PipelineConfig};

#[derive(Parser)]
#[command(name = "sprout_tester")]
#[command(version, about = "Green density and growth rate from plant photographs", long_about = None)]
struct Cli {
    /// JSON pipeline config (threshold box, workers, upload limits)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log spec, e.g. "info" or "sprout_vision=debug"
    #[arg(long, value_name = "SPEC", default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the green density of each image
    Density {
        #[arg(value_name = "IMAGE", required = true)]
        images: Vec<PathBuf>,
    },

    /// Estimate a series of photographs and print its growth as JSON
    Growth {
        /// Photographs as PATH@TIMESTAMP, e.g. leaf.png@2024-05-01T09:00
        #[arg(value_name = "IMAGE@TIMESTAMP", required = true)]
        photos: Vec<String>,
    },

    /// Write a synthetic PNG with a known green fraction
    Synth {
        #[arg(short, long, value_name = "FILE")]
        out: PathBuf,

        #[arg(long, default_value = "64")]
        width: u32,

        #[arg(long, default_value = "64")]
        height: u32,

        /// Share of pixels (0.0-1.0) painted leaf green
        #[arg(long, default_value = "0.5")]
        green_fraction: f64,
    },
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn parse_photo_arg(arg: &str) -> Result<(PathBuf, chrono::NaiveDateTime)> {
    let (path, timestamp) = arg
        .rsplit_once('@')
        .ok_or_else(|| anyhow!("expected IMAGE@TIMESTAMP, got '{}'", arg))?;
    let timestamp = parse_timestamp(timestamp)
        .ok_or_else(|| anyhow!("invalid timestamp '{}' in '{}'", timestamp, arg))?;
    Ok((PathBuf::from(path), timestamp))
}

fn run_density(config: PipelineConfig, images: &[PathBuf]) -> Result<()> {
    let estimator = DensityEstimator::new(config.threshold);
    for image in images {
        let density = estimator
            .estimate_file(image)
            .with_context(|| format!("estimating {}", image.display()))?;
        println!("{}\t{:.6}", image.display(), density);
    }
    Ok(())
}

async fn run_growth(config: PipelineConfig, photo_args: &[String]) -> Result<()> {
    // --- 1. Argument Parsing & Loading ---
    let mut photos = Vec::with_capacity(photo_args.len());
    for arg in photo_args {
        let (path, timestamp) = parse_photo_arg(arg)?;
        let bytes = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
        photos.push(PlantPhoto::new(timestamp, bytes));
    }

    // --- 2. Parallel Estimation & Growth ---
    let pipeline = ParallelDensityPipeline::new(config)?;
    let report = pipeline.generate_report(photos).await;
    pipeline.shutdown().await;
    let report = report?;

    // --- 3. Output ---
    info!(
        "growth rate {:.6}/day over {} days",
        report.rate, report.elapsed_days
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_synth(out: &Path, width: u32, height: u32, green_fraction: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&green_fraction) {
        bail!("green fraction must be within 0.0-1.0, got {}", green_fraction);
    }
    let rgb = synthetic_plant_rgb(width, height, green_fraction);
    save_png(out, width, height, &rgb).with_context(|| format!("writing {}", out.display()))?;
    println!("Synthetic image saved to {}", out.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _logger = setup_logging(&cli.log_level).context("initialising logger")?;
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Density { images } => run_density(config, &images),
        Commands::Growth { photos } => run_growth(config, &photos).await,
        Commands::Synth {
            out,
            width,
            height,
            green_fraction,
        } => run_synth(&out, width, height, green_fraction),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn photo_arg_splits_on_last_at() {
        let (path, timestamp) = parse_photo_arg("shots/me@home.png@2024-05-01T09:00").unwrap();
        assert_eq!(path, PathBuf::from("shots/me@home.png"));
        assert_eq!(timestamp.to_string(), "2024-05-01 09:00:00");
    }

    #[test]
    fn photo_arg_requires_timestamp() {
        assert!(parse_photo_arg("leaf.png").is_err());
        assert!(parse_photo_arg("leaf.png@yesterday").is_err());
    }
}
