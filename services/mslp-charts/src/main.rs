//! MSLP chart generator.
//!
//! Fetches the HRRR mean sea-level pressure field for forecast hours 0-48 of
//! the latest published cycle and writes one contour chart per hour.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use mslp_charts::{Pipeline, PipelineConfig, DEFAULT_BASE_URL};
use mslp_common::step::MAX_FORECAST_STEP;
use mslp_common::{ForecastCycle, ForecastStep};
use renderer::ChartOptions;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "mslp-charts")]
#[command(about = "HRRR mean sea-level pressure contour charts")]
struct Args {
    /// Root directory; charts go to <dir>/static/MSLP
    #[arg(long, env = "MSLP_OUTPUT_DIR", default_value = "Hrrr")]
    output_dir: PathBuf,

    /// NOMADS grib filter endpoint
    #[arg(long, env = "MSLP_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Cycle to chart as YYYYMMDDHH (default: latest published)
    #[arg(long)]
    cycle: Option<ForecastCycle>,

    /// Last forecast hour to chart
    #[arg(long, default_value_t = MAX_FORECAST_STEP,
          value_parser = clap::value_parser!(u32).range(0..=MAX_FORECAST_STEP as i64))]
    last_step: u32,

    /// Output resolution
    #[arg(long, default_value = "850")]
    dpi: f32,

    /// Figure width in inches
    #[arg(long, default_value = "10")]
    figure_width: f32,

    /// Figure height in inches
    #[arg(long, default_value = "7")]
    figure_height: f32,

    /// Log the planned requests and files without touching disk or network
    #[arg(long)]
    dry_run: bool,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true);
    if args.log_json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    let config = PipelineConfig {
        output_dir: args.output_dir,
        base_url: args.base_url,
        cycle: args.cycle,
        last_step: ForecastStep::new(args.last_step).context("Invalid --last-step")?,
        chart: ChartOptions {
            dpi: args.dpi,
            figure_width: args.figure_width,
            figure_height: args.figure_height,
            ..ChartOptions::default()
        },
        dry_run: args.dry_run,
    };

    let summary = Pipeline::new(config).run().await?;

    info!(
        cycle = %summary.cycle,
        charts = summary.charts.len(),
        skipped = summary.skipped.len(),
        dry_run = summary.dry_run,
        "Finished"
    );
    Ok(())
}
