//! One complete run: pick the cycle, then fetch, decode and chart every step.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use mslp_common::{ForecastCycle, ForecastStep};
use renderer::{render_chart, ChartOptions};
use tracing::{info, instrument};

use crate::decode::decode_mslp;
use crate::fetch::GridFetcher;
use crate::layout::OutputLayout;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root under which `static/MSLP` is created
    pub output_dir: PathBuf,
    pub base_url: String,
    /// Fixed cycle; the latest available one when `None`
    pub cycle: Option<ForecastCycle>,
    pub last_step: ForecastStep,
    pub chart: ChartOptions,
    pub dry_run: bool,
}

/// What a run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub cycle: ForecastCycle,
    /// Downloaded grids, or the planned paths in a dry run
    pub grib_files: Vec<PathBuf>,
    /// Written charts, or the planned paths in a dry run
    pub charts: Vec<PathBuf>,
    /// Steps the archive did not serve
    pub skipped: Vec<ForecastStep>,
    pub dry_run: bool,
}

pub struct Pipeline {
    config: PipelineConfig,
    layout: OutputLayout,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let layout = OutputLayout::new(&config.output_dir);
        Self { config, layout }
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Run for the configured cycle, or the latest one available now.
    pub async fn run(&self) -> Result<RunSummary> {
        let cycle = self.config.cycle.unwrap_or_else(ForecastCycle::current);
        self.run_cycle(cycle).await
    }

    /// Run as if the wall clock read `now`.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<RunSummary> {
        let cycle = self
            .config
            .cycle
            .unwrap_or_else(|| ForecastCycle::latest_available(now));
        self.run_cycle(cycle).await
    }

    #[instrument(skip_all, fields(cycle = %cycle, dry_run = self.config.dry_run))]
    async fn run_cycle(&self, cycle: ForecastCycle) -> Result<RunSummary> {
        info!(cycle = %cycle, last_step = %self.config.last_step, "Starting MSLP run");

        let fetcher = GridFetcher::new(&self.config.base_url, self.layout.grib_dir())
            .context("Failed to set up grid fetcher")?;

        let mut summary = RunSummary {
            cycle,
            grib_files: Vec::new(),
            charts: Vec::new(),
            skipped: Vec::new(),
            dry_run: self.config.dry_run,
        };

        if self.config.dry_run {
            for step in ForecastStep::through(self.config.last_step) {
                let grib_path = self.layout.grib_path(&cycle, step);
                let chart_path = self.layout.chart_path(step);
                info!(
                    step = %step,
                    url = %fetcher.request_url(&cycle, step),
                    grib = %grib_path.display(),
                    chart = %chart_path.display(),
                    "Would download and chart"
                );
                summary.grib_files.push(grib_path);
                summary.charts.push(chart_path);
            }
            info!(steps = summary.charts.len(), "Dry run complete");
            return Ok(summary);
        }

        self.layout.prepare().await.with_context(|| {
            format!(
                "Failed to prepare output directory {}",
                self.layout.mslp_dir().display()
            )
        })?;

        for step in ForecastStep::through(self.config.last_step) {
            let grib_path = match fetcher.fetch(&cycle, step).await? {
                Some(path) => path,
                None => {
                    summary.skipped.push(step);
                    continue;
                }
            };

            let field = decode_mslp(&grib_path)
                .await
                .with_context(|| format!("Failed to decode {}", grib_path.display()))?;

            let chart_path = self.layout.chart_path(step);
            let chart = render_chart(&field, &self.config.chart)
                .with_context(|| format!("Failed to render step {}", step))?;
            chart
                .write_png(&chart_path)
                .with_context(|| format!("Failed to write {}", chart_path.display()))?;
            info!(
                step = %step,
                valid_time = %step.valid_time(&cycle),
                chart = %chart_path.display(),
                width = chart.width(),
                height = chart.height(),
                "Created chart"
            );

            summary.grib_files.push(grib_path);
            summary.charts.push(chart_path);
        }

        info!(
            cycle = %cycle,
            grib_files = summary.grib_files.len(),
            charts = summary.charts.len(),
            skipped = summary.skipped.len(),
            "All download and PNG creation tasks complete"
        );
        Ok(summary)
    }
}
