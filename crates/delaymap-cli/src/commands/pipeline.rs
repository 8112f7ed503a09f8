use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use delaymap_core::pipeline::config::{
    DegeneratePolicy, LagWindow, PipelineConfig, ShiftRounding,
};
use delaymap_core::pipeline::{run_pipeline_reported, PipelineStage, ProgressReporter};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::summary::{print_pipeline_summary, print_run_result};

#[derive(Args)]
pub struct RunArgs {
    /// Segment recordings (TIFF stacks, SER files) or directories containing them
    pub inputs: Vec<PathBuf>,

    /// Acquisition frame rate in frames per second
    #[arg(long)]
    pub frame_rate: Option<f64>,

    /// Pipeline config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Largest lag searched, in frames
    #[arg(long)]
    pub max_delay: Option<usize>,

    /// Also evaluate lag +max_delay
    #[arg(long)]
    pub symmetric_lags: bool,

    /// Round registration shifts to the nearest pixel instead of truncating
    #[arg(long)]
    pub round_shifts: bool,

    /// Fail on pixels with flat traces instead of marking them NaN
    #[arg(long)]
    pub strict: bool,

    /// Write each segment's delay map (in frames) as well
    #[arg(long)]
    pub segment_maps: bool,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: &RunArgs) -> Result<()> {
    let config = build_config(args)?;
    print_pipeline_summary(&config);

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{msg:24} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    let reporter = Arc::new(BarReporter { bar: bar.clone() });

    let output = run_pipeline_reported(&config, reporter)?;
    bar.finish_with_message("Done");

    print_run_result(&output);
    Ok(())
}

fn build_config(args: &RunArgs) -> Result<PipelineConfig> {
    let mut config = if let Some(ref config_path) = args.config {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        let mut config: PipelineConfig =
            toml::from_str(&contents).context("Invalid pipeline config")?;
        if !args.inputs.is_empty() {
            config.inputs = args.inputs.clone();
        }
        if let Some(frame_rate) = args.frame_rate {
            config.frame_rate = frame_rate;
        }
        config
    } else {
        let Some(frame_rate) = args.frame_rate else {
            bail!("--frame-rate is required when no --config is given");
        };
        PipelineConfig::new(args.inputs.clone(), frame_rate)
    };

    if config.inputs.is_empty() {
        bail!("No input segments given");
    }
    if let Some(max_delay) = args.max_delay {
        config.correlation.max_delay = max_delay;
    }
    if args.symmetric_lags {
        config.correlation.lag_window = LagWindow::Symmetric;
    }
    if args.strict {
        config.correlation.degenerate_pixels = DegeneratePolicy::Fail;
    }
    if args.round_shifts {
        config.registration.rounding = ShiftRounding::Round;
    }
    if args.segment_maps {
        config.output.write_segment_maps = true;
    }
    if let Some(ref output) = args.output {
        config.output_dir = output.clone();
    }

    config.validate()?;
    debug!(?config, "Effective pipeline config");
    Ok(config)
}

struct BarReporter {
    bar: ProgressBar,
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: PipelineStage, total_items: Option<usize>) {
        self.bar.set_length(total_items.unwrap_or(1) as u64);
        self.bar.set_position(0);
        self.bar.set_message(stage.to_string());
    }

    fn begin_segment(&self, _index: usize, label: &str) {
        self.bar.set_message(label.to_string());
    }

    fn advance(&self, items_done: usize) {
        self.bar.set_position(items_done as u64);
    }

    fn finish_stage(&self) {
        if let Some(len) = self.bar.length() {
            self.bar.set_position(len);
        }
    }
}
