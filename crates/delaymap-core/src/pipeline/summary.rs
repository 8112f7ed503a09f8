use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::config::PipelineConfig;
use super::types::{DelayMapOutput, SegmentReport};

/// Record of a run, written next to the maps as `run_summary.toml`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    pub inputs: Vec<PathBuf>,
    pub segment_count: usize,
    pub height: usize,
    pub width: usize,
    /// Finite delay range in seconds, absent if every pixel was degenerate.
    pub min_delay_s: Option<f64>,
    pub max_delay_s: Option<f64>,
    pub segments: Vec<SegmentReport>,
    pub config: PipelineConfig,
}

impl RunSummary {
    pub fn new(inputs: &[PathBuf], result: &DelayMapOutput, config: &PipelineConfig) -> Self {
        let (height, width) = result.delay_map.shape();
        let finite = || result.delay_map.seconds.iter().copied().filter(|v| v.is_finite());
        Self {
            inputs: inputs.to_vec(),
            segment_count: result.delay_map.segment_count,
            height,
            width,
            min_delay_s: finite().reduce(f64::min),
            max_delay_s: finite().reduce(f64::max),
            segments: result.segments.clone(),
            config: config.clone(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}
