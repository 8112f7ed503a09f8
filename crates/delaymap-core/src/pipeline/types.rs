use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::movie::{AggregatedDelayMap, DelayMap, ReferenceFrame, Shift};

/// Pipeline processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Discovering,
    Segments,
    Aggregating,
    Writing,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Discovering => write!(f, "Finding segments"),
            Self::Segments => write!(f, "Computing delay maps"),
            Self::Aggregating => write!(f, "Averaging"),
            Self::Writing => write!(f, "Writing output"),
        }
    }
}

/// Thread-safe progress reporting for the pipeline.
///
/// Implementors can use this to drive progress bars, logging, or any other
/// UI feedback. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new pipeline stage has started. `total_items` is the number of
    /// work items in this stage (e.g., segment count), if known.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// Work on segment `index` (0-based) has started.
    fn begin_segment(&self, _index: usize, _label: &str) {}

    /// One work item within the current stage has completed.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// No-op progress reporter, used when `run_pipeline` delegates.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

/// What happened to one segment during the run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SegmentReport {
    pub label: String,
    pub frames: usize,
    /// Integer roll applied to the segment, (rows, cols).
    pub applied_roll: (isize, isize),
    pub degenerate_pixels: usize,
    /// Estimated displacement relative to the reference frame (zero for the
    /// reference segment itself).
    pub shift: Shift,
}

/// Result of the core computation.
#[derive(Clone, Debug)]
pub struct DelayMapOutput {
    pub delay_map: AggregatedDelayMap,
    pub reference_frame: ReferenceFrame,
    pub segments: Vec<SegmentReport>,
    /// Per-segment maps in frames, only kept when requested.
    pub segment_maps: Vec<DelayMap>,
}

/// Files produced by a file-level run.
#[derive(Clone, Debug, Default)]
pub struct OutputFiles {
    pub delay_map: PathBuf,
    pub delay_preview: PathBuf,
    pub reference_frame: PathBuf,
    pub reference_preview: PathBuf,
    pub segment_maps: Vec<PathBuf>,
    pub summary: PathBuf,
}

/// Result of a file-level run.
#[derive(Clone, Debug)]
pub struct PipelineOutput {
    pub inputs: Vec<PathBuf>,
    pub result: DelayMapOutput,
    pub files: OutputFiles,
}
