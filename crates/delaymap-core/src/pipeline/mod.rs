pub mod config;
mod orchestrator;
mod segments;
mod summary;
mod types;

pub use orchestrator::{
    run_pipeline, run_pipeline_reported, write_outputs, DELAY_MAP_FILE, DELAY_PREVIEW_FILE,
    REFERENCE_FRAME_FILE, REFERENCE_PREVIEW_FILE, SUMMARY_FILE,
};
pub use segments::DelayMapPipeline;
pub use summary::RunSummary;
pub use types::{
    DelayMapOutput, NoOpReporter, OutputFiles, PipelineOutput, PipelineStage, ProgressReporter,
    SegmentReport,
};
