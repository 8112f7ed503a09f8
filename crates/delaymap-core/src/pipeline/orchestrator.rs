use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::Result;
use crate::filters::histogram::{delay_preview, quantile_stretch};
use crate::io::image_io::{save_float_tiff, save_png};
use crate::io::{discover_inputs, open_movie, source_label};

use super::config::PipelineConfig;
use super::segments::DelayMapPipeline;
use super::summary::RunSummary;
use super::types::{
    DelayMapOutput, NoOpReporter, OutputFiles, PipelineOutput, PipelineStage, ProgressReporter,
};

pub const DELAY_MAP_FILE: &str = "delay_map_seconds.tiff";
pub const DELAY_PREVIEW_FILE: &str = "delay_map_preview.png";
pub const REFERENCE_FRAME_FILE: &str = "reference_frame.tiff";
pub const REFERENCE_PREVIEW_FILE: &str = "reference_preview.png";
pub const SUMMARY_FILE: &str = "run_summary.toml";

/// Run the full pipeline with a thread-safe progress reporter.
pub fn run_pipeline_reported(
    config: &PipelineConfig,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<PipelineOutput> {
    config.validate()?;

    reporter.begin_stage(PipelineStage::Discovering, None);
    let inputs = discover_inputs(&config.inputs)?;
    reporter.finish_stage();
    info!(segments = inputs.len(), "Input segments found");

    let pipeline = DelayMapPipeline::from_config(config);
    let segments = inputs.iter().map(|path| {
        debug!(path = %path.display(), "Loading segment");
        open_movie(path)
    });
    let result = pipeline.run(segments, Some(inputs.len()), reporter.as_ref())?;

    reporter.begin_stage(PipelineStage::Writing, None);
    let files = write_outputs(config, &inputs, &result)?;
    reporter.finish_stage();
    info!(dir = %config.output_dir.display(), "Outputs written");

    Ok(PipelineOutput {
        inputs,
        result,
        files,
    })
}

/// Run the full pipeline.
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineOutput> {
    run_pipeline_reported(config, Arc::new(NoOpReporter))
}

/// Write maps, previews and the run summary into `config.output_dir`.
pub fn write_outputs(
    config: &PipelineConfig,
    inputs: &[PathBuf],
    result: &DelayMapOutput,
) -> Result<OutputFiles> {
    let dir = config.output_dir.as_path();
    std::fs::create_dir_all(dir)?;

    let files = OutputFiles {
        delay_map: dir.join(DELAY_MAP_FILE),
        delay_preview: dir.join(DELAY_PREVIEW_FILE),
        reference_frame: dir.join(REFERENCE_FRAME_FILE),
        reference_preview: dir.join(REFERENCE_PREVIEW_FILE),
        segment_maps: segment_map_paths(dir, inputs, result),
        summary: dir.join(SUMMARY_FILE),
    };

    let seconds = &result.delay_map.seconds;
    save_float_tiff(seconds, &files.delay_map)?;
    save_png(
        &delay_preview(seconds, config.output.display_range_s),
        &files.delay_preview,
    )?;

    let reference = &result.reference_frame.data;
    save_float_tiff(reference, &files.reference_frame)?;
    save_png(
        &quantile_stretch(
            reference,
            config.output.reference_low_quantile,
            config.output.reference_high_quantile,
        ),
        &files.reference_preview,
    )?;

    for (map, path) in result.segment_maps.iter().zip(&files.segment_maps) {
        save_float_tiff(&map.data, path)?;
    }

    RunSummary::new(inputs, result, config).save(&files.summary)?;
    Ok(files)
}

fn segment_map_paths(dir: &Path, inputs: &[PathBuf], result: &DelayMapOutput) -> Vec<PathBuf> {
    inputs
        .iter()
        .take(result.segment_maps.len())
        .enumerate()
        .map(|(index, path)| {
            let stem = Path::new(&source_label(path))
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            dir.join(format!("segment_{index:03}_{stem}_frames.tiff"))
        })
        .collect()
}
