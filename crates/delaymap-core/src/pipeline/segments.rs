use std::time::Instant;

use tracing::info;

use crate::aggregate::DelayAccumulator;
use crate::align::SegmentAligner;
use crate::correlation::LagCorrelationMapper;
use crate::error::{DelayMapError, Result};
use crate::movie::{Movie, Shift};
use crate::reference::reference_trace;

use super::config::{PipelineConfig, RegistrationConfig};
use super::types::{
    DelayMapOutput, NoOpReporter, PipelineStage, ProgressReporter, SegmentReport,
};

/// In-memory delay-map computation over an ordered sequence of segments.
///
/// The first segment defines the reference frame. Every later segment is
/// aligned to it, mapped, and added to a running mean, then dropped, so at
/// most one segment is held in memory at a time.
#[derive(Clone, Debug)]
pub struct DelayMapPipeline {
    frame_rate: f64,
    mapper: LagCorrelationMapper,
    registration: RegistrationConfig,
    keep_segment_maps: bool,
}

impl DelayMapPipeline {
    pub fn new(
        frame_rate: f64,
        mapper: LagCorrelationMapper,
        registration: RegistrationConfig,
    ) -> Self {
        Self {
            frame_rate,
            mapper,
            registration,
            keep_segment_maps: false,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            frame_rate: config.frame_rate,
            mapper: LagCorrelationMapper::new(&config.correlation),
            registration: config.registration.clone(),
            keep_segment_maps: config.output.write_segment_maps,
        }
    }

    /// Also return the per-segment maps (in frames).
    pub fn keep_segment_maps(mut self, keep: bool) -> Self {
        self.keep_segment_maps = keep;
        self
    }

    /// Run over already-loaded segments.
    pub fn run_movies(&self, segments: Vec<Movie>) -> Result<DelayMapOutput> {
        let total = segments.len();
        self.run(segments.into_iter().map(Ok), Some(total), &NoOpReporter)
    }

    /// Run over segments produced lazily, e.g. decoded from disk one at a time.
    /// A loading error aborts the run.
    pub fn run<I>(
        &self,
        segments: I,
        total: Option<usize>,
        reporter: &dyn ProgressReporter,
    ) -> Result<DelayMapOutput>
    where
        I: IntoIterator<Item = Result<Movie>>,
    {
        reporter.begin_stage(PipelineStage::Segments, total);

        let mut aligner: Option<SegmentAligner> = None;
        let mut accumulator: Option<DelayAccumulator> = None;
        let mut reports = Vec::new();
        let mut segment_maps = Vec::new();

        for (index, movie) in segments.into_iter().enumerate() {
            let movie = movie?;
            movie.ensure_non_empty()?;
            reporter.begin_segment(index, &movie.label);
            let started = Instant::now();

            // The reference trace comes from the segment as recorded, before
            // drift correction.
            let trace = reference_trace(&movie)?;

            let (movie, shift, applied_roll) = match &aligner {
                None => {
                    aligner = Some(SegmentAligner::from_reference_segment(
                        &movie,
                        self.registration.clone(),
                    )?);
                    (movie, Shift::default(), (0, 0))
                }
                Some(aligner) => {
                    let aligned = aligner.align(movie)?;
                    (aligned.movie, aligned.shift, aligned.applied)
                }
            };

            let map = self.mapper.map(&movie, &trace)?;
            let acc = accumulator.get_or_insert_with(|| {
                let (h, w) = map.shape();
                DelayAccumulator::new(h, w)
            });
            acc.add(&map)?;

            info!(
                segment = %movie.label,
                index,
                frames = movie.frame_count(),
                shift_row = shift.row,
                shift_col = shift.col,
                degenerate = map.degenerate_pixels,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Segment delay map computed"
            );

            reports.push(SegmentReport {
                label: movie.label.clone(),
                frames: movie.frame_count(),
                applied_roll,
                degenerate_pixels: map.degenerate_pixels,
                shift,
            });
            if self.keep_segment_maps {
                segment_maps.push(map);
            }
            reporter.advance(index + 1);
        }
        reporter.finish_stage();

        let (Some(aligner), Some(accumulator)) = (aligner, accumulator) else {
            return Err(DelayMapError::EmptyInputSet);
        };

        reporter.begin_stage(PipelineStage::Aggregating, None);
        let delay_map = accumulator.finalize(self.frame_rate)?;
        reporter.finish_stage();

        info!(
            segments = delay_map.segment_count,
            frame_rate = delay_map.frame_rate,
            "Delay maps averaged"
        );

        Ok(DelayMapOutput {
            delay_map,
            reference_frame: aligner.into_reference(),
            segments: reports,
            segment_maps,
        })
    }
}
