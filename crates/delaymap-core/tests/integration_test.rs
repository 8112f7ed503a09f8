#[allow(dead_code)]
mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use approx::assert_abs_diff_eq;
use ndarray::Array2;
use tempfile::TempDir;

use delaymap_core::align::roll_frames;
use delaymap_core::correlation::LagCorrelationMapper;
use delaymap_core::error::DelayMapError;
use delaymap_core::io::image_io::load_float_tiff;
use delaymap_core::movie::Movie;
use delaymap_core::pipeline::config::{CorrelationConfig, PipelineConfig, RegistrationConfig};
use delaymap_core::pipeline::{
    run_pipeline, run_pipeline_reported, DelayMapPipeline, PipelineStage, ProgressReporter,
    RunSummary,
};

const FRAME_RATE: f64 = 4.419;

/// Delays (in frames) injected at a few pixels of even and odd segments.
/// Every other pixel follows the whole-field signal without delay.
const INJECTED_DELAYS: [&[((usize, usize), isize)]; 2] = [
    &[((1, 3), 4), ((3, 1), -6), ((0, 0), 2)],
    &[((1, 3), 2), ((3, 1), -6), ((4, 4), -3), ((2, 0), 5)],
];

fn injected_delay(index: u64, row: usize, col: usize) -> isize {
    INJECTED_DELAYS[(index % 2) as usize]
        .iter()
        .find(|(pixel, _)| *pixel == (row, col))
        .map_or(0, |&(_, delay)| delay)
}

fn injected_map(index: u64, height: usize, width: usize) -> Array2<f64> {
    Array2::from_shape_fn((height, width), |(row, col)| {
        injected_delay(index, row, col) as f64
    })
}

/// Expected final map in seconds: injected delays averaged over segments
/// `0..count`, divided by the frame rate.
fn expected_seconds(count: u64, height: usize, width: usize) -> Array2<f64> {
    let sum = (0..count).fold(Array2::<f64>::zeros((height, width)), |acc, index| {
        acc + injected_map(index, height, width)
    });
    sum / count as f64 / FRAME_RATE
}

/// Segment `index` of a synthetic recording: a fixed anatomy with activity
/// that reaches a few pixels late or early.
fn segment(index: u64, height: usize, width: usize, frames: usize) -> Movie {
    let base = common::texture(height, width, 100);
    let signal = common::integer_noise(frames, 100, 200 + index);
    let lag = |row: usize, col: usize| injected_delay(index, row, col);
    common::lagged_movie(&base, &signal, 2.0, lag, &format!("segment_{index}"))
}

fn default_pipeline() -> DelayMapPipeline {
    DelayMapPipeline::new(
        FRAME_RATE,
        LagCorrelationMapper::new(&CorrelationConfig::default()),
        RegistrationConfig::default(),
    )
}

#[test]
fn test_two_segments_average_to_seconds() {
    let seg0 = segment(0, 5, 5, 50);
    let seg1 = segment(1, 5, 5, 50);

    let output = default_pipeline()
        .keep_segment_maps(true)
        .run_movies(vec![seg0, seg1])
        .unwrap();

    assert_eq!(output.segment_maps[0].data, injected_map(0, 5, 5));
    assert_eq!(output.segment_maps[1].data, injected_map(1, 5, 5));

    assert_eq!(output.delay_map.shape(), (5, 5));
    assert_eq!(output.delay_map.segment_count, 2);
    let expected = expected_seconds(2, 5, 5);
    for (got, want) in output.delay_map.seconds.iter().zip(expected.iter()) {
        assert_abs_diff_eq!(*got, *want, epsilon = 1e-6);
    }
    // (1, 3) lags by 4 then 2 frames: 3 frames on average.
    assert_abs_diff_eq!(output.delay_map.seconds[[1, 3]], 3.0 / FRAME_RATE, epsilon = 1e-9);
    assert_abs_diff_eq!(output.delay_map.seconds[[3, 1]], -6.0 / FRAME_RATE, epsilon = 1e-9);
    assert!(output.segments.iter().all(|s| s.shift.is_zero()));
}

#[test]
fn test_single_segment_is_map_over_frame_rate() {
    let seg = segment(3, 6, 4, 60);
    let expected = injected_map(3, 6, 4) / FRAME_RATE;

    let output = default_pipeline().run_movies(vec![seg]).unwrap();
    assert_eq!(output.delay_map.segment_count, 1);
    assert_eq!(output.segments[0].applied_roll, (0, 0));
    for (got, want) in output.delay_map.seconds.iter().zip(expected.iter()) {
        assert_abs_diff_eq!(*got, *want, epsilon = 1e-12);
    }
}

#[test]
fn test_drifted_segment_is_registered_before_mapping() {
    let seg0 = segment(0, 8, 8, 50);
    let seg1 = segment(1, 8, 8, 50);

    let drifted = Movie::new(roll_frames(&seg1.data, 1, -2), "segment_1_drifted");
    let output = default_pipeline()
        .keep_segment_maps(true)
        .run_movies(vec![seg0.clone(), drifted])
        .unwrap();

    let report = &output.segments[1];
    assert_eq!(report.shift.row, 1.0);
    assert_eq!(report.shift.col, -2.0);
    assert_eq!(report.applied_roll, (-1, 2));

    assert_eq!(output.segment_maps.len(), 2);
    assert_eq!(output.segment_maps[1].data, injected_map(1, 8, 8));
    let expected = expected_seconds(2, 8, 8);
    for (got, want) in output.delay_map.seconds.iter().zip(expected.iter()) {
        assert_abs_diff_eq!(*got, *want, epsilon = 1e-9);
    }
    // The anatomical reference is the first segment's mean frame.
    assert_eq!(
        output.reference_frame.data,
        delaymap_core::reference::mean_frame(&seg0).unwrap()
    );
}

#[test]
fn test_segment_with_other_shape_is_rejected() {
    let result = default_pipeline().run_movies(vec![segment(0, 5, 5, 50), segment(1, 6, 5, 50)]);
    assert!(matches!(
        result,
        Err(DelayMapError::InputShapeMismatch { .. })
    ));
}

#[test]
fn test_empty_segment_list_is_rejected() {
    assert!(matches!(
        default_pipeline().run_movies(vec![]),
        Err(DelayMapError::EmptyInputSet)
    ));
}

#[test]
fn test_short_segment_fails_lag_window_check() {
    let result = default_pipeline().run_movies(vec![segment(0, 4, 4, 50), segment(1, 4, 4, 20)]);
    assert!(matches!(
        result,
        Err(DelayMapError::LagWindowTooLarge { frames: 20, .. })
    ));
}

#[derive(Default)]
struct CountingReporter {
    segments: AtomicUsize,
    stages: AtomicUsize,
}

impl ProgressReporter for CountingReporter {
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {
        self.stages.fetch_add(1, Ordering::Relaxed);
    }

    fn begin_segment(&self, _index: usize, _label: &str) {
        self.segments.fetch_add(1, Ordering::Relaxed);
    }
}

#[test]
fn test_full_pipeline_from_files() {
    let dir = TempDir::new().unwrap();
    let inputs = dir.path().join("recordings");
    std::fs::create_dir_all(&inputs).unwrap();

    let seg0 = segment(0, 6, 6, 50);
    let seg1 = segment(1, 6, 6, 50);
    common::write_tiff_stack(&inputs.join("a_segment.tif"), &seg0.data);
    std::fs::write(
        inputs.join("b_segment.ser"),
        common::build_ser_from_movie(&seg1.data),
    )
    .unwrap();

    let mut config = PipelineConfig::new(vec![inputs.clone()], FRAME_RATE);
    config.output_dir = dir.path().join("out");
    config.output.write_segment_maps = true;

    let reporter = Arc::new(CountingReporter::default());
    let output = run_pipeline_reported(&config, reporter.clone()).unwrap();

    assert_eq!(output.inputs.len(), 2);
    assert_eq!(reporter.segments.load(Ordering::Relaxed), 2);
    assert_eq!(reporter.stages.load(Ordering::Relaxed), 4);

    let expected = expected_seconds(2, 6, 6);
    assert_abs_diff_eq!(
        output.result.delay_map.seconds[[2, 0]],
        2.5 / FRAME_RATE,
        epsilon = 1e-9
    );
    for (got, want) in output.result.delay_map.seconds.iter().zip(expected.iter()) {
        assert_abs_diff_eq!(*got, *want, epsilon = 1e-6);
    }

    let files = &output.files;
    for path in [
        &files.delay_map,
        &files.delay_preview,
        &files.reference_frame,
        &files.reference_preview,
        &files.summary,
    ] {
        assert!(path.exists(), "missing {}", path.display());
    }
    assert_eq!(files.segment_maps.len(), 2);
    assert!(files.segment_maps.iter().all(|p| p.exists()));

    let on_disk = load_float_tiff(&files.delay_map).unwrap();
    for (got, want) in on_disk.iter().zip(expected.iter()) {
        assert_abs_diff_eq!(*got, *want, epsilon = 1e-5);
    }

    let summary: RunSummary =
        toml::from_str(&std::fs::read_to_string(&files.summary).unwrap()).unwrap();
    assert_eq!(summary.segment_count, 2);
    assert_eq!(summary.segments[0].label, "a_segment.tif");
    assert_eq!(summary.segments[1].label, "b_segment.ser");
    assert_eq!(summary.config.correlation.max_delay, 30);
}

#[test]
fn test_pipeline_rejects_invalid_config() {
    let dir = TempDir::new().unwrap();
    let mut config = PipelineConfig::new(vec![dir.path().to_path_buf()], -1.0);
    config.output_dir = dir.path().join("out");
    assert!(matches!(
        run_pipeline(&config),
        Err(DelayMapError::InvalidConfig(_))
    ));
    assert!(!config.output_dir.exists());
}
