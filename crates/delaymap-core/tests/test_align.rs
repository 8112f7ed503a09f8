#[allow(dead_code)]
mod common;

use approx::assert_abs_diff_eq;
use ndarray::{Array2, Array3};

use delaymap_core::align::{phase_cross_correlation, roll_frames, SegmentAligner};
use delaymap_core::error::DelayMapError;
use delaymap_core::movie::{Movie, ReferenceFrame};
use delaymap_core::pipeline::config::{RegistrationConfig, ShiftRounding};
use delaymap_core::reference::mean_frame;

/// Textured movie with a little temporal variation on top.
fn textured_movie(height: usize, width: usize, frames: usize, label: &str) -> Movie {
    let base = common::texture(height, width, 21);
    let signal = common::integer_noise(frames, 10, 22);
    common::lagged_movie(&base, &signal, 1.0, |_, _| 0, label)
}

#[test]
fn test_zero_shift_for_identical_frames() {
    let frame = common::texture(32, 32, 1);
    let shift = phase_cross_correlation(&frame, &frame, &RegistrationConfig::default()).unwrap();
    assert_eq!(shift.row, 0.0);
    assert_eq!(shift.col, 0.0);
}

#[test]
fn test_known_circular_shift() {
    let frame = common::texture(16, 16, 2);
    let stack = Array3::from_shape_vec((1, 16, 16), frame.iter().copied().collect()).unwrap();
    let shifted = roll_frames(&stack, 3, -2).index_axis_move(ndarray::Axis(0), 0);

    let shift = phase_cross_correlation(&shifted, &frame, &RegistrationConfig::default()).unwrap();
    assert_eq!(shift.row, 3.0);
    assert_eq!(shift.col, -2.0);
}

#[test]
fn test_subpixel_refinement_keeps_integer_peak() {
    let frame = common::texture(16, 16, 3);
    let stack = Array3::from_shape_vec((1, 16, 16), frame.iter().copied().collect()).unwrap();
    let shifted = roll_frames(&stack, -4, 5).index_axis_move(ndarray::Axis(0), 0);

    let config = RegistrationConfig {
        subpixel: true,
        ..Default::default()
    };
    let shift = phase_cross_correlation(&shifted, &frame, &config).unwrap();
    assert_abs_diff_eq!(shift.row, -4.0, epsilon = 1e-6);
    assert_abs_diff_eq!(shift.col, 5.0, epsilon = 1e-6);
}

#[test]
fn test_hann_window_finds_same_shift() {
    let frame = common::texture(32, 32, 4);
    let stack = Array3::from_shape_vec((1, 32, 32), frame.iter().copied().collect()).unwrap();
    let shifted = roll_frames(&stack, 2, 1).index_axis_move(ndarray::Axis(0), 0);

    let config = RegistrationConfig {
        hann_window: true,
        ..Default::default()
    };
    let shift = phase_cross_correlation(&shifted, &frame, &config).unwrap();
    assert_eq!(shift.row, 2.0);
    assert_eq!(shift.col, 1.0);
}

#[test]
fn test_reference_segment_aligns_to_itself() {
    let movie = textured_movie(16, 16, 20, "seg0");
    let aligner = SegmentAligner::from_reference_segment(&movie, RegistrationConfig::default())
        .unwrap();

    assert_eq!(aligner.reference().data, mean_frame(&movie).unwrap());
    let aligned = aligner.align(movie.clone()).unwrap();
    assert!(aligned.shift.is_zero());
    assert_eq!(aligned.applied, (0, 0));
    assert_eq!(aligned.movie.data, movie.data);
}

#[test]
fn test_drifted_segment_is_restored() {
    let movie = textured_movie(16, 16, 20, "seg0");
    let aligner = SegmentAligner::from_reference_segment(&movie, RegistrationConfig::default())
        .unwrap();

    let drifted = Movie::new(roll_frames(&movie.data, 3, -5), "seg1");
    let aligned = aligner.align(drifted).unwrap();

    assert_eq!(aligned.shift.row, 3.0);
    assert_eq!(aligned.shift.col, -5.0);
    assert_eq!(aligned.applied, (-3, 5));
    assert_eq!(aligned.movie.label, "seg1");
    assert_eq!(aligned.movie.data, movie.data);
}

#[test]
fn test_shape_mismatch_is_rejected() {
    let reference = ReferenceFrame {
        data: Array2::zeros((16, 16)),
    };
    let aligner = SegmentAligner::with_reference(reference, RegistrationConfig::default());
    let other = textured_movie(8, 16, 5, "small");

    match aligner.align(other) {
        Err(DelayMapError::InputShapeMismatch {
            segment,
            expected_height,
            height,
            ..
        }) => {
            assert_eq!(segment, "small");
            assert_eq!(expected_height, 16);
            assert_eq!(height, 8);
        }
        other => panic!("expected InputShapeMismatch, got {other:?}"),
    }
}

#[test]
fn test_shift_rounding_modes() {
    assert_eq!(ShiftRounding::Truncate.to_pixels(2.7), 2);
    assert_eq!(ShiftRounding::Truncate.to_pixels(-2.7), -2);
    assert_eq!(ShiftRounding::Round.to_pixels(2.7), 3);
    assert_eq!(ShiftRounding::Round.to_pixels(-2.7), -3);
    assert_eq!(ShiftRounding::Round.to_pixels(-2.2), -2);
}

#[test]
fn test_roll_matches_reference_convention() {
    let data = Array3::from_shape_fn((2, 4, 5), |(t, r, c)| (t * 100 + r * 10 + c) as f64);
    let rolled = roll_frames(&data, -1, 2);
    for t in 0..2 {
        for r in 0..4 {
            for c in 0..5 {
                assert_eq!(rolled[[t, (r + 3) % 4, (c + 2) % 5]], data[[t, r, c]]);
            }
        }
    }
}
