use std::sync::Arc;

use ndarray::parallel::prelude::*;
use ndarray::{Array2, ArrayView1, ArrayViewMut1, Axis};
use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::consts::{EPSILON, PARALLEL_PIXEL_THRESHOLD};
use crate::error::{DelayMapError, Result};
use crate::movie::Shift;
use crate::pipeline::config::RegistrationConfig;

use super::subpixel::refine_peak_paraboloid;

/// Estimate the translation that registers `moving` onto `reference`
/// using FFT phase correlation.
///
/// If `reference` equals `moving` circularly shifted by `(r, c)`, the result
/// is `Shift { row: r, col: c }`. The integer peak is exact; sub-pixel
/// refinement only runs when `config.subpixel` is set.
pub fn phase_cross_correlation(
    reference: &Array2<f64>,
    moving: &Array2<f64>,
    config: &RegistrationConfig,
) -> Result<Shift> {
    let (h, w) = reference.dim();
    let (mh, mw) = moving.dim();
    if h != mh || w != mw {
        return Err(DelayMapError::InputShapeMismatch {
            segment: "registration target".into(),
            expected_height: h,
            expected_width: w,
            height: mh,
            width: mw,
        });
    }

    let (ref_fft, mov_fft) = if config.hann_window {
        (fft2d(&apply_hann(reference)), fft2d(&apply_hann(moving)))
    } else {
        (fft2d(reference), fft2d(moving))
    };

    let cross_power = normalized_cross_power(&ref_fft, &mov_fft);
    let correlation = ifft2d(&cross_power);

    let (peak_row, peak_col, _peak_val) = find_peak(&correlation);

    let mut row = wrap_peak(peak_row, h);
    let mut col = wrap_peak(peak_col, w);

    if config.subpixel {
        let (sub_row, sub_col) = refine_peak_paraboloid(&correlation, peak_row, peak_col);
        row += sub_row;
        col += sub_col;
    }

    Ok(Shift::new(row, col))
}

/// Peaks past the midpoint of an axis correspond to negative shifts.
fn wrap_peak(peak: usize, len: usize) -> f64 {
    if peak > len / 2 {
        peak as f64 - len as f64
    } else {
        peak as f64
    }
}

pub(crate) fn apply_hann(data: &Array2<f64>) -> Array2<f64> {
    let (h, w) = data.dim();
    Array2::from_shape_fn((h, w), |(row, col)| {
        let wy = 0.5 * (1.0 - (std::f64::consts::TAU * row as f64 / h as f64).cos());
        let wx = 0.5 * (1.0 - (std::f64::consts::TAU * col as f64 / w as f64).cos());
        data[[row, col]] * wy * wx
    })
}

/// 2D FFT: row-wise FFT, then column-wise FFT.
pub(crate) fn fft2d(data: &Array2<f64>) -> Array2<Complex<f64>> {
    let (h, w) = data.dim();
    let mut planner = FftPlanner::new();
    let fft_row = planner.plan_fft_forward(w);
    let fft_col = planner.plan_fft_forward(h);

    let mut result = data.mapv(|v| Complex::new(v, 0.0));
    process_lanes(&mut result, Axis(0), &fft_row);
    process_lanes(&mut result, Axis(1), &fft_col);
    result
}

/// Inverse 2D FFT, returning the normalized real part.
pub(crate) fn ifft2d(data: &Array2<Complex<f64>>) -> Array2<f64> {
    let (h, w) = data.dim();
    let mut planner = FftPlanner::new();
    let ifft_row = planner.plan_fft_inverse(w);
    let ifft_col = planner.plan_fft_inverse(h);

    let mut work = data.clone();
    process_lanes(&mut work, Axis(1), &ifft_col);
    process_lanes(&mut work, Axis(0), &ifft_row);

    let scale = 1.0 / (h * w) as f64;
    work.mapv(|c| c.re * scale)
}

/// Run `fft` over every lane obtained by iterating along `axis`
/// (`Axis(0)` yields rows, `Axis(1)` yields columns).
fn process_lanes(data: &mut Array2<Complex<f64>>, axis: Axis, fft: &Arc<dyn Fft<f64>>) {
    let transform = |mut lane: ArrayViewMut1<Complex<f64>>| {
        let mut buffer = lane.to_vec();
        fft.process(&mut buffer);
        lane.assign(&ArrayView1::from(&buffer[..]));
    };

    if data.len() >= PARALLEL_PIXEL_THRESHOLD {
        data.axis_iter_mut(axis).into_par_iter().for_each(transform);
    } else {
        data.axis_iter_mut(axis).for_each(transform);
    }
}

pub(crate) fn normalized_cross_power(
    ref_fft: &Array2<Complex<f64>>,
    mov_fft: &Array2<Complex<f64>>,
) -> Array2<Complex<f64>> {
    ndarray::Zip::from(ref_fft)
        .and(mov_fft)
        .map_collect(|&r, &m| {
            let cross = r * m.conj();
            let mag = cross.norm();
            if mag > EPSILON {
                cross / mag
            } else {
                Complex::new(0.0, 0.0)
            }
        })
}

/// Location and value of the maximum; the first one in row-major order wins ties.
pub(crate) fn find_peak(data: &Array2<f64>) -> (usize, usize, f64) {
    let mut best = (0, 0, f64::NEG_INFINITY);
    for ((row, col), &val) in data.indexed_iter() {
        if val > best.2 {
            best = (row, col, val);
        }
    }
    best
}
