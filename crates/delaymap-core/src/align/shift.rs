use ndarray::parallel::prelude::*;
use ndarray::{Array3, ArrayView2, ArrayViewMut2, Axis};

use crate::consts::PARALLEL_FRAME_THRESHOLD;

/// Circularly shift every frame by `(rows, cols)` pixels.
///
/// Pixel `(r, c)` moves to `((r + rows) mod h, (c + cols) mod w)`; pixels pushed
/// past one edge re-enter on the opposite edge.
pub fn roll_frames(data: &Array3<f64>, rows: isize, cols: isize) -> Array3<f64> {
    let (t, h, w) = data.dim();
    if h == 0 || w == 0 {
        return data.clone();
    }

    let dr = rows.rem_euclid(h as isize) as usize;
    let dc = cols.rem_euclid(w as isize) as usize;
    if dr == 0 && dc == 0 {
        return data.clone();
    }

    let roll_one = |mut dst: ArrayViewMut2<f64>, src: ArrayView2<f64>| {
        for ((r, c), &val) in src.indexed_iter() {
            dst[[(r + dr) % h, (c + dc) % w]] = val;
        }
    };

    let mut result = Array3::<f64>::zeros((t, h, w));
    if t >= PARALLEL_FRAME_THRESHOLD {
        result
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .zip(data.axis_iter(Axis(0)).into_par_iter())
            .for_each(|(dst, src)| roll_one(dst, src));
    } else {
        for (dst, src) in result.axis_iter_mut(Axis(0)).zip(data.axis_iter(Axis(0))) {
            roll_one(dst, src);
        }
    }

    result
}
