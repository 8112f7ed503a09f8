use ndarray::{Array2, Axis};

use crate::error::Result;
use crate::movie::{Movie, ReferenceTrace};

/// Reduce a movie to its whole-field mean activity, one value per frame.
pub fn reference_trace(movie: &Movie) -> Result<ReferenceTrace> {
    movie.ensure_non_empty()?;
    let (_, h, w) = movie.data.dim();
    let n = (h * w) as f64;

    let values = movie
        .data
        .outer_iter()
        .map(|frame| frame.sum() / n)
        .collect();

    Ok(ReferenceTrace { values })
}

/// Temporal mean of a movie: the average frame.
pub fn mean_frame(movie: &Movie) -> Result<Array2<f64>> {
    movie.ensure_non_empty()?;
    let t = movie.frame_count() as f64;
    Ok(movie.data.sum_axis(Axis(0)) / t)
}
