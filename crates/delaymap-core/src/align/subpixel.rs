use ndarray::Array2;

use crate::consts::EPSILON;

/// Refine peak location using paraboloid fitting on the 3x3 neighborhood.
///
/// The correlation surface is periodic, so neighbors wrap around the edges.
/// Returns (delta_row, delta_col) as fractional pixel offsets from the integer peak.
pub fn refine_peak_paraboloid(
    correlation: &Array2<f64>,
    peak_row: usize,
    peak_col: usize,
) -> (f64, f64) {
    let (h, w) = correlation.dim();
    if h < 3 || w < 3 {
        return (0.0, 0.0);
    }

    let y_prev = correlation[[(peak_row + h - 1) % h, peak_col]];
    let y_curr = correlation[[peak_row, peak_col]];
    let y_next = correlation[[(peak_row + 1) % h, peak_col]];

    let x_prev = correlation[[peak_row, (peak_col + w - 1) % w]];
    let x_curr = y_curr;
    let x_next = correlation[[peak_row, (peak_col + 1) % w]];

    (
        parabola_vertex(y_prev, y_curr, y_next),
        parabola_vertex(x_prev, x_curr, x_next),
    )
}

/// Vertex offset of the parabola through (-1, prev), (0, curr), (1, next),
/// clamped to +/- 0.5 pixel.
fn parabola_vertex(prev: f64, curr: f64, next: f64) -> f64 {
    let denom = prev - 2.0 * curr + next;
    if denom.abs() > EPSILON {
        ((prev - next) / (2.0 * denom)).clamp(-0.5, 0.5)
    } else {
        0.0
    }
}
