use ndarray::Array2;

use crate::consts::EPSILON;

/// Linear histogram stretch: maps [black_point, white_point] → [0.0, 1.0].
/// `NaN` maps to 0.0.
pub fn histogram_stretch(data: &Array2<f64>, black_point: f64, white_point: f64) -> Array2<f64> {
    let range = white_point - black_point;
    let range = if range.abs() < EPSILON { 1.0 } else { range };

    data.mapv(|v| {
        if v.is_nan() {
            0.0
        } else {
            ((v - black_point) / range).clamp(0.0, 1.0)
        }
    })
}

/// Quantile of the finite values, linearly interpolated between neighbors.
/// `q` is in [0.0, 1.0]. Returns `None` if there are no finite values.
pub fn quantile(data: &Array2<f64>, q: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = data.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Stretch between two quantiles of the data, e.g. (0.0, 0.95) to keep a few
/// bright cells from flattening the rest of the anatomy.
pub fn quantile_stretch(data: &Array2<f64>, low_q: f64, high_q: f64) -> Array2<f64> {
    match (quantile(data, low_q), quantile(data, high_q)) {
        (Some(black), Some(white)) => histogram_stretch(data, black, white),
        _ => Array2::zeros(data.dim()),
    }
}

/// Delay preview: `+range_s` (leading) maps to black, `-range_s` (lagging)
/// to white, zero delay to mid-gray. `NaN` cells are black.
pub fn delay_preview(seconds: &Array2<f64>, range_s: f64) -> Array2<f64> {
    let inverted = seconds.mapv(|v| -v);
    histogram_stretch(&inverted, -range_s, range_s)
}
