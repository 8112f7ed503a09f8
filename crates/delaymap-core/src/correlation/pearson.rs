/// Variance below this fraction of the raw second moment counts as zero, so a
/// constant series is flat even when its mean is not exactly representable.
const RELATIVE_VARIANCE_FLOOR: f64 = 1e-20;

/// Pearson correlation coefficient of two equally long series.
///
/// Returns `None` when fewer than two samples are given or either series has
/// zero variance, where the coefficient is undefined.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    debug_assert_eq!(x.len(), y.len());
    let centered = CenteredSeries::new(x)?;
    centered.correlate(y)
}

/// A series with its mean removed and its sum of squared deviations cached,
/// so it can be correlated against many partners.
#[derive(Clone, Debug)]
pub struct CenteredSeries {
    deviations: Vec<f64>,
    sum_sq_dev: f64,
}

impl CenteredSeries {
    /// `None` if the series is too short or flat.
    pub fn new(values: &[f64]) -> Option<Self> {
        let (mean, sum_sq_dev) = moments(values)?;
        let deviations = values.iter().map(|v| v - mean).collect();
        Some(Self {
            deviations,
            sum_sq_dev,
        })
    }

    /// Correlation with `other`, which must have the same length.
    pub fn correlate(&self, other: &[f64]) -> Option<f64> {
        debug_assert_eq!(self.deviations.len(), other.len());
        let (mean, sum_sq_other) = moments(other)?;

        let cross: f64 = self
            .deviations
            .iter()
            .zip(other)
            .map(|(dx, y)| dx * (y - mean))
            .sum();

        let r = cross / (self.sum_sq_dev * sum_sq_other).sqrt();
        Some(r.clamp(-1.0, 1.0))
    }
}

/// Mean and sum of squared deviations; `None` if undefined or flat.
fn moments(values: &[f64]) -> Option<(f64, f64)> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let sum_sq_dev: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    let raw_second_moment: f64 = values.iter().map(|v| v * v).sum();

    if !sum_sq_dev.is_finite() || sum_sq_dev <= RELATIVE_VARIANCE_FLOOR * raw_second_moment {
        return None;
    }
    Some((mean, sum_sq_dev))
}
