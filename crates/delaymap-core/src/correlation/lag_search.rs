use ndarray::Array2;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::{DelayMapError, Result};
use crate::movie::{DelayMap, Movie, ReferenceTrace};
use crate::pipeline::config::{CorrelationConfig, DegeneratePolicy, LagWindow};

use super::pearson::CenteredSeries;

/// Per-pixel lag search against a whole-field reference trace.
///
/// For every lag `k` the pixel trace is shifted by `k` frames and the
/// wrapped-around samples are dropped from both series before correlating.
/// The lag with the highest correlation is the pixel's delay; the map stores
/// its negation, so positive values mean the pixel leads the reference.
#[derive(Clone, Debug)]
pub struct LagCorrelationMapper {
    max_delay: usize,
    window: LagWindow,
    policy: DegeneratePolicy,
}

impl LagCorrelationMapper {
    pub fn new(config: &CorrelationConfig) -> Self {
        Self {
            max_delay: config.max_delay,
            window: config.lag_window,
            policy: config.degenerate_pixels,
        }
    }

    pub fn max_delay(&self) -> usize {
        self.max_delay
    }

    /// Length of the correlation curve: one slot per lag in `[-max_delay, max_delay]`.
    pub fn curve_len(&self) -> usize {
        2 * self.max_delay + 1
    }

    /// Lags that are actually evaluated, in ascending order.
    pub fn lags(&self) -> impl Iterator<Item = isize> {
        let m = self.max_delay as isize;
        let upper = match self.window {
            LagWindow::HalfOpen => m,
            LagWindow::Symmetric => m + 1,
        };
        -m..upper
    }

    /// Correlation curve of one pixel trace. Slot `i` holds lag `i - max_delay`;
    /// undefined correlations are `NaN`, lags outside the window stay `0.0`.
    pub fn correlation_curve(&self, reference: &ReferenceTrace, trace: &[f64]) -> Result<Vec<f64>> {
        let plan = self.plan("trace", reference)?;
        Ok(plan.curve(trace).values)
    }

    /// Compute the delay map (in frames) of an aligned movie.
    pub fn map(&self, movie: &Movie, reference: &ReferenceTrace) -> Result<DelayMap> {
        movie.ensure_non_empty()?;
        if reference.len() != movie.frame_count() {
            return Err(DelayMapError::InvalidConfig(format!(
                "reference trace has {} samples but segment '{}' has {} frames",
                reference.len(),
                movie.label,
                movie.frame_count()
            )));
        }

        let plan = self.plan(&movie.label, reference)?;
        let (h, w) = movie.frame_shape();

        let compute_row = |row: usize| -> Result<Vec<f64>> {
            let mut trace = vec![0.0f64; movie.frame_count()];
            (0..w)
                .map(|col| {
                    for (dst, &src) in trace.iter_mut().zip(movie.pixel_trace(row, col)) {
                        *dst = src;
                    }
                    match plan.curve(&trace).peak_lag() {
                        Some(delay) => Ok(-delay as f64),
                        None => match self.policy {
                            DegeneratePolicy::Nan => Ok(f64::NAN),
                            DegeneratePolicy::Fail => Err(DelayMapError::DegenerateTrace {
                                segment: movie.label.clone(),
                                pixel: Some((row, col)),
                            }),
                        },
                    }
                })
                .collect()
        };

        // Rows are gathered in order before checking for errors, so the
        // reported pixel is the first failing one in row-major order.
        let rows: Vec<Result<Vec<f64>>> = if h * w >= PARALLEL_PIXEL_THRESHOLD {
            (0..h).into_par_iter().map(compute_row).collect()
        } else {
            (0..h).map(compute_row).collect()
        };
        let rows = rows.into_iter().collect::<Result<Vec<_>>>()?;

        let mut data = Array2::<f64>::zeros((h, w));
        for (row, values) in rows.into_iter().enumerate() {
            for (col, val) in values.into_iter().enumerate() {
                data[[row, col]] = val;
            }
        }

        let degenerate_pixels = data.iter().filter(|v| v.is_nan()).count();
        if degenerate_pixels > 0 {
            let first = data
                .indexed_iter()
                .find(|(_, v)| v.is_nan())
                .map(|(idx, _)| idx);
            warn!(
                segment = %movie.label,
                count = degenerate_pixels,
                first = ?first,
                "Pixels with flat traces marked as NaN"
            );
        }

        Ok(DelayMap {
            data,
            degenerate_pixels,
        })
    }

    /// Center the reference once per lag; every pixel reuses it.
    fn plan(&self, segment: &str, reference: &ReferenceTrace) -> Result<LagPlan> {
        let frames = reference.len();
        if frames < self.max_delay + 2 {
            return Err(DelayMapError::LagWindowTooLarge {
                segment: segment.to_string(),
                max_delay: self.max_delay,
                frames,
            });
        }

        let values = reference.values.to_vec();
        let lags: Vec<LagSlot> = self
            .lags()
            .map(|lag| {
                let (x, _) = window_bounds(lag, frames);
                LagSlot {
                    lag,
                    reference: CenteredSeries::new(&values[x.0..x.1]),
                }
            })
            .collect();

        if lags.iter().all(|slot| slot.reference.is_none()) {
            return Err(DelayMapError::DegenerateTrace {
                segment: segment.to_string(),
                pixel: None,
            });
        }

        debug!(
            segment,
            lags = lags.len(),
            max_delay = self.max_delay,
            "Lag search prepared"
        );

        Ok(LagPlan {
            max_delay: self.max_delay,
            frames,
            lags,
        })
    }
}

struct LagSlot {
    lag: isize,
    /// `None` if the reference is flat inside this lag's window.
    reference: Option<CenteredSeries>,
}

struct LagPlan {
    max_delay: usize,
    frames: usize,
    lags: Vec<LagSlot>,
}

impl LagPlan {
    fn curve(&self, trace: &[f64]) -> CorrelationCurve {
        debug_assert_eq!(trace.len(), self.frames);
        let mut values = vec![0.0f64; 2 * self.max_delay + 1];
        let mut defined = 0;
        for slot in &self.lags {
            let (_, y) = window_bounds(slot.lag, self.frames);
            let r = slot
                .reference
                .as_ref()
                .and_then(|x| x.correlate(&trace[y.0..y.1]));
            if r.is_some() {
                defined += 1;
            }
            values[(slot.lag + self.max_delay as isize) as usize] = r.unwrap_or(f64::NAN);
        }
        CorrelationCurve {
            values,
            defined,
            max_delay: self.max_delay,
        }
    }
}

struct CorrelationCurve {
    values: Vec<f64>,
    /// Number of lags with a defined correlation.
    defined: usize,
    max_delay: usize,
}

impl CorrelationCurve {
    /// `None` when no evaluated lag produced a correlation.
    fn peak_lag(&self) -> Option<isize> {
        if self.defined == 0 {
            return None;
        }
        peak_lag(&self.values, self.max_delay)
    }
}

/// Index ranges `(reference, pixel)` compared at `lag`.
///
/// Shifting the pixel trace by `lag` pairs reference sample `i` with pixel
/// sample `i - lag`; the samples that would wrap around are dropped.
fn window_bounds(lag: isize, frames: usize) -> ((usize, usize), (usize, usize)) {
    let m = lag.unsigned_abs();
    if lag >= 0 {
        ((m, frames), (0, frames - m))
    } else {
        ((0, frames - m), (m, frames))
    }
}

/// Signed lag of the curve's maximum, first occurrence on ties.
///
/// `NaN` slots are skipped; `None` if every slot is `NaN`.
pub fn peak_lag(curve: &[f64], max_delay: usize) -> Option<isize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &val) in curve.iter().enumerate() {
        if val.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if val <= b => {}
            _ => best = Some((i, val)),
        }
    }
    best.map(|(i, _)| i as isize - max_delay as isize)
}
