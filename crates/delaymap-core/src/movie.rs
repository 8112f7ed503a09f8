use ndarray::{Array1, Array2, Array3, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{DelayMapError, Result};

/// A time-lapse recording of one segment.
/// Intensities are raw `f64` values, shape = (frames, height, width).
#[derive(Clone, Debug)]
pub struct Movie {
    pub data: Array3<f64>,
    /// Human-readable source name (usually the file name), used in diagnostics.
    pub label: String,
}

impl Movie {
    pub fn new(data: Array3<f64>, label: impl Into<String>) -> Self {
        Self {
            data,
            label: label.into(),
        }
    }

    pub fn frame_count(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn height(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    pub fn width(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    /// Spatial shape (height, width).
    pub fn frame_shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    /// Time trace of a single pixel.
    pub fn pixel_trace(&self, row: usize, col: usize) -> ArrayView1<'_, f64> {
        self.data.slice(ndarray::s![.., row, col])
    }

    /// Reject movies with no frames or zero spatial extent.
    pub fn ensure_non_empty(&self) -> Result<()> {
        let (t, h, w) = self.data.dim();
        if t == 0 || h == 0 || w == 0 {
            return Err(DelayMapError::InvalidDimensions {
                frames: t,
                width: w,
                height: h,
            });
        }
        Ok(())
    }
}

/// Whole-field mean activity of a movie, one value per frame.
#[derive(Clone, Debug)]
pub struct ReferenceTrace {
    pub values: Array1<f64>,
}

impl ReferenceTrace {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Temporal mean of the first segment: the anatomical anchor all later
/// segments are registered to. Never mutated after creation.
#[derive(Clone, Debug)]
pub struct ReferenceFrame {
    pub data: Array2<f64>,
}

impl ReferenceFrame {
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }
}

/// Translation of a segment relative to the reference frame, in pixels.
///
/// A segment whose mean frame equals the reference circularly shifted by
/// `(row, col)` has shift `(row, col)`; correction applies the negated shift.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Shift {
    pub row: f64,
    pub col: f64,
}

impl Shift {
    pub fn new(row: f64, col: f64) -> Self {
        Self { row, col }
    }

    pub fn is_zero(&self) -> bool {
        self.row == 0.0 && self.col == 0.0
    }
}

/// Per-pixel lag estimates of one segment, in frames.
/// `NaN` marks pixels whose trace carried no usable signal.
#[derive(Clone, Debug)]
pub struct DelayMap {
    pub data: Array2<f64>,
    /// Number of pixels set to `NaN`.
    pub degenerate_pixels: usize,
}

impl DelayMap {
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }
}

/// Mean delay across all segments, in seconds.
#[derive(Clone, Debug)]
pub struct AggregatedDelayMap {
    pub seconds: Array2<f64>,
    pub segment_count: usize,
    pub frame_rate: f64,
}

impl AggregatedDelayMap {
    pub fn shape(&self) -> (usize, usize) {
        self.seconds.dim()
    }
}
