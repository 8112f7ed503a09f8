use tracing::{debug, warn};

use crate::error::{DelayMapError, Result};
use crate::movie::{Movie, ReferenceFrame, Shift};
use crate::pipeline::config::RegistrationConfig;
use crate::reference::mean_frame;

use super::phase_correlation::phase_cross_correlation;
use super::shift::roll_frames;

/// A segment after drift correction.
#[derive(Clone, Debug)]
pub struct AlignedSegment {
    pub movie: Movie,
    /// Estimated displacement of the segment relative to the reference frame.
    pub shift: Shift,
    /// Integer roll actually applied to every frame, (rows, cols).
    pub applied: (isize, isize),
}

/// Registers segments to the anatomical reference established by the first one.
///
/// The reference frame is created once and only borrowed afterwards, so every
/// segment in a run is aligned against the same anchor.
#[derive(Clone, Debug)]
pub struct SegmentAligner {
    reference: ReferenceFrame,
    config: RegistrationConfig,
}

impl SegmentAligner {
    /// Use the temporal mean of `movie` as the reference frame.
    pub fn from_reference_segment(movie: &Movie, config: RegistrationConfig) -> Result<Self> {
        let data = mean_frame(movie)?;
        debug!(
            segment = %movie.label,
            height = data.nrows(),
            width = data.ncols(),
            "Reference frame established"
        );
        Ok(Self {
            reference: ReferenceFrame { data },
            config,
        })
    }

    pub fn with_reference(reference: ReferenceFrame, config: RegistrationConfig) -> Self {
        Self { reference, config }
    }

    pub fn reference(&self) -> &ReferenceFrame {
        &self.reference
    }

    pub fn into_reference(self) -> ReferenceFrame {
        self.reference
    }

    /// Fail unless `movie` has the reference frame's spatial shape.
    pub fn check_shape(&self, movie: &Movie) -> Result<()> {
        let (expected_height, expected_width) = self.reference.shape();
        let (height, width) = movie.frame_shape();
        if (height, width) != (expected_height, expected_width) {
            return Err(DelayMapError::InputShapeMismatch {
                segment: movie.label.clone(),
                expected_height,
                expected_width,
                height,
                width,
            });
        }
        Ok(())
    }

    /// Estimate the displacement of `movie`'s mean frame relative to the reference.
    pub fn estimate_shift(&self, movie: &Movie) -> Result<Shift> {
        self.check_shape(movie)?;
        let segment_mean = mean_frame(movie)?;
        let shift = phase_cross_correlation(&segment_mean, &self.reference.data, &self.config)?;
        self.report_implausible(&movie.label, &shift);
        Ok(shift)
    }

    /// Estimate the drift of `movie` and undo it by circularly shifting every frame.
    pub fn align(&self, movie: Movie) -> Result<AlignedSegment> {
        let shift = self.estimate_shift(&movie)?;
        let rows = -self.config.rounding.to_pixels(shift.row);
        let cols = -self.config.rounding.to_pixels(shift.col);

        let data = if rows == 0 && cols == 0 {
            movie.data
        } else {
            roll_frames(&movie.data, rows, cols)
        };

        debug!(
            segment = %movie.label,
            shift_row = shift.row,
            shift_col = shift.col,
            roll_rows = rows,
            roll_cols = cols,
            "Segment aligned"
        );

        Ok(AlignedSegment {
            movie: Movie::new(data, movie.label),
            shift,
            applied: (rows, cols),
        })
    }

    /// Large shifts are logged, never corrected or rejected.
    fn report_implausible(&self, label: &str, shift: &Shift) {
        let (h, w) = self.reference.shape();
        let limit = self.config.max_plausible_shift;
        if shift.row.abs() > limit * h as f64 || shift.col.abs() > limit * w as f64 {
            warn!(
                segment = %label,
                shift_row = shift.row,
                shift_col = shift.col,
                limit_fraction = limit,
                "Registration shift is implausibly large; the estimate may be unreliable"
            );
        }
    }
}
