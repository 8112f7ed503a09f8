use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_DISPLAY_RANGE_S, DEFAULT_MAX_DELAY, DEFAULT_MAX_PLAUSIBLE_SHIFT,
    DEFAULT_REFERENCE_HIGH_QUANTILE, DEFAULT_REFERENCE_LOW_QUANTILE,
};
use crate::error::{DelayMapError, Result};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Segment files, or directories scanned for TIFF/SER files.
    pub inputs: Vec<PathBuf>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Acquisition rate in frames per second. Only affects the final unit scaling.
    pub frame_rate: f64,
    #[serde(default)]
    pub correlation: CorrelationConfig,
    #[serde(default)]
    pub registration: RegistrationConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("delay_map")
}

impl PipelineConfig {
    pub fn new(inputs: Vec<PathBuf>, frame_rate: f64) -> Self {
        Self {
            inputs,
            output_dir: default_output_dir(),
            frame_rate,
            correlation: CorrelationConfig::default(),
            registration: RegistrationConfig::default(),
            output: OutputConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_frame_rate(self.frame_rate)?;
        self.correlation.validate()?;
        self.registration.validate()?;
        self.output.validate()
    }
}

pub(crate) fn validate_frame_rate(frame_rate: f64) -> Result<()> {
    if !frame_rate.is_finite() || frame_rate <= 0.0 {
        return Err(DelayMapError::InvalidConfig(format!(
            "frame_rate must be a positive number, got {frame_rate}"
        )));
    }
    Ok(())
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Half-width of the lag search, in frames. Increase with the frame rate so
    /// the window keeps covering the same span of time.
    pub max_delay: usize,
    pub lag_window: LagWindow,
    pub degenerate_pixels: DegeneratePolicy,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            max_delay: DEFAULT_MAX_DELAY,
            lag_window: LagWindow::default(),
            degenerate_pixels: DegeneratePolicy::default(),
        }
    }
}

impl CorrelationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_delay == 0 {
            return Err(DelayMapError::InvalidConfig(
                "max_delay must be at least 1 frame".into(),
            ));
        }
        Ok(())
    }
}

/// Which lags the correlation search evaluates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LagWindow {
    /// Lags in `[-max_delay, max_delay)`. The slot for `+max_delay` is left at
    /// 0.0 and still takes part in the peak search.
    #[default]
    HalfOpen,
    /// Lags in `[-max_delay, max_delay]`.
    Symmetric,
}

impl std::fmt::Display for LagWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HalfOpen => write!(f, "Half-open"),
            Self::Symmetric => write!(f, "Symmetric"),
        }
    }
}

/// What to do with a pixel whose correlation is undefined at every lag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DegeneratePolicy {
    /// Write `NaN` into the delay map and keep going.
    #[default]
    Nan,
    /// Abort the run, naming the pixel.
    Fail,
}

impl std::fmt::Display for DegeneratePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nan => write!(f, "NaN"),
            Self::Fail => write!(f, "Fail"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    pub rounding: ShiftRounding,
    /// Paraboloid refinement of the correlation peak.
    pub subpixel: bool,
    /// Hann-window both frames before the FFT.
    pub hann_window: bool,
    /// Fraction of the frame extent beyond which a shift is reported as implausible.
    pub max_plausible_shift: f64,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            rounding: ShiftRounding::default(),
            subpixel: false,
            hann_window: false,
            max_plausible_shift: DEFAULT_MAX_PLAUSIBLE_SHIFT,
        }
    }
}

impl RegistrationConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.max_plausible_shift > 0.0) {
            return Err(DelayMapError::InvalidConfig(format!(
                "max_plausible_shift must be positive, got {}",
                self.max_plausible_shift
            )));
        }
        Ok(())
    }
}

/// How a real-valued shift becomes a whole-pixel roll.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShiftRounding {
    /// Toward zero.
    #[default]
    Truncate,
    /// To the nearest pixel, halves away from zero.
    Round,
}

impl ShiftRounding {
    pub fn to_pixels(self, value: f64) -> isize {
        match self {
            Self::Truncate => value.trunc() as isize,
            Self::Round => value.round() as isize,
        }
    }
}

impl std::fmt::Display for ShiftRounding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Truncate => write!(f, "Truncate"),
            Self::Round => write!(f, "Round"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Delay preview maps [-range, +range] seconds onto the gray scale.
    pub display_range_s: f64,
    pub reference_low_quantile: f64,
    pub reference_high_quantile: f64,
    /// Also write each segment's delay map (in frames).
    pub write_segment_maps: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            display_range_s: DEFAULT_DISPLAY_RANGE_S,
            reference_low_quantile: DEFAULT_REFERENCE_LOW_QUANTILE,
            reference_high_quantile: DEFAULT_REFERENCE_HIGH_QUANTILE,
            write_segment_maps: false,
        }
    }
}

impl OutputConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.display_range_s > 0.0) {
            return Err(DelayMapError::InvalidConfig(format!(
                "display_range_s must be positive, got {}",
                self.display_range_s
            )));
        }
        let (lo, hi) = (self.reference_low_quantile, self.reference_high_quantile);
        if !(0.0..=1.0).contains(&lo) || !(0.0..=1.0).contains(&hi) || lo >= hi {
            return Err(DelayMapError::InvalidConfig(format!(
                "reference quantiles must satisfy 0 <= low < high <= 1, got {lo} and {hi}"
            )));
        }
        Ok(())
    }
}
