/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 1_024;

/// Minimum frame count to use frame-level Rayon parallelism.
pub const PARALLEL_FRAME_THRESHOLD: usize = 4;

/// Small epsilon to avoid division by zero in floating-point comparisons.
pub const EPSILON: f64 = 1e-12;

/// Default half-width of the lag search window, in frames.
/// Tuned for ~4.4 Hz recordings; scale up proportionally for faster frame rates.
pub const DEFAULT_MAX_DELAY: usize = 30;

/// Shift magnitude (fraction of the frame extent) above which a registration
/// estimate is reported as implausible.
pub const DEFAULT_MAX_PLAUSIBLE_SHIFT: f64 = 0.25;

/// Default half-range, in seconds, of the delay map preview.
pub const DEFAULT_DISPLAY_RANGE_S: f64 = 2.0;

/// Default quantiles used to stretch the anatomical reference preview.
pub const DEFAULT_REFERENCE_LOW_QUANTILE: f64 = 0.0;
pub const DEFAULT_REFERENCE_HIGH_QUANTILE: f64 = 0.95;

/// File extensions recognized as multi-page TIFF stacks.
pub const TIFF_EXTENSIONS: [&str; 2] = ["tif", "tiff"];

/// File extension of SER recordings.
pub const SER_EXTENSION: &str = "ser";
