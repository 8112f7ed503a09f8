use thiserror::Error;

#[derive(Error, Debug)]
pub enum DelayMapError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid SER file: {0}")]
    InvalidSer(String),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid movie dimensions: {frames} frames of {width}x{height}")]
    InvalidDimensions {
        frames: usize,
        width: usize,
        height: usize,
    },

    #[error("Segment '{segment}' is {width}x{height}, expected {expected_width}x{expected_height}")]
    InputShapeMismatch {
        segment: String,
        expected_height: usize,
        expected_width: usize,
        height: usize,
        width: usize,
    },

    #[error("{}", degenerate_message(.segment, .pixel))]
    DegenerateTrace {
        segment: String,
        pixel: Option<(usize, usize)>,
    },

    #[error("Lag window of +/-{max_delay} frames is too large for segment '{segment}' with {frames} frames")]
    LagWindowTooLarge {
        segment: String,
        max_delay: usize,
        frames: usize,
    },

    #[error("No input segments found")]
    EmptyInputSet,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Config serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}

fn degenerate_message(segment: &str, pixel: &Option<(usize, usize)>) -> String {
    match pixel {
        Some((row, col)) => format!(
            "Pixel ({row}, {col}) in segment '{segment}' has a flat trace, correlation undefined"
        ),
        None => format!("Reference trace of segment '{segment}' is flat, correlation undefined"),
    }
}

pub type Result<T> = std::result::Result<T, DelayMapError>;
