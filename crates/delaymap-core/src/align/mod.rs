pub mod phase_correlation;
mod segment;
pub mod shift;
pub mod subpixel;

pub use phase_correlation::phase_cross_correlation;
pub use segment::{AlignedSegment, SegmentAligner};
pub use shift::roll_frames;
