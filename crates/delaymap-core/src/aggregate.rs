use ndarray::Array2;

use crate::error::{DelayMapError, Result};
use crate::movie::{AggregatedDelayMap, DelayMap};
use crate::pipeline::config::validate_frame_rate;

/// Average per-segment delay maps and convert frames to seconds.
///
/// A single map is valid input. `NaN` cells propagate into the result.
pub fn aggregate_delay_maps(maps: &[DelayMap], frame_rate: f64) -> Result<AggregatedDelayMap> {
    validate_frame_rate(frame_rate)?;
    let first = maps.first().ok_or(DelayMapError::EmptyInputSet)?;
    let (h, w) = first.shape();

    let mut accumulator = DelayAccumulator::new(h, w);
    for map in maps {
        accumulator.add(map)?;
    }
    accumulator.finalize(frame_rate)
}

/// Running sum of delay maps, so segments can be dropped as soon as their map
/// has been added.
#[derive(Clone, Debug)]
pub struct DelayAccumulator {
    sum: Array2<f64>,
    count: usize,
}

impl DelayAccumulator {
    pub fn new(height: usize, width: usize) -> Self {
        Self {
            sum: Array2::zeros((height, width)),
            count: 0,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn add(&mut self, map: &DelayMap) -> Result<()> {
        let (expected_height, expected_width) = self.sum.dim();
        let (height, width) = map.shape();
        if (height, width) != (expected_height, expected_width) {
            return Err(DelayMapError::InputShapeMismatch {
                segment: format!("#{}", self.count),
                expected_height,
                expected_width,
                height,
                width,
            });
        }
        self.sum += &map.data;
        self.count += 1;
        Ok(())
    }

    /// Mean delay in seconds.
    pub fn finalize(self, frame_rate: f64) -> Result<AggregatedDelayMap> {
        validate_frame_rate(frame_rate)?;
        if self.count == 0 {
            return Err(DelayMapError::EmptyInputSet);
        }
        let n = self.count as f64;
        let seconds = self.sum.mapv(|total| total / n / frame_rate);
        Ok(AggregatedDelayMap {
            seconds,
            segment_count: self.count,
            frame_rate,
        })
    }
}
