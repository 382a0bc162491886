pub mod roi;

pub use roi::RegionOfInterest;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::depth::DepthFrame;

/// Outcome of scanning one frame. `min_distance_m` is only meaningful when
/// `obstacle_found` is true; it stays 0.0 otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub obstacle_found: bool,
    pub min_distance_m: f32,
}

impl DetectionResult {
    pub fn clear() -> Self {
        Self {
            obstacle_found: false,
            min_distance_m: 0.0,
        }
    }
}

/// Malformed input to `detect`. These are rejected outright rather than
/// clamped: a silently narrowed region or threshold would weaken a
/// safety-relevant computation.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum DetectError {
    #[error("frame dimensions must be non-zero, got {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    #[error("region ratio {value} is outside (0, 1]")]
    InvalidRatio { value: f32 },
    #[error("collision threshold {value} must be positive and finite")]
    InvalidThreshold { value: f32 },
}

fn validate_ratio(value: f32) -> Result<(), DetectError> {
    if !value.is_finite() || value <= 0.0 || value > 1.0 {
        return Err(DetectError::InvalidRatio { value });
    }
    Ok(())
}

/// Scan the centered region of interest of `frame` for any reading closer
/// than `threshold_m`.
///
/// A pixel contributes only when its reading is strictly greater than zero
/// (readings <= 0 are unmeasured) and strictly less than the threshold; a
/// reading exactly at the threshold is not an obstacle. A single contributing
/// pixel is enough for a positive result. No smoothing or outlier rejection:
/// for this tool a missed obstacle costs more than a spurious alert.
///
/// Pure and deterministic; all side effects live with the caller.
pub fn detect(
    frame: &DepthFrame,
    roi_width_ratio: f32,
    roi_height_ratio: f32,
    threshold_m: f32,
) -> Result<DetectionResult, DetectError> {
    let (width, height) = (frame.width(), frame.height());
    if width == 0 || height == 0 {
        return Err(DetectError::InvalidDimensions { width, height });
    }
    validate_ratio(roi_width_ratio)?;
    validate_ratio(roi_height_ratio)?;
    if !threshold_m.is_finite() || threshold_m <= 0.0 {
        return Err(DetectError::InvalidThreshold { value: threshold_m });
    }

    let roi = RegionOfInterest::centered(width, height, roi_width_ratio, roi_height_ratio);
    if roi.is_empty() {
        return Ok(DetectionResult::clear());
    }

    let mut min_distance: Option<f32> = None;
    for y in roi.y..roi.y + roi.height {
        for &reading in &frame.row(y)[roi.x..roi.x + roi.width] {
            if reading > 0.0 && reading < threshold_m {
                min_distance = Some(match min_distance {
                    Some(current) => current.min(reading),
                    None => reading,
                });
            }
        }
    }

    Ok(match min_distance {
        Some(distance) => DetectionResult {
            obstacle_found: true,
            min_distance_m: distance,
        },
        None => DetectionResult::clear(),
    })
}
