use std::fmt;

use crate::media::tools::{Dimensions, ToolError};

/// Maximum distance from a target ratio that still counts as a match.
pub const ASPECT_TOLERANCE: f64 = 0.05;

const LANDSCAPE_RATIO: f64 = 16.0 / 9.0;
const PORTRAIT_RATIO: f64 = 9.0 / 16.0;

/// Geometry bucket of a video, used as the storage key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectRatio {
    Landscape,
    Portrait,
    Other,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "landscape",
            AspectRatio::Portrait => "portrait",
            AspectRatio::Other => "other",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn within_tolerance(ratio: f64, target: f64) -> bool {
    (ratio - target).abs() < ASPECT_TOLERANCE
}

/// Classify stream geometry. Zero-sized dimensions are a probe failure, not `Other`.
pub fn classify(dimensions: Dimensions) -> Result<AspectRatio, ToolError> {
    let Dimensions { width, height } = dimensions;
    if width == 0 || height == 0 {
        return Err(ToolError::InvalidDimensions { width, height });
    }

    let ratio = f64::from(width) / f64::from(height);
    let aspect = if within_tolerance(ratio, LANDSCAPE_RATIO) {
        AspectRatio::Landscape
    } else if within_tolerance(ratio, PORTRAIT_RATIO) {
        AspectRatio::Portrait
    } else {
        AspectRatio::Other
    };

    Ok(aspect)
}
