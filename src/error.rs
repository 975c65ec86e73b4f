//! Error types
//!
//! Only acquisition failures are fatal to the inspection loop. Geometry
//! failures are recovered per region, and decode misses or rejected payloads
//! are not errors at all (they just produce fewer detections).

use std::path::PathBuf;

/// Camera-level failure, reported upward and never retried silently
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AcquisitionError {
    /// The device could not be opened
    #[error("camera {id} could not be opened: {reason}")]
    OpenFailed {
        /// Device identifier
        id: u32,
        /// Backend message
        reason: String,
    },
    /// No frame arrived in time
    #[error("timed out waiting for a frame")]
    Timeout,
    /// The device went away (unplugged, stream ended, read failure)
    #[error("camera device lost: {reason}")]
    DeviceLost {
        /// Backend message
        reason: String,
    },
}

/// A configuration value outside its declared range
///
/// The previous valid value is always kept when this is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid parameter {name}: {value} is outside {min}..={max}")]
pub struct InvalidParameter {
    /// Parameter name
    pub name: &'static str,
    /// Rejected value
    pub value: f64,
    /// Lowest accepted value
    pub min: f64,
    /// Highest accepted value
    pub max: f64,
}

impl InvalidParameter {
    /// Check `value` against an inclusive range
    pub fn check<T>(name: &'static str, value: T, min: T, max: T) -> Result<T, InvalidParameter>
    where
        T: PartialOrd + Into<f64> + Copy,
    {
        if value < min || value > max {
            return Err(InvalidParameter {
                name,
                value: value.into(),
                min: min.into(),
                max: max.into(),
            });
        }
        Ok(value)
    }
}

/// Rectification could not build a usable transform
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum GeometryError {
    /// Zero-area or near-collinear polygon
    #[error("degenerate polygon (area {area:.2} px²)")]
    Degenerate {
        /// Shoelace area of the polygon
        area: f32,
    },
    /// The homography system has no unique solution
    #[error("singular homography")]
    SingularHomography,
}

/// Profile persistence failure
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// File system error
    #[error("profile i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed record
    #[error("profile format error: {0}")]
    Json(#[from] serde_json::Error),
    /// Record parsed but holds an out-of-range value
    #[error("profile rejected: {0}")]
    Invalid(#[from] InvalidParameter),
    /// Every profile slot is taken
    #[error("profile limit reached ({max} files)")]
    LimitReached {
        /// Slot count
        max: u32,
    },
    /// No profile record in the directory
    #[error("no profile found in {}", dir.display())]
    NotFound {
        /// Directory searched
        dir: PathBuf,
    },
}
