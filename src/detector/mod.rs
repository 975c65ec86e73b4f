//! Region detection stages
//!
//! - Locating candidate codes with a fast full-frame pass
//! - Cropping each candidate with a safety margin
//! - Warping skewed candidates into upright rectangles

/// Full-frame first pass producing candidate regions
pub mod locator;
/// Perspective correction of cropped regions
pub mod rectify;
/// Margin cropping with frame coordinate bookkeeping
pub mod region;

pub use locator::{CandidateRegion, CodeLocator};
pub use rectify::{RectifiedImage, Rectifier};
pub use region::{RegionCrop, RegionExtractor};
