//! Core data structures shared by every pipeline stage

pub mod code;
pub mod frame;
pub mod params;
pub mod point;

pub use code::{CodeKey, DetectedCode, Origin, Symbology, VariantTag};
pub use frame::{Raster, RawFrame};
pub use params::{HardwareParams, PdiParameters, SoftwareParams};
pub use point::{BoundingBox, PixelRect, Point};
