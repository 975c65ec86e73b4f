//! Utility functions for image processing
//!
//! - Grayscale conversion (RGB to luminance)
//! - Adaptive thresholding over an integral image
//! - Geometry (perspective transforms, polygon helpers)

pub mod binarization;
pub mod geometry;
pub mod grayscale;
