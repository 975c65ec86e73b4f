//! code_inspect - live-video optical code inspection
//!
//! Finds, rectifies, enhances and decodes 1D and 2D codes in camera frames,
//! then checks each inspection cycle against an expected code count.
//!
//! Per frame the [`FramePipeline`] runs:
//! 1. a fast full-frame locator pass producing candidate regions
//! 2. margin cropping and perspective rectification of every region
//! 3. three enhancement variants (binarized, sharpened gray, contrast
//!    enhanced color)
//! 4. decoding of every variant and priority-ordered selection
//! 5. a whole-frame enhanced pass when no region yields a code
//!
//! The [`InspectionWorker`] drives that pipeline from a camera on its own
//! thread and folds each frame into an [`InspectionSession`].
//!
//! Symbology decoding itself is pluggable through [`SymbologyDecoder`]; the
//! `rxing` feature provides a ready-made implementation.

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Camera seam, file-backed camera and hardware parameter sync
pub mod acquisition;
/// Tuning knobs with environment overrides
pub mod config;
/// Decode seam, payload validation and variant selection
pub mod decoder;
/// Locator, region extraction and rectification
pub mod detector;
/// Image enhancement variants and the digital boost
pub mod enhance;
/// Error types
pub mod error;
/// Core data structures (frames, codes, parameters, geometry)
pub mod models;
/// Shared parameter snapshots
pub mod params_store;
/// Per-frame detection pipeline
pub mod pipeline;
/// Parameter profiles on disk
pub mod profile;
/// Inspection cycle state machine
pub mod session;
/// Helpers for the command-line tools
pub mod tools;
/// Low-level image and geometry routines
pub mod utils;
/// Worker thread and control handle
pub mod worker;

use std::sync::Arc;

use image::RgbImage;

pub use decoder::{Symbol, SymbologyDecoder};
pub use error::{AcquisitionError, GeometryError, InvalidParameter, ProfileError};
pub use models::{DetectedCode, PdiParameters, Point, RawFrame, Symbology, VariantTag};
pub use params_store::ParameterStore;
pub use pipeline::{FramePipeline, FrameResult};
pub use profile::ProfileStore;
pub use session::{InspectionSession, SessionSnapshot, SessionStatus};
pub use worker::{Command, InspectionControl, InspectionWorker, WorkerEvent};

/// Detect every code in a single RGB image with default tuning
///
/// # Arguments
/// * `image` - Frame to inspect
/// * `decoder` - Symbology decoder used by every stage
///
/// # Returns
/// Accepted codes, unique by symbology and payload
pub fn detect_codes(image: &RgbImage, decoder: Arc<dyn SymbologyDecoder>) -> Vec<DetectedCode> {
    let frame = RawFrame::new(image.clone(), 0);
    FramePipeline::new(decoder).process(&frame).codes
}
