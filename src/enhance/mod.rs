//! Image enhancement variants
//!
//! Each region (or the whole frame in fallback) is turned into three derived
//! rasters that share its geometry:
//! - binarized: adaptive threshold + closing, strongest for linear codes
//! - enhanced: CLAHE on luma with chroma preserved
//! - sharpened: unsharp mask of the enhanced luma
//!
//! All kernels are pure functions of their input and [`EnhanceConfig`].

pub mod binarize;
pub mod boost;
pub mod clahe;
pub mod sharpen;

use image::RgbImage;
use tracing::trace;

use crate::config::EnhanceConfig;
use crate::models::{Raster, VariantTag};
use crate::utils::grayscale::rgb_to_luma;

pub use boost::{apply_boost, apply_software};

/// The derived rasters of one source image
#[derive(Debug, Clone, PartialEq)]
pub struct EnhancedVariantSet {
    /// Two-valued luma
    pub binarized: Raster,
    /// Unsharp-masked luma of `enhanced`
    pub sharpened: Raster,
    /// Local-contrast equalized color
    pub enhanced: Raster,
}

impl EnhancedVariantSet {
    /// Raster for a tag, `None` for [`VariantTag::Original`]
    pub fn get(&self, tag: VariantTag) -> Option<&Raster> {
        match tag {
            VariantTag::Binarized => Some(&self.binarized),
            VariantTag::SharpenedGray => Some(&self.sharpened),
            VariantTag::EnhancedColor => Some(&self.enhanced),
            VariantTag::Original => None,
        }
    }

    /// Variants in decode priority order
    pub fn iter(&self) -> impl Iterator<Item = (VariantTag, &Raster)> {
        [
            (VariantTag::Binarized, &self.binarized),
            (VariantTag::SharpenedGray, &self.sharpened),
            (VariantTag::EnhancedColor, &self.enhanced),
        ]
        .into_iter()
    }

    /// Shared width of every variant
    pub fn width(&self) -> u32 {
        self.binarized.width()
    }

    /// Shared height of every variant
    pub fn height(&self) -> u32 {
        self.binarized.height()
    }
}

/// Produces an [`EnhancedVariantSet`] from an RGB raster
#[derive(Debug, Clone, Copy, Default)]
pub struct EnhancementPipeline {
    config: EnhanceConfig,
}

impl EnhancementPipeline {
    /// Pipeline with explicit settings
    pub fn new(config: EnhanceConfig) -> Self {
        Self { config }
    }

    /// Active settings
    pub fn config(&self) -> &EnhanceConfig {
        &self.config
    }

    /// Build all variants
    ///
    /// The binarized branch only depends on the input luma, so it runs
    /// alongside the CLAHE and sharpen chain.
    pub fn enhance(&self, image: &RgbImage) -> EnhancedVariantSet {
        let c = &self.config;
        let (binarized, (enhanced, sharpened)) = rayon::join(
            || {
                let luma = rgb_to_luma(image);
                binarize::binarize(&luma, c.adaptive_block, c.adaptive_offset)
            },
            || {
                let enhanced = clahe::clahe_color(image, c.clahe_clip, c.clahe_tiles);
                let sharpened = sharpen::unsharp_mask(&rgb_to_luma(&enhanced), c.unsharp_sigma);
                (enhanced, sharpened)
            },
        );

        trace!(
            width = image.width(),
            height = image.height(),
            "enhancement variants built"
        );

        EnhancedVariantSet {
            binarized: Raster::Gray(binarized),
            sharpened: Raster::Gray(sharpened),
            enhanced: Raster::Rgb(enhanced),
        }
    }
}
