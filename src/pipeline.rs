//! Per-frame detection pipeline
//!
//! locate → crop → rectify → enhance → decode variants → select, region by
//! region, with a whole-frame pass when no region yields a code.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::config::PipelineConfig;
use crate::decoder::selector::Selection;
use crate::decoder::{SymbologyDecoder, Validator, VariantAttempt, VariantSelector};
use crate::detector::{CandidateRegion, CodeLocator, Rectifier, RegionExtractor};
use crate::enhance::{EnhancedVariantSet, EnhancementPipeline};
use crate::models::{CodeKey, DetectedCode, Origin, Point, Raster, RawFrame, VariantTag};

/// Outcome of one frame
#[derive(Debug, Clone, Default)]
pub struct FrameResult {
    /// Accepted codes, unique by symbology and payload
    pub codes: Vec<DetectedCode>,
    /// Candidate regions found by the locator
    pub regions: usize,
    /// Whether the whole-frame pass ran
    pub fallback_used: bool,
}

/// Runs every detection stage on a frame
pub struct FramePipeline {
    decoder: Arc<dyn SymbologyDecoder>,
    config: PipelineConfig,
    locator: CodeLocator,
    extractor: RegionExtractor,
    rectifier: Rectifier,
    enhancer: EnhancementPipeline,
    region_selector: VariantSelector,
    frame_selector: VariantSelector,
}

impl FramePipeline {
    /// Pipeline with default tuning
    pub fn new(decoder: Arc<dyn SymbologyDecoder>) -> Self {
        Self::with_config(decoder, PipelineConfig::default())
    }

    /// Pipeline with explicit tuning
    pub fn with_config(decoder: Arc<dyn SymbologyDecoder>, config: PipelineConfig) -> Self {
        let validator = Validator::new(config.validation);
        let region_selector = VariantSelector::new(validator, config.overlap_iou);
        Self {
            locator: CodeLocator::new(Arc::clone(&decoder), validator),
            extractor: RegionExtractor::new(config.region_margin),
            rectifier: Rectifier::new(config.min_rectified_width, config.min_rectified_height),
            enhancer: EnhancementPipeline::new(config.enhance),
            region_selector,
            frame_selector: region_selector.with_size_check(),
            decoder,
            config,
        }
    }

    /// Active tuning
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Detect every code in `frame`
    pub fn process(&self, frame: &RawFrame) -> FrameResult {
        let started = Instant::now();
        let gray = Raster::Gray(frame.to_gray());
        let regions = self.locator.locate(&gray);

        // par_iter keeps region order in the collected output
        let per_region: Vec<Vec<DetectedCode>> = regions
            .par_iter()
            .map(|region| self.process_region(frame, region))
            .collect();

        let mut codes = dedup(per_region.into_iter().flatten());
        let fallback_used = codes.is_empty();
        if fallback_used {
            codes = self.process_full_frame(frame);
        }

        debug!(
            seq = frame.sequence(),
            regions = regions.len(),
            codes = codes.len(),
            fallback = fallback_used,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "frame processed"
        );

        FrameResult {
            codes,
            regions: regions.len(),
            fallback_used,
        }
    }

    fn process_region(&self, frame: &RawFrame, region: &CandidateRegion) -> Vec<DetectedCode> {
        let Some(crop) = self.extractor.extract(frame.image(), region) else {
            trace!(content = %region.content, "empty crop");
            return Vec::new();
        };
        let rectified = self.rectifier.rectify(&crop);
        let variants = self.enhancer.enhance(&rectified.image);

        let mut attempts = self.decode_variants(&variants);
        let original = Raster::Rgb(rectified.image);
        attempts.push(VariantAttempt::new(VariantTag::Original, self.decoder.decode(&original)));

        let now = Instant::now();
        self.region_selector
            .select(attempts)
            .into_iter()
            .map(|sel| to_detected(sel, region.polygon.clone(), Origin::Region, now))
            .collect()
    }

    /// Enhance and decode the whole frame, no extraction or warping
    ///
    /// The unmodified frame is not decoded again here: the locator pass
    /// already covered it.
    fn process_full_frame(&self, frame: &RawFrame) -> Vec<DetectedCode> {
        let variants = self.enhancer.enhance(frame.image());
        let attempts = self.decode_variants(&variants);
        let now = Instant::now();
        let codes = dedup(self.frame_selector.select(attempts).into_iter().map(|sel| {
            let outline = sel.outline.clone();
            to_detected(sel, outline, Origin::FullFrame, now)
        }));
        if !codes.is_empty() {
            debug!(seq = frame.sequence(), codes = codes.len(), "fallback recovered codes");
        }
        codes
    }

    fn decode_variants(&self, variants: &EnhancedVariantSet) -> Vec<VariantAttempt> {
        variants
            .iter()
            .map(|(tag, raster)| VariantAttempt::new(tag, self.decoder.decode(raster)))
            .collect()
    }
}

fn to_detected(sel: Selection, polygon: Vec<Point>, origin: Origin, now: Instant) -> DetectedCode {
    DetectedCode {
        symbology: sel.symbology,
        content: sel.content,
        polygon,
        rank: sel.variant.rank(),
        variant: sel.variant,
        origin,
        detected_at: now,
    }
}

/// Keep the first code of every (symbology, payload)
fn dedup(codes: impl IntoIterator<Item = DetectedCode>) -> Vec<DetectedCode> {
    let mut seen: HashSet<CodeKey> = HashSet::new();
    codes.into_iter().filter(|c| seen.insert(c.key())).collect()
}
