//! Candidate regions from a whole-frame decode pass

use std::sync::Arc;

use tracing::{debug, trace};

use crate::decoder::{SymbologyDecoder, Validator};
use crate::models::{BoundingBox, Point, Raster, Symbology};
use crate::utils::geometry::normalize_outline;

/// Area of a frame suspected to hold one code
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRegion {
    /// Outline in frame coordinates, at least four points
    pub polygon: Vec<Point>,
    /// Axis-aligned box around `polygon`
    pub bbox: BoundingBox,
    /// Symbology reported by the first pass
    pub symbology: Symbology,
    /// Payload reported by the first pass
    pub content: String,
}

/// Fast first pass: decode the whole gray frame once and keep the outlines
pub struct CodeLocator {
    decoder: Arc<dyn SymbologyDecoder>,
    validator: Validator,
}

impl CodeLocator {
    /// Locator using `decoder` for the first pass
    pub fn new(decoder: Arc<dyn SymbologyDecoder>, validator: Validator) -> Self {
        Self { decoder, validator }
    }

    /// Candidate regions in `gray`
    ///
    /// Results with an invalid payload, or whose normalized box is below
    /// the minimum code size, are dropped. No result is not an error.
    pub fn locate(&self, gray: &Raster) -> Vec<CandidateRegion> {
        let symbols = self.decoder.decode(gray);
        let total = symbols.len();

        let regions: Vec<CandidateRegion> = symbols
            .into_iter()
            .filter_map(|symbol| {
                let Some(polygon) = normalize_outline(&symbol.polygon) else {
                    trace!(symbology = %symbol.symbology, "rejected: no outline");
                    return None;
                };
                let bbox = BoundingBox::from_points(&polygon)?;
                let content = self.validator.accept_located(&symbol, &bbox)?.to_string();
                Some(CandidateRegion {
                    polygon,
                    bbox,
                    symbology: symbol.symbology,
                    content,
                })
            })
            .collect();

        debug!(found = total, kept = regions.len(), "locator pass");
        regions
    }
}
