//! Arbitration between decodes of the same region's variants
//!
//! The first variant (in priority order) that produces at least one valid
//! decode is authoritative. Lower-priority variants can only add codes that
//! are new by payload and sit somewhere else in the image.

use tracing::trace;

use super::{Symbol, Validator};
use crate::models::{BoundingBox, Point, Symbology, VariantTag};
use crate::utils::geometry::normalize_outline;

/// Raw decoder output for one variant
#[derive(Debug, Clone)]
pub struct VariantAttempt {
    /// Which variant was decoded
    pub variant: VariantTag,
    /// What the decoder returned, in variant coordinates
    pub symbols: Vec<Symbol>,
}

impl VariantAttempt {
    /// Bundle a decode result with its variant tag
    pub fn new(variant: VariantTag, symbols: Vec<Symbol>) -> Self {
        Self { variant, symbols }
    }
}

/// A decode that survived validation and arbitration
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Symbology
    pub symbology: Symbology,
    /// Trimmed payload
    pub content: String,
    /// Normalized outline in variant coordinates
    pub outline: Vec<Point>,
    /// Variant that produced it
    pub variant: VariantTag,
}

impl Selection {
    fn bbox(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.outline)
    }
}

/// Picks the authoritative decodes among variant attempts
#[derive(Debug, Clone, Copy)]
pub struct VariantSelector {
    validator: Validator,
    overlap_iou: f32,
    check_size: bool,
}

impl VariantSelector {
    /// Selector for rectified regions (payload rules only)
    pub fn new(validator: Validator, overlap_iou: f32) -> Self {
        Self {
            validator,
            overlap_iou,
            check_size: false,
        }
    }

    /// Also apply the minimum box size rule, for full-frame decodes
    pub fn with_size_check(mut self) -> Self {
        self.check_size = true;
        self
    }

    /// Arbitrate `attempts`, which must be in priority order
    pub fn select(&self, attempts: impl IntoIterator<Item = VariantAttempt>) -> Vec<Selection> {
        let mut retained: Vec<Selection> = Vec::new();
        let mut authoritative: Option<VariantTag> = None;

        for attempt in attempts {
            let valid = self.validate(&attempt);
            if valid.is_empty() {
                continue;
            }

            match authoritative {
                None => {
                    trace!(variant = %attempt.variant, count = valid.len(), "authoritative variant");
                    authoritative = Some(attempt.variant);
                    for sel in valid {
                        if !retained.iter().any(|r| same_key(r, &sel)) {
                            retained.push(sel);
                        }
                    }
                }
                Some(_) => {
                    for sel in valid {
                        if self.is_new_code(&retained, &sel) {
                            trace!(variant = %sel.variant, content = %sel.content, "extra code from lower variant");
                            retained.push(sel);
                        }
                    }
                }
            }
        }

        retained
    }

    fn validate(&self, attempt: &VariantAttempt) -> Vec<Selection> {
        attempt
            .symbols
            .iter()
            .filter_map(|symbol| {
                let outline = normalize_outline(&symbol.polygon).unwrap_or_default();
                let content = if self.check_size {
                    let bbox = BoundingBox::from_points(&outline)?;
                    self.validator.accept_located(symbol, &bbox)?
                } else {
                    self.validator.accept_content(&symbol.symbology, &symbol.content)?
                };
                Some(Selection {
                    symbology: symbol.symbology.clone(),
                    content: content.to_string(),
                    outline,
                    variant: attempt.variant,
                })
            })
            .collect()
    }

    /// Distinct payload and no overlap with anything already retained
    fn is_new_code(&self, retained: &[Selection], candidate: &Selection) -> bool {
        if retained.iter().any(|r| same_key(r, candidate)) {
            return false;
        }
        let Some(bbox) = candidate.bbox() else {
            return false;
        };
        retained.iter().all(|r| match r.bbox() {
            Some(other) => bbox.iou(&other) <= self.overlap_iou,
            None => false,
        })
    }
}

fn same_key(a: &Selection, b: &Selection) -> bool {
    a.symbology == b.symbology && a.content == b.content
}
