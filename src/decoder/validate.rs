//! Payload and size rules for decoded symbols

use tracing::trace;

use super::Symbol;
use crate::config::ValidationRules;
use crate::models::{BoundingBox, Symbology};

/// Payload and geometry filters applied to every decode
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    rules: ValidationRules,
}

impl Validator {
    /// Validator with explicit rules
    pub fn new(rules: ValidationRules) -> Self {
        Self { rules }
    }

    /// Active rules
    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    /// Trimmed payload when it is acceptable for `symbology`
    ///
    /// Accepts printable ASCII only, at least `min_content_len` characters.
    /// GS1 DataBar payloads must also be all digits and at least
    /// `databar_min_len` long.
    pub fn accept_content<'a>(&self, symbology: &Symbology, content: &'a str) -> Option<&'a str> {
        let trimmed = content.trim();
        if trimmed.chars().count() < self.rules.min_content_len {
            trace!(%symbology, len = trimmed.len(), "rejected: payload too short");
            return None;
        }
        if !trimmed.chars().all(|c| (' '..='~').contains(&c)) {
            trace!(%symbology, "rejected: non-printable payload");
            return None;
        }
        if symbology.is_databar()
            && (trimmed.len() < self.rules.databar_min_len
                || !trimmed.chars().all(|c| c.is_ascii_digit()))
        {
            trace!(%symbology, "rejected: malformed DataBar payload");
            return None;
        }
        Some(trimmed)
    }

    /// True when the box is large enough to be a real code
    pub fn accept_size(&self, bbox: &BoundingBox) -> bool {
        bbox.width >= self.rules.min_width && bbox.height >= self.rules.min_height
    }

    /// Validate a symbol whose polygon is in frame coordinates
    ///
    /// Applies both the payload and the size rule. Returns the trimmed
    /// payload on success.
    pub fn accept_located<'a>(&self, symbol: &'a Symbol, bbox: &BoundingBox) -> Option<&'a str> {
        if !self.accept_size(bbox) {
            trace!(
                symbology = %symbol.symbology,
                width = bbox.width,
                height = bbox.height,
                "rejected: box below minimum size"
            );
            return None;
        }
        self.accept_content(&symbol.symbology, &symbol.content)
    }
}
