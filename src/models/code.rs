use std::fmt;
use std::time::Instant;

use super::{BoundingBox, Point};

/// Symbology reported by the decode capability
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbology {
    /// QR code (Model 2 and Micro)
    Qr,
    /// Data Matrix (ECC 200)
    DataMatrix,
    /// PDF417 stacked code
    Pdf417,
    /// Aztec code
    Aztec,
    /// EAN-13
    Ean13,
    /// EAN-8
    Ean8,
    /// UPC-A
    UpcA,
    /// UPC-E
    UpcE,
    /// Code 128
    Code128,
    /// Code 39
    Code39,
    /// Code 93
    Code93,
    /// Codabar
    Codabar,
    /// Interleaved 2 of 5
    Itf,
    /// GS1 DataBar (RSS-14)
    DataBar,
    /// GS1 DataBar Expanded
    DataBarExpanded,
    /// Anything else, named by the decoder
    Other(String),
}

impl Symbology {
    /// GS1 DataBar family (numeric payloads only)
    pub fn is_databar(&self) -> bool {
        matches!(self, Symbology::DataBar | Symbology::DataBarExpanded)
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Symbology::Qr => "QRCODE",
            Symbology::DataMatrix => "DATAMATRIX",
            Symbology::Pdf417 => "PDF417",
            Symbology::Aztec => "AZTEC",
            Symbology::Ean13 => "EAN13",
            Symbology::Ean8 => "EAN8",
            Symbology::UpcA => "UPCA",
            Symbology::UpcE => "UPCE",
            Symbology::Code128 => "CODE128",
            Symbology::Code39 => "CODE39",
            Symbology::Code93 => "CODE93",
            Symbology::Codabar => "CODABAR",
            Symbology::Itf => "I25",
            Symbology::DataBar => "DATABAR",
            Symbology::DataBarExpanded => "DATABAR_EXP",
            Symbology::Other(name) => name.as_str(),
        };
        f.write_str(name)
    }
}

/// Which rendition of a region produced a decode, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VariantTag {
    /// Adaptive threshold + closing, best for linear codes
    Binarized,
    /// Unsharp-masked luma of the enhanced image
    SharpenedGray,
    /// Local contrast equalized color, best for matrix codes
    EnhancedColor,
    /// The rectified image without enhancement
    Original,
}

impl VariantTag {
    /// Decode attempt order
    pub const PRIORITY: [VariantTag; 4] = [
        VariantTag::Binarized,
        VariantTag::SharpenedGray,
        VariantTag::EnhancedColor,
        VariantTag::Original,
    ];

    /// Position in [`VariantTag::PRIORITY`], 0 is best
    pub fn rank(&self) -> u8 {
        *self as u8
    }

    /// Short lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            VariantTag::Binarized => "binarized",
            VariantTag::SharpenedGray => "sharpened",
            VariantTag::EnhancedColor => "enhanced",
            VariantTag::Original => "original",
        }
    }
}

impl fmt::Display for VariantTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where in the pipeline a code was accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Located, rectified and re-decoded region
    Region,
    /// Whole-frame fallback pass
    FullFrame,
}

/// Identity of a code inside an inspection: symbology plus payload
pub type CodeKey = (Symbology, String);

/// A validated decode result in frame coordinates
#[derive(Debug, Clone)]
pub struct DetectedCode {
    /// Symbology
    pub symbology: Symbology,
    /// Decoded payload
    pub content: String,
    /// Outline in source frame coordinates
    pub polygon: Vec<Point>,
    /// Variant that produced the winning decode
    pub variant: VariantTag,
    /// Region or full-frame fallback
    pub origin: Origin,
    /// Variant priority rank (0 = binarized)
    pub rank: u8,
    /// When the pipeline accepted the code
    pub detected_at: Instant,
}

impl DetectedCode {
    /// Dedup identity
    pub fn key(&self) -> CodeKey {
        (self.symbology.clone(), self.content.clone())
    }

    /// Bounding box of the outline
    pub fn bbox(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.polygon)
    }
}

impl fmt::Display for DetectedCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.symbology, self.content)
    }
}
