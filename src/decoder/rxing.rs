//! [`SymbologyDecoder`] backed by the `rxing` ZXing port

use rxing::BarcodeFormat;
use tracing::debug;

use super::{Symbol, SymbologyDecoder};
use crate::models::{Point, Raster, Symbology};

/// Multi-format decoder using `rxing::helpers::detect_multiple_in_luma`
#[derive(Debug, Clone, Copy, Default)]
pub struct RxingDecoder;

impl RxingDecoder {
    /// Create a decoder
    pub fn new() -> Self {
        Self
    }
}

fn map_format(format: &BarcodeFormat) -> Symbology {
    match format {
        BarcodeFormat::QR_CODE | BarcodeFormat::MICRO_QR_CODE => Symbology::Qr,
        BarcodeFormat::DATA_MATRIX => Symbology::DataMatrix,
        BarcodeFormat::PDF_417 => Symbology::Pdf417,
        BarcodeFormat::AZTEC => Symbology::Aztec,
        BarcodeFormat::EAN_13 => Symbology::Ean13,
        BarcodeFormat::EAN_8 => Symbology::Ean8,
        BarcodeFormat::UPC_A => Symbology::UpcA,
        BarcodeFormat::UPC_E => Symbology::UpcE,
        BarcodeFormat::CODE_128 => Symbology::Code128,
        BarcodeFormat::CODE_39 => Symbology::Code39,
        BarcodeFormat::CODE_93 => Symbology::Code93,
        BarcodeFormat::CODABAR => Symbology::Codabar,
        BarcodeFormat::ITF => Symbology::Itf,
        BarcodeFormat::RSS_14 => Symbology::DataBar,
        BarcodeFormat::RSS_EXPANDED => Symbology::DataBarExpanded,
        other => Symbology::Other(other.to_string()),
    }
}

impl SymbologyDecoder for RxingDecoder {
    fn decode(&self, raster: &Raster) -> Vec<Symbol> {
        let (width, height) = (raster.width(), raster.height());
        if width == 0 || height == 0 {
            return Vec::new();
        }

        let luma = raster.to_luma().into_raw();
        match rxing::helpers::detect_multiple_in_luma(luma, width, height) {
            Ok(results) => results
                .iter()
                .map(|r| {
                    let polygon = r.getPoints().iter().map(|p| Point::new(p.x, p.y)).collect();
                    Symbol::new(map_format(r.getBarcodeFormat()), r.getText(), polygon)
                })
                .collect(),
            Err(rxing::Exceptions::NotFoundException(_)) => Vec::new(),
            Err(e) => {
                debug!("rxing error: {}", e);
                Vec::new()
            }
        }
    }
}
