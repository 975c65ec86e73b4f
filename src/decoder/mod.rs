//! Decode seam and result arbitration
//!
//! Symbology-level decoding is delegated to a [`SymbologyDecoder`]. This
//! module validates what it returns and picks the authoritative results
//! among the enhancement variants of a region.

#[cfg(feature = "rxing")]
pub mod rxing;
pub mod selector;
pub mod validate;

use crate::models::{Point, Raster, Symbology};

#[cfg(feature = "rxing")]
pub use self::rxing::RxingDecoder;
pub use selector::{VariantAttempt, VariantSelector};
pub use validate::Validator;

/// One raw decode result, in the coordinates of the raster it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    /// Symbology reported by the decoder
    pub symbology: Symbology,
    /// Payload as text
    pub content: String,
    /// Outline points (4 for matrix codes, often 2 for a linear scan line)
    pub polygon: Vec<Point>,
}

impl Symbol {
    /// Create a symbol
    pub fn new(symbology: Symbology, content: impl Into<String>, polygon: Vec<Point>) -> Self {
        Self {
            symbology,
            content: content.into(),
            polygon,
        }
    }
}

/// Decode capability for every supported symbology
///
/// Implementations must be cheap to share between threads and must return
/// in bounded time. A miss is an empty vector, never an error.
pub trait SymbologyDecoder: Send + Sync {
    /// Decode every code visible in `raster`
    fn decode(&self, raster: &Raster) -> Vec<Symbol>;
}

impl<F> SymbologyDecoder for F
where
    F: Fn(&Raster) -> Vec<Symbol> + Send + Sync,
{
    fn decode(&self, raster: &Raster) -> Vec<Symbol> {
        self(raster)
    }
}
