//! Binarized variant

use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::morphology::close;

use crate::utils::binarization::adaptive_threshold;

/// Adaptive local-mean threshold followed by a 3x3 closing
///
/// Output is strictly two-valued: 0 or 255.
pub fn binarize(gray: &GrayImage, block: u32, offset: i32) -> GrayImage {
    let thresholded = adaptive_threshold(gray, block, offset);
    if thresholded.width() == 0 || thresholded.height() == 0 {
        return thresholded;
    }
    // LInf radius 1 is the 3x3 square structuring element
    close(&thresholded, Norm::LInf, 1)
}
