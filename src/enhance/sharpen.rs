//! Unsharp-mask variant

use image::GrayImage;
use imageproc::filter::gaussian_blur_f32;
use rayon::prelude::*;

/// Weight of the original image in the unsharp mask
const ORIGINAL_WEIGHT: f32 = 1.5;
/// Weight of the blurred image in the unsharp mask
const BLUR_WEIGHT: f32 = -0.5;

/// Unsharp mask: `1.5 * g - 0.5 * gaussian(g, sigma)`, saturated to u8
///
/// A non-positive sigma leaves the image unchanged.
pub fn unsharp_mask(gray: &GrayImage, sigma: f32) -> GrayImage {
    if sigma.is_nan() || sigma <= 0.0 || gray.width() == 0 || gray.height() == 0 {
        return gray.clone();
    }

    let blurred = gaussian_blur_f32(gray, sigma);
    let mut out = gray.clone();
    let pixels: &mut [u8] = &mut out;
    pixels
        .par_iter_mut()
        .zip(blurred.as_raw().par_iter())
        .for_each(|(px, &b)| {
            let v = ORIGINAL_WEIGHT * *px as f32 + BLUR_WEIGHT * b as f32;
            *px = v.round().clamp(0.0, 255.0) as u8;
        });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_flat_image_unchanged() {
        let gray = GrayImage::from_pixel(16, 16, Luma([120]));
        let out = unsharp_mask(&gray, 2.0);
        assert!(out.as_raw().iter().all(|&v| v.abs_diff(120) <= 1));
    }

    #[test]
    fn test_edge_overshoot() {
        let gray = GrayImage::from_fn(32, 8, |x, _| Luma([if x < 16 { 60 } else { 180 }]));
        let out = unsharp_mask(&gray, 2.0);
        // Dark side of the edge gets darker, bright side brighter
        assert!(out.get_pixel(15, 4)[0] < 60);
        assert!(out.get_pixel(16, 4)[0] > 180);
    }

    #[test]
    fn test_zero_sigma_is_identity() {
        let gray = GrayImage::from_fn(8, 8, |x, y| Luma([(x * 30 + y) as u8]));
        assert_eq!(unsharp_mask(&gray, 0.0), gray);
    }
}
