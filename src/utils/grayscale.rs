//! Luma conversion for `image` buffers
//! Y = 0.299*R + 0.587*G + 0.114*B
//! Uses fast integer arithmetic: Y = (76*R + 150*G + 29*B) >> 8
use image::{GrayImage, RgbImage};
use rayon::prelude::*;

/// Coefficients for grayscale conversion: Y = (76*R + 150*G + 29*B) >> 8
const COEF_R: i32 = 76;
const COEF_G: i32 = 150;
const COEF_B: i32 = 29;

/// Luma of a single RGB pixel
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let lum = (COEF_R * r as i32 + COEF_G * g as i32 + COEF_B * b as i32) >> 8;
    lum.min(255) as u8
}

/// Convert an RGB image to grayscale
/// Processes rows in parallel for multi-core speedup
pub fn rgb_to_luma(rgb: &RgbImage) -> GrayImage {
    let (width, height) = rgb.dimensions();
    let w = width as usize;
    let src = rgb.as_raw();
    let mut gray = vec![0u8; w * height as usize];

    if w > 0 {
        gray.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
            let row_start = y * w * 3;
            for (x, out) in row.iter_mut().enumerate() {
                let idx = row_start + x * 3;
                *out = luma(src[idx], src[idx + 1], src[idx + 2]);
            }
        });
    }

    // Buffer length always matches width * height
    GrayImage::from_raw(width, height, gray).unwrap_or_else(|| GrayImage::new(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_luma_extremes() {
        // Pure white
        assert!(luma(255, 255, 255) >= 254);
        // Pure black
        assert_eq!(luma(0, 0, 0), 0);
        // Pure red
        let red = luma(255, 0, 0);
        assert!(red > 0 && red < 255);
        // Pure green
        assert!(luma(0, 255, 0) > 100);
    }

    #[test]
    fn test_rgb_to_luma_image() {
        let mut img = RgbImage::new(2, 2);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 255, 0]));
        img.put_pixel(0, 1, Rgb([0, 0, 255]));
        img.put_pixel(1, 1, Rgb([255, 255, 255]));
        let gray = rgb_to_luma(&img);
        assert_eq!(gray.dimensions(), (2, 2));
        assert_eq!(gray.get_pixel(0, 0)[0], luma(255, 0, 0));
        assert_eq!(gray.get_pixel(1, 1)[0], luma(255, 255, 255));
    }

    #[test]
    fn test_empty_image() {
        let gray = rgb_to_luma(&RgbImage::new(0, 0));
        assert_eq!(gray.dimensions(), (0, 0));
    }
}
