//! Digital brightness and contrast boost

use image::RgbImage;
use rayon::prelude::*;

use crate::models::SoftwareParams;

/// Digital gain: every channel becomes `saturate(|alpha * p + beta|)`
pub fn apply_boost(image: &mut RgbImage, alpha: f32, beta: i32) {
    let pixels: &mut [u8] = image;
    pixels.par_iter_mut().for_each(|px| {
        let v = (alpha * *px as f32 + beta as f32).abs();
        *px = v.round().min(255.0) as u8;
    });
}

/// Apply the software boost when it is enabled
pub fn apply_software(image: &mut RgbImage, params: &SoftwareParams) {
    if params.boost {
        apply_boost(image, params.alpha, params.beta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_boost_saturates() {
        let mut img = RgbImage::from_pixel(2, 2, Rgb([100, 200, 10]));
        apply_boost(&mut img, 2.0, 10);
        assert_eq!(img.get_pixel(0, 0), &Rgb([210, 255, 30]));
    }

    #[test]
    fn test_negative_offset_takes_absolute_value() {
        let mut img = RgbImage::from_pixel(1, 1, Rgb([20, 50, 0]));
        apply_boost(&mut img, 1.0, -40);
        assert_eq!(img.get_pixel(0, 0), &Rgb([20, 10, 40]));
    }

    #[test]
    fn test_disabled_boost_is_noop() {
        let mut img = RgbImage::from_pixel(3, 3, Rgb([7, 8, 9]));
        let params = SoftwareParams {
            boost: false,
            alpha: 3.0,
            beta: 100,
        };
        apply_software(&mut img, &params);
        assert_eq!(img.get_pixel(1, 1), &Rgb([7, 8, 9]));
    }
}
