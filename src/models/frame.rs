use std::time::Instant;

use image::{GrayImage, RgbImage};

use crate::utils::grayscale::rgb_to_luma;

/// One frame as delivered by the acquisition layer
///
/// Owned by the pipeline run that processes it and dropped afterwards.
#[derive(Debug, Clone)]
pub struct RawFrame {
    image: RgbImage,
    sequence: u64,
    captured_at: Instant,
}

impl RawFrame {
    /// Wrap an RGB buffer captured now
    pub fn new(image: RgbImage, sequence: u64) -> Self {
        Self::with_timestamp(image, sequence, Instant::now())
    }

    /// Wrap an RGB buffer with an explicit capture time
    pub fn with_timestamp(image: RgbImage, sequence: u64, captured_at: Instant) -> Self {
        Self {
            image,
            sequence,
            captured_at,
        }
    }

    /// Pixel data
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Consume the frame and return its pixels
    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// Frame width in pixels
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Frame height in pixels
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Acquisition sequence number
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// When the frame was read from the device
    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }

    /// Luma rendition of the frame
    pub fn to_gray(&self) -> GrayImage {
        rgb_to_luma(&self.image)
    }
}

/// A raster handed to the decode capability
#[derive(Debug, Clone, PartialEq)]
pub enum Raster {
    /// Single channel image
    Gray(GrayImage),
    /// Three channel image
    Rgb(RgbImage),
}

impl Raster {
    /// Width in pixels
    pub fn width(&self) -> u32 {
        match self {
            Raster::Gray(img) => img.width(),
            Raster::Rgb(img) => img.width(),
        }
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        match self {
            Raster::Gray(img) => img.height(),
            Raster::Rgb(img) => img.height(),
        }
    }

    /// Luma view of the raster (copies gray data, converts RGB)
    pub fn to_luma(&self) -> GrayImage {
        match self {
            Raster::Gray(img) => img.clone(),
            Raster::Rgb(img) => rgb_to_luma(img),
        }
    }

    /// True when every pixel is either 0 or 255
    pub fn is_bilevel(&self) -> bool {
        match self {
            Raster::Gray(img) => img.as_raw().iter().all(|&v| v == 0 || v == 255),
            Raster::Rgb(img) => img.as_raw().iter().all(|&v| v == 0 || v == 255),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    #[test]
    fn test_raster_dimensions() {
        let gray = Raster::Gray(GrayImage::new(7, 3));
        assert_eq!((gray.width(), gray.height()), (7, 3));
        let rgb = Raster::Rgb(RgbImage::new(4, 9));
        assert_eq!((rgb.width(), rgb.height()), (4, 9));
    }

    #[test]
    fn test_is_bilevel() {
        let mut img = GrayImage::from_pixel(4, 4, Luma([255]));
        img.put_pixel(1, 1, Luma([0]));
        assert!(Raster::Gray(img.clone()).is_bilevel());
        img.put_pixel(2, 2, Luma([128]));
        assert!(!Raster::Gray(img).is_bilevel());
    }

    #[test]
    fn test_frame_to_gray() {
        let frame = RawFrame::new(RgbImage::from_pixel(3, 2, Rgb([255, 255, 255])), 1);
        let gray = frame.to_gray();
        assert_eq!(gray.dimensions(), (3, 2));
        assert!(gray.as_raw().iter().all(|&v| v >= 254));
    }
}
