//! Margin crops around located candidates

use image::{RgbImage, imageops};

use super::locator::CandidateRegion;
use crate::models::{PixelRect, Point};

/// A candidate cropped out of its frame
#[derive(Debug, Clone)]
pub struct RegionCrop {
    /// Cropped pixels
    pub image: RgbImage,
    /// Outline in crop-local coordinates
    pub polygon: Vec<Point>,
    /// Crop rectangle in frame coordinates
    pub offset: PixelRect,
}

impl RegionCrop {
    /// Map a crop-local point back into the frame
    pub fn to_frame(&self, p: &Point) -> Point {
        p.translate(self.offset.x as f32, self.offset.y as f32)
    }
}

/// Crops candidates with a safety margin
#[derive(Debug, Clone, Copy)]
pub struct RegionExtractor {
    margin: f32,
}

impl Default for RegionExtractor {
    fn default() -> Self {
        Self { margin: 0.2 }
    }
}

impl RegionExtractor {
    /// Extractor growing each side by `margin` of the box size
    pub fn new(margin: f32) -> Self {
        Self {
            margin: margin.max(0.0),
        }
    }

    /// Crop `region` out of `frame`, `None` when nothing is left after clamping
    pub fn extract(&self, frame: &RgbImage, region: &CandidateRegion) -> Option<RegionCrop> {
        let rect = region
            .bbox
            .expand_clamped(self.margin, frame.width(), frame.height())?;
        let image = imageops::crop_imm(frame, rect.x, rect.y, rect.width, rect.height).to_image();
        let (dx, dy) = (-(rect.x as f32), -(rect.y as f32));
        let polygon = region.polygon.iter().map(|p| p.translate(dx, dy)).collect();
        Some(RegionCrop {
            image,
            polygon,
            offset: rect,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BoundingBox, Symbology};
    use image::Rgb;

    fn region(bbox: BoundingBox) -> CandidateRegion {
        CandidateRegion {
            polygon: bbox.corners().to_vec(),
            bbox,
            symbology: Symbology::Qr,
            content: "REGION".into(),
        }
    }

    #[test]
    fn test_margin_and_mapping() {
        let frame = RgbImage::from_fn(640, 480, |x, y| Rgb([x as u8, y as u8, 0]));
        let crop = RegionExtractor::default()
            .extract(&frame, &region(BoundingBox::new(100.0, 50.0, 100.0, 50.0)))
            .unwrap();
        assert_eq!(crop.offset, PixelRect { x: 80, y: 40, width: 140, height: 70 });
        assert_eq!(crop.image.dimensions(), (140, 70));
        assert_eq!(crop.polygon[0], Point::new(20.0, 10.0));
        assert_eq!(crop.to_frame(&crop.polygon[2]), Point::new(200.0, 100.0));
        assert_eq!(crop.image.get_pixel(0, 0), frame.get_pixel(80, 40));
    }

    #[test]
    fn test_clamped_at_border() {
        let frame = RgbImage::new(200, 100);
        let crop = RegionExtractor::default()
            .extract(&frame, &region(BoundingBox::new(150.0, 60.0, 50.0, 40.0)))
            .unwrap();
        assert_eq!(crop.offset.x + crop.offset.width, 200);
        assert_eq!(crop.offset.y + crop.offset.height, 100);
    }

    #[test]
    fn test_outside_frame_yields_nothing() {
        let frame = RgbImage::new(100, 100);
        let r = region(BoundingBox::new(300.0, 300.0, 20.0, 20.0));
        assert!(RegionExtractor::default().extract(&frame, &r).is_none());
    }
}
