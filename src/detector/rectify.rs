//! Perspective correction of cropped regions
//!
//! A region outline is reduced to a quadrilateral and warped to an upright
//! rectangle of at least 100x50 pixels. Degenerate outlines fall back to the
//! unwarped crop.

use image::RgbImage;
use rayon::prelude::*;
use tracing::warn;

use super::region::RegionCrop;
use crate::error::GeometryError;
use crate::models::{PixelRect, Point};
use crate::utils::geometry::{
    MIN_POLYGON_AREA, PerspectiveTransform, min_area_rect, order_quad, polygon_area,
};

/// Largest side of a warped output; thinner slivers are treated as degenerate
const MAX_RECTIFIED_SIDE: f32 = 4096.0;

/// Shortest accepted quad edge in pixels
const MIN_EDGE: f32 = 2.0;

/// A region in fixed orientation
#[derive(Debug, Clone)]
pub struct RectifiedImage {
    /// Upright pixels (or the unwarped crop)
    pub image: RgbImage,
    /// Whether a perspective warp was applied
    pub warped: bool,
    /// Crop rectangle in frame coordinates
    pub offset: PixelRect,
}

/// Warps skewed quadrilaterals into upright rectangles
#[derive(Debug, Clone, Copy)]
pub struct Rectifier {
    min_width: u32,
    min_height: u32,
}

impl Default for Rectifier {
    fn default() -> Self {
        Self {
            min_width: 100,
            min_height: 50,
        }
    }
}

impl Rectifier {
    /// Rectifier upscaling warped output to at least `min_width x min_height`
    pub fn new(min_width: u32, min_height: u32) -> Self {
        Self {
            min_width: min_width.max(1),
            min_height: min_height.max(1),
        }
    }

    /// Rectify a crop; geometry failures fall back to the unwarped crop
    pub fn rectify(&self, crop: &RegionCrop) -> RectifiedImage {
        match self.warp(&crop.image, &crop.polygon) {
            Ok(image) => RectifiedImage {
                image,
                warped: true,
                offset: crop.offset,
            },
            Err(err) => {
                warn!(%err, x = crop.offset.x, y = crop.offset.y, "rectification skipped");
                RectifiedImage {
                    image: crop.image.clone(),
                    warped: false,
                    offset: crop.offset,
                }
            }
        }
    }

    /// Warp the area inside `polygon` into an upright rectangle
    pub fn warp(&self, image: &RgbImage, polygon: &[Point]) -> Result<RgbImage, GeometryError> {
        let quad = self.quad(polygon)?;
        let [tl, tr, br, bl] = quad;

        let width = tl.distance(&tr).max(bl.distance(&br));
        let height = tl.distance(&bl).max(tr.distance(&br));
        if width < MIN_EDGE || height < MIN_EDGE {
            return Err(GeometryError::Degenerate {
                area: polygon_area(&quad),
            });
        }

        let scale = (self.min_width as f32 / width)
            .max(self.min_height as f32 / height)
            .max(1.0);
        let out_w = (width * scale).ceil();
        let out_h = (height * scale).ceil();
        if out_w > MAX_RECTIFIED_SIDE || out_h > MAX_RECTIFIED_SIDE {
            return Err(GeometryError::Degenerate {
                area: polygon_area(&quad),
            });
        }

        let rect = [
            Point::new(0.0, 0.0),
            Point::new(out_w - 1.0, 0.0),
            Point::new(out_w - 1.0, out_h - 1.0),
            Point::new(0.0, out_h - 1.0),
        ];
        let transform =
            PerspectiveTransform::from_points(&rect, &quad).ok_or(GeometryError::SingularHomography)?;

        let (w, h) = (out_w as u32, out_h as u32);
        let row_len = w as usize * 3;
        let mut out = vec![0u8; row_len * h as usize];
        out.par_chunks_mut(row_len).enumerate().for_each(|(y, row)| {
            for x in 0..w as usize {
                let src = transform
                    .transform(&Point::new(x as f32, y as f32))
                    .unwrap_or_default();
                let px = sample_bilinear(image, src.x, src.y);
                row[x * 3..x * 3 + 3].copy_from_slice(&px);
            }
        });

        RgbImage::from_raw(w, h, out).ok_or(GeometryError::SingularHomography)
    }

    /// Four ordered corners for `polygon`
    fn quad(&self, polygon: &[Point]) -> Result<[Point; 4], GeometryError> {
        let corners = match <[Point; 4]>::try_from(polygon) {
            Ok(quad) => quad,
            Err(_) => min_area_rect(polygon).ok_or(GeometryError::Degenerate {
                area: polygon_area(polygon),
            })?,
        };

        let area = polygon_area(&corners);
        if !area.is_finite() || area < MIN_POLYGON_AREA {
            return Err(GeometryError::Degenerate { area });
        }
        Ok(order_quad(&corners))
    }
}

/// Bilinear sample with edge clamping
fn sample_bilinear(image: &RgbImage, x: f32, y: f32) -> [u8; 3] {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return [0; 3];
    }
    let max_x = (w - 1) as f32;
    let max_y = (h - 1) as f32;
    let x = if x.is_finite() { x.clamp(0.0, max_x) } else { 0.0 };
    let y = if y.is_finite() { y.clamp(0.0, max_y) } else { 0.0 };

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = image.get_pixel(x0, y0);
    let p10 = image.get_pixel(x1, y0);
    let p01 = image.get_pixel(x0, y1);
    let p11 = image.get_pixel(x1, y1);

    let mut out = [0u8; 3];
    for (c, v) in out.iter_mut().enumerate() {
        let top = p00[c] as f32 * (1.0 - fx) + p10[c] as f32 * fx;
        let bottom = p01[c] as f32 * (1.0 - fx) + p11[c] as f32 * fx;
        *v = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn crop(image: RgbImage, polygon: Vec<Point>) -> RegionCrop {
        RegionCrop {
            offset: PixelRect {
                x: 10,
                y: 20,
                width: image.width(),
                height: image.height(),
            },
            image,
            polygon,
        }
    }

    /// Dark filled quad on white
    fn dark_quad(w: u32, h: u32, quad: &[Point; 4]) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| {
            let p = Point::new(x as f32, y as f32);
            let inside = (0..4).all(|i| quad[i].cross(&quad[(i + 1) % 4], &p) >= 0.0);
            if inside { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
        })
    }

    #[test]
    fn test_skewed_quad_is_upscaled() {
        let quad = [
            Point::new(10.0, 8.0),
            Point::new(60.0, 14.0),
            Point::new(56.0, 40.0),
            Point::new(12.0, 36.0),
        ];
        let img = dark_quad(70, 50, &quad);
        let out = Rectifier::default().rectify(&crop(img, quad.to_vec()));
        assert!(out.warped);
        assert!(out.image.width() >= 100 && out.image.height() >= 50);
        assert_eq!(out.offset.x, 10);

        // Upright output is dark almost everywhere
        let (w, h) = out.image.dimensions();
        let center = out.image.get_pixel(w / 2, h / 2);
        assert!(center[0] < 40);
        let dark = out.image.pixels().filter(|p| p[0] < 128).count();
        assert!(dark as f32 > 0.7 * (w * h) as f32);
    }

    #[test]
    fn test_unordered_quad() {
        let quad = vec![
            Point::new(80.0, 60.0),
            Point::new(20.0, 10.0),
            Point::new(20.0, 60.0),
            Point::new(80.0, 10.0),
        ];
        let out = Rectifier::default().rectify(&crop(RgbImage::new(100, 80), quad));
        assert!(out.warped);
        // 60 x 50 source, scaled by 100/60
        assert!((100..=101).contains(&out.image.width()));
        assert!(out.image.height() >= 83);
    }

    #[test]
    fn test_zero_area_falls_back() {
        let img = RgbImage::from_pixel(40, 30, Rgb([9, 9, 9]));
        let line = vec![
            Point::new(5.0, 5.0),
            Point::new(20.0, 5.0),
            Point::new(35.0, 5.0),
            Point::new(10.0, 5.0),
        ];
        let out = Rectifier::default().rectify(&crop(img.clone(), line));
        assert!(!out.warped);
        assert_eq!(out.image, img);
    }

    #[test]
    fn test_polygon_reduced_to_rectangle() {
        let pentagon = vec![
            Point::new(10.0, 10.0),
            Point::new(90.0, 10.0),
            Point::new(95.0, 35.0),
            Point::new(90.0, 60.0),
            Point::new(10.0, 60.0),
        ];
        let out = Rectifier::default().rectify(&crop(RgbImage::new(100, 70), pentagon));
        assert!(out.warped);
        assert!(out.image.width() >= 100 && out.image.height() >= 50);
    }

    #[test]
    fn test_empty_polygon_falls_back() {
        let out = Rectifier::default().rectify(&crop(RgbImage::new(10, 10), vec![]));
        assert!(!out.warped);
    }
}
