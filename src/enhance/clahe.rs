//! Contrast Limited Adaptive Histogram Equalization
//!
//! Per-tile histograms are clipped at `clip * tile_area / 256`, the excess is
//! spread over all bins, and each pixel is mapped through a bilinear blend of
//! the four nearest tile lookup tables.
use image::{GrayImage, RgbImage};
use rayon::prelude::*;

const BINS: usize = 256;

struct TileGrid {
    tiles_x: usize,
    tiles_y: usize,
    tile_w: usize,
    tile_h: usize,
    luts: Vec<[u8; BINS]>,
}

impl TileGrid {
    fn build(gray: &GrayImage, clip: f32, tiles: u32) -> Self {
        let (w, h) = (gray.width() as usize, gray.height() as usize);
        let tiles = tiles.max(1) as usize;
        let tile_w = w.div_ceil(tiles).max(1);
        let tile_h = h.div_ceil(tiles).max(1);
        let tiles_x = w.div_ceil(tile_w).max(1);
        let tiles_y = h.div_ceil(tile_h).max(1);
        let src = gray.as_raw();

        let luts = (0..tiles_x * tiles_y)
            .into_par_iter()
            .map(|t| {
                let (tx, ty) = (t % tiles_x, t / tiles_x);
                let x0 = tx * tile_w;
                let y0 = ty * tile_h;
                let x1 = (x0 + tile_w).min(w);
                let y1 = (y0 + tile_h).min(h);

                let mut hist = [0u32; BINS];
                for y in y0..y1 {
                    for &v in &src[y * w + x0..y * w + x1] {
                        hist[v as usize] += 1;
                    }
                }
                let area = ((x1 - x0) * (y1 - y0)) as u32;
                tile_lut(&mut hist, area, clip)
            })
            .collect();

        Self {
            tiles_x,
            tiles_y,
            tile_w,
            tile_h,
            luts,
        }
    }

    #[inline]
    fn lut(&self, tx: usize, ty: usize) -> &[u8; BINS] {
        &self.luts[ty * self.tiles_x + tx]
    }

    /// Neighbouring tile indices and the weight of the second one
    #[inline]
    fn neighbours(pos: usize, tile: usize, count: usize) -> (usize, usize, f32) {
        let f = (pos as f32 + 0.5) / tile as f32 - 0.5;
        if f <= 0.0 {
            return (0, 0, 0.0);
        }
        let i0 = (f.floor() as usize).min(count - 1);
        let i1 = (i0 + 1).min(count - 1);
        (i0, i1, f - i0 as f32)
    }
}

/// Clip a tile histogram, redistribute the excess, return the mapping
fn tile_lut(hist: &mut [u32; BINS], area: u32, clip: f32) -> [u8; BINS] {
    let mut lut = [0u8; BINS];
    if area == 0 {
        for (i, v) in lut.iter_mut().enumerate() {
            *v = i as u8;
        }
        return lut;
    }

    if clip > 0.0 {
        let limit = ((clip * area as f32 / BINS as f32) as u32).max(1);
        let mut excess = 0u32;
        for bin in hist.iter_mut() {
            if *bin > limit {
                excess += *bin - limit;
                *bin = limit;
            }
        }

        let batch = excess / BINS as u32;
        let residual = (excess % BINS as u32) as usize;
        for bin in hist.iter_mut() {
            *bin += batch;
        }
        if residual > 0 {
            let step = (BINS / residual).max(1);
            for bin in hist.iter_mut().step_by(step).take(residual) {
                *bin += 1;
            }
        }
    }

    let scale = 255.0 / area as f32;
    let mut cumulative = 0u32;
    for (i, v) in lut.iter_mut().enumerate() {
        cumulative += hist[i];
        *v = (cumulative as f32 * scale).round().min(255.0) as u8;
    }
    lut
}

/// Apply CLAHE to a single channel image
pub fn clahe_gray(gray: &GrayImage, clip: f32, tiles: u32) -> GrayImage {
    let (width, height) = gray.dimensions();
    let (w, h) = (width as usize, height as usize);
    if w == 0 || h == 0 {
        return gray.clone();
    }

    let grid = TileGrid::build(gray, clip, tiles);
    let src = gray.as_raw();
    let mut out = vec![0u8; w * h];

    out.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        let (ty0, ty1, wy) = TileGrid::neighbours(y, grid.tile_h, grid.tiles_y);
        for (x, px) in row.iter_mut().enumerate() {
            let (tx0, tx1, wx) = TileGrid::neighbours(x, grid.tile_w, grid.tiles_x);
            let v = src[y * w + x] as usize;

            let top = grid.lut(tx0, ty0)[v] as f32 * (1.0 - wx) + grid.lut(tx1, ty0)[v] as f32 * wx;
            let bottom = grid.lut(tx0, ty1)[v] as f32 * (1.0 - wx) + grid.lut(tx1, ty1)[v] as f32 * wx;
            *px = (top * (1.0 - wy) + bottom * wy).round().clamp(0.0, 255.0) as u8;
        }
    });

    GrayImage::from_raw(width, height, out).unwrap_or_else(|| gray.clone())
}

/// BT.601 luma with rounding, the Y of a YCbCr conversion
#[inline]
fn ycbcr_luma(r: u8, g: u8, b: u8) -> u8 {
    (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32)
        .round()
        .min(255.0) as u8
}

/// Apply CLAHE to the luma of a color image, leaving chroma untouched
///
/// Converting to YCbCr, replacing Y and converting back shifts every channel
/// by the same luma delta, which is what is computed here.
pub fn clahe_color(rgb: &RgbImage, clip: f32, tiles: u32) -> RgbImage {
    let (width, height) = rgb.dimensions();
    let src = rgb.as_raw();

    let luma: Vec<u8> = src
        .chunks_exact(3)
        .map(|p| ycbcr_luma(p[0], p[1], p[2]))
        .collect();
    let Some(luma) = GrayImage::from_raw(width, height, luma) else {
        return rgb.clone();
    };
    let equalized = clahe_gray(&luma, clip, tiles);

    let mut out = src.clone();
    out.par_chunks_mut(3)
        .zip(luma.as_raw().par_iter().zip(equalized.as_raw().par_iter()))
        .for_each(|(px, (&before, &after))| {
            let delta = after as i16 - before as i16;
            for c in px.iter_mut() {
                *c = (*c as i16 + delta).clamp(0, 255) as u8;
            }
        });

    RgbImage::from_raw(width, height, out).unwrap_or_else(|| rgb.clone())
}
