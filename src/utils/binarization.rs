use image::GrayImage;
use rayon::prelude::*;

/// Summed-area table with one row and column of zero padding
struct IntegralImage {
    sums: Vec<u64>,
    stride: usize,
}

impl IntegralImage {
    fn new(gray: &GrayImage) -> Self {
        let (w, h) = (gray.width() as usize, gray.height() as usize);
        let stride = w + 1;
        let mut sums = vec![0u64; stride * (h + 1)];
        let src = gray.as_raw();

        for y in 0..h {
            let mut row_sum = 0u64;
            for x in 0..w {
                row_sum += src[y * w + x] as u64;
                sums[(y + 1) * stride + x + 1] = sums[y * stride + x + 1] + row_sum;
            }
        }

        Self { sums, stride }
    }

    /// Sum over the half-open window `[x0, x1) x [y0, y1)`
    #[inline]
    fn window_sum(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> u64 {
        let s = self.stride;
        self.sums[y1 * s + x1] + self.sums[y0 * s + x0] - self.sums[y0 * s + x1] - self.sums[y1 * s + x0]
    }
}

/// Local mean adaptive threshold
///
/// A pixel becomes 255 when it is brighter than the mean of its
/// `block x block` neighbourhood minus `offset`, else 0. The window is
/// clipped at the image border. `block` is forced odd and at least 3.
pub fn adaptive_threshold(gray: &GrayImage, block: u32, offset: i32) -> GrayImage {
    let (width, height) = gray.dimensions();
    let (w, h) = (width as usize, height as usize);
    if w == 0 || h == 0 {
        return GrayImage::new(width, height);
    }

    let block = (block.max(3) | 1) as usize;
    let radius = block / 2;
    let integral = IntegralImage::new(gray);
    let src = gray.as_raw();
    let mut out = vec![0u8; w * h];

    out.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        let y0 = y.saturating_sub(radius);
        let y1 = (y + radius + 1).min(h);
        for (x, px) in row.iter_mut().enumerate() {
            let x0 = x.saturating_sub(radius);
            let x1 = (x + radius + 1).min(w);
            let count = ((x1 - x0) * (y1 - y0)) as f32;
            let mean = integral.window_sum(x0, y0, x1, y1) as f32 / count;
            *px = if src[y * w + x] as f32 > mean - offset as f32 {
                255
            } else {
                0
            };
        }
    });

    GrayImage::from_raw(width, height, out).unwrap_or_else(|| GrayImage::new(width, height))
}
