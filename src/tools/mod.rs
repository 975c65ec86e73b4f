//! Helpers shared by the command-line tools and benches

use image::{GenericImageView, GrayImage, RgbImage};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "bmp", "tiff"];

fn max_dim_from_env() -> Option<u32> {
    match env::var("INSPECT_MAX_DIM") {
        Ok(value) => match value.trim().parse::<u32>() {
            Ok(0) => None,
            Ok(v) => Some(v),
            Err(_) => None,
        },
        Err(_) => None,
    }
}

/// Load an image as RGB, downscaled when `INSPECT_MAX_DIM` is set
pub fn load_rgb<P: AsRef<Path>>(path: P) -> Result<RgbImage, image::ImageError> {
    let img = image::open(path)?;
    let rgb = match max_dim_from_env() {
        Some(max_dim) if img.dimensions().0.max(img.dimensions().1) > max_dim => img
            .resize(max_dim, max_dim, image::imageops::FilterType::Triangle)
            .to_rgb8(),
        _ => img.to_rgb8(),
    };
    Ok(rgb)
}

/// Summary statistics for grayscale data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrayStats {
    /// Minimum grayscale value.
    pub min: u8,
    /// Maximum grayscale value.
    pub max: u8,
    /// Average grayscale value.
    pub avg: u8,
    /// Share of pixels below 128.
    pub dark_ratio: f64,
}

/// Compute min/max/avg and the dark share of a grayscale image.
pub fn grayscale_stats(gray: &GrayImage) -> GrayStats {
    let mut min = u8::MAX;
    let mut max = u8::MIN;
    let mut sum: u64 = 0;
    let mut dark = 0usize;
    for &v in gray.as_raw() {
        min = min.min(v);
        max = max.max(v);
        sum += v as u64;
        if v < 128 {
            dark += 1;
        }
    }
    let total = gray.as_raw().len();
    if total == 0 {
        return GrayStats {
            min: 0,
            max: 0,
            avg: 0,
            dark_ratio: 0.0,
        };
    }
    GrayStats {
        min,
        max,
        avg: (sum / total as u64) as u8,
        dark_ratio: dark as f64 / total as f64,
    }
}

/// Frame limit for directory replays from `INSPECT_FRAME_LIMIT`
///
/// Returns `None` (every frame) when unset or set to `0`.
pub fn frame_limit_from_env() -> Option<usize> {
    match env::var("INSPECT_FRAME_LIMIT") {
        Ok(value) => value
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|v| if v == 0 { None } else { Some(v) }),
        Err(_) => None,
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Image files directly inside `dir`, sorted by path
///
/// Unreadable directories yield an empty list.
pub fn list_images<P: AsRef<Path>>(dir: P) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut images: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_image(path))
        .collect();
    images.sort();
    images
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_grayscale_stats() {
        let mut gray = GrayImage::from_pixel(4, 1, Luma([200]));
        gray.put_pixel(0, 0, Luma([0]));
        let stats = grayscale_stats(&gray);
        assert_eq!(stats.min, 0);
        assert_eq!(stats.max, 200);
        assert_eq!(stats.avg, 150);
        assert!((stats.dark_ratio - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_empty_stats() {
        let stats = grayscale_stats(&GrayImage::new(0, 0));
        assert_eq!(stats.avg, 0);
        assert_eq!(stats.dark_ratio, 0.0);
    }

    #[test]
    fn test_list_images_filters_and_sorts() {
        let dir = env::temp_dir().join(format!("code_inspect_list_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join("nested")).unwrap();
        for name in ["b.PNG", "a.jpg", "notes.txt"] {
            fs::write(dir.join(name), b"x").unwrap();
        }
        let names: Vec<String> = list_images(&dir)
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.PNG"]);
        assert!(list_images(dir.join("missing")).is_empty());
        fs::remove_dir_all(&dir).ok();
    }
}
