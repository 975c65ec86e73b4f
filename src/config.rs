//! Pipeline tuning knobs
//!
//! Every struct has a `Default` holding the values the inspection station was
//! tuned with. `from_env` lets a deployment override them through
//! `INSPECT_*` variables without a rebuild; unparsable values fall back to the
//! default.

use std::time::Duration;

use crate::session::AutoRestart;

fn parse_env_u32(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

fn parse_env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn parse_env_i32(name: &str, default: i32) -> i32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<i32>().ok())
        .unwrap_or(default)
}

fn parse_env_f32(name: &str, default: f32) -> f32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<f32>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

/// Parameters of the three enhancement variants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnhanceConfig {
    /// Adaptive threshold window (odd, pixels)
    pub adaptive_block: u32,
    /// Constant subtracted from the local mean
    pub adaptive_offset: i32,
    /// CLAHE clip limit, relative to the uniform histogram height
    pub clahe_clip: f32,
    /// CLAHE tile grid (tiles per axis)
    pub clahe_tiles: u32,
    /// Gaussian sigma of the unsharp mask
    pub unsharp_sigma: f32,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            adaptive_block: 11,
            adaptive_offset: 2,
            clahe_clip: 2.0,
            clahe_tiles: 8,
            unsharp_sigma: 2.0,
        }
    }
}

impl EnhanceConfig {
    /// Defaults overridden by `INSPECT_*` variables
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            adaptive_block: parse_env_u32("INSPECT_ADAPTIVE_BLOCK", d.adaptive_block).clamp(3, 255) | 1,
            adaptive_offset: parse_env_i32("INSPECT_ADAPTIVE_OFFSET", d.adaptive_offset).clamp(-64, 64),
            clahe_clip: parse_env_f32("INSPECT_CLAHE_CLIP", d.clahe_clip).clamp(0.0, 40.0),
            clahe_tiles: parse_env_u32("INSPECT_CLAHE_TILES", d.clahe_tiles).clamp(1, 64),
            unsharp_sigma: parse_env_f32("INSPECT_UNSHARP_SIGMA", d.unsharp_sigma).clamp(0.0, 20.0),
        }
    }
}

/// Acceptance rules for decoded payloads
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationRules {
    /// Minimum payload length after trimming
    pub min_content_len: usize,
    /// Minimum bounding box width (px) for a located code
    pub min_width: f32,
    /// Minimum bounding box height (px) for a located code
    pub min_height: f32,
    /// Minimum payload length of GS1 DataBar codes
    pub databar_min_len: usize,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            min_content_len: 3,
            min_width: 15.0,
            min_height: 8.0,
            databar_min_len: 10,
        }
    }
}

/// Full per-frame pipeline configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    /// Region expansion on each side, as a fraction of the box size
    pub region_margin: f32,
    /// Minimum width of a warped region
    pub min_rectified_width: u32,
    /// Minimum height of a warped region
    pub min_rectified_height: u32,
    /// IoU above which two decodes are the same physical code
    pub overlap_iou: f32,
    /// Enhancement variants
    pub enhance: EnhanceConfig,
    /// Payload and geometry filters
    pub validation: ValidationRules,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            region_margin: 0.2,
            min_rectified_width: 100,
            min_rectified_height: 50,
            overlap_iou: 0.5,
            enhance: EnhanceConfig::default(),
            validation: ValidationRules::default(),
        }
    }
}

impl PipelineConfig {
    /// Defaults overridden by `INSPECT_*` variables
    pub fn from_env() -> Self {
        let d = Self::default();
        let mut validation = d.validation;
        validation.min_content_len =
            parse_env_usize("INSPECT_MIN_CONTENT_LEN", validation.min_content_len).max(1);
        Self {
            region_margin: parse_env_f32("INSPECT_REGION_MARGIN", d.region_margin).clamp(0.0, 2.0),
            enhance: EnhanceConfig::from_env(),
            validation,
            ..d
        }
    }
}

/// Frame skip used by the fast mode of the station
pub const FAST_MODE_FRAME_SKIP: usize = 3;

/// Inspection worker loop settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkerConfig {
    /// Process every Nth frame (1 = every frame)
    pub frame_skip: usize,
    /// Minimum frames between two hardware parameter pushes
    pub hardware_apply_interval: u64,
    /// Re-arm policy after a verdict
    pub auto_restart: AutoRestart,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            frame_skip: 1,
            hardware_apply_interval: 15,
            auto_restart: AutoRestart::After(Duration::from_secs(1)),
        }
    }
}

impl WorkerConfig {
    /// Defaults overridden by `INSPECT_FRAME_SKIP`
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            frame_skip: parse_env_usize("INSPECT_FRAME_SKIP", d.frame_skip).max(1),
            ..d
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.region_margin, 0.2);
        assert_eq!(config.enhance.adaptive_block, 11);
        assert_eq!(config.enhance.clahe_tiles, 8);
        assert_eq!(config.validation.min_content_len, 3);
        assert_eq!(WorkerConfig::default().hardware_apply_interval, 15);
    }

    #[test]
    fn test_env_parse_fallback() {
        assert_eq!(parse_env_u32("INSPECT_TEST_UNSET_VARIABLE", 7), 7);
        assert_eq!(parse_env_f32("INSPECT_TEST_UNSET_VARIABLE", 1.5), 1.5);
    }
}
