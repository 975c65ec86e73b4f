//! Camera (hardware) and digital boost (software) image parameters
//!
//! Ranges and defaults match the fixed-focus USB inspection camera profile
//! the tool was tuned for.

use serde::{Deserialize, Serialize};

use crate::error::InvalidParameter;

/// Exposure level range (log2 seconds, V4L2 convention)
pub const EXPOSURE_RANGE: (i32, i32) = (-13, -1);
/// Manual focus range
pub const FOCUS_RANGE: (i32, i32) = (0, 255);
/// Gain range
pub const GAIN_RANGE: (i32, i32) = (0, 100);
/// Brightness range
pub const BRIGHTNESS_RANGE: (i32, i32) = (0, 255);
/// Contrast range
pub const CONTRAST_RANGE: (i32, i32) = (0, 100);
/// Gamma range
pub const GAMMA_RANGE: (i32, i32) = (0, 200);
/// Boost multiplicative gain range
pub const ALPHA_RANGE: (f32, f32) = (0.1, 3.0);
/// Boost additive offset range
pub const BETA_RANGE: (i32, i32) = (-100, 100);

/// Parameters pushed to the camera device
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareParams {
    /// Let the camera pick exposure
    pub auto_exposure: bool,
    /// Manual exposure level (used when `auto_exposure` is off)
    pub exposure: i32,
    /// Continuous autofocus
    pub auto_focus: bool,
    /// Manual focus position (used when `auto_focus` is off)
    pub focus: i32,
    /// Sensor gain
    pub gain: i32,
    /// Brightness
    pub brightness: i32,
    /// Contrast
    pub contrast: i32,
    /// Gamma
    pub gamma: i32,
}

impl Default for HardwareParams {
    fn default() -> Self {
        Self {
            auto_exposure: true,
            exposure: -6,
            auto_focus: true,
            focus: 0,
            gain: 0,
            brightness: 128,
            contrast: 40,
            gamma: 100,
        }
    }
}

impl HardwareParams {
    /// Reject any field outside its declared range
    pub fn validate(&self) -> Result<(), InvalidParameter> {
        InvalidParameter::check("exposure", self.exposure, EXPOSURE_RANGE.0, EXPOSURE_RANGE.1)?;
        InvalidParameter::check("focus", self.focus, FOCUS_RANGE.0, FOCUS_RANGE.1)?;
        InvalidParameter::check("gain", self.gain, GAIN_RANGE.0, GAIN_RANGE.1)?;
        InvalidParameter::check(
            "brightness",
            self.brightness,
            BRIGHTNESS_RANGE.0,
            BRIGHTNESS_RANGE.1,
        )?;
        InvalidParameter::check("contrast", self.contrast, CONTRAST_RANGE.0, CONTRAST_RANGE.1)?;
        InvalidParameter::check("gamma", self.gamma, GAMMA_RANGE.0, GAMMA_RANGE.1)?;
        Ok(())
    }
}

/// Digital gain applied to frames after acquisition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoftwareParams {
    /// Apply `alpha * p + beta` to every frame
    pub boost: bool,
    /// Multiplicative gain
    pub alpha: f32,
    /// Additive offset
    pub beta: i32,
}

impl Default for SoftwareParams {
    fn default() -> Self {
        Self {
            boost: false,
            alpha: 1.0,
            beta: 0,
        }
    }
}

impl SoftwareParams {
    /// Reject any field outside its declared range
    pub fn validate(&self) -> Result<(), InvalidParameter> {
        if !self.alpha.is_finite() {
            return Err(InvalidParameter {
                name: "alpha",
                value: f64::NAN,
                min: ALPHA_RANGE.0.into(),
                max: ALPHA_RANGE.1.into(),
            });
        }
        InvalidParameter::check("alpha", self.alpha, ALPHA_RANGE.0, ALPHA_RANGE.1)?;
        InvalidParameter::check("beta", self.beta, BETA_RANGE.0, BETA_RANGE.1)?;
        Ok(())
    }
}

/// Full parameter set, shared between the control path and the worker
///
/// Serialized flat, one JSON key per field, which is also the profile format.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PdiParameters {
    /// Camera-side settings
    #[serde(flatten)]
    pub hardware: HardwareParams,
    /// Digital boost settings
    #[serde(flatten)]
    pub software: SoftwareParams,
}

impl PdiParameters {
    /// Reject any field outside its declared range
    pub fn validate(&self) -> Result<(), InvalidParameter> {
        self.hardware.validate()?;
        self.software.validate()
    }
}
