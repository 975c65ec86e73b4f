//! Frame acquisition
//!
//! [`CameraDevice`] is the seam to the hardware: frame reads plus one setter
//! per hardware parameter. [`FrameSource`] wraps a device, pushes hardware
//! parameters when they change and applies the digital boost.

mod file;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::enhance::apply_software;
use crate::error::{AcquisitionError, InvalidParameter};
use crate::models::params::{
    BRIGHTNESS_RANGE, CONTRAST_RANGE, EXPOSURE_RANGE, FOCUS_RANGE, GAIN_RANGE, GAMMA_RANGE,
};
use crate::models::{HardwareParams, PdiParameters, RawFrame};
use crate::params_store::ParameterStore;

pub use file::{FileCamera, FileCameraBackend};

/// Opens camera devices by index
pub trait CameraBackend {
    /// Device type produced by this backend
    type Device: CameraDevice;

    /// Open device `id`
    fn open(&self, id: u32) -> Result<Self::Device, AcquisitionError>;
}

/// An open camera
///
/// Setters reject out-of-range values with [`InvalidParameter`] and leave
/// the device unchanged in that case.
pub trait CameraDevice: Send {
    /// Block until the next frame is available
    fn read_frame(&mut self) -> Result<RawFrame, AcquisitionError>;

    /// Toggle automatic exposure
    fn set_auto_exposure(&mut self, enabled: bool) -> Result<(), InvalidParameter>;
    /// Manual exposure level
    fn set_exposure(&mut self, value: i32) -> Result<(), InvalidParameter>;
    /// Toggle continuous autofocus
    fn set_auto_focus(&mut self, enabled: bool) -> Result<(), InvalidParameter>;
    /// Manual focus position
    fn set_focus(&mut self, value: i32) -> Result<(), InvalidParameter>;
    /// Sensor gain
    fn set_gain(&mut self, value: i32) -> Result<(), InvalidParameter>;
    /// Brightness
    fn set_brightness(&mut self, value: i32) -> Result<(), InvalidParameter>;
    /// Contrast
    fn set_contrast(&mut self, value: i32) -> Result<(), InvalidParameter>;
    /// Gamma
    fn set_gamma(&mut self, value: i32) -> Result<(), InvalidParameter>;

    /// Push every hardware parameter
    ///
    /// Manual exposure and focus are only written when the matching
    /// automatic mode is off.
    fn apply_hardware(&mut self, params: &HardwareParams) -> Result<(), InvalidParameter> {
        self.set_auto_exposure(params.auto_exposure)?;
        if !params.auto_exposure {
            self.set_exposure(params.exposure)?;
        }
        self.set_auto_focus(params.auto_focus)?;
        if !params.auto_focus {
            self.set_focus(params.focus)?;
        }
        self.set_gain(params.gain)?;
        self.set_brightness(params.brightness)?;
        self.set_contrast(params.contrast)?;
        self.set_gamma(params.gamma)
    }
}

/// Range check shared by device implementations
pub fn check_hardware_value(name: &'static str, value: i32) -> Result<i32, InvalidParameter> {
    let (min, max) = match name {
        "exposure" => EXPOSURE_RANGE,
        "focus" => FOCUS_RANGE,
        "gain" => GAIN_RANGE,
        "brightness" => BRIGHTNESS_RANGE,
        "contrast" => CONTRAST_RANGE,
        "gamma" => GAMMA_RANGE,
        _ => (i32::MIN, i32::MAX),
    };
    InvalidParameter::check(name, value, min, max)
}

/// Device wrapper applying the current parameter snapshot
pub struct FrameSource<D> {
    device: D,
    params: Arc<ParameterStore>,
    applied: Option<HardwareParams>,
    frames_since_apply: u64,
    apply_interval: u64,
}

impl<D: CameraDevice> FrameSource<D> {
    /// Wrap `device`; hardware changes are pushed at most every `apply_interval` frames
    pub fn new(device: D, params: Arc<ParameterStore>, apply_interval: u64) -> Self {
        Self {
            device,
            params,
            applied: None,
            frames_since_apply: 0,
            apply_interval: apply_interval.max(1),
        }
    }

    /// Underlying device
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Hardware parameters last pushed to the device
    pub fn applied(&self) -> Option<&HardwareParams> {
        self.applied.as_ref()
    }

    /// Next frame, boosted according to the snapshot it was taken under
    pub fn next_frame(&mut self) -> Result<(RawFrame, Arc<PdiParameters>), AcquisitionError> {
        let snapshot = self.params.snapshot();
        self.sync_hardware(&snapshot.hardware);

        let frame = self.device.read_frame()?;
        self.frames_since_apply += 1;

        if !snapshot.software.boost {
            return Ok((frame, snapshot));
        }
        let (sequence, captured_at) = (frame.sequence(), frame.captured_at());
        let mut image = frame.into_image();
        apply_software(&mut image, &snapshot.software);
        Ok((RawFrame::with_timestamp(image, sequence, captured_at), snapshot))
    }

    fn sync_hardware(&mut self, wanted: &HardwareParams) {
        let due = match &self.applied {
            None => true,
            Some(current) => current != wanted && self.frames_since_apply >= self.apply_interval,
        };
        if !due {
            return;
        }
        match self.device.apply_hardware(wanted) {
            Ok(()) => debug!(?wanted, "hardware parameters applied"),
            Err(err) => warn!(%err, "hardware parameter rejected by device"),
        }
        // Recorded even on rejection so a bad value is not retried every frame
        self.applied = Some(*wanted);
        self.frames_since_apply = 0;
    }
}
