use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info};

use super::{CameraBackend, CameraDevice, check_hardware_value};
use crate::error::{AcquisitionError, InvalidParameter};
use crate::models::{HardwareParams, RawFrame};
use crate::tools::list_images;

/// Opens [`FileCamera`]s over a directory of still images
#[derive(Debug, Clone)]
pub struct FileCameraBackend {
    dir: PathBuf,
    looping: bool,
}

impl FileCameraBackend {
    /// Backend replaying `dir`, restarting at the first image when `looping`
    pub fn new(dir: impl Into<PathBuf>, looping: bool) -> Self {
        Self {
            dir: dir.into(),
            looping,
        }
    }
}

impl CameraBackend for FileCameraBackend {
    type Device = FileCamera;

    fn open(&self, id: u32) -> Result<FileCamera, AcquisitionError> {
        FileCamera::open(&self.dir, self.looping).map_err(|err| match err {
            AcquisitionError::OpenFailed { reason, .. } => AcquisitionError::OpenFailed { id, reason },
            other => other,
        })
    }
}

/// Camera replaying image files in name order
///
/// Hardware setters are range checked and recorded but have no effect on
/// the pixels.
#[derive(Debug, Clone)]
pub struct FileCamera {
    frames: Vec<PathBuf>,
    next: usize,
    looping: bool,
    sequence: u64,
    hardware: HardwareParams,
}

impl FileCamera {
    /// Open a directory of images
    pub fn open(dir: &Path, looping: bool) -> Result<Self, AcquisitionError> {
        if !dir.is_dir() {
            return Err(AcquisitionError::OpenFailed {
                id: 0,
                reason: format!("{} is not a directory", dir.display()),
            });
        }
        let frames = list_images(dir);
        if frames.is_empty() {
            return Err(AcquisitionError::OpenFailed {
                id: 0,
                reason: format!("no images in {}", dir.display()),
            });
        }
        info!(dir = %dir.display(), frames = frames.len(), looping, "file camera opened");
        Ok(Self::from_paths(frames, looping))
    }

    /// Replay an explicit list of image files
    pub fn from_paths(frames: Vec<PathBuf>, looping: bool) -> Self {
        Self {
            frames,
            next: 0,
            looping,
            sequence: 0,
            hardware: HardwareParams::default(),
        }
    }

    /// Number of images in the sequence
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True when there is nothing to replay
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Hardware parameters as last set
    pub fn hardware(&self) -> &HardwareParams {
        &self.hardware
    }
}

impl CameraDevice for FileCamera {
    fn read_frame(&mut self) -> Result<RawFrame, AcquisitionError> {
        if self.next >= self.frames.len() {
            if !self.looping || self.frames.is_empty() {
                return Err(AcquisitionError::DeviceLost {
                    reason: "end of image sequence".into(),
                });
            }
            self.next = 0;
        }

        let path = &self.frames[self.next];
        let image = image::open(path)
            .map_err(|err| AcquisitionError::DeviceLost {
                reason: format!("{}: {err}", path.display()),
            })?
            .to_rgb8();
        debug!(path = %path.display(), "frame read");

        self.next += 1;
        self.sequence += 1;
        Ok(RawFrame::with_timestamp(image, self.sequence, Instant::now()))
    }

    fn set_auto_exposure(&mut self, enabled: bool) -> Result<(), InvalidParameter> {
        self.hardware.auto_exposure = enabled;
        Ok(())
    }

    fn set_exposure(&mut self, value: i32) -> Result<(), InvalidParameter> {
        self.hardware.exposure = check_hardware_value("exposure", value)?;
        Ok(())
    }

    fn set_auto_focus(&mut self, enabled: bool) -> Result<(), InvalidParameter> {
        self.hardware.auto_focus = enabled;
        Ok(())
    }

    fn set_focus(&mut self, value: i32) -> Result<(), InvalidParameter> {
        self.hardware.focus = check_hardware_value("focus", value)?;
        Ok(())
    }

    fn set_gain(&mut self, value: i32) -> Result<(), InvalidParameter> {
        self.hardware.gain = check_hardware_value("gain", value)?;
        Ok(())
    }

    fn set_brightness(&mut self, value: i32) -> Result<(), InvalidParameter> {
        self.hardware.brightness = check_hardware_value("brightness", value)?;
        Ok(())
    }

    fn set_contrast(&mut self, value: i32) -> Result<(), InvalidParameter> {
        self.hardware.contrast = check_hardware_value("contrast", value)?;
        Ok(())
    }

    fn set_gamma(&mut self, value: i32) -> Result<(), InvalidParameter> {
        self.hardware.gamma = check_hardware_value("gamma", value)?;
        Ok(())
    }
}
