//! Shared fixtures: a painted scene, a decoder that reads it back and a
//! camera that replays scripted scenes.

#![allow(dead_code)]

use code_inspect::acquisition::{CameraDevice, check_hardware_value};
use code_inspect::models::{BoundingBox, Raster, RawFrame, Symbology};
use code_inspect::utils::geometry::normalize_outline;
use code_inspect::{AcquisitionError, InvalidParameter, Symbol, SymbologyDecoder};
use image::{Rgb, RgbImage};
use std::collections::VecDeque;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};

pub const FRAME_WIDTH: u32 = 320;
pub const FRAME_HEIGHT: u32 = 240;

const BACKGROUND: Rgb<u8> = Rgb([210, 210, 210]);
const INK: Rgb<u8> = Rgb([25, 25, 25]);

/// Axis-aligned symbol at `(x, y)` of size `w x h`
pub fn symbol(symbology: Symbology, content: &str, x: f32, y: f32, w: f32, h: f32) -> Symbol {
    Symbol::new(symbology, content, BoundingBox::new(x, y, w, h).corners().to_vec())
}

/// QR symbol shortcut
pub fn qr(content: &str, x: f32, y: f32) -> Symbol {
    symbol(Symbology::Qr, content, x, y, 60.0, 60.0)
}

/// Light frame with a dark block under every (normalized) symbol outline
pub fn paint(symbols: &[Symbol]) -> RgbImage {
    let mut img = RgbImage::from_pixel(FRAME_WIDTH, FRAME_HEIGHT, BACKGROUND);
    for s in symbols {
        let Some(bbox) = normalize_outline(&s.polygon).and_then(|p| BoundingBox::from_points(&p)) else {
            continue;
        };
        let x0 = bbox.x.max(0.0) as u32;
        let y0 = bbox.y.max(0.0) as u32;
        let x1 = (bbox.right().ceil() as u32).min(FRAME_WIDTH);
        let y1 = (bbox.bottom().ceil() as u32).min(FRAME_HEIGHT);
        for y in y0..y1 {
            for x in x0..x1 {
                img.put_pixel(x, y, INK);
            }
        }
    }
    img
}

/// What the camera is currently looking at
#[derive(Default)]
pub struct Scene {
    symbols: Mutex<Vec<Symbol>>,
}

impl Scene {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, symbols: Vec<Symbol>) {
        *self.symbols.lock().unwrap() = symbols;
    }

    pub fn symbols(&self) -> Vec<Symbol> {
        self.symbols.lock().unwrap().clone()
    }

    /// Paint the scene as a frame
    pub fn frame(&self, sequence: u64) -> RawFrame {
        RawFrame::new(paint(&self.symbols()), sequence)
    }
}

/// Reports the scene's symbols for any raster with visible contrast
pub struct SceneDecoder {
    scene: Arc<Scene>,
    gate: Option<Gate>,
}

impl SceneDecoder {
    pub fn new(scene: Arc<Scene>) -> Arc<Self> {
        Arc::new(Self { scene, gate: None })
    }

    /// Decoder that blocks in its first call until the gate is released
    pub fn gated(scene: Arc<Scene>, gate: Gate) -> Arc<Self> {
        Arc::new(Self {
            scene,
            gate: Some(gate),
        })
    }
}

impl SymbologyDecoder for SceneDecoder {
    fn decode(&self, raster: &Raster) -> Vec<Symbol> {
        if let Some(gate) = &self.gate {
            gate.pass();
        }
        let luma = raster.to_luma();
        let (min, max) = luma
            .as_raw()
            .iter()
            .fold((u8::MAX, u8::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        if luma.as_raw().is_empty() || max.saturating_sub(min) < 60 {
            return Vec::new();
        }
        self.scene.symbols()
    }
}

/// One-shot rendezvous: signals `entered` then waits for `release`
pub struct Gate {
    entered: Mutex<Option<Sender<()>>>,
    release: Mutex<Option<Receiver<()>>>,
}

impl Gate {
    pub fn new(entered: Sender<()>, release: Receiver<()>) -> Self {
        Self {
            entered: Mutex::new(Some(entered)),
            release: Mutex::new(Some(release)),
        }
    }

    fn pass(&self) {
        let Some(entered) = self.entered.lock().unwrap().take() else {
            return;
        };
        let _ = entered.send(());
        if let Some(release) = self.release.lock().unwrap().take() {
            let _ = release.recv();
        }
    }
}

/// Camera replaying a list of scenes, then reporting the device lost
pub struct ScriptedCamera {
    script: VecDeque<Vec<Symbol>>,
    scene: Arc<Scene>,
    sequence: u64,
    hold: Option<Receiver<()>>,
    pub gain: i32,
}

impl ScriptedCamera {
    pub fn new(scene: Arc<Scene>, script: Vec<Vec<Symbol>>) -> Self {
        Self {
            script: script.into(),
            scene,
            sequence: 0,
            hold: None,
            gain: 0,
        }
    }

    /// Block the first read until `go` fires
    pub fn held(mut self, go: Receiver<()>) -> Self {
        self.hold = Some(go);
        self
    }
}

impl CameraDevice for ScriptedCamera {
    fn read_frame(&mut self) -> Result<RawFrame, AcquisitionError> {
        if let Some(go) = self.hold.take() {
            let _ = go.recv();
        }
        let Some(symbols) = self.script.pop_front() else {
            return Err(AcquisitionError::DeviceLost {
                reason: "script finished".into(),
            });
        };
        self.scene.set(symbols);
        self.sequence += 1;
        Ok(self.scene.frame(self.sequence))
    }

    fn set_auto_exposure(&mut self, _: bool) -> Result<(), InvalidParameter> {
        Ok(())
    }
    fn set_exposure(&mut self, v: i32) -> Result<(), InvalidParameter> {
        check_hardware_value("exposure", v).map(|_| ())
    }
    fn set_auto_focus(&mut self, _: bool) -> Result<(), InvalidParameter> {
        Ok(())
    }
    fn set_focus(&mut self, v: i32) -> Result<(), InvalidParameter> {
        check_hardware_value("focus", v).map(|_| ())
    }
    fn set_gain(&mut self, v: i32) -> Result<(), InvalidParameter> {
        self.gain = check_hardware_value("gain", v)?;
        Ok(())
    }
    fn set_brightness(&mut self, v: i32) -> Result<(), InvalidParameter> {
        check_hardware_value("brightness", v).map(|_| ())
    }
    fn set_contrast(&mut self, v: i32) -> Result<(), InvalidParameter> {
        check_hardware_value("contrast", v).map(|_| ())
    }
    fn set_gamma(&mut self, v: i32) -> Result<(), InvalidParameter> {
        check_hardware_value("gamma", v).map(|_| ())
    }
}
