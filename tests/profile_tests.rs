//! Profiles on disk feeding a file-backed acquisition run

use code_inspect::acquisition::{CameraBackend, FileCameraBackend, FrameSource};
use code_inspect::{ParameterStore, PdiParameters, ProfileError, ProfileStore};
use image::{Rgb, RgbImage};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("code_inspect_it_{name}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn saved_profile_round_trips_through_json() {
    let dir = scratch("roundtrip");
    let store = ProfileStore::new(&dir);

    let mut params = PdiParameters::default();
    params.hardware.auto_focus = false;
    params.hardware.focus = 140;
    params.software.boost = true;
    params.software.alpha = 1.8;
    params.software.beta = -20;
    store.save(&params).unwrap();

    params.hardware.gain = 77;
    let second = store.save(&params).unwrap();

    let (path, loaded) = store.load_latest().unwrap();
    assert_eq!(path, second);
    assert_eq!(loaded, params);

    // Flat object: one key per field
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["gain"], 77);
    assert_eq!(json["boost"], true);
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn partial_profile_fills_defaults() {
    let dir = scratch("partial");
    fs::write(dir.join("profile1.json"), r#"{"brightness": 90}"#).unwrap();
    let (_, params) = ProfileStore::new(&dir).load_latest().unwrap();
    assert_eq!(params.hardware.brightness, 90);
    assert_eq!(params.software, PdiParameters::default().software);
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn out_of_range_profile_is_rejected() {
    let dir = scratch("range");
    fs::write(dir.join("profile1.json"), r#"{"alpha": 7.5}"#).unwrap();
    let err = ProfileStore::new(&dir).load_latest().unwrap_err();
    match err {
        ProfileError::Invalid(invalid) => assert_eq!(invalid.name, "alpha"),
        other => panic!("unexpected error: {other}"),
    }
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn loaded_profile_boosts_file_frames() {
    let profiles = scratch("boost_profiles");
    let frames = scratch("boost_frames");
    RgbImage::from_pixel(16, 12, Rgb([60, 60, 60]))
        .save(frames.join("frame_000.png"))
        .unwrap();

    let mut params = PdiParameters::default();
    params.software.boost = true;
    params.software.alpha = 2.0;
    params.software.beta = 10;
    ProfileStore::new(&profiles).save(&params).unwrap();

    let (_, loaded) = ProfileStore::new(&profiles).load_latest().unwrap();
    let store = Arc::new(ParameterStore::new(loaded).unwrap());
    let camera = FileCameraBackend::new(&frames, true).open(0).unwrap();
    let mut source = FrameSource::new(camera, Arc::clone(&store), 15);

    let (frame, snapshot) = source.next_frame().unwrap();
    assert!(snapshot.software.boost);
    assert_eq!(frame.image().get_pixel(0, 0), &Rgb([130, 130, 130]));
    assert_eq!(source.device().hardware(), &loaded.hardware);

    store.update(|p| p.software.boost = false).unwrap();
    let (frame, _) = source.next_frame().unwrap();
    assert_eq!(frame.image().get_pixel(0, 0), &Rgb([60, 60, 60]));

    fs::remove_dir_all(&profiles).ok();
    fs::remove_dir_all(&frames).ok();
}
