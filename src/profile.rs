//! Parameter profiles on disk
//!
//! Each profile is one flat JSON object named `profile{N}.json`. Saving
//! takes the slot after the highest one in use, so the highest numbered file
//! is always the latest and is the one loaded.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::ProfileError;
use crate::models::PdiParameters;

/// Number of profile slots
pub const MAX_PROFILES: u32 = 100;

const PREFIX: &str = "profile";
const SUFFIX: &str = ".json";

/// Slot number of a profile file name, `None` for anything else
fn slot_of(name: &str) -> Option<u32> {
    let digits = name.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|n| (1..=MAX_PROFILES).contains(n))
}

/// Directory of numbered parameter profiles
#[derive(Debug, Clone)]
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    /// Store rooted at `dir`; the directory is created on first save
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Profile directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of slot `n`
    pub fn path_for(&self, n: u32) -> PathBuf {
        self.dir.join(format!("{PREFIX}{n}{SUFFIX}"))
    }

    /// Occupied slots in ascending order
    pub fn slots(&self) -> Result<Vec<u32>, ProfileError> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut slots: Vec<u32> = fs::read_dir(&self.dir)?
            .flatten()
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| slot_of(&entry.file_name().to_string_lossy()))
            .collect();
        slots.sort_unstable();
        Ok(slots)
    }

    /// Write `params` to the slot after the highest one and return its path
    pub fn save(&self, params: &PdiParameters) -> Result<PathBuf, ProfileError> {
        params.validate()?;
        fs::create_dir_all(&self.dir)?;

        let slot = self.slots()?.last().map_or(1, |n| n + 1);
        if slot > MAX_PROFILES {
            return Err(ProfileError::LimitReached { max: MAX_PROFILES });
        }

        let path = self.path_for(slot);
        let json = serde_json::to_string_pretty(params)?;
        fs::write(&path, json)?;
        info!(path = %path.display(), "profile saved");
        Ok(path)
    }

    /// Read and validate one profile file
    pub fn load(&self, path: &Path) -> Result<PdiParameters, ProfileError> {
        let text = fs::read_to_string(path)?;
        let params: PdiParameters = serde_json::from_str(&text)?;
        params.validate()?;
        debug!(path = %path.display(), ?params, "profile read");
        Ok(params)
    }

    /// Load the highest numbered profile
    pub fn load_latest(&self) -> Result<(PathBuf, PdiParameters), ProfileError> {
        let slot = self
            .slots()?
            .last()
            .copied()
            .ok_or_else(|| ProfileError::NotFound {
                dir: self.dir.clone(),
            })?;
        let path = self.path_for(slot);
        let params = self.load(&path)?;
        info!(path = %path.display(), "profile loaded");
        Ok((path, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> ProfileStore {
        let dir = std::env::temp_dir().join(format!("code_inspect_profile_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        ProfileStore::new(dir)
    }

    #[test]
    fn test_slot_names() {
        assert_eq!(slot_of("profile1.json"), Some(1));
        assert_eq!(slot_of("profile100.json"), Some(100));
        assert_eq!(slot_of("profile101.json"), None);
        assert_eq!(slot_of("profile0.json"), None);
        assert_eq!(slot_of("profile.json"), None);
        assert_eq!(slot_of("profile-3.json"), None);
        assert_eq!(slot_of("other1.json"), None);
    }

    #[test]
    fn test_save_appends_after_highest_slot() {
        let store = scratch("slots");
        let params = PdiParameters::default();
        assert!(store.save(&params).unwrap().ends_with("profile1.json"));
        assert!(store.save(&params).unwrap().ends_with("profile2.json"));
        fs::remove_file(store.path_for(1)).unwrap();

        let mut newest = params;
        newest.hardware.gain = 77;
        assert!(store.save(&newest).unwrap().ends_with("profile3.json"));
        assert_eq!(store.slots().unwrap(), vec![2, 3]);

        let (path, loaded) = store.load_latest().unwrap();
        assert!(path.ends_with("profile3.json"));
        assert_eq!(loaded.hardware.gain, 77);
        fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_load_latest_numeric_order() {
        let store = scratch("latest");
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(store.path_for(9), r#"{"gain": 9}"#).unwrap();
        fs::write(store.path_for(10), r#"{"gain": 10}"#).unwrap();
        let (path, params) = store.load_latest().unwrap();
        assert!(path.ends_with("profile10.json"));
        assert_eq!(params.hardware.gain, 10);
        fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_limit_reached() {
        let store = scratch("limit");
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(store.path_for(MAX_PROFILES), "{}").unwrap();
        let err = store.save(&PdiParameters::default()).unwrap_err();
        assert!(matches!(err, ProfileError::LimitReached { max: 100 }));
        assert_eq!(store.slots().unwrap(), vec![MAX_PROFILES]);
        fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_missing_and_invalid() {
        let store = scratch("invalid");
        assert!(matches!(store.load_latest(), Err(ProfileError::NotFound { .. })));

        fs::create_dir_all(store.dir()).unwrap();
        fs::write(store.path_for(1), r#"{"gamma": 999}"#).unwrap();
        assert!(matches!(store.load_latest(), Err(ProfileError::Invalid(_))));
        fs::write(store.path_for(2), "not json").unwrap();
        assert!(matches!(store.load_latest(), Err(ProfileError::Json(_))));
        fs::remove_dir_all(store.dir()).ok();
    }
}
