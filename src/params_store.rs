//! Shared image parameters
//!
//! The control path validates and swaps in complete snapshots; readers clone
//! the `Arc` once and keep using that immutable copy, so a reader never sees
//! half of an update.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::error::InvalidParameter;
use crate::models::PdiParameters;

/// Mutex-guarded, atomically replaced [`PdiParameters`] snapshot
#[derive(Debug, Default)]
pub struct ParameterStore {
    current: Mutex<Arc<PdiParameters>>,
}

impl ParameterStore {
    /// Store holding `params`, rejected when out of range
    pub fn new(params: PdiParameters) -> Result<Self, InvalidParameter> {
        params.validate()?;
        Ok(Self {
            current: Mutex::new(Arc::new(params)),
        })
    }

    // The guarded value is only ever replaced whole, so a poisoned lock
    // still holds a consistent snapshot.
    fn lock(&self) -> MutexGuard<'_, Arc<PdiParameters>> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<PdiParameters> {
        Arc::clone(&self.lock())
    }

    /// Swap in a complete new snapshot
    ///
    /// On error the previous snapshot stays in place.
    pub fn replace(&self, params: PdiParameters) -> Result<Arc<PdiParameters>, InvalidParameter> {
        params.validate()?;
        let next = Arc::new(params);
        *self.lock() = Arc::clone(&next);
        debug!(?params, "parameters replaced");
        Ok(next)
    }

    /// Edit a copy of the current snapshot and swap it in when valid
    pub fn update<F>(&self, edit: F) -> Result<Arc<PdiParameters>, InvalidParameter>
    where
        F: FnOnce(&mut PdiParameters),
    {
        let mut guard = self.lock();
        let mut params = **guard;
        edit(&mut params);
        params.validate()?;
        let next = Arc::new(params);
        *guard = Arc::clone(&next);
        debug!(?params, "parameters updated");
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_invalid_update_keeps_previous() {
        let store = ParameterStore::default();
        store.update(|p| p.hardware.gain = 40).unwrap();
        let err = store.update(|p| p.hardware.gain = 400).unwrap_err();
        assert_eq!(err.name, "gain");
        assert_eq!(store.snapshot().hardware.gain, 40);
    }

    #[test]
    fn test_snapshot_is_immutable() {
        let store = ParameterStore::default();
        let before = store.snapshot();
        store.update(|p| p.software.boost = true).unwrap();
        assert!(!before.software.boost);
        assert!(store.snapshot().software.boost);
    }

    #[test]
    fn test_rejects_invalid_initial() {
        let mut params = PdiParameters::default();
        params.software.beta = 500;
        assert!(ParameterStore::new(params).is_err());
    }

    #[test]
    fn test_concurrent_readers_see_whole_snapshots() {
        let store = Arc::new(ParameterStore::default());

        let low = |p: &mut PdiParameters| {
            p.hardware.gain = 10;
            p.hardware.brightness = 10;
            p.hardware.contrast = 10;
            p.software.beta = 10;
        };
        let high = |p: &mut PdiParameters| {
            p.hardware.gain = 90;
            p.hardware.brightness = 90;
            p.hardware.contrast = 90;
            p.software.beta = 90;
        };
        store.update(low).unwrap();

        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..2000 {
                    if i % 2 == 0 {
                        store.update(high).unwrap();
                    } else {
                        store.update(low).unwrap();
                    }
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..2000 {
                        let p = store.snapshot();
                        let g = p.hardware.gain;
                        assert!(g == 10 || g == 90);
                        assert_eq!(p.hardware.brightness, g);
                        assert_eq!(p.hardware.contrast, g);
                        assert_eq!(p.software.beta, g);
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
    }
}
