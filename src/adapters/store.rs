//! JSON-file setpoint store.
//!
//! One small JSON object maps mode labels to calibrated bands:
//!
//! ```json
//! { "Sourdough": { "low": 26.5, "high": 27.5 } }
//! ```
//!
//! Saves go through a temp file in the same directory followed by a
//! rename, so a crash mid-write leaves the previous file intact.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use log::warn;

use crate::app::ports::SetpointStore;
use crate::config::{Band, Mode};
use crate::error::StoreError;

pub struct JsonSetpointStore {
    path: PathBuf,
}

impl JsonSetpointStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_map(&self) -> Result<HashMap<String, Band>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&contents).map_err(|_| StoreError::Corrupted)
    }

    fn write_map(&self, map: &HashMap<String, Band>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(map).map_err(|_| StoreError::Corrupted)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SetpointStore for JsonSetpointStore {
    fn load(&self, mode: Mode) -> Result<Option<Band>, StoreError> {
        Ok(self.read_map()?.remove(mode.label()))
    }

    fn save(&mut self, mode: Mode, band: Band) -> Result<(), StoreError> {
        // A corrupt file loses its other entries on the next save; the
        // calibrated band being written is the one we must not lose.
        let mut map = self.read_map().unwrap_or_else(|e| {
            warn!("setpoint file unreadable on save ({e}), rewriting");
            HashMap::new()
        });
        map.insert(mode.label().to_string(), band);
        self.write_map(&map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(tag: &str) -> JsonSetpointStore {
        let path = std::env::temp_dir().join(format!(
            "setpoints-{tag}-{}.json",
            std::process::id()
        ));
        let _ = fs::remove_file(&path);
        JsonSetpointStore::new(path)
    }

    #[test]
    fn missing_file_loads_nothing() {
        let store = temp_store("missing");
        assert_eq!(store.load(Mode::Sourdough).unwrap(), None);
    }

    #[test]
    fn save_then_load_roundtrips_per_mode() {
        let mut store = temp_store("roundtrip");
        store.save(Mode::Sourdough, Band::new(26.5, 27.5)).unwrap();
        store.save(Mode::Kombucha, Band::new(23.0, 24.0)).unwrap();

        assert_eq!(
            store.load(Mode::Sourdough).unwrap(),
            Some(Band::new(26.5, 27.5))
        );
        assert_eq!(
            store.load(Mode::Kombucha).unwrap(),
            Some(Band::new(23.0, 24.0))
        );
        assert_eq!(store.load(Mode::WaterKefir).unwrap(), None);

        let _ = fs::remove_file(&store.path);
    }

    #[test]
    fn save_replaces_previous_band() {
        let mut store = temp_store("replace");
        store.save(Mode::Sourdough, Band::new(25.0, 26.0)).unwrap();
        store.save(Mode::Sourdough, Band::new(26.5, 27.5)).unwrap();
        assert_eq!(
            store.load(Mode::Sourdough).unwrap(),
            Some(Band::new(26.5, 27.5))
        );
        let _ = fs::remove_file(&store.path);
    }

    #[test]
    fn corrupt_file_is_a_load_error_but_not_a_save_error() {
        let store = temp_store("corrupt");
        fs::write(&store.path, "not json").unwrap();
        assert!(matches!(
            store.load(Mode::Sourdough),
            Err(StoreError::Corrupted)
        ));

        let mut store = store;
        store.save(Mode::Sourdough, Band::new(26.5, 27.5)).unwrap();
        assert_eq!(
            store.load(Mode::Sourdough).unwrap(),
            Some(Band::new(26.5, 27.5))
        );
        let _ = fs::remove_file(&store.path);
    }
}
