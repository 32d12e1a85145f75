//! Durable storage for marker positions.
//!
//! Only coordinates are stored; indices are recovered by snapping on load
//! because the track may have been reprocessed between sessions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::TrackError;
use crate::markers::{MarkerKind, MarkerStore};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavedPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavedSpeed {
    pub lat: f64,
    pub lng: f64,
    pub value: f64,
}

/// `{ start?: {lat, lng}, end?: {lat, lng}, speed?: {lat, lng, value} }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedMarkers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<SavedPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<SavedPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<SavedSpeed>,
}

impl SavedMarkers {
    pub fn from_store(store: &MarkerStore) -> Self {
        let point = |kind| {
            store.get(kind).map(|m| SavedPoint {
                lat: m.coordinate.lat,
                lng: m.coordinate.lon,
            })
        };
        Self {
            start: point(MarkerKind::Start),
            end: point(MarkerKind::End),
            speed: store.get(MarkerKind::Speed).map(|m| SavedSpeed {
                lat: m.coordinate.lat,
                lng: m.coordinate.lon,
                value: m.speed_value.unwrap_or(0.0),
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none() && self.speed.is_none()
    }
}

/// Load/save/clear keyed by a fixed identifier. `Ok(None)` from `load` means
/// nothing was saved under `key`.
pub trait MarkerPersistence {
    fn load(&self, key: &str) -> Result<Option<SavedMarkers>, TrackError>;
    fn save(&mut self, key: &str, markers: &SavedMarkers) -> Result<(), TrackError>;
    fn clear(&mut self, key: &str) -> Result<(), TrackError>;
}

/// One JSON document per key inside a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, TrackError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(TrackError::InvalidInput(format!("bad storage key {:?}", key)));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl MarkerPersistence for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<SavedMarkers>, TrackError> {
        let path = self.path_for(key)?;
        let contents = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }

    /// Writes to a temporary file first, then renames over the old record.
    fn save(&mut self, key: &str, markers: &SavedMarkers) -> Result<(), TrackError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string(markers)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn clear(&mut self, key: &str) -> Result<(), TrackError> {
        let path = self.path_for(key)?;
        match fs::remove_file(path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// In-process store holding the raw serialized records.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `raw` verbatim, well-formed or not.
    pub fn insert_raw(&mut self, key: &str, raw: impl Into<String>) {
        self.records.insert(key.to_string(), raw.into());
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.records.get(key).map(String::as_str)
    }
}

impl MarkerPersistence for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<SavedMarkers>, TrackError> {
        match self.records.get(key) {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, key: &str, markers: &SavedMarkers) -> Result<(), TrackError> {
        self.records
            .insert(key.to_string(), serde_json::to_string(markers)?);
        Ok(())
    }

    fn clear(&mut self, key: &str) -> Result<(), TrackError> {
        self.records.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Coordinate;

    fn sample() -> SavedMarkers {
        SavedMarkers {
            start: Some(SavedPoint { lat: 1.0, lng: 2.0 }),
            end: None,
            speed: Some(SavedSpeed {
                lat: 3.0,
                lng: 4.0,
                value: 27.5,
            }),
        }
    }

    #[test]
    fn test_wire_shape_omits_absent_markers() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "start": {"lat": 1.0, "lng": 2.0},
                "speed": {"lat": 3.0, "lng": 4.0, "value": 27.5}
            })
        );
        let empty: SavedMarkers = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_from_store_uses_snapped_coordinates() {
        let mut store = MarkerStore::new(4);
        store.set_marker(MarkerKind::End, 2, Coordinate::new(5.0, 6.0), None);
        let saved = SavedMarkers::from_store(&store);
        assert_eq!(saved.end, Some(SavedPoint { lat: 5.0, lng: 6.0 }));
        assert!(saved.start.is_none() && saved.speed.is_none());
    }

    #[test]
    fn test_file_store_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let mut fs_store = JsonFileStore::new(dir.path().join("state"));

        assert_eq!(fs_store.load("markers").unwrap(), None);
        fs_store.save("markers", &sample()).unwrap();
        assert_eq!(fs_store.load("markers").unwrap(), Some(sample()));
        assert!(!dir.path().join("state/markers.json.tmp").exists());

        fs_store.clear("markers").unwrap();
        assert_eq!(fs_store.load("markers").unwrap(), None);
        fs_store.clear("markers").unwrap();
    }

    #[test]
    fn test_file_store_corrupt_record_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("markers.json"), "{not json").unwrap();
        let fs_store = JsonFileStore::new(dir.path());
        assert!(matches!(fs_store.load("markers"), Err(TrackError::Json(_))));
    }

    #[test]
    fn test_file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut fs_store = JsonFileStore::new(dir.path());
        assert!(fs_store.save("../escape", &sample()).is_err());
        assert!(fs_store.load("").is_err());
    }

    #[test]
    fn test_memory_store() {
        let mut mem = MemoryStore::new();
        mem.save("k", &sample()).unwrap();
        assert_eq!(mem.load("k").unwrap(), Some(sample()));
        assert!(mem.raw("k").unwrap().contains("\"lng\""));
        mem.clear("k").unwrap();
        assert_eq!(mem.load("k").unwrap(), None);

        mem.insert_raw("k", "[1,2");
        assert!(mem.load("k").is_err());
    }
}
