use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::TrackError;

pub const DEFAULT_STORAGE_KEY: &str = "gps_track_markers";
pub const DEFAULT_IMPLAUSIBLE_SPEED_KMH: f64 = 150.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Segment speeds above this are flagged, not rejected.
    pub implausible_speed_kmh: f64,
    /// Identifier the marker record is saved under.
    pub storage_key: String,
    /// Mirror the marker store to persistence after every change.
    pub autosave: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            implausible_speed_kmh: DEFAULT_IMPLAUSIBLE_SPEED_KMH,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            autosave: true,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, TrackError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, TrackError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}
