//! Measurement engine for recorded GPS tracks.
//!
//! A [`Track`] is loaded once; markers are snapped onto it through the
//! [`SpatialIndex`], and segment distance/time/speed plus whole-track
//! statistics are derived on demand. [`Controller`] drives the whole thing
//! from click events.

use serde::{Deserialize, Serialize};
use std::io::Read;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};

pub mod config;
pub mod controller;
pub mod display;
pub mod geodesic;
pub mod markers;
pub mod measure;
pub mod persist;
pub mod spatial;
pub mod summary;

pub use config::EngineConfig;
pub use controller::{Controller, Event, InteractionState};
pub use display::{DisplayState, format_duration};
pub use geodesic::{distance_meters, haversine_distance, parse_timestamp};
pub use markers::{Marker, MarkerChange, MarkerKind, MarkerStore};
pub use measure::{Advisory, MeasurementResult, measure};
pub use persist::{JsonFileStore, MarkerPersistence, MemoryStore, SavedMarkers};
pub use spatial::{SpatialIndex, nearest};
pub use summary::{TrackSummary, summarize};

#[derive(Error, Debug)]
pub enum TrackError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config: {0}")]
    Config(#[from] toml::de::Error),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

/// One recorded sample. `time` is kept as the raw string handed over by the
/// parser and only interpreted when a duration is needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Recorded instantaneous speed in km/h.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

impl TrackPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            time: None,
            speed: None,
        }
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }

    /// Parsed timestamp, `None` when absent or unparseable.
    pub fn timestamp(&self) -> Option<OffsetDateTime> {
        self.time.as_deref().and_then(parse_timestamp)
    }

    /// Recorded speed if present and strictly positive.
    pub fn positive_speed(&self) -> Option<f64> {
        self.speed.filter(|s| s.is_finite() && *s > 0.0)
    }
}

/// Ordered, read-only sequence of track points. A point's index is its
/// identity for the whole session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    points: Vec<TrackPoint>,
}

impl Track {
    pub fn new(points: Vec<TrackPoint>) -> Self {
        let bad = points.iter().filter(|p| !p.coordinate().is_finite()).count();
        if bad > 0 {
            warn!(count = bad, "track contains points with non-finite coordinates");
        }
        Self { points }
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn get(&self, index: usize) -> Option<&TrackPoint> {
        self.points.get(index)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Initial view anchor: the first recorded point.
    pub fn anchor(&self) -> Option<Coordinate> {
        self.points.first().map(TrackPoint::coordinate)
    }
}

impl From<Vec<TrackPoint>> for Track {
    fn from(points: Vec<TrackPoint>) -> Self {
        Track::new(points)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawInput {
    Points(Vec<TrackPoint>),
    #[serde(rename_all = "camelCase")]
    Wrapped {
        points: Vec<TrackPoint>,
        #[serde(default)]
        original_point_count: Option<usize>,
    },
}

/// What the parsing collaborator hands over: the processed points plus the
/// count it saw before any simplification.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackInput {
    pub track: Track,
    pub original_point_count: usize,
}

impl TrackInput {
    pub fn new(points: Vec<TrackPoint>, original_point_count: usize) -> Self {
        Self {
            track: Track::new(points),
            original_point_count,
        }
    }

    /// Accepts either a bare JSON array of points or
    /// `{"points": [...], "originalPointCount": n}`.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, TrackError> {
        let raw: RawInput = serde_json::from_reader(reader)?;
        let input = match raw {
            RawInput::Points(points) => {
                let n = points.len();
                TrackInput::new(points, n)
            }
            RawInput::Wrapped {
                points,
                original_point_count,
            } => {
                let n = original_point_count.unwrap_or(points.len());
                TrackInput::new(points, n)
            }
        };
        info!(
            points = input.track.len(),
            original = input.original_point_count,
            "loaded track"
        );
        Ok(input)
    }

    pub fn from_json_str(s: &str) -> Result<Self, TrackError> {
        Self::from_json_reader(s.as_bytes())
    }
}

impl From<Track> for TrackInput {
    fn from(track: Track) -> Self {
        let n = track.len();
        Self {
            track,
            original_point_count: n,
        }
    }
}
