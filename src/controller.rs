//! Click-driven marker placement.
//!
//! Start/End selection cycles `Idle -> StartSet -> BothSet -> StartSet ...`.
//! Speed Mode is an orthogonal flag: while it is on, the next click places the
//! Speed marker and leaves the Start/End selection untouched.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::display::DisplayState;
use crate::markers::{Marker, MarkerChange, MarkerKind, MarkerStore};
use crate::measure::{MeasurementResult, measure};
use crate::persist::{MarkerPersistence, SavedMarkers};
use crate::spatial::SpatialIndex;
use crate::summary::{TrackSummary, summarize};
use crate::{Coordinate, Track, TrackInput, TrackPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionState {
    Idle,
    StartSet,
    BothSet,
}

/// Result of one controller operation, for the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    Ignored {
        reason: &'static str,
    },
    StartPlaced {
        marker: Marker,
    },
    EndPlaced {
        marker: Marker,
        measurement: MeasurementResult,
    },
    /// A click while both markers were set: old pair dropped, new Start placed.
    SelectionRestarted {
        marker: Marker,
    },
    SpeedUpdated {
        marker: Marker,
        speed_kmh: f64,
    },
    SpeedModeToggled {
        active: bool,
    },
    SpeedCleared,
    AllCleared,
    Restored {
        start: Option<Marker>,
        end: Option<Marker>,
        speed: Option<Marker>,
        measurement: Option<MeasurementResult>,
    },
    Saved {
        persisted: bool,
    },
}

pub type BoxedPersistence = Box<dyn MarkerPersistence + Send>;

/// Owns the track, its index and the marker state for one session.
pub struct Controller {
    track: Track,
    original_point_count: usize,
    spatial: SpatialIndex,
    summary: TrackSummary,
    store: MarkerStore,
    config: EngineConfig,
    persistence: BoxedPersistence,
}

impl Controller {
    pub fn new(input: TrackInput, config: EngineConfig, persistence: BoxedPersistence) -> Self {
        let TrackInput {
            track,
            original_point_count,
        } = input;
        let spatial = SpatialIndex::build(&track);
        let summary = summarize(&track);
        info!(
            points = track.len(),
            length_km = summary.length_km,
            "track ready"
        );
        Self {
            store: MarkerStore::new(track.len()),
            track,
            original_point_count,
            spatial,
            summary,
            config,
            persistence,
        }
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn summary(&self) -> &TrackSummary {
        &self.summary
    }

    pub fn store(&self) -> &MarkerStore {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn into_persistence(self) -> BoxedPersistence {
        self.persistence
    }

    pub fn state(&self) -> InteractionState {
        match (
            self.store.get(MarkerKind::Start),
            self.store.get(MarkerKind::End),
        ) {
            (None, _) => InteractionState::Idle,
            (Some(_), None) => InteractionState::StartSet,
            (Some(_), Some(_)) => InteractionState::BothSet,
        }
    }

    /// Store changes since the last call.
    pub fn take_changes(&mut self) -> Vec<MarkerChange> {
        self.store.take_changes()
    }

    pub fn view(&self) -> DisplayState {
        DisplayState::new(
            self.track.len(),
            self.original_point_count,
            &self.summary,
            &self.store,
            self.config.implausible_speed_kmh,
        )
    }

    fn place(&mut self, kind: MarkerKind, index: usize, speed_value: Option<f64>) -> Marker {
        let marker = Marker {
            kind,
            track_index: index,
            coordinate: self.track.points()[index].coordinate(),
            speed_value,
        };
        self.store
            .set_marker(kind, index, marker.coordinate, speed_value);
        marker
    }

    fn recorded_speed(&self, index: usize) -> Option<f64> {
        self.track.get(index).and_then(TrackPoint::positive_speed)
    }

    fn remeasure(&mut self) -> Option<MeasurementResult> {
        let a = self.store.get(MarkerKind::Start)?.track_index;
        let b = self.store.get(MarkerKind::End)?.track_index;
        let result = measure(&self.track, a, b);
        self.store.set_measurement(result);
        Some(result)
    }

    pub fn handle_click(&mut self, click: Coordinate) -> Event {
        if self.track.is_empty() {
            debug!("click on empty track ignored");
            return Event::Ignored {
                reason: "empty track",
            };
        }
        let Some(index) = self.spatial.nearest(click) else {
            debug!(?click, "click with no finite point to snap to ignored");
            return Event::Ignored {
                reason: "nothing to snap to",
            };
        };

        let event = if self.store.speed_mode_active() {
            let speed_kmh = self.recorded_speed(index).unwrap_or(0.0);
            let marker = self.place(MarkerKind::Speed, index, Some(speed_kmh));
            self.store.set_speed_mode(false);
            Event::SpeedUpdated { marker, speed_kmh }
        } else {
            match self.state() {
                InteractionState::Idle => {
                    self.store.clear(MarkerKind::End);
                    let marker = self.place(MarkerKind::Start, index, None);
                    Event::StartPlaced { marker }
                }
                InteractionState::StartSet => {
                    let marker = self.place(MarkerKind::End, index, None);
                    let measurement = self.remeasure().unwrap_or_default();
                    Event::EndPlaced {
                        marker,
                        measurement,
                    }
                }
                InteractionState::BothSet => {
                    self.store.clear(MarkerKind::Start);
                    self.store.clear(MarkerKind::End);
                    let marker = self.place(MarkerKind::Start, index, None);
                    Event::SelectionRestarted { marker }
                }
            }
        };
        debug!(?event, state = ?self.state(), "click handled");
        self.autosave();
        event
    }

    pub fn toggle_speed_mode(&mut self) -> Event {
        let active = self.store.toggle_speed_mode();
        Event::SpeedModeToggled { active }
    }

    pub fn clear_speed(&mut self) -> Event {
        self.store.clear(MarkerKind::Speed);
        self.autosave();
        Event::SpeedCleared
    }

    /// Drops every marker and the persisted record.
    pub fn clear_all(&mut self) -> Event {
        self.store.clear_all();
        if let Err(e) = self.persistence.clear(&self.config.storage_key) {
            warn!(error = %e, "failed to clear saved markers");
        }
        Event::AllCleared
    }

    pub fn save(&mut self) -> Event {
        let saved = SavedMarkers::from_store(&self.store);
        let persisted = match self.persistence.save(&self.config.storage_key, &saved) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to save markers");
                false
            }
        };
        Event::Saved { persisted }
    }

    fn autosave(&mut self) {
        if self.config.autosave {
            self.save();
        }
    }

    /// Re-applies saved markers by snapping each stored coordinate to the
    /// current track. A record holding Start or End replaces the in-memory
    /// selection; an End without a Start is dropped. An unreadable record is
    /// logged and treated as empty.
    pub fn restore(&mut self) -> Event {
        let saved = match self.persistence.load(&self.config.storage_key) {
            Ok(Some(saved)) => saved,
            Ok(None) => SavedMarkers::default(),
            Err(e) => {
                warn!(error = %e, "discarding unreadable saved markers");
                SavedMarkers::default()
            }
        };

        let snap = |lat: f64, lng: f64| self.spatial.nearest(Coordinate::new(lat, lng));
        let start = saved.start.and_then(|p| snap(p.lat, p.lng));
        let end = saved.end.and_then(|p| snap(p.lat, p.lng));
        let speed = saved.speed.and_then(|p| snap(p.lat, p.lng).map(|i| (i, p.value)));

        let replaces_selection = saved.start.is_some() || saved.end.is_some();
        if replaces_selection {
            self.store.clear(MarkerKind::Start);
            self.store.clear(MarkerKind::End);
        }

        let start = start.map(|i| self.place(MarkerKind::Start, i, None));
        let end = match (start, end) {
            (Some(_), Some(i)) => Some(self.place(MarkerKind::End, i, None)),
            (None, Some(_)) => {
                warn!("saved end marker has no start, dropping it");
                None
            }
            _ => None,
        };
        let measurement = if replaces_selection {
            self.remeasure()
        } else {
            None
        };
        let speed = speed.map(|(i, saved_value)| {
            let value = self.recorded_speed(i).unwrap_or(saved_value.max(0.0));
            self.place(MarkerKind::Speed, i, Some(value))
        });

        info!(
            start = start.is_some(),
            end = end.is_some(),
            speed = speed.is_some(),
            "markers restored"
        );
        Event::Restored {
            start,
            end,
            speed,
            measurement,
        }
    }
}
