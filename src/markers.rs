use serde::Serialize;
use tracing::{debug, warn};

use crate::Coordinate;
use crate::measure::MeasurementResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Start,
    End,
    Speed,
}

/// A marker snapped to a track point. `coordinate` is the snapped point's
/// position, not the position that was clicked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Marker {
    pub kind: MarkerKind,
    pub track_index: usize,
    pub coordinate: Coordinate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_value: Option<f64>,
}

/// State changes recorded by the store, drained by whoever renders them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum MarkerChange {
    Placed(Marker),
    Cleared { kind: MarkerKind },
    SpeedMode { active: bool },
}

/// At most one marker per kind, plus the Speed Mode flag and the measurement
/// computed for the current Start/End pair.
#[derive(Debug, Clone, Default)]
pub struct MarkerStore {
    track_len: usize,
    start: Option<Marker>,
    end: Option<Marker>,
    speed: Option<Marker>,
    speed_mode_active: bool,
    measurement: Option<MeasurementResult>,
    changes: Vec<MarkerChange>,
}

impl MarkerStore {
    pub fn new(track_len: usize) -> Self {
        Self {
            track_len,
            ..Default::default()
        }
    }

    fn slot(&mut self, kind: MarkerKind) -> &mut Option<Marker> {
        match kind {
            MarkerKind::Start => &mut self.start,
            MarkerKind::End => &mut self.end,
            MarkerKind::Speed => &mut self.speed,
        }
    }

    pub fn get(&self, kind: MarkerKind) -> Option<&Marker> {
        match kind {
            MarkerKind::Start => self.start.as_ref(),
            MarkerKind::End => self.end.as_ref(),
            MarkerKind::Speed => self.speed.as_ref(),
        }
    }

    /// Replaces the marker of `kind`. An index outside the track is dropped
    /// so the store never refers to a point that does not exist.
    pub fn set_marker(
        &mut self,
        kind: MarkerKind,
        track_index: usize,
        coordinate: Coordinate,
        speed_value: Option<f64>,
    ) {
        if track_index >= self.track_len {
            warn!(?kind, track_index, len = self.track_len, "ignoring marker outside track");
            return;
        }
        let marker = Marker {
            kind,
            track_index,
            coordinate,
            speed_value: if kind == MarkerKind::Speed { speed_value } else { None },
        };
        if kind != MarkerKind::Speed {
            self.measurement = None;
        }
        *self.slot(kind) = Some(marker);
        debug!(?kind, track_index, "marker placed");
        self.changes.push(MarkerChange::Placed(marker));
    }

    /// Removes the marker of `kind`. Start or End also drops the measurement.
    pub fn clear(&mut self, kind: MarkerKind) {
        if self.slot(kind).take().is_some() {
            debug!(?kind, "marker cleared");
            self.changes.push(MarkerChange::Cleared { kind });
        }
        if kind != MarkerKind::Speed {
            self.measurement = None;
        }
    }

    /// Removes every marker. The persisted record is the controller's to clear.
    pub fn clear_all(&mut self) {
        for kind in [MarkerKind::Start, MarkerKind::End, MarkerKind::Speed] {
            self.clear(kind);
        }
    }

    pub fn toggle_speed_mode(&mut self) -> bool {
        self.set_speed_mode(!self.speed_mode_active);
        self.speed_mode_active
    }

    pub(crate) fn set_speed_mode(&mut self, active: bool) {
        if self.speed_mode_active != active {
            self.speed_mode_active = active;
            self.changes.push(MarkerChange::SpeedMode { active });
        }
    }

    pub fn speed_mode_active(&self) -> bool {
        self.speed_mode_active
    }

    pub fn measurement(&self) -> Option<&MeasurementResult> {
        self.measurement.as_ref()
    }

    /// Only accepted while both Start and End are placed.
    pub fn set_measurement(&mut self, result: MeasurementResult) {
        if self.start.is_some() && self.end.is_some() {
            self.measurement = Some(result);
        }
    }

    pub fn take_changes(&mut self) -> Vec<MarkerChange> {
        std::mem::take(&mut self.changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64) -> Coordinate {
        Coordinate::new(lat, 0.0)
    }

    #[test]
    fn test_set_replaces_same_kind() {
        let mut store = MarkerStore::new(10);
        store.set_marker(MarkerKind::Start, 1, c(1.0), None);
        store.set_marker(MarkerKind::Start, 4, c(4.0), None);
        assert_eq!(store.get(MarkerKind::Start).unwrap().track_index, 4);
        assert!(store.get(MarkerKind::End).is_none());
        assert_eq!(store.take_changes().len(), 2);
        assert!(store.take_changes().is_empty());
    }

    #[test]
    fn test_out_of_range_index_is_ignored() {
        let mut store = MarkerStore::new(3);
        store.set_marker(MarkerKind::End, 3, c(0.0), None);
        assert!(store.get(MarkerKind::End).is_none());
        assert!(store.take_changes().is_empty());

        let mut empty = MarkerStore::new(0);
        empty.set_marker(MarkerKind::Start, 0, c(0.0), None);
        assert!(empty.get(MarkerKind::Start).is_none());
    }

    #[test]
    fn test_speed_value_only_kept_on_speed_marker() {
        let mut store = MarkerStore::new(5);
        store.set_marker(MarkerKind::Start, 0, c(0.0), Some(9.0));
        store.set_marker(MarkerKind::Speed, 2, c(2.0), Some(9.0));
        assert_eq!(store.get(MarkerKind::Start).unwrap().speed_value, None);
        assert_eq!(store.get(MarkerKind::Speed).unwrap().speed_value, Some(9.0));
    }

    #[test]
    fn test_clearing_start_or_end_drops_measurement() {
        let mut store = MarkerStore::new(5);
        store.set_marker(MarkerKind::Start, 0, c(0.0), None);
        store.set_measurement(MeasurementResult::default());
        assert!(store.measurement().is_none(), "needs both markers");

        store.set_marker(MarkerKind::End, 3, c(3.0), None);
        store.set_measurement(MeasurementResult::default());
        assert!(store.measurement().is_some());

        store.clear(MarkerKind::Speed);
        assert!(store.measurement().is_some());

        store.clear(MarkerKind::End);
        assert!(store.measurement().is_none());
    }

    #[test]
    fn test_clear_all_and_change_log() {
        let mut store = MarkerStore::new(5);
        store.set_marker(MarkerKind::Start, 0, c(0.0), None);
        store.set_marker(MarkerKind::Speed, 1, c(1.0), Some(3.0));
        store.take_changes();

        store.clear_all();
        for kind in [MarkerKind::Start, MarkerKind::End, MarkerKind::Speed] {
            assert!(store.get(kind).is_none());
        }
        assert_eq!(
            store.take_changes(),
            vec![
                MarkerChange::Cleared { kind: MarkerKind::Start },
                MarkerChange::Cleared { kind: MarkerKind::Speed },
            ]
        );
    }

    #[test]
    fn test_toggle_speed_mode() {
        let mut store = MarkerStore::new(1);
        assert!(!store.speed_mode_active());
        assert!(store.toggle_speed_mode());
        assert!(!store.toggle_speed_mode());
        assert_eq!(
            store.take_changes(),
            vec![
                MarkerChange::SpeedMode { active: true },
                MarkerChange::SpeedMode { active: false },
            ]
        );
    }
}
