//! Values handed to the rendering layer after each state change.

use serde::Serialize;

use crate::markers::{MarkerKind, MarkerStore};
use crate::measure::MeasurementResult;
use crate::summary::TrackSummary;

/// Formats seconds as `MM:SS.T`. Tenths are truncated, not rounded.
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "00:00.0".to_string();
    }
    let tenths = (seconds * 10.0).floor() as u64;
    let minutes = tenths / 600;
    let secs = (tenths % 600) / 10;
    format!("{:02}:{:02}.{}", minutes, secs, tenths % 10)
}

fn two_decimals(v: f64) -> String {
    format!("{:.2}", v)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentDisplay {
    pub distance_km: String,
    pub time: String,
    pub avg_speed_kmh: String,
    pub valid: bool,
    pub advisories: Vec<String>,
}

impl SegmentDisplay {
    pub fn new(result: &MeasurementResult, implausible_speed_kmh: f64) -> Self {
        Self {
            distance_km: two_decimals(result.distance_km),
            time: format_duration(result.duration_seconds),
            avg_speed_kmh: two_decimals(result.avg_speed_kmh),
            valid: result.valid,
            advisories: result
                .advisories(implausible_speed_kmh)
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayState {
    pub point_count: usize,
    pub original_point_count: usize,
    pub length_km: String,
    pub max_speed_kmh: String,
    pub avg_speed_kmh: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment: Option<SegmentDisplay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_at_marker_kmh: Option<String>,
    pub speed_mode: bool,
}

impl DisplayState {
    pub fn new(
        point_count: usize,
        original_point_count: usize,
        summary: &TrackSummary,
        store: &MarkerStore,
        implausible_speed_kmh: f64,
    ) -> Self {
        Self {
            point_count,
            original_point_count,
            length_km: two_decimals(summary.length_km),
            max_speed_kmh: two_decimals(summary.max_speed_kmh),
            avg_speed_kmh: two_decimals(summary.avg_speed_kmh),
            segment: store
                .measurement()
                .map(|m| SegmentDisplay::new(m, implausible_speed_kmh)),
            speed_at_marker_kmh: store
                .get(MarkerKind::Speed)
                .map(|m| two_decimals(m.speed_value.unwrap_or(0.0))),
            speed_mode: store.speed_mode_active(),
        }
    }
}
