use serde::Serialize;
use std::fmt;
use tracing::warn;

use crate::Track;
use crate::geodesic::{path_length_m, seconds_between, speed_kmh};

/// Distance, duration and average speed for the segment between two markers.
///
/// `valid` is false whenever the endpoints lack usable timestamps or the
/// duration is not positive. Distance is still reported in that case.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MeasurementResult {
    pub distance_km: f64,
    pub duration_seconds: f64,
    pub avg_speed_kmh: f64,
    pub valid: bool,
}

/// Advisory text attached to a measurement for display. Never blocks it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advisory {
    NoTimeData,
    UnrealisticSpeed { kmh: f64 },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::NoTimeData => write!(f, "no time data"),
            Advisory::UnrealisticSpeed { kmh } => {
                write!(f, "unrealistic speed value ({:.2} km/h)", kmh)
            }
        }
    }
}

impl MeasurementResult {
    pub fn advisories(&self, implausible_speed_kmh: f64) -> Vec<Advisory> {
        let mut out = Vec::new();
        if !self.valid {
            out.push(Advisory::NoTimeData);
        } else if self.avg_speed_kmh > implausible_speed_kmh {
            out.push(Advisory::UnrealisticSpeed {
                kmh: self.avg_speed_kmh,
            });
        }
        out
    }
}

/// Measures the path along the track between indices `a` and `b`, in either
/// order. Indices past the end are clamped to the last point.
pub fn measure(track: &Track, a: usize, b: usize) -> MeasurementResult {
    if track.is_empty() {
        return MeasurementResult::default();
    }
    let last = track.len() - 1;
    if a > last || b > last {
        warn!(a, b, len = track.len(), "measure index out of range, clamping");
    }
    let lo = a.min(b).min(last);
    let hi = a.max(b).min(last);

    let points = &track.points()[lo..=hi];
    let meters = path_length_m(points);
    let distance_km = meters / 1000.0;

    let seconds = seconds_between(&points[0], &points[points.len() - 1]).map(|s| s.max(0.0));
    match seconds {
        Some(s) if s > 0.0 => MeasurementResult {
            distance_km,
            duration_seconds: s,
            avg_speed_kmh: speed_kmh(meters, s),
            valid: true,
        },
        _ => MeasurementResult {
            distance_km,
            duration_seconds: 0.0,
            avg_speed_kmh: 0.0,
            valid: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TrackPoint;

    fn equator_track() -> Track {
        Track::new(vec![
            TrackPoint::new(0.0, 0.0).with_time("2023-01-01T00:00:00"),
            TrackPoint::new(0.0, 0.001).with_time("2023-01-01T00:00:10"),
            TrackPoint::new(0.0, 0.002).with_time("2023-01-01T00:00:20"),
        ])
    }

    #[test]
    fn test_three_point_equator_segment() {
        let r = measure(&equator_track(), 0, 2);
        assert!(r.valid);
        assert!((r.distance_km - 0.222).abs() < 0.001, "got {}", r.distance_km);
        assert_eq!(r.duration_seconds, 20.0);
        assert!((r.avg_speed_kmh - 40.0).abs() < 0.1, "got {}", r.avg_speed_kmh);
    }

    #[test]
    fn test_order_independent() {
        let track = equator_track();
        assert_eq!(measure(&track, 0, 2), measure(&track, 2, 0));
        assert_eq!(measure(&track, 1, 2), measure(&track, 2, 1));
    }

    #[test]
    fn test_distance_grows_with_span() {
        let points: Vec<TrackPoint> = (0..20)
            .map(|i| TrackPoint::new(45.0, 7.0 + i as f64 * 0.0005))
            .collect();
        let track = Track::new(points);
        let mut prev = 0.0;
        for j in 0..20 {
            let d = measure(&track, 0, j).distance_km;
            assert!(d >= prev);
            prev = d;
        }
    }

    #[test]
    fn test_path_length_not_straight_line() {
        // Out and back: the endpoints coincide but the path does not.
        let track = Track::new(vec![
            TrackPoint::new(0.0, 0.0),
            TrackPoint::new(0.0, 0.001),
            TrackPoint::new(0.0, 0.0),
        ]);
        let r = measure(&track, 0, 2);
        assert!((r.distance_km - 0.2224).abs() < 0.001);
    }

    #[test]
    fn test_no_time_data_keeps_distance() {
        let track = Track::new(vec![
            TrackPoint::new(0.0, 0.0),
            TrackPoint::new(0.0, 0.001),
            TrackPoint::new(0.0, 0.002),
        ]);
        let r = measure(&track, 0, 2);
        assert!(!r.valid);
        assert_eq!(r.duration_seconds, 0.0);
        assert_eq!(r.avg_speed_kmh, 0.0);
        assert!((r.distance_km - 0.222).abs() < 0.001);
        assert_eq!(r.advisories(150.0), vec![Advisory::NoTimeData]);
    }

    #[test]
    fn test_one_missing_endpoint_time_is_invalid() {
        let mut points = equator_track().points().to_vec();
        points[2].time = None;
        let r = measure(&Track::new(points), 0, 2);
        assert!(!r.valid);
        assert!(r.distance_km > 0.2);
    }

    #[test]
    fn test_backwards_time_is_invalid() {
        let track = Track::new(vec![
            TrackPoint::new(0.0, 0.0).with_time("2023-01-01T00:00:20"),
            TrackPoint::new(0.0, 0.001).with_time("2023-01-01T00:00:00"),
        ]);
        let r = measure(&track, 0, 1);
        assert!(!r.valid);
        assert_eq!(r.duration_seconds, 0.0);
        assert_eq!(r.avg_speed_kmh, 0.0);
    }

    #[test]
    fn test_unparseable_time_is_invalid() {
        let track = Track::new(vec![
            TrackPoint::new(0.0, 0.0).with_time("yesterday"),
            TrackPoint::new(0.0, 0.001).with_time("2023-01-01T00:00:00"),
        ]);
        assert!(!measure(&track, 0, 1).valid);
    }

    #[test]
    fn test_same_index_and_empty_track() {
        let r = measure(&equator_track(), 1, 1);
        assert_eq!(r.distance_km, 0.0);
        assert!(!r.valid);
        assert_eq!(measure(&Track::default(), 0, 3), MeasurementResult::default());
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        let track = equator_track();
        assert_eq!(measure(&track, 0, 99), measure(&track, 0, 2));
    }

    #[test]
    fn test_unrealistic_speed_is_flagged() {
        let track = Track::new(vec![
            TrackPoint::new(0.0, 0.0).with_time("2023-01-01T00:00:00"),
            TrackPoint::new(0.0, 0.01).with_time("2023-01-01T00:00:05"),
        ]);
        let r = measure(&track, 0, 1);
        assert!(r.valid);
        assert!(r.avg_speed_kmh > 150.0);
        assert!(matches!(
            r.advisories(150.0).as_slice(),
            [Advisory::UnrealisticSpeed { .. }]
        ));
        assert!(r.advisories(10_000.0).is_empty());
        assert!(r.advisories(150.0)[0].to_string().starts_with("unrealistic speed value"));
    }
}
