use serde::Serialize;

use crate::Track;
use crate::geodesic::{path_length_m, seconds_between, speed_kmh};

/// Whole-track statistics, recomputed on load.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TrackSummary {
    pub length_km: f64,
    pub max_speed_kmh: f64,
    pub avg_speed_kmh: f64,
}

/// Average speed prefers the recorded instantaneous speeds (plain mean of the
/// positive ones). Only when no point carries one does it fall back to
/// length over the first-to-last duration.
pub fn summarize(track: &Track) -> TrackSummary {
    let points = track.points();
    let meters = path_length_m(points);

    let speeds: Vec<f64> = points.iter().filter_map(|p| p.positive_speed()).collect();
    let max_speed_kmh = speeds.iter().copied().fold(0.0, f64::max);

    let avg_speed_kmh = if !speeds.is_empty() {
        speeds.iter().sum::<f64>() / speeds.len() as f64
    } else {
        match (points.first(), points.last()) {
            (Some(first), Some(last)) => seconds_between(first, last)
                .map(|s| speed_kmh(meters, s))
                .unwrap_or(0.0),
            _ => 0.0,
        }
    };

    TrackSummary {
        length_km: meters / 1000.0,
        max_speed_kmh,
        avg_speed_kmh,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TrackPoint;

    #[test]
    fn test_recorded_speeds_are_averaged() {
        let track = Track::new(vec![
            TrackPoint::new(0.0, 0.0).with_speed(10.0).with_time("2023-01-01T00:00:00"),
            TrackPoint::new(0.0, 0.001).with_speed(0.0),
            TrackPoint::new(0.0, 0.002).with_speed(20.0),
            TrackPoint::new(0.0, 0.003).with_speed(-4.0),
            TrackPoint::new(0.0, 0.004).with_speed(30.0).with_time("2023-01-01T00:00:01"),
        ]);
        let s = summarize(&track);
        assert_eq!(s.avg_speed_kmh, 20.0);
        assert_eq!(s.max_speed_kmh, 30.0);
        assert!((s.length_km - 0.4448).abs() < 0.001);
    }

    #[test]
    fn test_falls_back_to_length_over_duration() {
        let track = Track::new(vec![
            TrackPoint::new(0.0, 0.0).with_time("2023-01-01T00:00:00"),
            TrackPoint::new(0.0, 0.001),
            TrackPoint::new(0.0, 0.002).with_time("2023-01-01T00:00:20"),
        ]);
        let s = summarize(&track);
        assert_eq!(s.max_speed_kmh, 0.0);
        let expected = s.length_km / (20.0 / 3600.0);
        assert!((s.avg_speed_kmh - expected).abs() < 1e-9);
        assert!((s.avg_speed_kmh - 40.0).abs() < 0.1);
    }

    #[test]
    fn test_no_speed_no_time_is_zero() {
        let track = Track::new(vec![TrackPoint::new(0.0, 0.0), TrackPoint::new(0.0, 0.001)]);
        let s = summarize(&track);
        assert_eq!(s.avg_speed_kmh, 0.0);
        assert!(s.length_km > 0.1);
    }

    #[test]
    fn test_reversed_timestamps_give_zero_avg() {
        let track = Track::new(vec![
            TrackPoint::new(0.0, 0.0).with_time("2023-01-01T00:00:20"),
            TrackPoint::new(0.0, 0.001).with_time("2023-01-01T00:00:00"),
        ]);
        assert_eq!(summarize(&track).avg_speed_kmh, 0.0);
    }

    #[test]
    fn test_short_tracks() {
        assert_eq!(summarize(&Track::default()), TrackSummary::default());
        let single = Track::new(vec![TrackPoint::new(1.0, 1.0).with_speed(5.0)]);
        let s = summarize(&single);
        assert_eq!(s.length_km, 0.0);
        assert_eq!(s.max_speed_kmh, 5.0);
        assert_eq!(s.avg_speed_kmh, 5.0);
    }
}
