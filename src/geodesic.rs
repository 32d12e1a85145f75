use time::format_description::well_known::Iso8601;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::{Coordinate, TrackPoint};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Calculates the great circle distance in meters between two GPS coordinates
/// using the haversine formula.
///
/// The sphere approximation is well within GPS noise at the scale of a
/// recorded track. Inputs are degrees and are not validated: a `NaN` input
/// produces a `NaN` distance.
///
/// References:
/// - R.W. Sinnott, "Virtues of the Haversine", Sky and Telescope, vol. 68, no. 2, 1984, p. 159
/// - https://www.movable-type.co.uk/scripts/latlong.html
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    // a = sin²(Δφ/2) + cos φ1 ⋅ cos φ2 ⋅ sin²(Δλ/2)
    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);

    // c = 2 ⋅ atan2(√a, √(1−a))
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    haversine_distance(a.lat, a.lon, b.lat, b.lon)
}

/// Sum of consecutive-point distances over `points`, in meters.
///
/// Legs touching a non-finite coordinate contribute nothing.
pub fn path_length_m(points: &[TrackPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| distance_meters(w[0].coordinate(), w[1].coordinate()))
        .filter(|d| d.is_finite())
        .sum()
}

/// Parses an ISO-8601 timestamp. Strings without an offset are taken as UTC;
/// an explicit offset is honoured rather than overridden.
pub fn parse_timestamp(s: &str) -> Option<OffsetDateTime> {
    let s = s.trim();
    if let Ok(t) = OffsetDateTime::parse(s, &Iso8601::DEFAULT) {
        return Some(t);
    }
    PrimitiveDateTime::parse(s, &Iso8601::DEFAULT)
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

/// Seconds from `a` to `b` when both carry a parseable timestamp.
pub fn seconds_between(a: &TrackPoint, b: &TrackPoint) -> Option<f64> {
    let (ta, tb) = (a.timestamp()?, b.timestamp()?);
    Some((tb - ta).as_seconds_f64())
}

/// Average speed in km/h over `meters` covered in `seconds`; 0 for a
/// non-positive duration.
pub fn speed_kmh(meters: f64, seconds: f64) -> f64 {
    if seconds > 0.0 {
        (meters / 1000.0) / (seconds / 3600.0)
    } else {
        0.0
    }
}
