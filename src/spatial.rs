//! Nearest-point lookup over a track.
//!
//! Ranking uses squared planar distance in (lat, lon) degree space, not the
//! geodesic distance. Points on a recorded track are locally clustered so the
//! two orders agree for a click near the line; at high latitudes a degree of
//! longitude shrinks and the planar rank can pick a point that is not the
//! closest on the ground. The search is a linear scan.

use crate::{Coordinate, Track};

fn planar_sq(a: Coordinate, b: Coordinate) -> f64 {
    let dlat = a.lat - b.lat;
    let dlon = a.lon - b.lon;
    dlat * dlat + dlon * dlon
}

fn nearest_finite(points: &[Coordinate], target: Coordinate) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, p) in points.iter().enumerate() {
        let d = planar_sq(*p, target);
        if !d.is_finite() {
            continue;
        }
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((i, d));
        }
    }
    best.map(|(i, _)| i)
}

/// Index of the point closest to `target`, first occurrence on ties.
///
/// Returns 0 for an empty slice or one with no finite point; callers must
/// check the length before indexing with the result.
pub fn nearest(points: &[Coordinate], target: Coordinate) -> usize {
    nearest_finite(points, target).unwrap_or(0)
}

/// Coordinates of a track, extracted once at load.
#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    coords: Vec<Coordinate>,
}

impl SpatialIndex {
    pub fn build(track: &Track) -> Self {
        Self {
            coords: track.points().iter().map(|p| p.coordinate()).collect(),
        }
    }

    /// Snaps `target` to a track index; `None` when no finite point exists to
    /// snap to or the target itself is not a finite coordinate.
    pub fn nearest(&self, target: Coordinate) -> Option<usize> {
        if !target.is_finite() {
            return None;
        }
        nearest_finite(&self.coords, target)
    }
}
