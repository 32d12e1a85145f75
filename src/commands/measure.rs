use super::load_track;
use std::error::Error;
use std::path::Path;
use trackmeter::display::SegmentDisplay;
use trackmeter::{EngineConfig, measure};

pub fn measure_command(
    track_path: &Path,
    from: usize,
    to: usize,
    config: &EngineConfig,
) -> Result<(), Box<dyn Error>> {
    let input = load_track(track_path)?;
    let len = input.track.len();
    if let Some(bad) = [from, to].into_iter().find(|&i| i >= len) {
        return Err(format!("index {bad} out of range (track has {len} points)").into());
    }

    let result = measure(&input.track, from, to);
    let segment = SegmentDisplay::new(&result, config.implausible_speed_kmh);

    println!("distance: {} km", segment.distance_km);
    println!("time: {}", segment.time);
    println!("avg speed: {} km/h", segment.avg_speed_kmh);
    for advisory in &segment.advisories {
        println!("warning: {advisory}");
    }
    Ok(())
}
