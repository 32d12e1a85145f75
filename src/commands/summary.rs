use super::load_track;
use std::error::Error;
use std::path::Path;
use trackmeter::{DisplayState, EngineConfig, MarkerStore, summarize};

pub fn summary_command(track_path: &Path, config: &EngineConfig) -> Result<(), Box<dyn Error>> {
    let input = load_track(track_path)?;
    let summary = summarize(&input.track);
    let view = DisplayState::new(
        input.track.len(),
        input.original_point_count,
        &summary,
        &MarkerStore::new(input.track.len()),
        config.implausible_speed_kmh,
    );

    println!(
        "points: {} (original {})",
        view.point_count, view.original_point_count
    );
    println!("length: {} km", view.length_km);
    println!("max speed: {} km/h", view.max_speed_kmh);
    println!("avg speed: {} km/h", view.avg_speed_kmh);
    Ok(())
}
