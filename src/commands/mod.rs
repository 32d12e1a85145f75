pub mod measure;
pub mod session;
pub mod summary;

use crate::gpxxml::read_track_points;
use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use trackmeter::{Track, TrackInput};

/// Loads a track from a `.gpx` file, a JSON file, or JSON on stdin (`-`).
pub fn load_track(path: &Path) -> Result<TrackInput, Box<dyn Error>> {
    if path.as_os_str() == "-" {
        let mut input = Vec::new();
        io::stdin().lock().read_to_end(&mut input)?;
        return Ok(TrackInput::from_json_reader(input.as_slice())?);
    }

    let is_gpx = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gpx"));
    if is_gpx {
        let input = fs::read(path)?;
        let points = read_track_points(&input)?;
        Ok(TrackInput::from(Track::new(points)))
    } else {
        let file = fs::File::open(path)?;
        Ok(TrackInput::from_json_reader(io::BufReader::new(file))?)
    }
}
