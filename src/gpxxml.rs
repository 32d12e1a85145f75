use quick_xml::Reader;
use quick_xml::events::Event;
use std::error::Error;
use trackmeter::TrackPoint;

const MPS_TO_KMH: f64 = 3.6;

/// Pulls `<trkpt>` positions, raw `<time>` text and an optional `<speed>`
/// extension (m/s, converted to km/h) out of a GPX document. Points without a
/// usable position are skipped; this is a loader, not a validator.
pub fn read_track_points(input: &[u8]) -> Result<Vec<TrackPoint>, Box<dyn Error>> {
    let mut reader = Reader::from_reader(input);
    let mut buf = Vec::new();
    let mut track_points = Vec::new();

    let mut in_trkpt = false;
    let mut current_lat: Option<f64> = None;
    let mut current_lon: Option<f64> = None;
    let mut current_time: Option<String> = None;
    let mut current_speed: Option<f64> = None;
    let mut in_time_element = false;
    let mut in_speed_element = false;
    let mut text = String::new();

    loop {
        let event = match reader.read_event_into(&mut buf) {
            Err(e) => {
                return Err(
                    format!("Error at position {}: {:?}", reader.buffer_position(), e).into(),
                );
            }
            Ok(Event::Eof) => break,
            Ok(event) => event.into_owned(),
        };

        match event {
            Event::Start(ref e) => {
                if e.name().as_ref() == b"trkpt" {
                    in_trkpt = true;
                    current_lat = None;
                    current_lon = None;
                    current_time = None;
                    current_speed = None;

                    for attr in e.attributes().flatten() {
                        let value = std::str::from_utf8(&attr.value)
                            .ok()
                            .and_then(|s| s.trim().parse::<f64>().ok());
                        match attr.key.as_ref() {
                            b"lat" => current_lat = value,
                            b"lon" => current_lon = value,
                            _ => {}
                        }
                    }
                } else if in_trkpt && e.name().as_ref() == b"time" {
                    in_time_element = true;
                    text.clear();
                } else if in_trkpt && e.local_name().as_ref() == b"speed" {
                    in_speed_element = true;
                    text.clear();
                }
            }

            Event::End(ref e) => {
                if e.name().as_ref() == b"trkpt" {
                    if let (Some(lat), Some(lon)) = (current_lat, current_lon) {
                        track_points.push(TrackPoint {
                            lat,
                            lon,
                            time: current_time.take(),
                            speed: current_speed.take(),
                        });
                    }
                    in_trkpt = false;
                } else if in_trkpt && e.name().as_ref() == b"time" {
                    in_time_element = false;
                    let t = text.trim();
                    if !t.is_empty() {
                        current_time = Some(t.to_string());
                    }
                } else if in_trkpt && e.local_name().as_ref() == b"speed" {
                    in_speed_element = false;
                    current_speed = text
                        .trim()
                        .parse::<f64>()
                        .ok()
                        .filter(|v| v.is_finite())
                        .map(|mps| mps * MPS_TO_KMH);
                }
            }

            Event::Text(ref e) => {
                if in_trkpt
                    && (in_time_element || in_speed_element)
                    && let Ok(s) = std::str::from_utf8(e)
                {
                    text.push_str(s);
                }
            }

            _ => {}
        }

        buf.clear();
    }

    Ok(track_points)
}
