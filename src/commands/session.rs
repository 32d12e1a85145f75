use super::load_track;
use serde::Serialize;
use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::warn;
use trackmeter::controller::BoxedPersistence;
use trackmeter::{Controller, Coordinate, EngineConfig, JsonFileStore, MemoryStore};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Click(Coordinate),
    SpeedMode,
    ClearSpeed,
    ClearAll,
    Save,
    Show,
}

/// Parses one input line. Blank lines and `#` comments yield `None`.
fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let parts: Vec<&str> = line.split_whitespace().collect();
    let command = match parts.as_slice() {
        ["click", lat, lon] => {
            let lat: f64 = lat.parse().map_err(|_| format!("bad latitude: {lat}"))?;
            let lon: f64 = lon.parse().map_err(|_| format!("bad longitude: {lon}"))?;
            Command::Click(Coordinate::new(lat, lon))
        }
        ["speed-mode"] => Command::SpeedMode,
        ["clear-speed"] => Command::ClearSpeed,
        ["clear-all"] => Command::ClearAll,
        ["save"] => Command::Save,
        ["show"] => Command::Show,
        _ => return Err(format!("unknown command: {line}")),
    };
    Ok(Some(command))
}

fn emit<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<(), Box<dyn Error>> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn run_session<R: BufRead, W: Write>(
    controller: &mut Controller,
    input: R,
    mut out: W,
) -> Result<(), Box<dyn Error>> {
    emit(&mut out, &controller.restore())?;

    for line in input.lines() {
        let line = line?;
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                warn!(%message, "skipping input line");
                emit(&mut out, &serde_json::json!({ "error": message }))?;
                continue;
            }
        };
        match command {
            Command::Click(c) => emit(&mut out, &controller.handle_click(c))?,
            Command::SpeedMode => emit(&mut out, &controller.toggle_speed_mode())?,
            Command::ClearSpeed => emit(&mut out, &controller.clear_speed())?,
            Command::ClearAll => emit(&mut out, &controller.clear_all())?,
            Command::Save => emit(&mut out, &controller.save())?,
            Command::Show => emit(&mut out, &controller.view())?,
        }
    }

    emit(&mut out, &controller.view())?;
    Ok(())
}

pub fn session_command(
    track_path: &Path,
    state_dir: &Path,
    no_persist: bool,
    config: EngineConfig,
) -> Result<(), Box<dyn Error>> {
    let input = load_track(track_path)?;
    let persistence: BoxedPersistence = if no_persist {
        Box::new(MemoryStore::new())
    } else {
        Box::new(JsonFileStore::new(state_dir))
    };
    let mut controller = Controller::new(input, config, persistence);

    let stdin = io::stdin();
    let stdout = io::stdout();
    run_session(&mut controller, stdin.lock(), stdout.lock())
}
