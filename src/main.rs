mod commands;
mod gpxxml;

use clap::{Parser, Subcommand};
use std::error::Error;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use trackmeter::EngineConfig;

#[derive(Parser)]
#[command(
    name = "trackmeter",
    about = "Measure distance, time and speed between points of a recorded GPS track"
)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TOML file with engine settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Flag segment speeds above this many km/h
    #[arg(long, global = true)]
    implausible_speed: Option<f64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Print point count, length, max and average speed of a track")]
    Summary {
        /// Track file (.gpx or JSON), or - for JSON on stdin
        track: PathBuf,
    },
    #[command(about = "Measure the path between two point indices")]
    Measure {
        track: PathBuf,
        from: usize,
        to: usize,
    },
    #[command(about = "Replay interaction commands from stdin, printing one JSON event per line")]
    Session {
        track: PathBuf,
        /// Directory holding saved markers
        #[arg(long, default_value = ".trackmeter")]
        state_dir: PathBuf,
        /// Keep markers in memory only
        #[arg(long)]
        no_persist: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<EngineConfig, Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(kmh) = cli.implausible_speed {
        config.implausible_speed_kmh = kmh;
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = load_config(&cli)?;
    match cli.command {
        Commands::Summary { track } => commands::summary::summary_command(&track, &config),
        Commands::Measure { track, from, to } => {
            commands::measure::measure_command(&track, from, to, &config)
        }
        Commands::Session {
            track,
            state_dir,
            no_persist,
        } => commands::session::session_command(&track, &state_dir, no_persist, config),
    }
}
