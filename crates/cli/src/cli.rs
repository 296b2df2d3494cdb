//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// relgap - relative time gaps between cars on a closed track
#[derive(Parser, Debug)]
#[command(
    name = "relgap",
    author,
    version,
    about = "Relative time gap engine",
    long_about = "Computes time gaps between cars from lap-distance telemetry.\n\n\
                  Replays recorded telemetry through the gap engine, generates \n\
                  synthetic sessions and validates engine configuration files."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "RELGAP_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "RELGAP_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a telemetry recording through the gap engine
    Replay(ReplayArgs),

    /// Generate a synthetic telemetry recording
    Simulate(SimulateArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),
}

/// Arguments for the `replay` command
#[derive(Parser, Debug, Clone)]
pub struct ReplayArgs {
    /// Telemetry recording (JSON Lines)
    #[arg(short, long, env = "RELGAP_INPUT")]
    pub input: PathBuf,

    /// Engine configuration file (TOML or JSON); defaults apply when omitted
    #[arg(short, long, env = "RELGAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Car the gaps are reported relative to
    #[arg(short, long, default_value = "0", env = "RELGAP_REFERENCE")]
    pub reference: usize,

    /// Report gaps every N frames
    #[arg(long, default_value = "60", value_parser = clap::value_parser!(u64).range(1..))]
    pub every: u64,

    /// Smooth reported gaps with the configured smoothing factor
    #[arg(long)]
    pub smooth: bool,

    /// Output reports as JSON Lines
    #[arg(long)]
    pub json: bool,

    /// Pace the replay by recorded session time
    #[arg(long)]
    pub realtime: bool,

    /// Stop after this many frames (0 = whole recording)
    #[arg(long, default_value = "0")]
    pub max_frames: u64,

    /// Abort on the first malformed line instead of skipping it
    #[arg(long)]
    pub strict: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "RELGAP_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `simulate` command
#[derive(Parser, Debug, Clone)]
pub struct SimulateArgs {
    /// Output recording (JSON Lines)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Number of cars
    #[arg(long, default_value = "8")]
    pub cars: usize,

    /// Timed laps per car
    #[arg(long, default_value = "5")]
    pub laps: u32,

    /// Random seed
    #[arg(long, default_value = "42", env = "RELGAP_SEED")]
    pub seed: u64,

    /// Telemetry rate (Hz)
    #[arg(long, default_value = "60")]
    pub tick_hz: f64,

    /// Pace of the fastest car (seconds)
    #[arg(long, default_value = "90")]
    pub base_lap_time: f64,

    /// Pace difference between fastest and slowest car (seconds)
    #[arg(long, default_value = "4")]
    pub pace_spread: f64,

    /// Relative lap-to-lap variation
    #[arg(long, default_value = "0.01")]
    pub lap_variation: f64,

    /// Noise amplitude added to reported positions
    #[arg(long, default_value = "0")]
    pub position_noise: f64,

    /// Probability that a car is missing from a tick
    #[arg(long, default_value = "0")]
    pub dropout: f64,

    /// Probability that a car is flagged off track on a tick
    #[arg(long, default_value = "0")]
    pub off_track: f64,

    /// Session identifier written into every frame
    #[arg(long, default_value = "1")]
    pub session_id: i64,

    /// Track length, e.g. "4.0 km" or "2.5 mi"
    #[arg(long, default_value = "4.0 km")]
    pub track_length: String,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "relgap.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
