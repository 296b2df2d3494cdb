//! `simulate` command implementation.

use anyhow::{Context, Result};
use ingestion::{parse_track_length, MockTelemetryConfig, MockTelemetrySource, TelemetryRecorder};
use tracing::{info, warn};

use crate::cli::SimulateArgs;

/// Execute the `simulate` command
pub fn run_simulate(args: &SimulateArgs) -> Result<()> {
    let config = mock_config(args)?;

    info!(
        output = %args.output.display(),
        cars = config.cars,
        laps = config.laps,
        seed = config.seed,
        track_length = config.track_length,
        "Generating synthetic session"
    );

    let mut recorder = TelemetryRecorder::create(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;

    let mut last_time = 0.0;
    for frame in MockTelemetrySource::new(config) {
        last_time = frame.batch.session_time;
        recorder.record(&frame)?;
    }
    recorder.flush()?;

    info!(
        frames = recorder.frames_written(),
        session_time = format!("{:.1}", last_time),
        "Recording written"
    );
    println!(
        "✓ Wrote {} frames ({:.1}s of session time) to {}",
        recorder.frames_written(),
        last_time,
        args.output.display()
    );

    Ok(())
}

fn mock_config(args: &SimulateArgs) -> Result<MockTelemetryConfig> {
    if args.cars == 0 {
        anyhow::bail!("--cars must be at least 1");
    }
    if !(args.tick_hz.is_finite() && args.tick_hz > 0.0) {
        anyhow::bail!("--tick-hz must be positive, got {}", args.tick_hz);
    }
    if !(args.base_lap_time.is_finite() && args.base_lap_time > 0.0) {
        anyhow::bail!("--base-lap-time must be positive, got {}", args.base_lap_time);
    }

    let track_length = parse_track_length(&args.track_length);
    if track_length <= 0.0 {
        warn!(
            track_length = %args.track_length,
            "Unrecognized track length, recording 0"
        );
    }

    Ok(MockTelemetryConfig {
        cars: args.cars,
        laps: args.laps,
        tick_hz: args.tick_hz,
        base_lap_time: args.base_lap_time,
        pace_spread: args.pace_spread.max(0.0),
        lap_variation: args.lap_variation.clamp(0.0, 0.5),
        position_noise: args.position_noise.max(0.0),
        dropout_probability: args.dropout,
        off_track_probability: args.off_track,
        session_id: args.session_id,
        track_length,
        seed: args.seed,
    })
}
