//! `replay` command implementation.

use anyhow::{Context, Result};
use contracts::GapBlueprint;
use tracing::{info, warn};

use crate::cli::ReplayArgs;
use crate::pipeline::{ReplayConfig, Replayer, ReportFormat};

/// Execute the `replay` command
pub async fn run_replay(args: &ReplayArgs) -> Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Recording not found: {}", args.input.display());
    }

    let blueprint = match &args.config {
        Some(path) => {
            info!(config = %path.display(), "Loading configuration");
            config_loader::ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => {
            info!("No configuration file given, using defaults");
            GapBlueprint::default()
        }
    };

    info!(
        sample_interval = blueprint.gap.sample_interval,
        max_lap_history = blueprint.gap.max_lap_history,
        interpolation = ?blueprint.gap.interpolation_method,
        enabled = blueprint.gap.enabled,
        fallback_lap_time = blueprint.estimates.fallback_lap_time,
        "Configuration loaded"
    );

    let replay_config = ReplayConfig {
        blueprint,
        input: args.input.clone(),
        reference: args.reference,
        report_every: args.every,
        smooth: args.smooth,
        format: if args.json {
            ReportFormat::JsonLines
        } else {
            ReportFormat::Table
        },
        realtime: args.realtime,
        max_frames: if args.max_frames == 0 {
            None
        } else {
            Some(args.max_frames)
        },
        strict: args.strict,
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    let replayer = Replayer::new(replay_config);
    let shutdown_signal = setup_shutdown_signal();

    tokio::select! {
        result = replayer.run() => {
            let stats = result.context("Replay failed")?;
            info!(
                frames = stats.frames,
                reports = stats.reports,
                duration_secs = stats.duration.as_secs_f64(),
                fps = format!("{:.2}", stats.fps()),
                "Replay completed"
            );
            if !args.json {
                stats.print_summary();
            }
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, stopping replay...");
        }
    }

    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed never resolves.
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
