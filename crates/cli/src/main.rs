//! # relgap CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Telemetry replay through the gap engine
//! - Synthetic session generation
//! - Configuration validation

mod cli;
mod commands;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_replay, run_simulate, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "relgap starting");

    let result = match &cli.command {
        Commands::Replay(args) => run_replay(args).await,
        Commands::Simulate(args) => run_simulate(args),
        Commands::Validate(args) => run_validate(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging based on CLI options
///
/// The Prometheus exporter is started later by the commands that need it.
fn init_logging(cli: &Cli) -> Result<()> {
    observability::init_with_config(logging_config(cli))
}

fn logging_config(cli: &Cli) -> observability::ObservabilityConfig {
    let (default_log_level, env_override) = if cli.quiet {
        ("warn", false)
    } else {
        let level = match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        (level, true)
    };

    observability::ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: None,
        default_log_level: default_log_level.to_string(),
        env_override,
    }
}
