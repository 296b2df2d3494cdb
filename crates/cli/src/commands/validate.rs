//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{GapBlueprint, InterpolationMethod};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    sample_interval: f64,
    samples_per_lap: usize,
    max_lap_history: usize,
    interpolation_method: InterpolationMethod,
    smoothing_factor: f64,
    enabled: bool,
    fallback_lap_time: f64,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            let gap = &blueprint.gap;

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    sample_interval: gap.sample_interval,
                    samples_per_lap: (1.0 / gap.sample_interval).round() as usize,
                    max_lap_history: gap.max_lap_history,
                    interpolation_method: gap.interpolation_method,
                    smoothing_factor: gap.smoothing_factor,
                    enabled: gap.enabled,
                    fallback_lap_time: blueprint.estimates.fallback_lap_time,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &GapBlueprint) -> Vec<String> {
    let gap = &blueprint.gap;
    let mut warnings = Vec::new();

    if !gap.enabled {
        warnings.push(
            "gap.enabled is false - no positions will be sampled, gaps fall back to estimates"
                .to_string(),
        );
    }

    if gap.smoothing_factor == 0.0 {
        warnings.push(
            "gap.smoothing_factor is 0 - smoothed gaps never move from their first value"
                .to_string(),
        );
    }

    if gap.max_lap_history == 1 {
        warnings.push(
            "gap.max_lap_history is 1 - lap-history medians use a single lap".to_string(),
        );
    }

    if gap.interpolation_method == InterpolationMethod::Cubic && gap.sample_interval > 0.05 {
        warnings.push(format!(
            "cubic interpolation with sample_interval {} gives a coarse spline",
            gap.sample_interval
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!(
                "  Sample interval: {} (~{} samples/lap)",
                summary.sample_interval, summary.samples_per_lap
            );
            println!("  Lap history: {}", summary.max_lap_history);
            println!("  Interpolation: {:?}", summary.interpolation_method);
            println!("  Smoothing factor: {}", summary.smoothing_factor);
            println!("  Sampling enabled: {}", summary.enabled);
            println!("  Fallback lap time: {}s", summary.fallback_lap_time);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args(config: PathBuf) -> ValidateArgs {
        ValidateArgs {
            config,
            json: true,
        }
    }

    #[test]
    fn test_missing_file() {
        let result = validate_config(&args(PathBuf::from("/nonexistent/relgap.toml")));
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }

    #[test]
    fn test_valid_file_with_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relgap.toml");
        std::fs::write(
            &path,
            "[gap]\nsample_interval = 0.02\nsmoothing_factor = 0.0\nenabled = false\n",
        )
        .unwrap();

        let result = validate_config(&args(path));
        assert!(result.valid, "got: {:?}", result.error);
        let summary = result.summary.unwrap();
        assert_eq!(summary.samples_per_lap, 50);
        assert_eq!(result.warnings.unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relgap.toml");
        std::fs::write(&path, "[gap]\nmax_lap_history = 0\n").unwrap();

        let result = validate_config(&args(path));
        assert!(!result.valid);
        assert!(
            result.error.as_deref().unwrap_or("").contains("max_lap_history"),
            "got: {:?}",
            result.error
        );
    }

    #[test]
    fn test_defaults_have_no_warnings() {
        assert!(collect_warnings(&GapBlueprint::default()).is_empty());
    }
}
