//! Configuration validation.
//!
//! Rules:
//! - field ranges declared on the contract types (`validator` derive)
//! - every float is finite
//! - `sample_interval` leaves room for enough samples per lap

use contracts::{GapBlueprint, GapError, MIN_SAMPLES_PER_LAP};
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

/// Validate a GapBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &GapBlueprint) -> Result<(), GapError> {
    validate_finite(blueprint)?;
    validate_ranges(blueprint)?;
    validate_sample_density(blueprint)?;
    Ok(())
}

/// Range rules declared with `#[validate(...)]`
fn validate_ranges(blueprint: &GapBlueprint) -> Result<(), GapError> {
    let Err(errors) = blueprint.validate() else {
        return Ok(());
    };

    let mut violations = Vec::new();
    flatten_errors(&errors, "", &mut violations);
    violations.sort();

    match violations.into_iter().next() {
        Some((field, message)) => Err(GapError::config_validation(field, message)),
        None => Err(GapError::config_validation("<root>", errors.to_string())),
    }
}

/// Collect `(field.path, message)` pairs from nested validation errors
fn flatten_errors(errors: &ValidationErrors, prefix: &str, out: &mut Vec<(String, String)>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = match &error.message {
                        Some(message) => message.to_string(),
                        None => describe_range(error),
                    };
                    out.push((path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(nested) => flatten_errors(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (idx, nested) in items {
                    flatten_errors(nested, &format!("{path}[{idx}]"), out);
                }
            }
        }
    }
}

fn describe_range(error: &ValidationError) -> String {
    let bound = |name: &str| error.params.get(name).map(|v| v.to_string());
    let value = bound("value").unwrap_or_else(|| "?".into());

    match (bound("min"), bound("exclusive_min"), bound("max")) {
        (_, Some(min), Some(max)) => format!("must be > {min} and <= {max}, got {value}"),
        (Some(min), _, Some(max)) => format!("must be in [{min}, {max}], got {value}"),
        (_, Some(min), None) => format!("must be > {min}, got {value}"),
        (Some(min), _, None) => format!("must be >= {min}, got {value}"),
        (None, None, Some(max)) => format!("must be <= {max}, got {value}"),
        (None, None, None) => format!("failed '{}' check, got {value}", error.code),
    }
}

/// NaN passes every range comparison, so reject non-finite values first
fn validate_finite(blueprint: &GapBlueprint) -> Result<(), GapError> {
    let fields = [
        ("gap.sample_interval", blueprint.gap.sample_interval),
        ("gap.smoothing_factor", blueprint.gap.smoothing_factor),
        (
            "estimates.fallback_lap_time",
            blueprint.estimates.fallback_lap_time,
        ),
    ];
    for (field, value) in fields {
        if !value.is_finite() {
            return Err(GapError::config_validation(
                field,
                format!("must be a finite number, got {value}"),
            ));
        }
    }
    Ok(())
}

/// A lap must be able to collect enough samples to ever be archived
fn validate_sample_density(blueprint: &GapBlueprint) -> Result<(), GapError> {
    let interval = blueprint.gap.sample_interval;
    let max_interval = 1.0 / MIN_SAMPLES_PER_LAP as f64;
    if interval > max_interval {
        return Err(GapError::config_validation(
            "gap.sample_interval",
            format!(
                "sample_interval ({interval}) must be <= {max_interval} so a lap collects at least {MIN_SAMPLES_PER_LAP} samples"
            ),
        ));
    }
    Ok(())
}
