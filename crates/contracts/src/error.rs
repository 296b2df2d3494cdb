//! Layered error definitions
//!
//! Categorized by source: config / telemetry / io.
//! The gap computation itself never fails; these errors only cover the
//! outer layers that read configuration and recorded telemetry.

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum GapError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Telemetry Errors =====
    /// Recorded telemetry frame could not be decoded
    #[error("telemetry parse error at line {line}: {message}")]
    TelemetryParse { line: usize, message: String },

    /// Recorded telemetry frame could not be encoded
    #[error("telemetry write error: {message}")]
    TelemetryWrite { message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl GapError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create telemetry parse error
    pub fn telemetry_parse(line: usize, message: impl Into<String>) -> Self {
        Self::TelemetryParse {
            line,
            message: message.into(),
        }
    }
}
