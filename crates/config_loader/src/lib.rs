//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Generate `GapBlueprint`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("relgap.toml")).unwrap();
//! println!("History: {} laps", blueprint.gap.max_lap_history);
//! ```

mod parser;
mod validator;

pub use contracts::GapBlueprint;
pub use parser::ConfigFormat;

use contracts::GapError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<GapBlueprint, GapError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<GapBlueprint, GapError> {
        Self::parse_and_validate(content, format)
    }

    /// Validate an already constructed blueprint
    pub fn validate(blueprint: &GapBlueprint) -> Result<(), GapError> {
        validator::validate(blueprint)
    }

    /// Serialize GapBlueprint to TOML string
    pub fn to_toml(blueprint: &GapBlueprint) -> Result<String, GapError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| GapError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize GapBlueprint to JSON string
    pub fn to_json(blueprint: &GapBlueprint) -> Result<String, GapError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| GapError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, GapError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| GapError::config_parse("cannot determine file format from extension"))?;

        ConfigFormat::from_extension(ext)
            .ok_or_else(|| GapError::config_parse(format!("unsupported config format: .{ext}")))
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, GapError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(content: &str, format: ConfigFormat) -> Result<GapBlueprint, GapError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }
}
