//! Gap engine configuration contracts that can be shared across crates.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Interpolation scheme used on position/time curves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationMethod {
    /// Straight line between the bracketing samples
    #[default]
    Linear,
    /// Catmull-Rom spline over four neighbouring samples
    Cubic,
}

/// Relative gap engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct GapConfig {
    /// Minimum position advance before a new sample is recorded
    #[validate(range(exclusive_min = 0.0, max = 0.5))]
    pub sample_interval: f64,

    /// Maximum number of archived laps per object
    #[validate(range(min = 1))]
    pub max_lap_history: usize,

    /// Interpolation method for position records
    pub interpolation_method: InterpolationMethod,

    /// Exponential moving average factor (0.0 to 1.0)
    #[validate(range(min = 0.0, max = 1.0))]
    pub smoothing_factor: f64,

    /// Master switch for position sampling
    pub enabled: bool,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            sample_interval: 0.01,
            max_lap_history: 5,
            interpolation_method: InterpolationMethod::Linear,
            smoothing_factor: 0.3,
            enabled: true,
        }
    }
}

impl GapConfig {
    /// Shallow merge: every field present in `update` replaces the current value
    pub fn merge(&mut self, update: &GapConfigUpdate) {
        if let Some(sample_interval) = update.sample_interval {
            self.sample_interval = sample_interval;
        }
        if let Some(max_lap_history) = update.max_lap_history {
            self.max_lap_history = max_lap_history;
        }
        if let Some(method) = update.interpolation_method {
            self.interpolation_method = method;
        }
        if let Some(smoothing_factor) = update.smoothing_factor {
            self.smoothing_factor = smoothing_factor;
        }
        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
        }
    }
}

/// Partial configuration update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapConfigUpdate {
    pub sample_interval: Option<f64>,
    pub max_lap_history: Option<usize>,
    pub interpolation_method: Option<InterpolationMethod>,
    pub smoothing_factor: Option<f64>,
    pub enabled: Option<bool>,
}

/// Lap time estimates used by the class-estimate tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct EstimateConfig {
    /// Lap time assumed when telemetry carries no estimate (seconds)
    #[validate(range(exclusive_min = 0.0))]
    pub fallback_lap_time: f64,
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self {
            fallback_lap_time: 90.0,
        }
    }
}

/// Complete configuration file contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct GapBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Engine settings
    #[serde(default)]
    #[validate(nested)]
    pub gap: GapConfig,

    /// Tier 3 lap time estimates
    #[serde(default)]
    #[validate(nested)]
    pub estimates: EstimateConfig,
}
