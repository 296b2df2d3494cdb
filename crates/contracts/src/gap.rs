//! RelativeGapResult - Gap Estimator output
//!
//! Sign convention: a positive `time_gap` means the other object (B) is
//! ahead of the reference object (A).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ObjectId;

/// Fallback tier that produced a gap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GapTier {
    /// Interpolated from archived position/time curves
    PositionRecords,
    /// Distance scaled by median lap time
    LapHistory,
    /// Distance scaled by an externally estimated lap time
    ClassEstimate,
}

impl GapTier {
    /// Stable label, also used for metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            GapTier::PositionRecords => "position-records",
            GapTier::LapHistory => "lap-history",
            GapTier::ClassEstimate => "class-estimate",
        }
    }
}

impl fmt::Display for GapTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Estimated gap between two objects
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelativeGapResult {
    /// Signed gap in seconds (positive = other object ahead)
    pub time_gap: f64,
    /// Tier used for the calculation
    pub tier: GapTier,
    /// Heuristic trust weight (0.0 to 1.0)
    pub confidence: f64,
    /// False only when the gap came from true interpolation
    pub is_estimated: bool,
    /// Signed shortest circular position difference
    pub distance_gap: f64,
}

/// Positions and laps for one gap query
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GapParams {
    /// Reference object (A, usually the player)
    pub reference_id: ObjectId,
    /// Other object (B)
    pub other_id: ObjectId,
    /// Reference lap-distance fraction
    pub reference_position: f64,
    /// Other lap-distance fraction
    pub other_position: f64,
    /// Reference lap number
    pub reference_lap: i32,
    /// Other lap number
    pub other_lap: i32,
    /// Current session time
    pub session_time: f64,
}

/// Externally computed conditions that change how a gap is estimated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeCaseFlags {
    /// Object is currently off track
    pub is_off_track: bool,
    /// Object is in the pit lane
    pub is_in_pits: bool,
    /// Object is on its first lap or has no lap history
    pub is_first_lap: bool,
    /// Object is on a different lap than the reference
    pub is_lapped: bool,
    /// Telemetry looks corrupted for this tick
    pub is_telemetry_glitch: bool,
}
