//! TelemetryBatch - one tick of per-object telemetry.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Object identifier (index into the telemetry arrays)
pub type ObjectId = usize;

/// Caller-owned "last seen lap number" per object
///
/// Kept outside the session so lap-edge detection cadence is decoupled
/// from history storage.
pub type LapCounters = HashMap<ObjectId, i32>;

/// Per-tick telemetry for every object
///
/// Arrays are indexed by [`ObjectId`]. A position or lap of `-1` marks the
/// object as invalid for this tick; a last lap time `<= 0` means no lap was
/// completed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryBatch {
    /// Global session time (seconds)
    pub session_time: f64,
    /// Opaque session identifier; a change invalidates all history
    pub session_id: i64,
    /// Track length in meters (informational)
    #[serde(default)]
    pub track_length: f64,
    /// Lap-distance fraction per object
    pub positions: Vec<f64>,
    /// Current lap number per object
    pub lap_numbers: Vec<i32>,
    /// Last completed lap time per object (seconds)
    #[serde(default)]
    pub last_lap_times: Vec<f64>,
}

impl TelemetryBatch {
    /// Number of object slots in this batch
    pub fn object_count(&self) -> usize {
        self.positions.len()
    }

    /// Last completed lap time for `id`, `0.0` when absent
    pub fn last_lap_time(&self, id: ObjectId) -> f64 {
        self.last_lap_times.get(id).copied().unwrap_or(0.0)
    }
}
