//! Recorded telemetry frame.

use contracts::{ObjectId, TelemetryBatch};
use serde::{Deserialize, Serialize};

/// One line of a telemetry recording
///
/// The engine-facing [`TelemetryBatch`] fields are stored flat next to
/// per-object flags that only the host needs (pit road, off track) and the
/// class lap time estimates used by the fallback tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    #[serde(flatten)]
    pub batch: TelemetryBatch,

    /// Estimated lap time per object (seconds), `<= 0` when unknown
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub est_lap_times: Vec<f64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_pit_road: Vec<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub off_track: Vec<bool>,
}

impl TelemetryFrame {
    pub fn new(batch: TelemetryBatch) -> Self {
        Self {
            batch,
            ..Default::default()
        }
    }

    /// Estimated lap time for `id`, or `fallback` when missing or non-positive
    pub fn est_lap_time(&self, id: ObjectId, fallback: f64) -> f64 {
        match self.est_lap_times.get(id) {
            Some(&estimate) if estimate > 0.0 => estimate,
            _ => fallback,
        }
    }

    pub fn is_in_pits(&self, id: ObjectId) -> bool {
        self.on_pit_road.get(id).copied().unwrap_or(false)
    }

    pub fn is_off_track(&self, id: ObjectId) -> bool {
        self.off_track.get(id).copied().unwrap_or(false)
    }

    /// Whether `id` carries a usable position and lap this tick
    pub fn is_present(&self, id: ObjectId) -> bool {
        let position = self.batch.positions.get(id).copied().unwrap_or(-1.0);
        let lap = self.batch.lap_numbers.get(id).copied().unwrap_or(-1);
        position.is_finite() && position >= 0.0 && lap >= 0
    }
}
