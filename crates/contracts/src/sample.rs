//! Position samples, archived laps and per-object history.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::ObjectId;

/// Laps with fewer buffered samples are never archived
pub const MIN_SAMPLES_PER_LAP: usize = 10;

/// A single position sample at a specific point on track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    /// Lap-distance fraction in `[0, 1)`
    pub position: f64,
    /// Seconds since the lap started
    pub time: f64,
    /// Session time when the sample was recorded
    pub session_time: f64,
}

/// Completed lap with its position/time curve
///
/// Built once by the lap archiver and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapRecord {
    /// Lap number this record belongs to
    pub lap_number: i32,
    /// Samples sorted ascending by position
    pub samples: Vec<PositionSample>,
    /// Completed lap time reported by telemetry (seconds)
    pub lap_time: f64,
    /// Session time when the lap was archived
    pub completed_at: f64,
    /// False when the outlier filter rejected the lap time
    pub is_valid: bool,
}

/// Historical data for one tracked object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectHistory {
    /// Object (car) index
    pub id: ObjectId,
    /// Archived laps, oldest first
    pub lap_records: VecDeque<LapRecord>,
    /// Samples of the lap in progress, in arrival order
    pub current_lap_samples: Vec<PositionSample>,
    /// Position of the last recorded sample
    pub last_position: f64,
    /// Lap currently being sampled
    pub current_lap_number: i32,
    /// Session time at which the current lap started
    pub lap_start_time: f64,
}

impl ObjectHistory {
    /// Create an empty history starting on `lap` at `session_time`
    pub fn new(id: ObjectId, lap: i32, session_time: f64) -> Self {
        Self {
            id,
            lap_records: VecDeque::new(),
            current_lap_samples: Vec::new(),
            last_position: 0.0,
            current_lap_number: lap,
            lap_start_time: session_time,
        }
    }

    /// Most recent lap that passed the outlier filter
    pub fn latest_valid_lap(&self) -> Option<&LapRecord> {
        self.lap_records.iter().rev().find(|lap| lap.is_valid)
    }

    /// Lap times of every valid archived lap, oldest first
    pub fn valid_lap_times(&self) -> Vec<f64> {
        self.lap_records
            .iter()
            .filter(|lap| lap.is_valid)
            .map(|lap| lap.lap_time)
            .collect()
    }

    /// Number of valid archived laps
    pub fn valid_lap_count(&self) -> usize {
        self.lap_records.iter().filter(|lap| lap.is_valid).count()
    }

    /// Whether at least one lap has been archived
    #[inline]
    pub fn has_lap_history(&self) -> bool {
        !self.lap_records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lap(lap_number: i32, lap_time: f64, is_valid: bool) -> LapRecord {
        LapRecord {
            lap_number,
            samples: Vec::new(),
            lap_time,
            completed_at: 0.0,
            is_valid,
        }
    }

    #[test]
    fn test_new_history_is_empty() {
        let history = ObjectHistory::new(3, 7, 120.0);
        assert_eq!(history.id, 3);
        assert_eq!(history.current_lap_number, 7);
        assert_eq!(history.lap_start_time, 120.0);
        assert!(!history.has_lap_history());
        assert!(history.latest_valid_lap().is_none());
    }

    #[test]
    fn test_latest_valid_lap_skips_outliers() {
        let mut history = ObjectHistory::new(0, 1, 0.0);
        history.lap_records.push_back(lap(1, 90.0, true));
        history.lap_records.push_back(lap(2, 91.0, true));
        history.lap_records.push_back(lap(3, 140.0, false));

        let latest = history.latest_valid_lap().unwrap();
        assert_eq!(latest.lap_number, 2);
        assert_eq!(history.valid_lap_count(), 2);
        assert_eq!(history.valid_lap_times(), vec![90.0, 91.0]);
    }
}
