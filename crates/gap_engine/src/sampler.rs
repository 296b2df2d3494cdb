//! Position sampler and lap archiver.
//!
//! The sampler gates incoming positions by distance travelled, never by
//! tick rate. The archiver turns the buffered samples of a finished lap
//! into an immutable [`LapRecord`] and keeps the per-object FIFO bounded.

use contracts::{GapConfig, LapRecord, ObjectHistory, PositionSample, MIN_SAMPLES_PER_LAP};
use tracing::debug;

use crate::interpolation::normalize_position;
use crate::outlier::is_valid_lap;

/// Backwards jump that is treated as a start/finish crossing
const WRAP_REGRESSION: f64 = 0.5;

/// What happened to a lap handed to the archiver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveOutcome {
    /// Stored as a new lap record
    Archived {
        lap_number: i32,
        is_valid: bool,
        /// Oldest records dropped to respect the history cap
        evicted: usize,
    },
    /// Not enough samples; nothing stored
    Dropped { samples: usize },
    /// No history exists for the object
    Unknown,
}

/// Offer a position to the sampler
///
/// Returns whether a sample was appended. Does nothing at all while the
/// config is disabled.
pub fn record_sample(
    history: &mut ObjectHistory,
    position: f64,
    session_time: f64,
    current_lap: i32,
    config: &GapConfig,
) -> bool {
    if !config.enabled {
        return false;
    }

    // New lap without an explicit completion: start over, do not archive
    if current_lap != history.current_lap_number {
        history.current_lap_number = current_lap;
        history.current_lap_samples.clear();
        history.lap_start_time = session_time;
    }

    let position = normalize_position(position);
    let should_sample = history.current_lap_samples.is_empty()
        || position >= history.last_position + config.sample_interval
        || position < history.last_position - WRAP_REGRESSION;

    if !should_sample {
        return false;
    }

    history.current_lap_samples.push(PositionSample {
        position,
        time: session_time - history.lap_start_time,
        session_time,
    });
    history.last_position = position;
    true
}

/// Finalize the buffered lap into the history
pub fn archive_lap(
    history: &mut ObjectHistory,
    lap_time: f64,
    session_time: f64,
    max_lap_history: usize,
) -> ArchiveOutcome {
    let buffered = history.current_lap_samples.len();
    if buffered < MIN_SAMPLES_PER_LAP {
        debug!(
            object_id = history.id,
            samples = buffered,
            "lap dropped: not enough samples"
        );
        metrics::counter!("relgap_laps_dropped_total").increment(1);
        return ArchiveOutcome::Dropped { samples: buffered };
    }

    let mut samples = std::mem::take(&mut history.current_lap_samples);
    samples.sort_by(|a, b| a.position.total_cmp(&b.position));

    let is_valid = is_valid_lap(lap_time, &history.valid_lap_times());
    let lap_number = history.current_lap_number;

    history.lap_records.push_back(LapRecord {
        lap_number,
        samples,
        lap_time,
        completed_at: session_time,
        is_valid,
    });
    let evicted = enforce_history_cap(history, max_lap_history);

    history.lap_start_time = session_time;
    history.current_lap_number += 1;

    debug!(
        object_id = history.id,
        lap_number,
        lap_time,
        is_valid,
        samples = buffered,
        "lap archived"
    );
    metrics::counter!(
        "relgap_laps_archived_total",
        "valid" => if is_valid { "true" } else { "false" }
    )
    .increment(1);

    ArchiveOutcome::Archived {
        lap_number,
        is_valid,
        evicted,
    }
}

/// Drop the oldest records until at most `max_lap_history` remain
pub fn enforce_history_cap(history: &mut ObjectHistory, max_lap_history: usize) -> usize {
    let mut evicted = 0;
    while history.lap_records.len() > max_lap_history {
        history.lap_records.pop_front();
        evicted += 1;
    }
    evicted
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drive one lap of `count` evenly spaced positions, one second apart
    fn drive_lap(history: &mut ObjectHistory, lap: i32, start: f64, count: usize) {
        let config = GapConfig::default();
        for i in 0..count {
            let position = i as f64 / count as f64;
            record_sample(history, position, start + i as f64, lap, &config);
        }
    }

    #[test]
    fn test_first_sample_always_recorded() {
        let mut history = ObjectHistory::new(0, 1, 10.0);
        let config = GapConfig::default();
        assert!(record_sample(&mut history, 0.42, 12.0, 1, &config));
        let sample = history.current_lap_samples[0];
        assert_eq!(sample.position, 0.42);
        assert_eq!(sample.time, 2.0);
        assert_eq!(sample.session_time, 12.0);
    }

    #[test]
    fn test_sampling_is_gated_by_distance() {
        let mut history = ObjectHistory::new(0, 1, 0.0);
        let config = GapConfig::default();
        assert!(record_sample(&mut history, 0.100, 0.0, 1, &config));
        assert!(!record_sample(&mut history, 0.105, 0.1, 1, &config));
        assert!(!record_sample(&mut history, 0.109, 0.2, 1, &config));
        assert!(record_sample(&mut history, 0.111, 0.3, 1, &config));
        assert_eq!(history.current_lap_samples.len(), 2);
        assert_eq!(history.last_position, 0.111);
    }

    #[test]
    fn test_wrap_regression_is_sampled() {
        let mut history = ObjectHistory::new(0, 1, 0.0);
        let config = GapConfig::default();
        record_sample(&mut history, 0.98, 0.0, 1, &config);
        assert!(record_sample(&mut history, 0.01, 1.0, 1, &config));
        // small regression is ignored
        assert!(!record_sample(&mut history, 0.005, 1.1, 1, &config));
    }

    #[test]
    fn test_positions_are_normalized() {
        let mut history = ObjectHistory::new(0, 1, 0.0);
        let config = GapConfig::default();
        record_sample(&mut history, 1.25, 0.0, 1, &config);
        assert_eq!(history.current_lap_samples[0].position, 0.25);
    }

    #[test]
    fn test_lap_change_resets_buffer_without_archiving() {
        let mut history = ObjectHistory::new(0, 1, 0.0);
        drive_lap(&mut history, 1, 0.0, 20);
        assert_eq!(history.current_lap_samples.len(), 20);

        let config = GapConfig::default();
        record_sample(&mut history, 0.0, 50.0, 2, &config);
        assert_eq!(history.current_lap_number, 2);
        assert_eq!(history.lap_start_time, 50.0);
        assert_eq!(history.current_lap_samples.len(), 1);
        assert!(history.lap_records.is_empty());
    }

    #[test]
    fn test_disabled_sampler_is_noop() {
        let mut history = ObjectHistory::new(0, 1, 0.0);
        let config = GapConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(!record_sample(&mut history, 0.5, 1.0, 3, &config));
        assert!(history.current_lap_samples.is_empty());
        assert_eq!(history.current_lap_number, 1);
    }

    #[test]
    fn test_short_lap_is_dropped() {
        let mut history = ObjectHistory::new(0, 1, 0.0);
        drive_lap(&mut history, 1, 0.0, 9);
        let outcome = archive_lap(&mut history, 90.0, 90.0, 5);
        assert_eq!(outcome, ArchiveOutcome::Dropped { samples: 9 });
        assert!(history.lap_records.is_empty());
        assert_eq!(history.current_lap_number, 1);
    }

    #[test]
    fn test_archive_sorts_and_advances() {
        let mut history = ObjectHistory::new(0, 1, 0.0);
        drive_lap(&mut history, 1, 0.0, 10);
        // wrap sample arrives last but sorts first
        history.current_lap_samples.push(PositionSample {
            position: 0.001,
            time: 10.5,
            session_time: 10.5,
        });

        let outcome = archive_lap(&mut history, 11.0, 11.0, 5);
        assert_eq!(
            outcome,
            ArchiveOutcome::Archived {
                lap_number: 1,
                is_valid: true,
                evicted: 0
            }
        );

        let record = &history.lap_records[0];
        assert_eq!(record.samples.len(), 11);
        assert!(record
            .samples
            .windows(2)
            .all(|w| w[0].position <= w[1].position));
        assert_eq!(record.completed_at, 11.0);
        assert!(history.current_lap_samples.is_empty());
        assert_eq!(history.current_lap_number, 2);
        assert_eq!(history.lap_start_time, 11.0);
    }

    #[test]
    fn test_outlier_lap_is_kept_but_invalid() {
        let mut history = ObjectHistory::new(0, 1, 0.0);
        for (lap, lap_time) in [(1, 100.0), (2, 101.0), (3, 180.0)] {
            drive_lap(&mut history, lap, lap as f64 * 200.0, 12);
            archive_lap(&mut history, lap_time, lap as f64 * 200.0 + 100.0, 5);
        }
        assert_eq!(history.lap_records.len(), 3);
        assert!(!history.lap_records[2].is_valid);
        assert_eq!(history.valid_lap_count(), 2);
    }

    #[test]
    fn test_history_cap_evicts_oldest() {
        let mut history = ObjectHistory::new(0, 1, 0.0);
        for lap in 1..=7 {
            drive_lap(&mut history, lap, lap as f64 * 100.0, 12);
            archive_lap(&mut history, 100.0, lap as f64 * 100.0 + 99.0, 5);
            assert!(history.lap_records.len() <= 5);
        }
        let laps: Vec<i32> = history.lap_records.iter().map(|l| l.lap_number).collect();
        assert_eq!(laps, vec![3, 4, 5, 6, 7]);
    }
}
