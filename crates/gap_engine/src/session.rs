//! Session lifecycle manager.
//!
//! [`GapSession`] owns every object's history together with the active
//! configuration and the identity of the current session. A change of
//! session identifier discards all history before the batch that carried
//! it is processed.

use std::collections::HashMap;

use contracts::{
    EdgeCaseFlags, GapConfig, GapConfigUpdate, GapParams, LapCounters, ObjectHistory, ObjectId,
    RelativeGapResult, TelemetryBatch,
};
use tracing::{debug, info, instrument};

use crate::estimator::compute_relative_gap;
use crate::sampler::{archive_lap, enforce_history_cap, record_sample, ArchiveOutcome};

/// Per-session store of object histories
#[derive(Debug, Clone, Default)]
pub struct GapSession {
    /// Histories keyed by object id
    histories: HashMap<ObjectId, ObjectHistory>,
    /// Active configuration
    config: GapConfig,
    /// Last observed session identifier, `None` until the first batch
    session_id: Option<i64>,
    /// Track length in meters
    track_length: f64,
}

impl GapSession {
    /// Create an empty session with the given configuration
    pub fn new(config: GapConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Ingest one telemetry batch
    ///
    /// `counters` holds the last seen lap number per object. Lap completions
    /// are detected against it and the updated map is returned.
    #[instrument(
        level = "trace",
        name = "gap_session_update",
        skip(self, batch, counters),
        fields(session_time = batch.session_time, objects = batch.object_count())
    )]
    pub fn update(&mut self, batch: &TelemetryBatch, mut counters: LapCounters) -> LapCounters {
        self.update_session_info(batch.session_id, batch.track_length);

        for (id, &position) in batch.positions.iter().enumerate() {
            let Some(&lap) = batch.lap_numbers.get(id) else {
                continue;
            };
            if !position.is_finite() || position < 0.0 || lap < 0 {
                continue;
            }

            self.initialize_history(id, lap, batch.session_time);

            let previous = counters.get(&id).copied().unwrap_or(lap);
            let last_lap_time = batch.last_lap_time(id);
            if lap > previous && last_lap_time > 0.0 {
                self.complete_lap(id, last_lap_time, batch.session_time);
            }
            counters.insert(id, lap);

            self.add_position_sample(id, position, batch.session_time, lap);
        }

        counters
    }

    /// Create the history for `id` unless it already exists
    pub fn initialize_history(&mut self, id: ObjectId, lap: i32, session_time: f64) {
        self.histories
            .entry(id)
            .or_insert_with(|| ObjectHistory::new(id, lap, session_time));
    }

    /// Forward a position to the sampler; `false` if nothing was recorded
    pub fn add_position_sample(
        &mut self,
        id: ObjectId,
        position: f64,
        session_time: f64,
        lap: i32,
    ) -> bool {
        if !self.config.enabled {
            return false;
        }
        match self.histories.get_mut(&id) {
            Some(history) => record_sample(history, position, session_time, lap, &self.config),
            None => false,
        }
    }

    /// Archive the buffered lap of `id`
    pub fn complete_lap(&mut self, id: ObjectId, lap_time: f64, session_time: f64) -> ArchiveOutcome {
        match self.histories.get_mut(&id) {
            Some(history) => {
                archive_lap(history, lap_time, session_time, self.config.max_lap_history)
            }
            None => ArchiveOutcome::Unknown,
        }
    }

    /// Discard every history
    pub fn clear(&mut self) {
        self.histories.clear();
    }

    /// Record the session identity, wiping history when it changed
    ///
    /// Returns whether a reset happened. The very first identifier only
    /// initializes the session.
    pub fn update_session_info(&mut self, session_id: i64, track_length: f64) -> bool {
        let reset = matches!(self.session_id, Some(previous) if previous != session_id);
        if reset {
            info!(
                previous = ?self.session_id,
                session_id,
                discarded = self.histories.len(),
                "session changed, clearing gap history"
            );
            metrics::counter!("relgap_session_resets_total").increment(1);
            self.histories.clear();
        }
        self.session_id = Some(session_id);
        self.track_length = track_length;
        reset
    }

    /// Merge a partial configuration into the active one
    pub fn update_config(&mut self, update: &GapConfigUpdate) {
        self.config.merge(update);

        if update.max_lap_history.is_some() {
            let cap = self.config.max_lap_history;
            let evicted: usize = self
                .histories
                .values_mut()
                .map(|history| enforce_history_cap(history, cap))
                .sum();
            if evicted > 0 {
                debug!(evicted, max_lap_history = cap, "trimmed lap histories");
            }
        }
    }

    /// Gap of `params.other_id` relative to `params.reference_id`
    pub fn relative_gap(
        &self,
        params: &GapParams,
        reference_est_lap_time: f64,
        other_est_lap_time: f64,
        edge_cases: &EdgeCaseFlags,
    ) -> RelativeGapResult {
        compute_relative_gap(
            self.history(params.reference_id),
            self.history(params.other_id),
            params,
            reference_est_lap_time,
            other_est_lap_time,
            edge_cases,
            self.config.interpolation_method,
        )
    }

    #[inline]
    pub fn history(&self, id: ObjectId) -> Option<&ObjectHistory> {
        self.histories.get(&id)
    }

    #[inline]
    pub fn histories(&self) -> &HashMap<ObjectId, ObjectHistory> {
        &self.histories
    }

    #[inline]
    pub fn config(&self) -> &GapConfig {
        &self.config
    }

    #[inline]
    pub fn session_id(&self) -> Option<i64> {
        self.session_id
    }

    #[inline]
    pub fn track_length(&self) -> f64 {
        self.track_length
    }
}
