//! # Gap Engine
//!
//! Time gaps between objects circling a closed track, computed from
//! lap-distance fractions.
//!
//! Responsibilities:
//! - position sampling and lap archiving per object
//! - outlier lap filtering
//! - interpolation on recorded position/time curves
//! - three-tier gap estimation with confidence
//! - session lifecycle (reset on session change)
//!
//! ## Example
//!
//! ```ignore
//! use gap_engine::{GapSession, GapConfig, LapCounters};
//!
//! let mut session = GapSession::new(GapConfig::default());
//! let mut counters = LapCounters::new();
//!
//! for batch in telemetry {
//!     counters = session.update(&batch, counters);
//! }
//!
//! let gap = session.relative_gap(&params, 92.0, 93.5, &EdgeCaseFlags::default());
//! println!("{:+.2}s ({})", gap.time_gap, gap.tier);
//! ```

mod estimator;
mod interpolation;
mod outlier;
mod sampler;
mod session;
mod smoothing;

pub use estimator::{
    class_estimate, compute_relative_gap, detect_edge_cases, simple_distance_gap,
    try_lap_history, try_position_records,
};
pub use interpolation::{
    catmull_rom, find_bracket, interpolate_time, linear_interpolate, median_lap_time,
    normalize_position, position_difference, time_gap_from_samples, Bracket,
    InterpolationResult,
};
pub use outlier::{is_valid_lap, LapTimeStats};
pub use sampler::{archive_lap, enforce_history_cap, record_sample, ArchiveOutcome};
pub use session::GapSession;
pub use smoothing::{GapSmoother, PairKey};

// Re-export contracts types
pub use contracts::{
    EdgeCaseFlags, GapConfig, GapConfigUpdate, GapParams, GapTier, InterpolationMethod,
    LapCounters, LapRecord, ObjectHistory, ObjectId, PositionSample, RelativeGapResult,
    TelemetryBatch, MIN_SAMPLES_PER_LAP,
};
