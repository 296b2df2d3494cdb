//! Replay pipeline module.

mod replayer;
mod stats;

pub use replayer::{ReplayConfig, Replayer, ReportFormat};
pub use stats::ReplayStats;
