//! Ingestion counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Ingestion metrics
///
/// Shared between a reader/writer and whoever reports on it.
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Frames decoded from a recording
    pub frames_read: AtomicU64,

    /// Frames encoded into a recording
    pub frames_written: AtomicU64,

    /// Lines that failed to decode
    pub parse_errors: AtomicU64,

    /// Blank lines skipped
    pub blank_lines: AtomicU64,
}

impl IngestionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_read(&self) {
        self.frames_read.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("relgap_frames_read_total").increment(1);
    }

    pub fn record_written(&self) {
        self.frames_written.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("relgap_frames_written_total").increment(1);
    }

    pub fn record_parse_error(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("relgap_frame_parse_errors_total").increment(1);
    }

    pub fn record_blank_line(&self) {
        self.blank_lines.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_read: self.frames_read.load(Ordering::Relaxed),
            frames_written: self.frames_written.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            blank_lines: self.blank_lines.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub frames_read: u64,
    pub frames_written: u64,
    pub parse_errors: u64,
    pub blank_lines: u64,
}
