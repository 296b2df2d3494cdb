//! # Ingestion
//!
//! Telemetry input for the gap engine.
//!
//! Responsibilities:
//! - Read and write JSON Lines telemetry recordings (`TelemetryFrame`)
//! - Generate deterministic synthetic sessions (`MockTelemetrySource`)
//! - Parse session metadata such as track length
//!
//! ## Replay
//!
//! ```ignore
//! use ingestion::TelemetryReplay;
//!
//! for frame in TelemetryReplay::open(path)? {
//!     let frame = frame?;
//!     counters = session.update(&frame.batch, counters);
//! }
//! ```
//!
//! ## Mock Testing
//!
//! ```ignore
//! use ingestion::{MockTelemetryConfig, MockTelemetrySource};
//!
//! let source = MockTelemetrySource::new(MockTelemetryConfig { cars: 8, ..Default::default() });
//! for frame in source {
//!     recorder.record(&frame)?;
//! }
//! ```

mod counters;
mod frame;
mod mock;
mod replay;
mod track;

// Re-exports
pub use contracts::TelemetryBatch;
pub use counters::{IngestionMetrics, MetricsSnapshot};
pub use frame::TelemetryFrame;
pub use mock::{MockTelemetryConfig, MockTelemetrySource};
pub use replay::{TelemetryRecorder, TelemetryReplay};
pub use track::parse_track_length;
