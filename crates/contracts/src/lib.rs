//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Position Model
//! - Positions are lap-distance fractions in `[0, 1)`, wrapping at start/finish
//! - Times are seconds (f64); sample times are relative to the lap start
//! - Objects (cars) are identified by their telemetry array index

mod config;
mod error;
mod gap;
mod sample;
mod telemetry;

pub use config::*;
pub use error::*;
pub use gap::*;
pub use sample::*;
pub use telemetry::*;
