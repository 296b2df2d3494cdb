//! Command implementations.

mod replay;
mod simulate;
mod validate;

pub use replay::run_replay;
pub use simulate::run_simulate;
pub use validate::run_validate;
