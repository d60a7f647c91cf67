//! Analysis module for data export and parameter sweeps.

pub mod export;
pub mod sweep;

pub use export::ExportSystem;
pub use sweep::{run_sweep, SweepParameter, SweepPoint, SweepSpec};
