//! Error types for parameter validation and simulation runs.

use thiserror::Error;

/// A parameter set or initial condition that violates the model invariants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("{field} must be > 0 (got {value})")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} must be >= 0 (got {value})")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be finite (got {value})")]
    NonFinite { field: &'static str, value: f64 },

    #[error("horizon {horizon} is not a whole multiple of dt {dt} ({ratio} steps)")]
    MisalignedHorizon { horizon: f64, dt: f64, ratio: f64 },

    #[error("horizon {horizon} / dt {dt} needs more steps than can be stored")]
    TooManySteps { horizon: f64, dt: f64 },
}

/// Failure of a simulation run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error(
        "numerical divergence at step {step} (t = {time}): vegetation = {vegetation}, population = {population}"
    )]
    NumericalDivergence {
        step: usize,
        time: f64,
        vegetation: f64,
        population: f64,
    },

    #[error("run cancelled at step {step} (t = {time})")]
    Cancelled { step: usize, time: f64 },

    #[error("run stopped at step {step} of {steps}")]
    Stopped { step: usize, steps: usize },
}

impl SimulationError {
    /// Step index at which the run stopped, if it got that far.
    pub fn step(&self) -> Option<usize> {
        match self {
            Self::Configuration(_) => None,
            Self::NumericalDivergence { step, .. }
            | Self::Cancelled { step, .. }
            | Self::Stopped { step, .. } => Some(*step),
        }
    }
}
