//! # tundra
//!
//! Lichen/reindeer grazing dynamics on a single homogeneous patch.
//!
//! ## Features
//!
//! - **Piecewise dynamics**: logistic lichen regrowth, grazing offtake and
//!   reindeer mortality switch between Collapse / Recovery / Sustained regimes
//! - **Fixed-step Euler**: deterministic, bit-reproducible trajectories
//! - **Divergence detection**: non-finite or runaway states stop the run
//! - **Configurable**: YAML configuration files
//! - **Parallel sweeps**: independent runs spread over all cores via Rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use tundra::{simulate, Config};
//!
//! let config = Config::default();
//! let params = config.parameters().unwrap();
//!
//! let trajectory = simulate(&params, config.initial_state()).unwrap();
//!
//! assert_eq!(trajectory.len(), params.sample_count());
//! println!("Final state: {:?}", trajectory.final_state());
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use tundra::Config;
//!
//! let mut config = Config::default();
//! config.model.alpha = 250.0;
//! config.integration.dt = 0.05;
//! assert!(config.validate().is_ok());
//! ```
//!
//! ## Stepping with cancellation
//!
//! ```rust
//! use tundra::{CancelToken, Config, Simulation};
//!
//! let config = Config::default();
//! let token = CancelToken::new();
//! let mut sim = Simulation::new(config.parameters().unwrap(), config.initial_state())
//!     .unwrap()
//!     .with_cancel_token(token.clone());
//!
//! sim.run_steps(100).unwrap();
//! token.cancel();
//! assert!(sim.run().is_err());
//!
//! let incomplete = sim.finish().unwrap_err();
//! println!("Stopped early: {}", incomplete.reason);
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod integrator;
pub mod model;
pub mod simulation;
pub mod stats;

// Re-export main types
pub use config::Config;
pub use error::{ConfigurationError, SimulationError};
pub use model::{DerivativeResult, ParameterSet, Regime, StateVector};
pub use simulation::{simulate, CancelToken, IncompleteRun, Sample, Samples, Simulation, Trajectory};
pub use stats::TrajectoryStats;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Time repeated runs of the default model at the given resolution
pub fn benchmark(horizon: f64, dt: f64, repeats: usize) -> Result<BenchmarkResult, SimulationError> {
    use std::time::Instant;

    let config = Config::default();
    let params = config.parameters()?.with_integration(model::IntegrationParams {
        horizon,
        dt,
        ..config.integration
    })?;
    let repeats = repeats.max(1);

    let start = Instant::now();
    let mut final_state = config.initial_state();
    for _ in 0..repeats {
        let trajectory = simulate(&params, config.initial_state())?;
        if let Some(state) = trajectory.final_state() {
            final_state = state;
        }
    }
    let elapsed = start.elapsed().as_secs_f64();
    let total_steps = params.steps() * repeats;

    Ok(BenchmarkResult {
        steps: params.steps(),
        repeats,
        final_state,
        elapsed_secs: elapsed,
        steps_per_second: total_steps as f64 / elapsed.max(f64::EPSILON),
    })
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub steps: usize,
    pub repeats: usize,
    pub final_state: StateVector,
    pub elapsed_secs: f64,
    pub steps_per_second: f64,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Benchmark Results ===")?;
        writeln!(f, "Steps per run: {}", self.steps)?;
        writeln!(f, "Runs: {}", self.repeats)?;
        writeln!(
            f,
            "Final state: V = {:.3}, R = {:.3}",
            self.final_state.vegetation, self.final_state.population
        )?;
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "Speed: {:.0} steps/s", self.steps_per_second)?;
        Ok(())
    }
}
