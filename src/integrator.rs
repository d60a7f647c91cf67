//! Explicit Euler integration and the divergence policy applied after each step.

use crate::error::SimulationError;
use crate::model::{evaluate, DerivativeResult, ParameterSet, StateVector};

/// First-order explicit Euler update: `state + rate * dt`.
#[inline]
pub fn euler_step(state: &StateVector, rates: &DerivativeResult, dt: f64) -> StateVector {
    StateVector {
        vegetation: state.vegetation + rates.d_vegetation * dt,
        population: state.population + rates.d_population * dt,
    }
}

/// Evaluate the dynamics at `state` and take one Euler step of `params.dt()`.
#[inline]
pub fn advance(state: &StateVector, params: &ParameterSet) -> StateVector {
    euler_step(state, &evaluate(state, params), params.dt())
}

/// Reject a state that is non-finite or, when a limit is set, larger in magnitude than the limit.
pub fn check_divergence(
    step: usize,
    time: f64,
    state: &StateVector,
    limit: Option<f64>,
) -> Result<(), SimulationError> {
    let diverged = !state.is_finite() || limit.is_some_and(|limit| state.max_abs() > limit);

    if diverged {
        return Err(SimulationError::NumericalDivergence {
            step,
            time,
            vegetation: state.vegetation,
            population: state.population,
        });
    }
    Ok(())
}
