//! Instantaneous state of the patch and its rates of change.

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};

/// Lichen biomass and reindeer population at one instant.
///
/// Values are never clamped: the model lets either variable go negative and
/// leaves it to the caller to decide what that means.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    pub vegetation: f64,
    pub population: f64,
}

impl StateVector {
    pub fn new(vegetation: f64, population: f64) -> Self {
        Self {
            vegetation,
            population,
        }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.vegetation.is_finite() && self.population.is_finite()
    }

    /// Largest absolute component.
    #[inline]
    pub fn max_abs(&self) -> f64 {
        self.vegetation.abs().max(self.population.abs())
    }

    #[inline]
    pub fn has_negative(&self) -> bool {
        self.vegetation < 0.0 || self.population < 0.0
    }

    /// Reject a non-finite initial condition before any step runs.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.vegetation.is_finite() {
            return Err(ConfigurationError::NonFinite {
                field: "initial.vegetation",
                value: self.vegetation,
            });
        }
        if !self.population.is_finite() {
            return Err(ConfigurationError::NonFinite {
                field: "initial.population",
                value: self.population,
            });
        }
        Ok(())
    }
}

/// Instantaneous rates of change, consumed by the integrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivativeResult {
    pub d_vegetation: f64,
    pub d_population: f64,
}
