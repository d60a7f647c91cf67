//! Grazing model for a single lichen/reindeer patch.
//!
//! This module contains:
//! - Parameter set (physical constants + integration settings, validated once)
//! - State vector (vegetation biomass, reindeer population)
//! - Regime classification (Collapse / Recovery / Sustained)
//! - Dynamics evaluation (instantaneous rates of change)

pub mod dynamics;
pub mod params;
pub mod regime;
pub mod state;

pub use dynamics::{evaluate, Fluxes};
pub use params::{IntegrationParams, ModelParams, ParameterSet};
pub use regime::{Regime, Stress, Sufficiency, STRESS_FRACTION};
pub use state::{DerivativeResult, StateVector};
