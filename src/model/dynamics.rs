//! Instantaneous rates of change for the lichen/reindeer system.

use crate::model::params::{ModelParams, ParameterSet};
use crate::model::regime::{Regime, Stress, Sufficiency};
use crate::model::state::{DerivativeResult, StateVector};

/// Individual flux terms at one state, tagged with the regime that selected them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fluxes {
    pub regime: Regime,
    /// Logistic lichen regrowth (`Rv`); negative above carrying capacity
    pub regrowth: f64,
    /// Density-proportional lichen loss (`Mv`)
    pub background_loss: f64,
    /// Grazing offtake (`Dv`)
    pub offtake: f64,
    /// Reindeer growth fed by offtake (`Rr`)
    pub population_growth: f64,
    /// Reindeer mortality (`Mr`)
    pub mortality: f64,
}

impl Fluxes {
    /// Compute every flux term for `state`.
    pub fn compute(state: &StateVector, params: &ModelParams) -> Self {
        let v = state.vegetation;
        let r = state.population;
        let regime = Regime::classify(v, params);

        let regrowth = params.a1 * (1.0 - v / params.vegetation_capacity) * v;
        let background_loss = params.a2 * v;

        let (offtake, population_growth) = match regime.sufficiency() {
            Sufficiency::Sustained => {
                let offtake = params.b1 * r;
                (offtake, offtake * params.kpbr)
            }
            Sufficiency::Depleted => (v * params.c2, 0.0),
        };

        let mortality = match regime.stress() {
            Stress::Low => r * params.b2,
            Stress::High => r * params.b3,
        };

        Self {
            regime,
            regrowth,
            background_loss,
            offtake,
            population_growth,
            mortality,
        }
    }

    #[inline]
    pub fn derivative(&self) -> DerivativeResult {
        DerivativeResult {
            d_vegetation: self.regrowth - self.background_loss - self.offtake,
            d_population: self.population_growth - self.mortality,
        }
    }
}

/// Rates of change at `state`. Pure and deterministic.
#[inline]
pub fn evaluate(state: &StateVector, params: &ParameterSet) -> DerivativeResult {
    Fluxes::compute(state, params.model()).derivative()
}
