//! Regime classification - which formulas apply at a given biomass level.

use crate::model::params::ModelParams;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fraction of `alpha` below which reindeer suffer high-stress mortality.
pub const STRESS_FRACTION: f64 = 0.8;

/// Whether there is enough lichen for grazing to feed population growth
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sufficiency {
    /// `V >= alpha`: offtake scales with herd size, herd grows
    Sustained,
    /// `V < alpha`: offtake scales with remaining lichen, no growth
    Depleted,
}

/// Which mortality rate applies
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stress {
    /// `V >= 0.8 * alpha`
    Low,
    /// `V < 0.8 * alpha`
    High,
}

/// Composite regime, ordered by increasing vegetation level.
///
/// Both thresholds are inclusive on the upper side, so `V == alpha` is
/// `Sustained` and `V == 0.8 * alpha` is `Recovery`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Regime {
    /// Depleted grazing, high-stress mortality
    Collapse,
    /// Depleted grazing, low-stress mortality
    Recovery,
    /// Sustained grazing, low-stress mortality
    Sustained,
}

impl Regime {
    pub const ALL: [Regime; 3] = [Regime::Collapse, Regime::Recovery, Regime::Sustained];

    /// Classify a vegetation level. NaN falls through every comparison and lands in `Collapse`.
    pub fn classify(vegetation: f64, params: &ModelParams) -> Self {
        let sufficient = vegetation >= params.alpha;
        let low_stress = vegetation >= params.stress_threshold();

        match (sufficient, low_stress) {
            (true, _) => Regime::Sustained,
            (false, true) => Regime::Recovery,
            (false, false) => Regime::Collapse,
        }
    }

    pub fn sufficiency(self) -> Sufficiency {
        match self {
            Regime::Sustained => Sufficiency::Sustained,
            Regime::Recovery | Regime::Collapse => Sufficiency::Depleted,
        }
    }

    pub fn stress(self) -> Stress {
        match self {
            Regime::Collapse => Stress::High,
            Regime::Recovery | Regime::Sustained => Stress::Low,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Regime::Collapse => "collapse",
            Regime::Recovery => "recovery",
            Regime::Sustained => "sustained",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
