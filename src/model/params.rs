//! Physical constants and integration settings.
//!
//! [`ModelParams`] and [`IntegrationParams`] are the plain, serializable halves
//! that a configuration file fills in. [`ParameterSet`] is the validated,
//! read-only combination every simulation step works from.

use crate::error::ConfigurationError;
use crate::model::regime::STRESS_FRACTION;
use serde::{Deserialize, Serialize};

/// Relative tolerance when checking that `horizon` is a whole number of steps.
pub const ALIGNMENT_TOLERANCE: f64 = 1e-9;

/// Upper bound on the alignment tolerance, in steps.
pub const MAX_ALIGNMENT_SLACK: f64 = 1e-6;

/// Largest step count a single run may request.
pub const MAX_STEPS: usize = u32::MAX as usize;

/// Physical constants of the grazing model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    /// Lichen regrowth rate
    pub a1: f64,
    /// Lichen background loss rate
    pub a2: f64,
    /// Grazing offtake per reindeer (sustained regime)
    pub b1: f64,
    /// Reindeer mortality under low stress
    pub b2: f64,
    /// Reindeer mortality under high stress
    pub b3: f64,
    /// Conversion of offtake into reindeer growth
    pub kpbr: f64,
    /// Offtake per unit biomass (depleted regime)
    pub c2: f64,
    /// Lichen carrying capacity
    pub vegetation_capacity: f64,
    /// Critical lichen threshold
    pub alpha: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            a1: 0.25,
            a2: 0.05,
            b1: 1.5,
            b2: 0.15,
            b3: 0.35,
            kpbr: 0.018,
            c2: 0.45,
            vegetation_capacity: 1000.0,
            alpha: 300.0,
        }
    }
}

impl ModelParams {
    /// Biomass below which reindeer mortality switches to the high-stress rate.
    #[inline]
    pub fn stress_threshold(&self) -> f64 {
        STRESS_FRACTION * self.alpha
    }

    /// Check the physical constants on their own.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for (field, value) in [
            ("a1", self.a1),
            ("a2", self.a2),
            ("b1", self.b1),
            ("b2", self.b2),
            ("b3", self.b3),
            ("kpbr", self.kpbr),
            ("c2", self.c2),
        ] {
            non_negative(field, value)?;
        }
        positive("vegetation_capacity", self.vegetation_capacity)?;
        positive("alpha", self.alpha)?;
        Ok(())
    }
}

/// Fixed-step integration settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntegrationParams {
    /// Integration step
    pub dt: f64,
    /// Total simulated duration
    pub horizon: f64,
    /// Magnitude above which a state counts as diverged (`None` = only non-finite values)
    #[serde(default = "default_divergence_limit")]
    pub divergence_limit: Option<f64>,
}

fn default_divergence_limit() -> Option<f64> {
    Some(1.0e12)
}

impl Default for IntegrationParams {
    fn default() -> Self {
        Self {
            dt: 0.01,
            horizon: 200.0,
            divergence_limit: default_divergence_limit(),
        }
    }
}

impl IntegrationParams {
    /// Validate and return the number of integration steps.
    pub fn step_count(&self) -> Result<usize, ConfigurationError> {
        positive("dt", self.dt)?;
        positive("horizon", self.horizon)?;
        if let Some(limit) = self.divergence_limit {
            positive("divergence_limit", limit)?;
        }

        let ratio = self.horizon / self.dt;
        if !ratio.is_finite() || ratio > MAX_STEPS as f64 {
            return Err(ConfigurationError::TooManySteps {
                horizon: self.horizon,
                dt: self.dt,
            });
        }

        let rounded = ratio.round();
        let slack = (ALIGNMENT_TOLERANCE * rounded).min(MAX_ALIGNMENT_SLACK);
        if rounded < 1.0 || (ratio - rounded).abs() > slack {
            return Err(ConfigurationError::MisalignedHorizon {
                horizon: self.horizon,
                dt: self.dt,
                ratio,
            });
        }

        Ok(rounded as usize)
    }
}

/// Validated, immutable parameter set shared by every step of a run.
///
/// Fields are private; the only way to obtain one is through
/// [`ParameterSet::new`], so every instance satisfies the model invariants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSet {
    model: ModelParams,
    integration: IntegrationParams,
    steps: usize,
}

impl ParameterSet {
    pub fn new(model: ModelParams, integration: IntegrationParams) -> Result<Self, ConfigurationError> {
        let steps = integration.step_count()?;
        model.validate()?;
        Ok(Self {
            model,
            integration,
            steps,
        })
    }

    /// Same physical constants, different integration settings.
    pub fn with_integration(&self, integration: IntegrationParams) -> Result<Self, ConfigurationError> {
        Self::new(self.model, integration)
    }

    #[inline]
    pub fn model(&self) -> &ModelParams {
        &self.model
    }

    #[inline]
    pub fn integration(&self) -> &IntegrationParams {
        &self.integration
    }

    #[inline]
    pub fn dt(&self) -> f64 {
        self.integration.dt
    }

    #[inline]
    pub fn horizon(&self) -> f64 {
        self.integration.horizon
    }

    #[inline]
    pub fn divergence_limit(&self) -> Option<f64> {
        self.integration.divergence_limit
    }

    /// Number of integration steps (`horizon / dt`).
    #[inline]
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Number of trajectory points, including the initial state.
    #[inline]
    pub fn sample_count(&self) -> usize {
        self.steps + 1
    }

    /// Time of the given step. Computed from the index so it does not drift.
    #[inline]
    pub fn time_at(&self, step: usize) -> f64 {
        step as f64 * self.integration.dt
    }
}

impl Default for ParameterSet {
    fn default() -> Self {
        let integration = IntegrationParams::default();
        Self {
            model: ModelParams::default(),
            steps: (integration.horizon / integration.dt).round() as usize,
            integration,
        }
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if !value.is_finite() {
        return Err(ConfigurationError::NonFinite { field, value });
    }
    if value <= 0.0 {
        return Err(ConfigurationError::NonPositive { field, value });
    }
    Ok(())
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if !value.is_finite() {
        return Err(ConfigurationError::NonFinite { field, value });
    }
    if value < 0.0 {
        return Err(ConfigurationError::Negative { field, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn integration(dt: f64, horizon: f64) -> IntegrationParams {
        IntegrationParams {
            dt,
            horizon,
            ..IntegrationParams::default()
        }
    }

    #[test]
    fn test_default_is_valid() {
        let params = ParameterSet::new(ModelParams::default(), IntegrationParams::default()).unwrap();
        assert_eq!(params, ParameterSet::default());
        assert_eq!(params.steps(), 20_000);
        assert_eq!(params.sample_count(), 20_001);
    }

    #[test]
    fn test_zero_dt_rejected() {
        let err = ParameterSet::new(ModelParams::default(), integration(0.0, 200.0)).unwrap_err();
        assert_eq!(err, ConfigurationError::NonPositive { field: "dt", value: 0.0 });
    }

    #[test]
    fn test_negative_horizon_rejected() {
        let err = ParameterSet::new(ModelParams::default(), integration(0.1, -1.0)).unwrap_err();
        assert!(matches!(err, ConfigurationError::NonPositive { field: "horizon", .. }));
    }

    #[test]
    fn test_negative_alpha_rejected() {
        let model = ModelParams {
            alpha: -5.0,
            ..ModelParams::default()
        };
        let err = ParameterSet::new(model, IntegrationParams::default()).unwrap_err();
        assert_eq!(err, ConfigurationError::NonPositive { field: "alpha", value: -5.0 });
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let model = ModelParams {
            vegetation_capacity: 0.0,
            ..ModelParams::default()
        };
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_negative_rate_rejected() {
        let model = ModelParams {
            kpbr: -0.1,
            ..ModelParams::default()
        };
        let err = model.validate().unwrap_err();
        assert!(matches!(err, ConfigurationError::Negative { field: "kpbr", .. }));
    }

    #[test]
    fn test_zero_rates_allowed() {
        let model = ModelParams {
            a1: 0.0,
            c2: 0.0,
            ..ModelParams::default()
        };
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_nan_rejected() {
        let model = ModelParams {
            b1: f64::NAN,
            ..ModelParams::default()
        };
        assert!(matches!(
            model.validate(),
            Err(ConfigurationError::NonFinite { field: "b1", .. })
        ));
    }

    #[test]
    fn test_misaligned_horizon_rejected() {
        let err = integration(0.3, 1.0).step_count().unwrap_err();
        assert!(matches!(err, ConfigurationError::MisalignedHorizon { .. }));
    }

    #[test]
    fn test_horizon_shorter_than_dt_rejected() {
        assert!(integration(1.0, 0.4).step_count().is_err());
    }

    #[test]
    fn test_rounding_noise_tolerated() {
        // 0.1 has no exact binary form; 3.0 / 0.1 is not exactly 30.
        assert_eq!(integration(0.1, 3.0).step_count().unwrap(), 30);
        assert_eq!(integration(0.01, 200.0).step_count().unwrap(), 20_000);
    }

    #[test]
    fn test_misalignment_caught_at_large_step_counts() {
        let err = integration(1.0, 1e9 + 0.4).step_count().unwrap_err();
        assert!(matches!(err, ConfigurationError::MisalignedHorizon { .. }));

        assert_eq!(integration(1.0, 1e9).step_count().unwrap(), 1_000_000_000);
        assert_eq!(integration(0.5, 1e9).step_count().unwrap(), 2_000_000_000);
    }

    #[test]
    fn test_absurd_step_count_rejected() {
        let err = integration(1e-300, 1e10).step_count().unwrap_err();
        assert!(matches!(err, ConfigurationError::TooManySteps { .. }));
    }

    #[test]
    fn test_divergence_limit_must_be_positive() {
        let params = IntegrationParams {
            divergence_limit: Some(0.0),
            ..IntegrationParams::default()
        };
        assert!(params.step_count().is_err());
    }

    #[test]
    fn test_time_at_is_index_based() {
        let params = ParameterSet::default();
        assert_eq!(params.time_at(0), 0.0);
        assert_eq!(params.time_at(20_000), 20_000.0 * 0.01);
    }

    #[test]
    fn test_stress_threshold() {
        assert_eq!(ModelParams::default().stress_threshold(), 0.8 * 300.0);
    }

    #[test]
    fn test_with_integration_revalidates() {
        let params = ParameterSet::default();
        assert!(params.with_integration(integration(-1.0, 10.0)).is_err());
        let coarse = params.with_integration(integration(0.5, 10.0)).unwrap();
        assert_eq!(coarse.steps(), 20);
        assert_eq!(coarse.model(), params.model());
    }
}
