//! Parameter sweeps - many independent runs over one varied parameter.
//!
//! Each run owns its own `ParameterSet`, so the batch is spread over the
//! rayon thread pool while every individual run stays sequential.

use crate::config::Config;
use crate::error::SimulationError;
use crate::simulation::simulate;
use crate::stats::TrajectoryStats;
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A configuration value a sweep can vary
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepParameter {
    A1,
    A2,
    B1,
    B2,
    B3,
    Kpbr,
    C2,
    VegetationCapacity,
    Alpha,
    InitialVegetation,
    InitialPopulation,
}

impl SweepParameter {
    pub const ALL: [SweepParameter; 11] = [
        SweepParameter::A1,
        SweepParameter::A2,
        SweepParameter::B1,
        SweepParameter::B2,
        SweepParameter::B3,
        SweepParameter::Kpbr,
        SweepParameter::C2,
        SweepParameter::VegetationCapacity,
        SweepParameter::Alpha,
        SweepParameter::InitialVegetation,
        SweepParameter::InitialPopulation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SweepParameter::A1 => "a1",
            SweepParameter::A2 => "a2",
            SweepParameter::B1 => "b1",
            SweepParameter::B2 => "b2",
            SweepParameter::B3 => "b3",
            SweepParameter::Kpbr => "kpbr",
            SweepParameter::C2 => "c2",
            SweepParameter::VegetationCapacity => "vegetation_capacity",
            SweepParameter::Alpha => "alpha",
            SweepParameter::InitialVegetation => "initial_vegetation",
            SweepParameter::InitialPopulation => "initial_population",
        }
    }

    /// Copy of `base` with this parameter set to `value`.
    pub fn apply(self, base: &Config, value: f64) -> Config {
        let mut config = base.clone();
        let slot = match self {
            SweepParameter::A1 => &mut config.model.a1,
            SweepParameter::A2 => &mut config.model.a2,
            SweepParameter::B1 => &mut config.model.b1,
            SweepParameter::B2 => &mut config.model.b2,
            SweepParameter::B3 => &mut config.model.b3,
            SweepParameter::Kpbr => &mut config.model.kpbr,
            SweepParameter::C2 => &mut config.model.c2,
            SweepParameter::VegetationCapacity => &mut config.model.vegetation_capacity,
            SweepParameter::Alpha => &mut config.model.alpha,
            SweepParameter::InitialVegetation => &mut config.initial.vegetation,
            SweepParameter::InitialPopulation => &mut config.initial.population,
        };
        *slot = value;
        config
    }
}

impl fmt::Display for SweepParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SweepParameter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<_> = Self::ALL.iter().map(|p| p.name()).collect();
                format!("unknown parameter '{}', expected one of: {}", s, names.join(", "))
            })
    }
}

/// Evenly spaced values of one parameter, endpoints included
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweepSpec {
    pub parameter: SweepParameter,
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

impl SweepSpec {
    pub fn values(&self) -> Vec<f64> {
        match self.count {
            0 => Vec::new(),
            1 => vec![self.start],
            n => {
                let span = self.end - self.start;
                (0..n)
                    .map(|i| self.start + span * i as f64 / (n - 1) as f64)
                    .collect()
            }
        }
    }
}

/// Result of one run in a sweep
#[derive(Clone, Debug, PartialEq)]
pub struct SweepPoint {
    pub value: f64,
    pub outcome: Result<TrajectoryStats, SimulationError>,
}

/// Run one configuration to completion and summarise it.
pub fn run_point(config: &Config) -> Result<TrajectoryStats, SimulationError> {
    let params = config.parameters()?;
    let trajectory = simulate(&params, config.initial_state())?;
    Ok(TrajectoryStats::from_trajectory(&trajectory))
}

/// Run every point of `spec` in parallel. Results come back in the order of `spec.values()`.
pub fn run_sweep(base: &Config, spec: &SweepSpec) -> Vec<SweepPoint> {
    let values = spec.values();
    info!(
        "Sweeping {} over {} values in [{}, {}]",
        spec.parameter,
        values.len(),
        spec.start,
        spec.end
    );

    let points: Vec<SweepPoint> = values
        .par_iter()
        .map(|&value| SweepPoint {
            value,
            outcome: run_point(&spec.parameter.apply(base, value)),
        })
        .collect();

    let failed = points.iter().filter(|p| p.outcome.is_err()).count();
    info!("Sweep finished: {} ok, {} failed", points.len() - failed, failed);
    points
}
