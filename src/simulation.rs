//! Simulation runner - drives the fixed-count integration loop.
//!
//! Three ways to run the same loop:
//! - [`simulate`]: eager, returns the whole [`Trajectory`] or an error
//! - [`Samples`]: lazy iterator, one [`Sample`] per step, nothing retained
//! - [`Simulation`]: stateful stepping with cooperative cancellation and an
//!   explicit [`IncompleteRun`] when a run stops early

use crate::error::SimulationError;
use crate::integrator::{advance, check_divergence};
use crate::model::{ParameterSet, Regime, StateVector};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::iter::FusedIterator;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Steps between cancellation checks in [`Simulation`].
pub const CANCEL_CHECK_INTERVAL: usize = 1024;

/// One point of a trajectory
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Step index (0 = initial condition)
    pub step: usize,
    /// `step * dt`
    pub time: f64,
    pub state: StateVector,
    /// Regime the state falls in
    pub regime: Regime,
}

/// Ordered time series produced by one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    /// Integration step the samples are spaced by
    pub dt: f64,
    pub samples: Vec<Sample>,
}

impl Trajectory {
    pub fn with_capacity(dt: f64, capacity: usize) -> Self {
        Self {
            dt,
            samples: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    /// Number of points, including the initial state.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of integration steps covered.
    pub fn steps(&self) -> usize {
        self.samples.len().saturating_sub(1)
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn final_state(&self) -> Option<StateVector> {
        self.samples.last().map(|s| s.state)
    }

    /// Simulated time from the first to the last sample.
    pub fn duration(&self) -> f64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => last.time - first.time,
            _ => 0.0,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// `(time, vegetation, population)` triples for plotting collaborators.
    pub fn time_series(&self) -> Vec<(f64, f64, f64)> {
        self.samples
            .iter()
            .map(|s| (s.time, s.state.vegetation, s.state.population))
            .collect()
    }

    /// Get vegetation over time
    pub fn vegetation_series(&self) -> Vec<(f64, f64)> {
        self.samples.iter().map(|s| (s.time, s.state.vegetation)).collect()
    }

    /// Get population over time
    pub fn population_series(&self) -> Vec<(f64, f64)> {
        self.samples.iter().map(|s| (s.time, s.state.population)).collect()
    }

    /// Get regime over time
    pub fn regime_series(&self) -> Vec<(f64, Regime)> {
        self.samples.iter().map(|s| (s.time, s.regime)).collect()
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

/// Per-run stepping state shared by the lazy and stateful runners.
#[derive(Debug, Clone)]
struct Stepper {
    current: StateVector,
    next_step: usize,
    warned_negative: bool,
}

impl Stepper {
    fn new(initial: StateVector) -> Self {
        Self {
            current: initial,
            next_step: 0,
            warned_negative: false,
        }
    }

    /// Produce the next sample. Step 0 is the initial condition itself.
    fn next_sample(&mut self, params: &ParameterSet) -> Result<Sample, SimulationError> {
        let step = self.next_step;
        let state = if step == 0 {
            self.current
        } else {
            advance(&self.current, params)
        };
        let time = params.time_at(step);

        check_divergence(step, time, &state, params.divergence_limit())?;

        if !self.warned_negative && state.has_negative() {
            warn!(
                "State went negative at step {} (t = {:.4}): V = {:.4}, R = {:.4} (not clamped)",
                step, time, state.vegetation, state.population
            );
            self.warned_negative = true;
        }

        self.current = state;
        self.next_step += 1;

        Ok(Sample {
            step,
            time,
            state,
            regime: Regime::classify(state.vegetation, params.model()),
        })
    }
}

/// Lazy sequence of samples from `t = 0` to `t = horizon`.
///
/// Yields `Err` once on divergence and then ends.
pub struct Samples<'a> {
    params: &'a ParameterSet,
    stepper: Stepper,
    finished: bool,
}

impl<'a> Samples<'a> {
    /// The initial state is not validated here; a non-finite one is reported as divergence at step 0.
    pub fn new(params: &'a ParameterSet, initial: StateVector) -> Self {
        Self {
            params,
            stepper: Stepper::new(initial),
            finished: false,
        }
    }

    fn remaining(&self) -> usize {
        if self.finished {
            0
        } else {
            self.params.sample_count().saturating_sub(self.stepper.next_step)
        }
    }
}

impl Iterator for Samples<'_> {
    type Item = Result<Sample, SimulationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining() == 0 {
            return None;
        }

        match self.stepper.next_sample(self.params) {
            Ok(sample) => Some(Ok(sample)),
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining.min(1), Some(remaining))
    }
}

impl FusedIterator for Samples<'_> {}

/// Run the model from `initial` across the configured horizon.
///
/// Returns no trajectory at all if the run diverges.
pub fn simulate(params: &ParameterSet, initial: StateVector) -> Result<Trajectory, SimulationError> {
    initial.validate()?;

    let mut trajectory = Trajectory::with_capacity(params.dt(), params.sample_count());
    for sample in Samples::new(params, initial) {
        trajectory.push(sample?);
    }

    debug!(
        "Simulated {} steps (dt = {}, horizon = {})",
        params.steps(),
        params.dt(),
        params.horizon()
    );
    Ok(trajectory)
}

/// Shared flag for stopping a long run from another thread
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A run that stopped before reaching the horizon, with what it produced so far.
#[derive(Debug, Clone, Error)]
#[error("incomplete run ({} samples): {reason}", .trajectory.len())]
pub struct IncompleteRun {
    pub trajectory: Trajectory,
    pub reason: SimulationError,
}

/// Stateful runner that keeps the trajectory as it goes.
pub struct Simulation {
    params: ParameterSet,
    stepper: Stepper,
    trajectory: Trajectory,
    cancel: Option<CancelToken>,
    failure: Option<SimulationError>,
}

impl Simulation {
    /// Validate the initial condition and record it as sample 0.
    pub fn new(params: ParameterSet, initial: StateVector) -> Result<Self, SimulationError> {
        initial.validate()?;

        let mut stepper = Stepper::new(initial);
        let first = stepper.next_sample(&params)?;
        let mut trajectory = Trajectory::with_capacity(params.dt(), params.sample_count());
        trajectory.push(first);

        Ok(Self {
            params,
            stepper,
            trajectory,
            cancel: None,
            failure: None,
        })
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    /// Index of the most recent sample.
    pub fn current_step(&self) -> usize {
        self.stepper.next_step - 1
    }

    pub fn current_state(&self) -> StateVector {
        self.stepper.current
    }

    pub fn time(&self) -> f64 {
        self.params.time_at(self.current_step())
    }

    pub fn is_complete(&self) -> bool {
        self.current_step() >= self.params.steps()
    }

    /// Fraction of the horizon covered, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        self.current_step() as f64 / self.params.steps() as f64
    }

    pub fn failure(&self) -> Option<&SimulationError> {
        self.failure.as_ref()
    }

    /// Advance one step. `Ok(None)` once the horizon is reached.
    pub fn step(&mut self) -> Result<Option<Sample>, SimulationError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        if self.is_complete() {
            return Ok(None);
        }

        let step = self.current_step();
        if step % CANCEL_CHECK_INTERVAL == 0 && self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            let time = self.time();
            return Err(self.fail(SimulationError::Cancelled { step, time }));
        }

        match self.stepper.next_sample(&self.params) {
            Ok(sample) => {
                self.trajectory.push(sample);
                Ok(Some(sample))
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Advance up to `max_steps` steps; returns how many were taken.
    pub fn run_steps(&mut self, max_steps: usize) -> Result<usize, SimulationError> {
        let mut taken = 0;
        while taken < max_steps {
            match self.step()? {
                Some(_) => taken += 1,
                None => break,
            }
        }
        Ok(taken)
    }

    /// Advance to the horizon.
    pub fn run(&mut self) -> Result<(), SimulationError> {
        self.run_steps(usize::MAX)?;
        debug!("Run complete at t = {}", self.time());
        Ok(())
    }

    /// Hand over the trajectory; anything short of the horizon comes back as [`IncompleteRun`].
    pub fn finish(self) -> Result<Trajectory, IncompleteRun> {
        let complete = self.is_complete();
        let step = self.current_step();
        let steps = self.params.steps();

        let reason = match self.failure {
            Some(err) => err,
            None if complete => return Ok(self.trajectory),
            None => SimulationError::Stopped { step, steps },
        };

        Err(IncompleteRun {
            trajectory: self.trajectory,
            reason,
        })
    }

    fn fail(&mut self, err: SimulationError) -> SimulationError {
        warn!("Simulation stopped: {}", err);
        self.failure = Some(err.clone());
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IntegrationParams, ModelParams};
    use approx::assert_relative_eq;

    fn params(dt: f64, horizon: f64) -> ParameterSet {
        let integration = IntegrationParams {
            dt,
            horizon,
            ..IntegrationParams::default()
        };
        ParameterSet::new(ModelParams::default(), integration).unwrap()
    }

    fn scenario_a() -> StateVector {
        StateVector::new(800.0, 50.0)
    }

    #[test]
    fn test_first_sample_is_initial_state() {
        let traj = simulate(&params(0.01, 1.0), scenario_a()).unwrap();
        let first = traj.first().unwrap();
        assert_eq!(first.step, 0);
        assert_eq!(first.time, 0.0);
        assert_eq!(first.state, scenario_a());
        assert_eq!(first.regime, Regime::Sustained);
    }

    #[test]
    fn test_sample_count_and_times() {
        let p = params(0.5, 10.0);
        let traj = simulate(&p, scenario_a()).unwrap();
        assert_eq!(traj.len(), 21);
        assert_eq!(traj.steps(), 20);
        for (i, sample) in traj.iter().enumerate() {
            assert_eq!(sample.step, i);
            assert_eq!(sample.time, i as f64 * 0.5);
        }
        assert_relative_eq!(traj.duration(), 10.0);
    }

    #[test]
    fn test_one_step_scenario_a() {
        let traj = simulate(&params(0.01, 0.01), scenario_a()).unwrap();
        assert_eq!(traj.len(), 2);
        let next = traj.final_state().unwrap();
        assert_relative_eq!(next.vegetation, 799.25, epsilon = 1e-9);
        assert_relative_eq!(next.population, 49.9385, epsilon = 1e-9);
    }

    #[test]
    fn test_non_finite_initial_state_rejected() {
        let err = simulate(&params(0.01, 1.0), StateVector::new(f64::NAN, 50.0)).unwrap_err();
        assert!(matches!(err, SimulationError::Configuration(_)));
    }

    #[test]
    fn test_lazy_matches_eager() {
        let p = params(0.1, 50.0);
        let eager = simulate(&p, scenario_a()).unwrap();
        let lazy: Vec<Sample> = Samples::new(&p, scenario_a()).collect::<Result<_, _>>().unwrap();
        assert_eq!(eager.samples, lazy);
    }

    #[test]
    fn test_samples_size_hint() {
        let p = params(1.0, 5.0);
        let mut samples = Samples::new(&p, scenario_a());
        assert_eq!(samples.size_hint(), (1, Some(6)));
        samples.next();
        assert_eq!(samples.size_hint(), (1, Some(5)));
    }

    #[test]
    fn test_samples_fused_after_divergence() {
        let p = params(1000.0, 100_000.0);
        let mut samples = Samples::new(&p, scenario_a());
        let err = samples.by_ref().find_map(Result::err);
        assert!(matches!(err, Some(SimulationError::NumericalDivergence { .. })));
        assert!(samples.next().is_none());
    }

    #[test]
    fn test_stateful_run_matches_simulate() {
        let p = params(0.1, 20.0);
        let mut sim = Simulation::new(p.clone(), scenario_a()).unwrap();
        sim.run().unwrap();
        assert!(sim.is_complete());
        assert_eq!(sim.progress(), 1.0);
        assert_eq!(sim.step().unwrap(), None);

        let traj = sim.finish().unwrap();
        assert_eq!(traj, simulate(&p, scenario_a()).unwrap());
    }

    #[test]
    fn test_run_steps_partial() {
        let mut sim = Simulation::new(params(0.1, 20.0), scenario_a()).unwrap();
        assert_eq!(sim.run_steps(15).unwrap(), 15);
        assert_eq!(sim.current_step(), 15);
        assert_relative_eq!(sim.time(), 1.5);
        assert_eq!(sim.trajectory().len(), 16);
    }

    #[test]
    fn test_unfinished_run_is_marked_incomplete() {
        let mut sim = Simulation::new(params(0.1, 20.0), scenario_a()).unwrap();
        sim.run_steps(5).unwrap();

        let incomplete = sim.finish().unwrap_err();
        assert_eq!(incomplete.trajectory.len(), 6);
        assert_eq!(incomplete.reason, SimulationError::Stopped { step: 5, steps: 200 });
    }

    #[test]
    fn test_cancel_before_start() {
        let token = CancelToken::new();
        token.cancel();

        let mut sim = Simulation::new(params(0.01, 200.0), scenario_a())
            .unwrap()
            .with_cancel_token(token);
        let err = sim.run().unwrap_err();
        assert_eq!(err, SimulationError::Cancelled { step: 0, time: 0.0 });

        let incomplete = sim.finish().unwrap_err();
        assert_eq!(incomplete.trajectory.len(), 1);
    }

    #[test]
    fn test_cancel_checked_at_interval() {
        let token = CancelToken::new();
        let mut sim = Simulation::new(params(0.01, 200.0), scenario_a())
            .unwrap()
            .with_cancel_token(token.clone());

        sim.run_steps(10).unwrap();
        token.cancel();

        let err = sim.run().unwrap_err();
        assert_eq!(err.step(), Some(CANCEL_CHECK_INTERVAL));
        // Failure is sticky.
        assert_eq!(sim.step().unwrap_err(), err);
        assert_eq!(sim.trajectory().len(), CANCEL_CHECK_INTERVAL + 1);
    }

    #[test]
    fn test_divergence_recorded_by_stateful_runner() {
        let mut sim = Simulation::new(params(1000.0, 100_000.0), scenario_a()).unwrap();
        let err = sim.run().unwrap_err();
        assert!(matches!(err, SimulationError::NumericalDivergence { .. }));
        assert!(sim.failure().is_some());

        let incomplete = sim.finish().unwrap_err();
        assert!(incomplete.trajectory.iter().all(|s| s.state.is_finite()));
        assert!(incomplete.to_string().starts_with("incomplete run"));
    }

    #[test]
    fn test_series_accessors() {
        let traj = simulate(&params(1.0, 3.0), scenario_a()).unwrap();
        assert_eq!(traj.time_series().len(), 4);
        assert_eq!(traj.vegetation_series()[0], (0.0, 800.0));
        assert_eq!(traj.population_series()[0], (0.0, 50.0));
        assert_eq!(traj.regime_series()[0], (0.0, Regime::Sustained));
    }
}
