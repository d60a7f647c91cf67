//! Summary statistics over a trajectory.

use crate::model::{Regime, StateVector};
use crate::simulation::Trajectory;
use serde::{Deserialize, Serialize};

/// Min / max / mean of one state variable
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Time at which the maximum was first reached
    pub max_time: f64,
}

impl SeriesStats {
    fn from_points(points: impl Iterator<Item = (f64, f64)>) -> Self {
        let mut stats = Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            mean: 0.0,
            max_time: 0.0,
        };
        let mut sum = 0.0;
        let mut count = 0usize;

        for (time, value) in points {
            stats.min = stats.min.min(value);
            if value > stats.max {
                stats.max = value;
                stats.max_time = time;
            }
            sum += value;
            count += 1;
        }

        if count == 0 {
            return Self::default();
        }
        stats.mean = sum / count as f64;
        stats
    }
}

/// Simulated time spent in each regime
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RegimeOccupancy {
    pub collapse: f64,
    pub recovery: f64,
    pub sustained: f64,
}

impl RegimeOccupancy {
    pub fn get(&self, regime: Regime) -> f64 {
        match regime {
            Regime::Collapse => self.collapse,
            Regime::Recovery => self.recovery,
            Regime::Sustained => self.sustained,
        }
    }

    fn add(&mut self, regime: Regime, duration: f64) {
        match regime {
            Regime::Collapse => self.collapse += duration,
            Regime::Recovery => self.recovery += duration,
            Regime::Sustained => self.sustained += duration,
        }
    }

    pub fn total(&self) -> f64 {
        self.collapse + self.recovery + self.sustained
    }

    /// Regime with the most time, ties going to the higher-vegetation regime.
    pub fn dominant(&self) -> Regime {
        Regime::ALL
            .into_iter()
            .rev()
            .fold(Regime::Sustained, |best, r| if self.get(r) > self.get(best) { r } else { best })
    }
}

/// Statistics for a complete (or partial) trajectory
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryStats {
    /// Number of samples, including t = 0
    pub samples: usize,
    /// Time of the last sample
    pub final_time: f64,
    pub final_state: Option<StateVector>,
    pub final_regime: Option<Regime>,
    pub vegetation: SeriesStats,
    pub population: SeriesStats,
    /// Each step interval is attributed to the regime at its start
    pub occupancy: RegimeOccupancy,
    /// Number of regime changes between consecutive samples
    pub regime_transitions: usize,
    /// First time the lichen dropped into the collapse regime
    pub first_collapse_time: Option<f64>,
    /// First time either variable went below zero
    pub first_negative_time: Option<f64>,
}

impl TrajectoryStats {
    pub fn from_trajectory(trajectory: &Trajectory) -> Self {
        let samples = &trajectory.samples;
        let last = samples.last();

        let mut occupancy = RegimeOccupancy::default();
        let mut regime_transitions = 0;
        for pair in samples.windows(2) {
            occupancy.add(pair[0].regime, pair[1].time - pair[0].time);
            if pair[0].regime != pair[1].regime {
                regime_transitions += 1;
            }
        }

        Self {
            samples: samples.len(),
            final_time: last.map_or(0.0, |s| s.time),
            final_state: last.map(|s| s.state),
            final_regime: last.map(|s| s.regime),
            vegetation: SeriesStats::from_points(samples.iter().map(|s| (s.time, s.state.vegetation))),
            population: SeriesStats::from_points(samples.iter().map(|s| (s.time, s.state.population))),
            occupancy,
            regime_transitions,
            first_collapse_time: samples
                .iter()
                .find(|s| s.regime == Regime::Collapse)
                .map(|s| s.time),
            first_negative_time: samples
                .iter()
                .find(|s| s.state.has_negative())
                .map(|s| s.time),
        }
    }

    /// Save stats to JSON file
    pub fn save_json(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    /// Load stats from JSON file
    pub fn load_json(path: &str) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Format stats as a one-line summary
    pub fn summary(&self) -> String {
        let (v, r) = self
            .final_state
            .map_or((f64::NAN, f64::NAN), |s| (s.vegetation, s.population));
        let regime = self.final_regime.map_or("-", Regime::name);

        format!(
            "T:{:8.2} | V:{:8.2} | R:{:7.2} | Regime:{:9} | Peak R:{:.1} @ {:.1} | Collapse:{:.1} Recovery:{:.1} Sustained:{:.1}",
            self.final_time,
            v,
            r,
            regime,
            self.population.max,
            self.population.max_time,
            self.occupancy.collapse,
            self.occupancy.recovery,
            self.occupancy.sustained,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::Sample;
    use approx::assert_relative_eq;

    fn sample(step: usize, v: f64, r: f64, regime: Regime) -> Sample {
        Sample {
            step,
            time: step as f64,
            state: StateVector::new(v, r),
            regime,
        }
    }

    fn trajectory() -> Trajectory {
        Trajectory {
            dt: 1.0,
            samples: vec![
                sample(0, 400.0, 50.0, Regime::Sustained),
                sample(1, 280.0, 60.0, Regime::Recovery),
                sample(2, 200.0, 55.0, Regime::Collapse),
                sample(3, 250.0, -1.0, Regime::Recovery),
            ],
        }
    }

    #[test]
    fn test_series_stats() {
        let stats = TrajectoryStats::from_trajectory(&trajectory());
        assert_eq!(stats.samples, 4);
        assert_eq!(stats.vegetation.min, 200.0);
        assert_eq!(stats.vegetation.max, 400.0);
        assert_relative_eq!(stats.vegetation.mean, 282.5);
        assert_eq!(stats.population.max, 60.0);
        assert_eq!(stats.population.max_time, 1.0);
    }

    #[test]
    fn test_occupancy_and_transitions() {
        let stats = TrajectoryStats::from_trajectory(&trajectory());
        assert_eq!(stats.occupancy.sustained, 1.0);
        assert_eq!(stats.occupancy.recovery, 1.0);
        assert_eq!(stats.occupancy.collapse, 1.0);
        assert_eq!(stats.occupancy.total(), 3.0);
        assert_eq!(stats.regime_transitions, 3);
        assert_eq!(stats.first_collapse_time, Some(2.0));
        assert_eq!(stats.first_negative_time, Some(3.0));
        assert_eq!(stats.final_regime, Some(Regime::Recovery));
    }

    #[test]
    fn test_dominant_tie_prefers_sustained() {
        let stats = TrajectoryStats::from_trajectory(&trajectory());
        assert_eq!(stats.occupancy.dominant(), Regime::Sustained);

        let occupancy = RegimeOccupancy {
            collapse: 5.0,
            recovery: 1.0,
            sustained: 2.0,
        };
        assert_eq!(occupancy.dominant(), Regime::Collapse);
    }

    #[test]
    fn test_empty_trajectory() {
        let stats = TrajectoryStats::from_trajectory(&Trajectory::default());
        assert_eq!(stats.samples, 0);
        assert_eq!(stats.final_state, None);
        assert_eq!(stats.vegetation, SeriesStats::default());
        assert!(stats.summary().contains("Regime:-"));
    }

    #[test]
    fn test_json_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        let path = path.to_str().unwrap();

        let stats = TrajectoryStats::from_trajectory(&trajectory());
        stats.save_json(path).unwrap();
        assert_eq!(TrajectoryStats::load_json(path).unwrap(), stats);
    }
}
