//! Data export system for analysis in external tools.

use crate::analysis::sweep::{SweepParameter, SweepPoint};
use crate::simulation::Trajectory;
use crate::stats::TrajectoryStats;
use std::fs::File;
use std::io::{BufWriter, Result, Write};
use std::path::Path;

/// Export system for saving simulation data
pub struct ExportSystem;

impl ExportSystem {
    /// Write a trajectory as CSV, one row per sample.
    pub fn write_trajectory_csv<W: Write>(trajectory: &Trajectory, mut out: W) -> Result<()> {
        writeln!(out, "step,time,vegetation,population,regime")?;

        for sample in trajectory {
            writeln!(
                out,
                "{},{},{},{},{}",
                sample.step,
                sample.time,
                sample.state.vegetation,
                sample.state.population,
                sample.regime,
            )?;
        }

        Ok(())
    }

    /// Export a trajectory to CSV
    pub fn export_trajectory_csv<P: AsRef<Path>>(trajectory: &Trajectory, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        Self::write_trajectory_csv(trajectory, &mut writer)?;
        writer.flush()
    }

    /// Export a trajectory to JSON
    pub fn export_trajectory_json<P: AsRef<Path>>(trajectory: &Trajectory, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, trajectory)?;
        writer.flush()
    }

    /// Export trajectory statistics to JSON
    pub fn export_stats_json<P: AsRef<Path>>(stats: &TrajectoryStats, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(stats)?;
        std::fs::write(path, json)
    }

    /// Write sweep results as CSV, one row per point.
    pub fn write_sweep_csv<W: Write>(
        points: &[SweepPoint],
        parameter: SweepParameter,
        mut out: W,
    ) -> Result<()> {
        writeln!(
            out,
            "{},status,final_vegetation,final_population,min_vegetation,max_population,collapse_time,recovery_time,sustained_time,first_collapse_time,error",
            parameter
        )?;

        for point in points {
            match &point.outcome {
                Ok(stats) => {
                    let (v, r) = stats
                        .final_state
                        .map_or((f64::NAN, f64::NAN), |s| (s.vegetation, s.population));
                    let first_collapse = stats
                        .first_collapse_time
                        .map_or(String::new(), |t| t.to_string());
                    writeln!(
                        out,
                        "{},ok,{},{},{},{},{},{},{},{},",
                        point.value,
                        v,
                        r,
                        stats.vegetation.min,
                        stats.population.max,
                        stats.occupancy.collapse,
                        stats.occupancy.recovery,
                        stats.occupancy.sustained,
                        first_collapse,
                    )?;
                }
                Err(err) => {
                    writeln!(
                        out,
                        "{},failed,,,,,,,,,\"{}\"",
                        point.value,
                        err.to_string().replace('"', "'")
                    )?;
                }
            }
        }

        Ok(())
    }

    /// Export sweep results to CSV
    pub fn export_sweep_csv<P: AsRef<Path>>(
        points: &[SweepPoint],
        parameter: SweepParameter,
        path: P,
    ) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        Self::write_sweep_csv(points, parameter, &mut writer)?;
        writer.flush()
    }
}
