//! Headless long-horizon runner for throughput measurements

use std::env;
use std::time::{Duration, Instant};

use tundra::config::Config;
use tundra::{Simulation, TrajectoryStats};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();

    let horizon: f64 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(10_000.0);

    let dt: f64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(0.01);

    log::info!("=== tundra Benchmark ===");
    log::info!("Horizon: {}", horizon);
    log::info!("dt: {}", dt);

    // Load and modify config
    let mut config = Config::load_or_default("config.yaml")?;
    config.integration.horizon = horizon;
    config.integration.dt = dt;

    let params = config.parameters()?;
    let steps = params.steps();
    let mut sim = Simulation::new(params, config.initial_state())?;

    let start = Instant::now();
    let mut last_report = Instant::now();
    let report_interval = Duration::from_secs(10);

    while !sim.is_complete() {
        // The failure is kept by the runner and reported by finish()
        if sim.run_steps(10_000).is_err() {
            break;
        }

        // Progress report every 10 seconds
        if last_report.elapsed() >= report_interval {
            let elapsed = start.elapsed().as_secs_f64();
            let steps_per_sec = sim.current_step() as f64 / elapsed;
            let eta_secs = (steps - sim.current_step()) as f64 / steps_per_sec;

            log::info!(
                "Step {}/{} ({:.1}%) - V: {:.2} - R: {:.2} - {:.0} steps/s - ETA: {:.0}s",
                sim.current_step(),
                steps,
                sim.progress() * 100.0,
                sim.current_state().vegetation,
                sim.current_state().population,
                steps_per_sec,
                eta_secs
            );
            last_report = Instant::now();
        }
    }

    let elapsed = start.elapsed();
    let completed = sim.current_step();
    let trajectory = sim.finish().map_err(|incomplete| {
        log::error!("{}", incomplete);
        incomplete.reason
    })?;

    log::info!("=== Simulation Complete ===");
    log::info!("Total steps: {}", completed);
    log::info!("Elapsed time: {:.2}s", elapsed.as_secs_f64());
    log::info!("Average speed: {:.0} steps/s", completed as f64 / elapsed.as_secs_f64());
    log::info!("{}", TrajectoryStats::from_trajectory(&trajectory).summary());

    Ok(())
}
