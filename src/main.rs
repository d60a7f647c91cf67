//! tundra - CLI Entry Point
//!
//! Lichen/reindeer grazing dynamics.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use tundra::analysis::{run_sweep, ExportSystem, SweepParameter, SweepSpec};
use tundra::model::Fluxes;
use tundra::{benchmark, Config, Regime, Simulation, StateVector, TrajectoryStats};

#[derive(Parser)]
#[command(name = "tundra")]
#[command(version)]
#[command(about = "Lichen/reindeer grazing dynamics with threshold-dependent regimes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation and export the trajectory
    Run {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Also write the trajectory as JSON
        #[arg(long)]
        json: bool,

        /// Quiet mode (minimal output)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Run many independent simulations over one parameter
    Sweep {
        /// Configuration file (YAML) used as the base for every run
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Parameter to vary (a1, a2, b1, b2, b3, kpbr, c2, vegetation_capacity, alpha, initial_vegetation, initial_population)
        #[arg(short, long)]
        parameter: SweepParameter,

        /// First value
        #[arg(long)]
        from: f64,

        /// Last value
        #[arg(long)]
        to: f64,

        /// Number of values, endpoints included
        #[arg(short = 'n', long, default_value = "11")]
        count: usize,

        /// Output CSV file
        #[arg(short, long, default_value = "sweep.csv")]
        output: PathBuf,
    },

    /// Run performance benchmark
    Benchmark {
        /// Simulated horizon
        #[arg(long, default_value = "200")]
        horizon: f64,

        /// Integration step
        #[arg(long, default_value = "0.01")]
        dt: f64,

        /// Number of runs
        #[arg(short, long, default_value = "10")]
        repeats: usize,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },

    /// Show the regime and rates for one state
    Regime {
        /// Lichen biomass
        vegetation: f64,

        /// Reindeer population
        #[arg(default_value = "50")]
        population: f64,

        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,
    },
}

impl Commands {
    fn config_path(&self) -> Option<&Path> {
        match self {
            Commands::Run { config, .. }
            | Commands::Sweep { config, .. }
            | Commands::Regime { config, .. } => Some(config.as_path()),
            Commands::Benchmark { .. } | Commands::Init { .. } => None,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over the config file's level
    let log_level = cli
        .command
        .config_path()
        .filter(|path| path.exists())
        .and_then(|path| Config::from_file(path).ok())
        .map_or_else(|| "info".to_string(), |config| config.logging.log_level);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Run {
            config,
            output,
            json,
            quiet,
        } => run_simulation(config, output, json, quiet),

        Commands::Sweep {
            config,
            parameter,
            from,
            to,
            count,
            output,
        } => run_parameter_sweep(config, parameter, from, to, count, output),

        Commands::Benchmark {
            horizon,
            dt,
            repeats,
        } => run_benchmark(horizon, dt, repeats),

        Commands::Init { output } => generate_config(output),

        Commands::Regime {
            vegetation,
            population,
            config,
        } => show_regime(vegetation, population, config),
    }
}

fn load_config(config_path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    if config_path.exists() {
        log::info!("Loading config from: {:?}", config_path);
    } else {
        log::info!("Using default configuration");
    }
    Config::load_or_default(config_path)
}

fn run_simulation(
    config_path: PathBuf,
    output: PathBuf,
    json: bool,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&config_path)?;
    let params = config.parameters()?;

    std::fs::create_dir_all(&output)?;

    println!("Starting simulation");
    println!(
        "  Initial state: V = {}, R = {}",
        config.initial.vegetation, config.initial.population
    );
    println!(
        "  Horizon: {} (dt = {}, {} steps)",
        params.horizon(),
        params.dt(),
        params.steps()
    );
    println!("  Critical level: alpha = {}", params.model().alpha);
    println!();

    let progress_interval = config.logging.progress_interval.max(1);
    let mut sim = Simulation::new(params, config.initial_state())?;
    let start = Instant::now();

    while !sim.is_complete() {
        if sim.run_steps(progress_interval).is_err() {
            break;
        }
        if !quiet {
            let state = sim.current_state();
            println!(
                "  t = {:8.2} | V = {:9.3} | R = {:8.3} | {}",
                sim.time(),
                state.vegetation,
                state.population,
                Regime::classify(state.vegetation, sim.params().model()),
            );
        }
    }

    let elapsed = start.elapsed();

    match sim.finish() {
        Ok(trajectory) => {
            let stats = TrajectoryStats::from_trajectory(&trajectory);

            println!();
            println!("=== Simulation Complete ===");
            println!("Time: {:.3}s", elapsed.as_secs_f64());
            println!("{}", stats.summary());
            if let Some(t) = stats.first_negative_time {
                println!("Warning: state went negative at t = {:.2} (values are not clamped)", t);
            }

            let csv_path = output.join("trajectory.csv");
            ExportSystem::export_trajectory_csv(&trajectory, &csv_path)?;
            println!("Trajectory: {:?}", csv_path);

            if json {
                let json_path = output.join("trajectory.json");
                ExportSystem::export_trajectory_json(&trajectory, &json_path)?;
                println!("Trajectory (JSON): {:?}", json_path);
            }

            let stats_path = output.join("stats.json");
            ExportSystem::export_stats_json(&stats, &stats_path)?;
            println!("Stats: {:?}", stats_path);

            Ok(())
        }
        Err(incomplete) => {
            let partial_path = output.join("trajectory_incomplete.csv");
            ExportSystem::export_trajectory_csv(&incomplete.trajectory, &partial_path)?;
            log::error!("{}", incomplete);
            log::error!("Partial trajectory written to {:?}", partial_path);
            Err(incomplete.reason.into())
        }
    }
}

fn run_parameter_sweep(
    config_path: PathBuf,
    parameter: SweepParameter,
    from: f64,
    to: f64,
    count: usize,
    output: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&config_path)?;
    let spec = SweepSpec {
        parameter,
        start: from,
        end: to,
        count,
    };

    let start = Instant::now();
    let points = run_sweep(&config, &spec);
    let elapsed = start.elapsed();

    println!("=== Sweep: {} ===", parameter);
    for point in &points {
        match &point.outcome {
            Ok(stats) => println!("  {:>10.4} | {}", point.value, stats.summary()),
            Err(err) => println!("  {:>10.4} | failed: {}", point.value, err),
        }
    }
    println!();
    println!("Time: {:.3}s", elapsed.as_secs_f64());

    ExportSystem::export_sweep_csv(&points, parameter, &output)?;
    println!("Sweep table: {:?}", output);

    Ok(())
}

fn run_benchmark(horizon: f64, dt: f64, repeats: usize) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== tundra Benchmark ===");
    println!("Horizon: {} (dt = {})", horizon, dt);
    println!("Runs: {}", repeats);
    println!();

    let result = benchmark(horizon, dt, repeats)?;
    println!("{}", result);

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}

fn show_regime(
    vegetation: f64,
    population: f64,
    config_path: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&config_path)?;
    let model = *config.parameters()?.model();
    let fluxes = Fluxes::compute(&StateVector::new(vegetation, population), &model);
    let rates = fluxes.derivative();

    println!("V = {}, R = {}", vegetation, population);
    println!(
        "Regime: {} (alpha = {}, stress threshold = {})",
        fluxes.regime,
        model.alpha,
        model.stress_threshold()
    );
    println!("  Regrowth (Rv):        {:.4}", fluxes.regrowth);
    println!("  Background loss (Mv): {:.4}", fluxes.background_loss);
    println!("  Offtake (Dv):         {:.4}", fluxes.offtake);
    println!("  Growth (Rr):          {:.4}", fluxes.population_growth);
    println!("  Mortality (Mr):       {:.4}", fluxes.mortality);
    println!("  dV/dt = {:.4}, dR/dt = {:.4}", rates.d_vegetation, rates.d_population);

    Ok(())
}
