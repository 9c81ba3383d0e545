//! predprey - CLI entry point
//!
//! Batch runner around the simulation library.

use clap::{Parser, Subcommand};
use predprey::stats::LogSink;
use predprey::{benchmark, Config, Simulation};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "predprey")]
#[command(version)]
#[command(about = "Predator-prey ecosystem simulator on a toroidal grid")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation
    Run {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Maximum number of steps to simulate
        #[arg(short, long, default_value = "1000")]
        steps: u64,

        /// Where to write the population series (JSON)
        #[arg(short, long, default_value = "population.json")]
        output: PathBuf,

        /// Random seed, overrides the config file
        #[arg(long)]
        seed: Option<u64>,

        /// Quiet mode (no periodic summaries)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Run performance benchmark
    Benchmark {
        /// Number of steps
        #[arg(short, long, default_value = "1000")]
        steps: u64,

        /// Grid side length
        #[arg(short, long, default_value = "50")]
        grid: usize,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            steps,
            output,
            seed,
            quiet,
        } => run_simulation(config, steps, output, seed, quiet),

        Commands::Benchmark { steps, grid, seed } => {
            init_logging("info");
            run_benchmark(steps, grid, seed)
        }

        Commands::Init { output } => generate_config(output),
    }
}

fn init_logging(default_level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn run_simulation(
    config_path: PathBuf,
    steps: u64,
    output: PathBuf,
    seed: Option<u64>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // Load or create config
    let (mut config, source) = if config_path.exists() {
        (Config::from_file(&config_path)?, format!("{:?}", config_path))
    } else {
        (Config::default(), "defaults".to_string())
    };
    init_logging(&config.logging.log_level);
    log::info!("Configuration loaded from {}", source);

    if seed.is_some() {
        config.world.seed = seed;
    }

    let stats_interval = config.logging.stats_interval;
    let mut sim = Simulation::new(config)?;
    if !quiet {
        sim.add_sink(Box::new(LogSink::new(stats_interval)));
    }

    let initial = sim.population();
    println!("Starting simulation");
    println!("  Seed: {}", sim.seed());
    println!(
        "  Grid size: {}x{}",
        sim.grid().width(),
        sim.grid().height()
    );
    println!("  Prey: {}  Predators: {}", initial.prey, initial.predators);
    println!("  Max steps: {}", steps);
    println!();

    let start = Instant::now();
    let executed = sim.run(steps)?;
    let elapsed = start.elapsed();

    let counts = sim.population();
    println!();
    println!("=== Simulation Complete ===");
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Steps: {}", executed);
    println!(
        "Speed: {:.1} steps/s",
        executed as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );
    println!("Final prey: {}", counts.prey);
    println!("Final predators: {}", counts.predators);
    println!(
        "Grown patches: {}/{}",
        counts.grown_patches, counts.patches
    );
    if sim.is_terminated() {
        println!("Terminated by extinction at step {}", sim.time());
    }

    sim.series().save_json(&output)?;
    println!("Population series: {:?}", output);

    Ok(())
}

fn run_benchmark(steps: u64, grid: usize, seed: u64) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== predprey Benchmark ===");
    println!("Steps: {}", steps);
    println!("Grid: {}x{}", grid, grid);
    println!();

    let result = benchmark(steps, grid, seed)?;
    println!("{}", result);

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}
