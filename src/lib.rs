//! # predprey
//!
//! Predator-prey ecosystem simulator on a toroidal grid.
//!
//! Prey graze on renewable resource patches, predators eat prey, and both
//! move, reproduce, age and starve in discrete steps.
//!
//! ## Features
//!
//! - **Deterministic**: one seeded ChaCha generator drives every random choice
//! - **Fair scheduling**: each breed is activated in a fresh random order every step
//! - **Immediate effects**: later agents in a step see what earlier agents did
//! - **Configurable**: YAML configuration files
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use predprey::{Config, Simulation};
//!
//! let mut sim = Simulation::new_with_seed(Config::default(), 42).unwrap();
//! let steps = sim.run(500).unwrap();
//!
//! println!("Ran {} steps, terminated: {}", steps, sim.is_terminated());
//! println!("Prey over time: {:?}", sim.series().prey_series());
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use predprey::Config;
//!
//! let mut config = Config::default();
//! config.world.width = 30;
//! config.prey.reproduce_probability = 0.1;
//! config.aging.enabled = true;
//! assert!(config.validate().is_ok());
//! ```

pub mod agent;
pub mod behavior;
pub mod config;
pub mod error;
pub mod grid;
pub mod schedule;
pub mod simulation;
pub mod stats;

// Re-export main types
pub use agent::{Agent, AgentId, Kind};
pub use config::Config;
pub use error::{Result, SimError};
pub use grid::{Neighborhood, Position, TorusGrid};
pub use simulation::{RunState, Simulation};
pub use stats::{MetricsSink, PopulationCounts, PopulationSeries, PopulationSnapshot};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run a quick benchmark on a square grid of `grid_size` cells per side
pub fn benchmark(steps: u64, grid_size: usize, seed: u64) -> Result<BenchmarkResult> {
    use std::time::Instant;

    let mut config = Config::default();
    config.world.width = grid_size;
    config.world.height = grid_size;
    config.prey.initial_density = Some(0.25);
    config.predator.initial_density = Some(0.1);

    let mut sim = Simulation::new_with_seed(config, seed)?;
    let initial = sim.population();

    let start = Instant::now();
    let executed = sim.run(steps)?;
    let elapsed = start.elapsed().as_secs_f64();

    Ok(BenchmarkResult {
        steps: executed,
        initial,
        final_counts: sim.population(),
        elapsed_secs: elapsed,
        steps_per_second: if elapsed > 0.0 { executed as f64 / elapsed } else { 0.0 },
        terminated: sim.is_terminated(),
    })
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub steps: u64,
    pub initial: PopulationCounts,
    pub final_counts: PopulationCounts,
    pub elapsed_secs: f64,
    pub steps_per_second: f64,
    pub terminated: bool,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Benchmark Results ===")?;
        writeln!(f, "Steps: {}", self.steps)?;
        writeln!(f, "Prey: {} -> {}", self.initial.prey, self.final_counts.prey)?;
        writeln!(
            f,
            "Predators: {} -> {}",
            self.initial.predators, self.final_counts.predators
        )?;
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "Speed: {:.1} steps/s", self.steps_per_second)?;
        if self.terminated {
            writeln!(f, "Terminated early (extinction)")?;
        }
        Ok(())
    }
}
