//! Configuration for the predator-prey simulation.
//!
//! Loaded from YAML; every section has defaults modelled on the classic
//! wolf-sheep predation setup.

use crate::agent::Kind;
use crate::error::{Result, SimError};
use crate::grid::Neighborhood;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default = "BreedConfig::default_prey")]
    pub prey: BreedConfig,
    #[serde(default = "BreedConfig::default_predator")]
    pub predator: BreedConfig,
    #[serde(default)]
    pub resource: ResourceConfig,
    #[serde(default)]
    pub aging: AgingConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Grid and seeding configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: usize,
    pub height: usize,
    /// Random seed; drawn from the OS when absent
    pub seed: Option<u64>,
}

/// Per-breed parameters shared by prey and predators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreedConfig {
    /// Number of individuals at start
    pub initial_count: usize,
    /// Fraction of cells seeded with an individual; overrides `initial_count`
    #[serde(default)]
    pub initial_density: Option<f32>,
    /// Starting energy for seeded individuals
    pub initial_energy: u32,
    /// Per-activation reproduction probability
    pub reproduce_probability: f64,
    /// Energy gained from one feeding event
    pub gain_from_food: u32,
    /// Energy lost per survived activation
    pub energy_decay: u32,
    /// Age at which an individual dies, when aging is enabled
    pub death_age: u32,
    /// Movement neighborhood
    #[serde(default)]
    pub neighborhood: Neighborhood,
}

/// Resource patch configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Whether prey gain `prey.gain_from_food` from patches
    pub enabled: bool,
    /// Steps a patch needs to regrow after being eaten
    pub regrowth_time: u32,
    /// Energy prey gain from a patch when resources are disabled
    pub fallback_gain: u32,
    /// Whether seeded patches start grown
    pub initially_grown: bool,
    /// Seed one patch per cell at construction
    pub seed_patches: bool,
}

/// Aging configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgingConfig {
    pub enabled: bool,
}

/// Activation order configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Breed order used every step; must name each kind exactly once
    pub kind_order: Vec<Kind>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Steps between summary log lines
    pub stats_interval: u64,
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            prey: BreedConfig::default_prey(),
            predator: BreedConfig::default_predator(),
            resource: ResourceConfig::default(),
            aging: AgingConfig::default(),
            schedule: ScheduleConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 20,
            height: 20,
            seed: None,
        }
    }
}

impl BreedConfig {
    pub fn default_prey() -> Self {
        Self {
            initial_count: 100,
            initial_density: None,
            initial_energy: 8,
            reproduce_probability: 0.04,
            gain_from_food: 4,
            energy_decay: 1,
            death_age: 50,
            neighborhood: Neighborhood::VonNeumann,
        }
    }

    pub fn default_predator() -> Self {
        Self {
            initial_count: 50,
            initial_density: None,
            initial_energy: 40,
            reproduce_probability: 0.05,
            gain_from_food: 20,
            energy_decay: 1,
            death_age: 60,
            neighborhood: Neighborhood::VonNeumann,
        }
    }

    /// Number of individuals to seed on a grid with `cells` cells
    pub fn initial_population(&self, cells: usize) -> usize {
        match self.initial_density {
            Some(density) => (density as f64 * cells as f64).round() as usize,
            None => self.initial_count,
        }
    }

    fn validate(&self, kind: Kind) -> Result<()> {
        if !(0.0..=1.0).contains(&self.reproduce_probability) {
            return Err(SimError::Configuration(format!(
                "{kind}.reproduce_probability must be in [0, 1], got {}",
                self.reproduce_probability
            )));
        }
        if let Some(density) = self.initial_density {
            if !(0.0..=1.0).contains(&density) {
                return Err(SimError::Configuration(format!(
                    "{kind}.initial_density must be in [0, 1], got {density}"
                )));
            }
        }
        if self.death_age == 0 {
            return Err(SimError::Configuration(format!(
                "{kind}.death_age must be > 0"
            )));
        }
        Ok(())
    }
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            regrowth_time: 30,
            fallback_gain: 1,
            initially_grown: true,
            seed_patches: true,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            kind_order: Kind::ALL.to_vec(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stats_interval: 50,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.world.width == 0 || self.world.height == 0 {
            return Err(SimError::Configuration(format!(
                "grid dimensions must be positive, got {}x{}",
                self.world.width, self.world.height
            )));
        }
        self.prey.validate(Kind::Prey)?;
        self.predator.validate(Kind::Predator)?;

        let mut order = self.schedule.kind_order.clone();
        order.sort();
        order.dedup();
        if order.len() != Kind::ALL.len() || self.schedule.kind_order.len() != Kind::ALL.len() {
            return Err(SimError::Configuration(format!(
                "schedule.kind_order must list each kind once, got {:?}",
                self.schedule.kind_order
            )));
        }
        if self.logging.stats_interval == 0 {
            return Err(SimError::Configuration(
                "logging.stats_interval must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
