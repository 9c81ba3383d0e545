//! Agent records: prey, predators and resource patches.

use crate::grid::{Neighborhood, Position};
use serde::{Deserialize, Serialize};

/// Unique agent identifier, never reused within a run
pub type AgentId = u64;

/// Breed of an agent
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Prey,
    Predator,
    ResourcePatch,
}

impl Kind {
    pub const ALL: [Kind; 3] = [Kind::Prey, Kind::Predator, Kind::ResourcePatch];

    /// Dense index for per-kind tables
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Kind::Prey => 0,
            Kind::Predator => 1,
            Kind::ResourcePatch => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Kind::Prey => "prey",
            Kind::Predator => "predator",
            Kind::ResourcePatch => "resource_patch",
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Cause of death tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    Starvation,
    OldAge,
    Predation,
}

/// Movement capability shared by every mobile breed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub neighborhood: Neighborhood,
}

/// State carried by prey and predators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Animal {
    pub energy: u32,
    pub age: u32,
    /// `None` when aging is disabled for the run
    pub death_age: Option<u32>,
    pub movement: Movement,
    /// Energy lost per survived activation
    pub energy_decay: u32,
}

impl Animal {
    pub fn new(energy: u32, death_age: Option<u32>, neighborhood: Neighborhood, energy_decay: u32) -> Self {
        Self {
            energy,
            age: 0,
            death_age,
            movement: Movement { neighborhood },
            energy_decay,
        }
    }

    #[inline]
    pub fn is_starving(&self) -> bool {
        self.energy == 0
    }

    #[inline]
    pub fn is_too_old(&self) -> bool {
        self.death_age.is_some_and(|limit| self.age >= limit)
    }

    /// Offspring inheriting this animal's configuration.
    ///
    /// The child starts at age zero with half of the parent's current
    /// energy (rounded down). The parent is not modified.
    pub fn offspring(&self) -> Self {
        Self {
            energy: self.energy / 2,
            age: 0,
            death_age: self.death_age,
            movement: self.movement,
            energy_decay: self.energy_decay,
        }
    }
}

/// A renewable resource patch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    pub grown: bool,
    /// Steps needed to regrow after being eaten
    pub regrowth_time: u32,
    /// Steps since last eaten
    pub age: u32,
}

impl Patch {
    pub fn new(grown: bool, regrowth_time: u32) -> Self {
        Self {
            grown,
            regrowth_time,
            age: 0,
        }
    }

    pub fn get_eaten(&mut self) {
        self.grown = false;
        self.age = 0;
    }
}

/// Kind-specific state, dispatched by tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Body {
    Prey(Animal),
    Predator(Animal),
    ResourcePatch(Patch),
}

/// A live agent in the simulation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub pos: Position,
    pub body: Body,
}

impl Agent {
    pub fn new(id: AgentId, pos: Position, body: Body) -> Self {
        Self { id, pos, body }
    }

    #[inline]
    pub fn kind(&self) -> Kind {
        match self.body {
            Body::Prey(_) => Kind::Prey,
            Body::Predator(_) => Kind::Predator,
            Body::ResourcePatch(_) => Kind::ResourcePatch,
        }
    }

    pub fn animal(&self) -> Option<&Animal> {
        match &self.body {
            Body::Prey(a) | Body::Predator(a) => Some(a),
            Body::ResourcePatch(_) => None,
        }
    }

    pub fn animal_mut(&mut self) -> Option<&mut Animal> {
        match &mut self.body {
            Body::Prey(a) | Body::Predator(a) => Some(a),
            Body::ResourcePatch(_) => None,
        }
    }

    pub fn patch(&self) -> Option<&Patch> {
        match &self.body {
            Body::ResourcePatch(p) => Some(p),
            _ => None,
        }
    }

    pub fn patch_mut(&mut self) -> Option<&mut Patch> {
        match &mut self.body {
            Body::ResourcePatch(p) => Some(p),
            _ => None,
        }
    }

    /// Energy for animals, `None` for patches
    pub fn energy(&self) -> Option<u32> {
        self.animal().map(|a| a.energy)
    }

    /// Whether this is a grown resource patch
    pub fn is_grown_patch(&self) -> bool {
        self.patch().is_some_and(|p| p.grown)
    }
}
