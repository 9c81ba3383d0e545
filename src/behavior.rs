//! Per-kind decision rules.
//!
//! Everything here reads agent state and the current grid/registry and
//! returns what should happen; nothing here touches the grid or scheduler.
//! The orchestrator applies each returned [`Action`] before asking for the
//! next one, so decisions always see up-to-date occupancy.

use crate::agent::{AgentId, Animal, DeathCause, Kind, Patch};
use crate::grid::{Position, TorusGrid};
use crate::schedule::Scheduler;
use rand::Rng;

/// An effect requested by an activated agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Step to this (already wrapped) cell
    Move(Position),
    /// Prey eats the grown patch with this id
    Graze(AgentId),
    /// Predator eats the prey with this id
    Hunt(AgentId),
    /// Spawn one offspring at the parent's cell
    Reproduce,
}

/// Movement decision. Always made first in an animal's activation.
pub fn decide_move<R: Rng + ?Sized>(
    animal: &Animal,
    pos: Position,
    grid: &TorusGrid,
    rng: &mut R,
) -> Action {
    Action::Move(grid.random_step(pos, animal.movement.neighborhood, rng))
}

/// Grazing decision for prey standing at `pos`.
///
/// Picks the lowest-id grown patch so the choice does not depend on the
/// order ids happen to sit in a cell.
pub fn decide_graze(pos: Position, grid: &TorusGrid, scheduler: &Scheduler) -> Option<Action> {
    grid.agents_at(pos)
        .iter()
        .copied()
        .filter(|&id| scheduler.get(id).is_some_and(|a| a.is_grown_patch()))
        .min()
        .map(Action::Graze)
}

/// Hunting decision for a predator standing at `pos`: at most one prey, the
/// lowest id in the cell.
pub fn decide_hunt(pos: Position, grid: &TorusGrid, scheduler: &Scheduler) -> Option<Action> {
    grid.agents_at(pos)
        .iter()
        .copied()
        .filter(|&id| scheduler.get(id).is_some_and(|a| a.kind() == Kind::Prey))
        .min()
        .map(Action::Hunt)
}

/// Bernoulli reproduction trial
pub fn decide_reproduce<R: Rng + ?Sized>(probability: f64, rng: &mut R) -> Option<Action> {
    rng.gen_bool(probability).then_some(Action::Reproduce)
}

/// Energy a prey gains from one patch
pub fn graze_gain(resource_enabled: bool, gain_from_food: u32, fallback_gain: u32) -> u32 {
    if resource_enabled {
        gain_from_food
    } else {
        fallback_gain
    }
}

/// Advance a patch's regrowth timer by one step.
///
/// Returns `true` when the patch became grown on this call.
pub fn regrow(patch: &mut Patch) -> bool {
    if patch.grown {
        return false;
    }
    patch.age += 1;
    if patch.age >= patch.regrowth_time {
        patch.grown = true;
        patch.age = 0;
        return true;
    }
    false
}

/// Starvation check made before an animal acts.
///
/// Only animals created with no energy get here; every other animal is
/// removed by [`resolve_mortality`] the moment its energy runs out.
pub fn starved_on_arrival(animal: &Animal) -> Option<DeathCause> {
    animal.is_starving().then_some(DeathCause::Starvation)
}

/// End-of-activation bookkeeping for an animal.
///
/// Ages the animal when aging is on, then decides whether it dies. A
/// surviving animal pays its energy decay, and starves right away if that
/// empties it. A dying one is left untouched.
pub fn resolve_mortality(animal: &mut Animal) -> Option<DeathCause> {
    if animal.death_age.is_some() {
        animal.age = animal.age.saturating_add(1);
    }
    if animal.is_starving() {
        return Some(DeathCause::Starvation);
    }
    if animal.is_too_old() {
        return Some(DeathCause::OldAge);
    }
    animal.energy = animal.energy.saturating_sub(animal.energy_decay);
    starved_on_arrival(animal)
}
