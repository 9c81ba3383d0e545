//! Simulation orchestrator - drives one step at a time.

use crate::agent::{Agent, AgentId, Animal, Body, DeathCause, Kind, Patch};
use crate::behavior::{self, Action};
use crate::config::{BreedConfig, Config};
use crate::error::{Result, SimError};
use crate::grid::{Position, TorusGrid};
use crate::schedule::Scheduler;
use crate::stats::{MetricsSink, PopulationCounts, PopulationSeries, PopulationSnapshot, StepEvents};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Lifecycle of a run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Running,
    /// Prey or predators died out; no further steps are accepted
    Terminated,
    /// A step hit an internal inconsistency; the world is left half-applied
    Aborted,
}

/// The predator-prey world and its stepping logic
pub struct Simulation {
    config: Config,

    // Spatial index and live-agent registry
    grid: TorusGrid,
    scheduler: Scheduler,

    // State
    time: u64,
    state: RunState,
    /// Breeds that have had a positive population at some point
    seen_alive: [bool; 3],

    // Reporting
    series: PopulationSeries,
    sinks: Vec<Box<dyn MetricsSink>>,
    events: StepEvents,

    next_agent_id: AgentId,

    // Single seeded source for every stochastic decision
    rng: ChaCha8Rng,
    seed: u64,
}

impl Simulation {
    /// Build and seed a world, using `world.seed` or an OS-drawn seed
    pub fn new(config: Config) -> Result<Self> {
        let seed = config.world.seed.unwrap_or_else(|| rand::thread_rng().gen());
        Self::new_with_seed(config, seed)
    }

    /// Build and seed a world with a specific seed for reproducibility
    pub fn new_with_seed(config: Config, seed: u64) -> Result<Self> {
        let mut sim = Self::empty(config, seed)?;
        let cells = sim.grid.area();

        let initial_prey = sim.config.prey.initial_population(cells);
        for _ in 0..initial_prey {
            let pos = sim.grid.random_cell(&mut sim.rng);
            sim.spawn_prey(pos, sim.config.prey.initial_energy)?;
        }

        let initial_predators = sim.config.predator.initial_population(cells);
        for _ in 0..initial_predators {
            let pos = sim.grid.random_cell(&mut sim.rng);
            sim.spawn_predator(pos, sim.config.predator.initial_energy)?;
        }

        if sim.config.resource.seed_patches {
            let grown = sim.config.resource.initially_grown;
            for x in 0..sim.grid.width() as i32 {
                for y in 0..sim.grid.height() as i32 {
                    sim.spawn_patch(Position::new(x, y), grown)?;
                }
            }
        }

        log::info!(
            "Simulation created: {}x{} grid, prey={}, predators={}, patches={}, seed={}",
            sim.grid.width(),
            sim.grid.height(),
            initial_prey,
            initial_predators,
            sim.scheduler.count(Kind::ResourcePatch),
            seed
        );

        Ok(sim)
    }

    /// Empty world for scripted scenarios; populate with the `spawn_*` methods
    pub fn empty(config: Config, seed: u64) -> Result<Self> {
        config.validate()?;
        let grid = TorusGrid::new(config.world.width, config.world.height)?;

        Ok(Self {
            config,
            grid,
            scheduler: Scheduler::new(),
            time: 0,
            state: RunState::Running,
            seen_alive: [false; 3],
            series: PopulationSeries::new(),
            sinks: Vec::new(),
            events: StepEvents::default(),
            next_agent_id: 1,
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        })
    }

    /// Attach an external metrics sink
    pub fn add_sink(&mut self, sink: Box<dyn MetricsSink>) {
        self.sinks.push(sink);
    }

    pub fn spawn_prey(&mut self, pos: Position, energy: u32) -> Result<AgentId> {
        let animal = self.new_animal(&self.config.prey, energy);
        self.spawn(pos, Body::Prey(animal))
    }

    pub fn spawn_predator(&mut self, pos: Position, energy: u32) -> Result<AgentId> {
        let animal = self.new_animal(&self.config.predator, energy);
        self.spawn(pos, Body::Predator(animal))
    }

    pub fn spawn_patch(&mut self, pos: Position, grown: bool) -> Result<AgentId> {
        let patch = Patch::new(grown, self.config.resource.regrowth_time);
        self.spawn(pos, Body::ResourcePatch(patch))
    }

    fn new_animal(&self, breed: &BreedConfig, energy: u32) -> Animal {
        let death_age = self.config.aging.enabled.then_some(breed.death_age);
        Animal::new(energy, death_age, breed.neighborhood, breed.energy_decay)
    }

    fn spawn(&mut self, pos: Position, body: Body) -> Result<AgentId> {
        let id = self.next_agent_id;
        self.next_agent_id += 1;

        let pos = self.grid.place(id, pos)?;
        let agent = Agent::new(id, pos, body);
        let kind = agent.kind();
        self.scheduler.add(agent)?;
        self.seen_alive[kind.index()] = true;

        log::trace!("spawned {kind} {id} at {pos}");
        Ok(id)
    }

    /// Advance the world by one step.
    ///
    /// Every agent alive when the step starts gets at most one activation,
    /// and each activation's effects are applied before the next agent
    /// decides. The post-step snapshot goes to the series and every sink.
    pub fn step(&mut self) -> Result<RunState> {
        match self.state {
            RunState::Running => {}
            RunState::Terminated => {
                return Err(SimError::AlreadyTerminated { step: self.time });
            }
            RunState::Aborted => {
                return Err(SimError::InvariantViolation(format!(
                    "run aborted during step {}",
                    self.time + 1
                )));
            }
        }

        self.events = StepEvents::default();

        let mut plan = self
            .scheduler
            .plan(&self.config.schedule.kind_order, &mut self.rng);
        while let Some(id) = plan.next_live(&self.scheduler) {
            if let Err(e) = self.activate(id) {
                log::error!("step {} aborted while activating agent {id}: {e}", self.time + 1);
                self.state = RunState::Aborted;
                return Err(e);
            }
        }

        if cfg!(debug_assertions) {
            if let Err(e) = self.verify_consistency() {
                log::error!("step {} left the world inconsistent: {e}", self.time + 1);
                self.state = RunState::Aborted;
                return Err(e);
            }
        }

        self.time += 1;

        let snapshot = PopulationSnapshot {
            step: self.time,
            counts: PopulationCounts::from_scheduler(&self.scheduler),
            events: self.events,
        };
        self.series.record(&snapshot);
        for sink in &mut self.sinks {
            sink.record(&snapshot);
        }
        log::debug!("{}", snapshot.summary());

        if let Some(kind) = self.extinct_breed(&snapshot.counts) {
            self.state = RunState::Terminated;
            log::info!("{kind} extinct at step {}, simulation terminated", self.time);
        }

        Ok(self.state)
    }

    /// Step until `max_steps` have run or the simulation terminates.
    /// Returns the number of steps actually executed.
    pub fn run(&mut self, max_steps: u64) -> Result<u64> {
        let mut executed = 0;
        while executed < max_steps && self.state == RunState::Running {
            self.step()?;
            executed += 1;
        }
        Ok(executed)
    }

    /// Run with a callback after each completed step
    pub fn run_with_callback<F>(&mut self, max_steps: u64, mut callback: F) -> Result<u64>
    where
        F: FnMut(&Simulation, &PopulationSnapshot),
    {
        let mut executed = 0;
        while executed < max_steps && self.state == RunState::Running {
            self.step()?;
            executed += 1;
            if let Some(snapshot) = self.series.last() {
                callback(self, snapshot);
            }
        }
        Ok(executed)
    }

    fn extinct_breed(&self, counts: &PopulationCounts) -> Option<Kind> {
        [Kind::Predator, Kind::Prey]
            .into_iter()
            .find(|&kind| self.seen_alive[kind.index()] && counts.get(kind) == 0)
    }

    fn activate(&mut self, id: AgentId) -> Result<()> {
        let kind = self
            .scheduler
            .get(id)
            .map(Agent::kind)
            .ok_or_else(|| SimError::InvariantViolation(format!("activated dead agent {id}")))?;

        match kind {
            Kind::Prey => self.activate_prey(id),
            Kind::Predator => self.activate_predator(id),
            Kind::ResourcePatch => self.activate_patch(id),
        }
    }

    /// Move, graze, maybe reproduce, then mortality
    fn activate_prey(&mut self, id: AgentId) -> Result<()> {
        if self.starved_before_acting(id)? {
            return Ok(());
        }
        self.move_animal(id)?;

        let pos = self.position(id)?;
        if let Some(action) = behavior::decide_graze(pos, &self.grid, &self.scheduler) {
            self.apply(id, action)?;
        }

        if let Some(action) =
            behavior::decide_reproduce(self.config.prey.reproduce_probability, &mut self.rng)
        {
            self.apply(id, action)?;
        }

        self.settle_animal(id)
    }

    /// Move, maybe reproduce, hunt, then mortality
    fn activate_predator(&mut self, id: AgentId) -> Result<()> {
        if self.starved_before_acting(id)? {
            return Ok(());
        }
        self.move_animal(id)?;

        if let Some(action) =
            behavior::decide_reproduce(self.config.predator.reproduce_probability, &mut self.rng)
        {
            self.apply(id, action)?;
        }

        let pos = self.position(id)?;
        if let Some(action) = behavior::decide_hunt(pos, &self.grid, &self.scheduler) {
            self.apply(id, action)?;
        }

        self.settle_animal(id)
    }

    fn activate_patch(&mut self, id: AgentId) -> Result<()> {
        let patch = self
            .scheduler
            .get_mut(id)
            .and_then(Agent::patch_mut)
            .ok_or_else(|| SimError::InvariantViolation(format!("agent {id} is not a patch")))?;
        if behavior::regrow(patch) {
            log::trace!("patch {id} regrown");
        }
        Ok(())
    }

    fn move_animal(&mut self, id: AgentId) -> Result<()> {
        let agent = self.scheduler.get(id).ok_or(SimError::NotFound(id))?;
        let animal = agent
            .animal()
            .ok_or_else(|| SimError::InvariantViolation(format!("agent {id} cannot move")))?;
        let action = behavior::decide_move(animal, agent.pos, &self.grid, &mut self.rng);
        self.apply(id, action)
    }

    /// An animal that starts its activation empty dies without acting
    fn starved_before_acting(&mut self, id: AgentId) -> Result<bool> {
        match behavior::starved_on_arrival(self.animal_mut(id)?) {
            Some(cause) => {
                self.destroy(id, cause)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Aging, death checks and energy decay after the animal has acted
    fn settle_animal(&mut self, id: AgentId) -> Result<()> {
        let cause = behavior::resolve_mortality(self.animal_mut(id)?);
        match cause {
            Some(cause) => self.destroy(id, cause),
            None => Ok(()),
        }
    }

    /// Apply one action's side effects immediately
    fn apply(&mut self, actor: AgentId, action: Action) -> Result<()> {
        match action {
            Action::Move(dest) => {
                let landed = self
                    .grid
                    .move_agent(actor, dest)
                    .map_err(|e| e.into_invariant("moving agent"))?;
                self.agent_mut(actor)?.pos = landed;
            }
            Action::Graze(patch_id) => {
                self.agent_mut(patch_id)?
                    .patch_mut()
                    .ok_or_else(|| {
                        SimError::InvariantViolation(format!("agent {patch_id} is not a patch"))
                    })?
                    .get_eaten();

                let resource = &self.config.resource;
                let gain = behavior::graze_gain(
                    resource.enabled,
                    self.config.prey.gain_from_food,
                    resource.fallback_gain,
                );
                let prey = self.animal_mut(actor)?;
                prey.energy = prey.energy.saturating_add(gain);
                self.events.patches_grazed += 1;
            }
            Action::Hunt(prey_id) => {
                self.destroy(prey_id, DeathCause::Predation)?;
                let gain = self.config.predator.gain_from_food;
                let predator = self.animal_mut(actor)?;
                predator.energy = predator.energy.saturating_add(gain);
            }
            Action::Reproduce => {
                let parent = self.scheduler.get(actor).ok_or(SimError::NotFound(actor))?;
                let pos = parent.pos;
                let body = match &parent.body {
                    Body::Prey(a) => Body::Prey(a.offspring()),
                    Body::Predator(a) => Body::Predator(a.offspring()),
                    Body::ResourcePatch(_) => {
                        return Err(SimError::InvariantViolation(format!(
                            "patch {actor} tried to reproduce"
                        )))
                    }
                };
                self.spawn(pos, body)?;
                self.events.births += 1;
            }
        }
        Ok(())
    }

    /// Remove an agent from both the grid and the registry
    fn destroy(&mut self, id: AgentId, cause: DeathCause) -> Result<()> {
        self.grid
            .remove(id)
            .map_err(|e| e.into_invariant("removing from grid"))?;
        let agent = self
            .scheduler
            .remove(id)
            .map_err(|e| e.into_invariant("removing from scheduler"))?;
        self.events.record_death(cause);
        log::trace!("{} {id} died: {cause:?}", agent.kind());
        Ok(())
    }

    fn position(&self, id: AgentId) -> Result<Position> {
        self.scheduler
            .get(id)
            .map(|a| a.pos)
            .ok_or(SimError::NotFound(id))
    }

    fn agent_mut(&mut self, id: AgentId) -> Result<&mut Agent> {
        self.scheduler.get_mut(id).ok_or(SimError::NotFound(id))
    }

    fn animal_mut(&mut self, id: AgentId) -> Result<&mut Animal> {
        self.agent_mut(id)?
            .animal_mut()
            .ok_or_else(|| SimError::InvariantViolation(format!("agent {id} is not an animal")))
    }

    /// Check that grid and registry agree about every live agent
    pub fn verify_consistency(&self) -> Result<()> {
        if self.grid.len() != self.scheduler.len() {
            return Err(SimError::InvariantViolation(format!(
                "grid holds {} agents, scheduler holds {}",
                self.grid.len(),
                self.scheduler.len()
            )));
        }
        for agent in self.scheduler.iter() {
            if !self.grid.in_bounds(agent.pos) {
                return Err(SimError::InvariantViolation(format!(
                    "agent {} out of bounds at {}",
                    agent.id, agent.pos
                )));
            }
            if self.grid.position_of(agent.id) != Some(agent.pos)
                || !self.grid.agents_at(agent.pos).contains(&agent.id)
            {
                return Err(SimError::InvariantViolation(format!(
                    "agent {} at {} disagrees with grid",
                    agent.id, agent.pos
                )));
            }
        }
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn grid(&self) -> &TorusGrid {
        &self.grid
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Live agents for rendering; order is unspecified
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.scheduler.iter()
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.scheduler.get(id)
    }

    pub fn series(&self) -> &PopulationSeries {
        &self.series
    }

    /// Current counts, independent of the recorded series
    pub fn population(&self) -> PopulationCounts {
        PopulationCounts::from_scheduler(&self.scheduler)
    }

    /// Number of completed steps
    pub fn time(&self) -> u64 {
        self.time
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_terminated(&self) -> bool {
        self.state == RunState::Terminated
    }

    /// Get seed for reproducibility
    pub fn seed(&self) -> u64 {
        self.seed
    }
}
