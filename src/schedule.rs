//! Live-agent registry and random activation by breed.

use crate::agent::{Agent, AgentId, Kind};
use crate::error::{Result, SimError};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

/// Ids of one breed with O(1) insert and swap-remove
#[derive(Clone, Debug, Default)]
struct BreedSet {
    ids: Vec<AgentId>,
    slots: HashMap<AgentId, usize>,
}

impl BreedSet {
    fn insert(&mut self, id: AgentId) {
        self.slots.insert(id, self.ids.len());
        self.ids.push(id);
    }

    fn remove(&mut self, id: AgentId) -> bool {
        let Some(slot) = self.slots.remove(&id) else {
            return false;
        };
        self.ids.swap_remove(slot);
        if let Some(&moved) = self.ids.get(slot) {
            self.slots.insert(moved, slot);
        }
        true
    }
}

/// Authoritative store of live agents, partitioned by kind
#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    agents: HashMap<AgentId, Agent>,
    breeds: [BreedSet; 3],
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live agent
    pub fn add(&mut self, agent: Agent) -> Result<()> {
        let id = agent.id;
        if self.agents.contains_key(&id) {
            return Err(SimError::InvariantViolation(format!(
                "agent {id} added to scheduler twice"
            )));
        }
        self.breeds[agent.kind().index()].insert(id);
        self.agents.insert(id, agent);
        Ok(())
    }

    /// Remove and return a live agent
    pub fn remove(&mut self, id: AgentId) -> Result<Agent> {
        let agent = self.agents.remove(&id).ok_or(SimError::NotFound(id))?;
        if !self.breeds[agent.kind().index()].remove(id) {
            return Err(SimError::InvariantViolation(format!(
                "agent {id} missing from its {} set",
                agent.kind()
            )));
        }
        Ok(agent)
    }

    #[inline]
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(&id)
    }

    #[inline]
    pub fn contains(&self, id: AgentId) -> bool {
        self.agents.contains_key(&id)
    }

    /// Live population of one breed
    #[inline]
    pub fn count(&self, kind: Kind) -> usize {
        self.breeds[kind.index()].ids.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// All live agents, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    /// Ids of one breed, in registry order
    pub fn ids_of(&self, kind: Kind) -> &[AgentId] {
        &self.breeds[kind.index()].ids
    }

    /// Draw this step's activation order.
    ///
    /// Breeds are visited in `kind_order`; within each breed the currently
    /// live agents are shuffled afresh. The plan is frozen: agents added
    /// after this call are not part of it.
    pub fn plan<R: Rng + ?Sized>(&self, kind_order: &[Kind], rng: &mut R) -> ActivationPlan {
        let mut queue = Vec::with_capacity(self.len());
        for &kind in kind_order {
            let start = queue.len();
            queue.extend_from_slice(self.ids_of(kind));
            queue[start..].shuffle(rng);
        }
        ActivationPlan {
            queue: queue.into_iter(),
        }
    }
}

/// Frozen activation order for a single step
#[derive(Debug)]
pub struct ActivationPlan {
    queue: std::vec::IntoIter<AgentId>,
}

impl ActivationPlan {
    /// Next planned agent that is still alive.
    ///
    /// Agents removed since the plan was drawn are skipped silently.
    pub fn next_live(&mut self, scheduler: &Scheduler) -> Option<AgentId> {
        self.queue.by_ref().find(|&id| scheduler.contains(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Animal, Body, Patch};
    use crate::grid::{Neighborhood, Position};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn prey(id: AgentId) -> Agent {
        Agent::new(
            id,
            Position::new(0, 0),
            Body::Prey(Animal::new(5, None, Neighborhood::VonNeumann, 1)),
        )
    }

    fn wolf(id: AgentId) -> Agent {
        Agent::new(
            id,
            Position::new(0, 0),
            Body::Predator(Animal::new(5, None, Neighborhood::VonNeumann, 1)),
        )
    }

    fn grass(id: AgentId) -> Agent {
        Agent::new(id, Position::new(0, 0), Body::ResourcePatch(Patch::new(true, 3)))
    }

    #[test]
    fn test_counts_per_kind() {
        let mut s = Scheduler::new();
        s.add(prey(1)).unwrap();
        s.add(prey(2)).unwrap();
        s.add(wolf(3)).unwrap();
        s.add(grass(4)).unwrap();

        assert_eq!(s.count(Kind::Prey), 2);
        assert_eq!(s.count(Kind::Predator), 1);
        assert_eq!(s.count(Kind::ResourcePatch), 1);
        assert_eq!(s.len(), 4);

        s.remove(1).unwrap();
        assert_eq!(s.count(Kind::Prey), 1);
        assert_eq!(s.ids_of(Kind::Prey), &[2]);
    }

    #[test]
    fn test_duplicate_and_missing() {
        let mut s = Scheduler::new();
        s.add(prey(1)).unwrap();
        assert!(matches!(s.add(prey(1)), Err(SimError::InvariantViolation(_))));
        s.remove(1).unwrap();
        assert!(matches!(s.remove(1), Err(SimError::NotFound(1))));
    }

    #[test]
    fn test_swap_remove_keeps_slots_valid() {
        let mut s = Scheduler::new();
        for id in 1..=5 {
            s.add(prey(id)).unwrap();
        }
        s.remove(2).unwrap();
        s.remove(5).unwrap();
        s.remove(1).unwrap();

        let mut left = s.ids_of(Kind::Prey).to_vec();
        left.sort_unstable();
        assert_eq!(left, vec![3, 4]);
        s.remove(4).unwrap();
        s.remove(3).unwrap();
        assert_eq!(s.count(Kind::Prey), 0);
    }

    #[test]
    fn test_plan_follows_kind_order() {
        let mut s = Scheduler::new();
        s.add(grass(1)).unwrap();
        s.add(prey(2)).unwrap();
        s.add(wolf(3)).unwrap();
        s.add(prey(4)).unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let order = [Kind::Predator, Kind::Prey, Kind::ResourcePatch];
        let mut plan = s.plan(&order, &mut rng);

        let mut kinds = Vec::new();
        while let Some(id) = plan.next_live(&s) {
            kinds.push(s.get(id).unwrap().kind());
        }
        assert_eq!(
            kinds,
            vec![Kind::Predator, Kind::Prey, Kind::Prey, Kind::ResourcePatch]
        );
    }

    #[test]
    fn test_plan_skips_removed_and_ignores_new() {
        let mut s = Scheduler::new();
        for id in 1..=4 {
            s.add(prey(id)).unwrap();
        }
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut plan = s.plan(&Kind::ALL, &mut rng);

        let first = plan.next_live(&s).unwrap();
        // Kill everyone else before they act, then add a newborn
        for id in 1..=4 {
            if id != first {
                s.remove(id).unwrap();
            }
        }
        s.add(prey(99)).unwrap();

        assert_eq!(plan.next_live(&s), None);
    }

    #[test]
    fn test_plan_reshuffles_each_step() {
        let mut s = Scheduler::new();
        for id in 1..=20 {
            s.add(prey(id)).unwrap();
        }
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let drain = |plan: &mut ActivationPlan, s: &Scheduler| {
            let mut out = Vec::new();
            while let Some(id) = plan.next_live(s) {
                out.push(id);
            }
            out
        };
        let a = drain(&mut s.plan(&Kind::ALL, &mut rng), &s);
        let b = drain(&mut s.plan(&Kind::ALL, &mut rng), &s);

        assert_eq!(a.len(), 20);
        assert_ne!(a, b);
        let mut sorted = a.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (1..=20).collect::<Vec<_>>());
    }
}
