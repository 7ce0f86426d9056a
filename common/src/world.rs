use std::collections::{BTreeMap, HashMap, btree_map::Entry};

use glam::Vec3;
use tracing::debug;

use crate::{
    actor::{ActorId, ActorState},
    config::SimConfig,
    input::InputFrame,
    movement,
    physics::PhysicsStep,
    scheduler::Tick,
};

// On a client only the local actor is stepped; remote entries are written by
// interpolation.
#[derive(Clone, Debug)]
pub struct World {
    config: SimConfig,
    actors: BTreeMap<ActorId, ActorState>,
}

impl World {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            actors: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn spawn(&mut self, id: ActorId, spawn_point: Vec3) -> &mut ActorState {
        let actor = ActorState::spawn(id, spawn_point);
        match self.actors.entry(id) {
            Entry::Occupied(mut entry) => {
                entry.insert(actor);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(actor),
        }
    }

    pub fn despawn(&mut self, id: ActorId) -> Option<ActorState> {
        self.actors.remove(&id)
    }

    pub fn get(&self, id: ActorId) -> Option<&ActorState> {
        self.actors.get(&id)
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut ActorState> {
        self.actors.get_mut(&id)
    }

    pub fn contains(&self, id: ActorId) -> bool {
        self.actors.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActorState> {
        self.actors.values()
    }

    pub fn ids(&self) -> Vec<ActorId> {
        self.actors.keys().copied().collect()
    }

    // Jump edges in `inputs` are consumed.
    pub fn step(
        &mut self,
        tick: Tick,
        inputs: &mut HashMap<ActorId, InputFrame>,
        physics: &mut dyn PhysicsStep,
    ) {
        for (id, input) in inputs.iter_mut() {
            if let Some(actor) = self.actors.get_mut(id) {
                movement::resolve(actor, input, tick, &self.config);
            }
        }

        let mut bodies: Vec<&mut ActorState> = self
            .actors
            .values_mut()
            .filter(|actor| inputs.contains_key(&actor.id))
            .collect();
        physics.step(&mut bodies, tick);

        for actor in bodies {
            if movement::recover_out_of_bounds(actor, &self.config) {
                debug!(actor = %actor.id, "fell out of the world; respawned");
            }
        }
    }
}
