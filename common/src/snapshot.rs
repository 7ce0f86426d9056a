use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::{
    actor::{ActorId, ActorState, AuxFlags},
    world::World,
};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    pub id: ActorId,
    pub position: Vec3,
    pub orientation: Quat,
    pub velocity: Vec3,
    pub stamina: f32,
    pub tired: bool,
    pub aux: AuxFlags,
}

impl From<&ActorState> for ActorSnapshot {
    fn from(actor: &ActorState) -> Self {
        Self {
            id: actor.id,
            position: actor.position,
            orientation: actor.orientation,
            velocity: actor.linear_velocity,
            stamina: actor.stamina,
            tired: actor.is_tired(),
            aux: actor.aux,
        }
    }
}

// `server_time` is unix-epoch milliseconds.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub server_time: f64,
    pub actors: Vec<ActorSnapshot>,
}

impl Snapshot {
    pub fn capture(world: &World, server_time: f64) -> Self {
        Self {
            server_time,
            actors: world.iter().map(ActorSnapshot::from).collect(),
        }
    }

    pub fn get(&self, id: ActorId) -> Option<&ActorSnapshot> {
        self.actors.iter().find(|actor| actor.id == id)
    }
}
