use std::fmt;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

pub const MAX_STAMINA: f32 = 100.0;

// Clients use their transport client id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u64);

impl ActorId {
    pub const HOST: ActorId = ActorId(0);
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StaminaPhase {
    #[default]
    Ready,
    Boosting,
    Tired,
}

// Host-decided race facts. The simulation never reads them; it only carries them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxFlags {
    pub checkpoint_index: u32,
    pub finished: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ActorState {
    pub id: ActorId,
    pub position: Vec3,
    pub orientation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,

    pub stamina: f32,
    pub phase: StaminaPhase,
    pub recharge_started_at: Option<f64>,

    // Simulated-clock milliseconds.
    pub last_grounded_at: f64,
    pub last_impact_at: f64,

    pub input_seq: u32,
    pub aux: AuxFlags,
    pub spawn_point: Vec3,
}

impl ActorState {
    pub fn spawn(id: ActorId, spawn_point: Vec3) -> Self {
        Self {
            id,
            position: spawn_point,
            orientation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            stamina: MAX_STAMINA,
            phase: StaminaPhase::Ready,
            recharge_started_at: None,
            last_grounded_at: f64::NEG_INFINITY,
            last_impact_at: f64::NEG_INFINITY,
            input_seq: 0,
            aux: AuxFlags::default(),
            spawn_point,
        }
    }

    pub fn is_tired(&self) -> bool {
        self.phase == StaminaPhase::Tired
    }

    // Puts the body back on its spawn point at rest. Gameplay state is untouched.
    pub fn respawn(&mut self) {
        self.position = self.spawn_point;
        self.orientation = Quat::IDENTITY;
        self.linear_velocity = Vec3::ZERO;
        self.angular_velocity = Vec3::ZERO;
    }

    pub fn horizontal_speed(&self) -> f32 {
        Vec3::new(self.linear_velocity.x, 0.0, self.linear_velocity.z).length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec3;

    #[test]
    fn spawned_actor_is_at_rest_with_full_stamina() {
        let actor = ActorState::spawn(ActorId(7), vec3(1.0, 2.0, 3.0));
        assert_eq!(actor.position, vec3(1.0, 2.0, 3.0));
        assert_eq!(actor.linear_velocity, Vec3::ZERO);
        assert_eq!(actor.stamina, MAX_STAMINA);
        assert_eq!(actor.phase, StaminaPhase::Ready);
    }

    #[test]
    fn respawn_keeps_stamina_and_race_progress() {
        let mut actor = ActorState::spawn(ActorId(1), vec3(0.0, 1.0, 0.0));
        actor.position = vec3(10.0, -30.0, 4.0);
        actor.linear_velocity = vec3(1.0, -9.0, 0.0);
        actor.angular_velocity = vec3(0.0, 3.0, 0.0);
        actor.orientation = Quat::from_rotation_y(1.0);
        actor.stamina = 42.0;
        actor.aux.checkpoint_index = 3;

        actor.respawn();

        assert_eq!(actor.position, vec3(0.0, 1.0, 0.0));
        assert_eq!(actor.linear_velocity, Vec3::ZERO);
        assert_eq!(actor.angular_velocity, Vec3::ZERO);
        assert_eq!(actor.orientation, Quat::IDENTITY);
        assert_eq!(actor.stamina, 42.0);
        assert_eq!(actor.aux.checkpoint_index, 3);
    }
}
