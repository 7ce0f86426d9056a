use glam::{Quat, Vec3};

use crate::{actor::ActorState, config::SimConfig, scheduler::Tick};

pub trait PhysicsStep {
    fn step(&mut self, bodies: &mut [&mut ActorState], tick: Tick);
}

// Flat square platform with nothing beyond its edges.
#[derive(Clone, Debug)]
pub struct FlatGround {
    pub gravity: Vec3,
    pub ground_level: f32,
    pub half_extent: f32,
    pub body_radius: f32,
    pub restitution: f32,
    pub friction: f32,
    pub impact_threshold: f32,
}

impl FlatGround {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            gravity: config.gravity,
            ground_level: config.ground_level,
            half_extent: config.platform_half_extent,
            body_radius: config.body_radius,
            restitution: config.restitution,
            friction: config.ground_friction,
            impact_threshold: config.impact_threshold,
        }
    }

    fn is_over_platform(&self, position: Vec3) -> bool {
        position.x.abs() <= self.half_extent && position.z.abs() <= self.half_extent
    }

    fn integrate(&self, body: &mut ActorState, tick: Tick) {
        let dt = tick.dt;
        body.linear_velocity += self.gravity * dt;
        body.position += body.linear_velocity * dt;

        let rest_height = self.ground_level + self.body_radius;
        // Bodies already deep below the surface have fallen past the edge;
        // don't pop them back up when they drift under the platform.
        let in_contact = self.is_over_platform(body.position)
            && body.position.y < rest_height
            && body.position.y > rest_height - self.body_radius;

        if in_contact {
            body.position.y = rest_height;

            let impact_speed = -body.linear_velocity.y;
            if impact_speed > self.impact_threshold {
                body.last_impact_at = tick.now_ms;
                body.linear_velocity.y = impact_speed * self.restitution;
            } else {
                body.linear_velocity.y = body.linear_velocity.y.max(0.0);
            }

            let keep = (1.0 - self.friction * dt).max(0.0);
            body.linear_velocity.x *= keep;
            body.linear_velocity.z *= keep;

            // Rolling without slipping.
            let horizontal = Vec3::new(body.linear_velocity.x, 0.0, body.linear_velocity.z);
            body.angular_velocity = Vec3::Y.cross(horizontal) / self.body_radius.max(f32::EPSILON);
        }

        let spin = body.angular_velocity * dt;
        if spin.length_squared() > 0.0 {
            body.orientation = (Quat::from_scaled_axis(spin) * body.orientation).normalize();
        }
    }
}

impl PhysicsStep for FlatGround {
    fn step(&mut self, bodies: &mut [&mut ActorState], tick: Tick) {
        for body in bodies.iter_mut() {
            self.integrate(body, tick);
        }
    }
}
