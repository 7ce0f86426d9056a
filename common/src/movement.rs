use glam::Vec3;
use tracing::trace;

use crate::{
    actor::{ActorState, MAX_STAMINA, StaminaPhase},
    config::SimConfig,
    input::InputFrame,
    scheduler::Tick,
};

// Drain steps of 1/60s accumulate f32 error; treat anything this close to
// empty as empty so exhaustion lands on the expected tick.
const STAMINA_EPSILON: f32 = 1e-2;

pub fn is_grounded(actor: &ActorState, config: &SimConfig) -> bool {
    actor.position.y <= config.ground_level + config.body_radius + config.grounded_epsilon
}

pub fn resolve(actor: &mut ActorState, input: &mut InputFrame, tick: Tick, config: &SimConfig) {
    let now = tick.now_ms;

    let grounded = is_grounded(actor, config);
    if grounded {
        actor.last_grounded_at = now;
    }
    let coyote = now - actor.last_grounded_at < config.coyote_window_ms;

    let boosting = update_stamina(actor, input.boost, tick, config);
    let max_speed = effective_max_speed(actor, config);

    apply_horizontal_force(actor, input, grounded || coyote, grounded, boosting, tick.dt, config);
    cap_horizontal_speed(actor, max_speed, boosting, config);

    if input.take_jump() && (grounded || coyote) {
        let velocity = &mut actor.linear_velocity;
        velocity.y = velocity.y.max(0.0) + config.jump_impulse / config.mass;
    }
}

pub fn update_stamina(
    actor: &mut ActorState,
    wants_boost: bool,
    tick: Tick,
    config: &SimConfig,
) -> bool {
    match actor.phase {
        StaminaPhase::Ready if wants_boost && actor.stamina > 0.0 => {
            actor.phase = StaminaPhase::Boosting;
        }
        StaminaPhase::Boosting if !wants_boost => {
            actor.phase = StaminaPhase::Ready;
        }
        _ => {}
    }

    match actor.phase {
        StaminaPhase::Boosting => {
            actor.stamina = (actor.stamina - config.stamina_drain_rate * tick.dt).max(0.0);
            if actor.stamina <= STAMINA_EPSILON {
                actor.stamina = 0.0;
                actor.phase = StaminaPhase::Tired;
                actor.recharge_started_at = Some(tick.now_ms);
                trace!(actor = %actor.id, "stamina exhausted");
            }
        }
        StaminaPhase::Tired => {
            let started = *actor.recharge_started_at.get_or_insert(tick.now_ms);
            let fraction = (tick.now_ms - started) / config.recharge_duration_ms.max(1.0);
            actor.stamina = (fraction as f32 * MAX_STAMINA).clamp(0.0, MAX_STAMINA);
            if actor.stamina >= MAX_STAMINA {
                actor.phase = StaminaPhase::Ready;
                actor.recharge_started_at = None;
            }
        }
        StaminaPhase::Ready => {
            let per_second = MAX_STAMINA / (config.recharge_duration_ms.max(1.0) / 1000.0) as f32;
            actor.stamina = (actor.stamina + per_second * tick.dt).min(MAX_STAMINA);
        }
    }

    actor.phase == StaminaPhase::Boosting
}

pub fn effective_max_speed(actor: &ActorState, config: &SimConfig) -> f32 {
    match actor.phase {
        StaminaPhase::Boosting => config.max_boost_speed,
        StaminaPhase::Tired => config.max_normal_speed * config.tired_multiplier,
        StaminaPhase::Ready => config.max_normal_speed,
    }
}

fn apply_horizontal_force(
    actor: &mut ActorState,
    input: &InputFrame,
    has_footing: bool,
    grounded: bool,
    boosting: bool,
    dt: f32,
    config: &SimConfig,
) {
    let wish = input.wish_direction();

    if wish != Vec3::ZERO {
        let mut force = if boosting {
            config.max_boost_force
        } else {
            config.max_move_force
        };
        if !has_footing {
            force *= config.air_control_multiplier;
        }
        actor.linear_velocity += wish * (force / config.mass) * dt;
        return;
    }

    if !grounded {
        return;
    }

    let horizontal = horizontal(actor.linear_velocity);
    let speed = horizontal.length();
    if speed > 0.0 {
        // Braking may stop the actor but never push it backwards.
        let decel = (config.braking_force / config.mass * dt).min(speed);
        actor.linear_velocity -= horizontal / speed * decel;
    }
}

fn cap_horizontal_speed(actor: &mut ActorState, max_speed: f32, boosting: bool, config: &SimConfig) {
    let speed = actor.horizontal_speed();
    if speed <= max_speed {
        return;
    }

    // Leaving boost above the normal cap bleeds speed over a few ticks rather
    // than stopping dead.
    let target = if boosting {
        max_speed
    } else {
        (speed * config.overspeed_decay).max(max_speed)
    };
    let scale = target / speed;
    actor.linear_velocity.x *= scale;
    actor.linear_velocity.z *= scale;
}

// Respawns an actor that fell below the world. Returns `true` if it did.
pub fn recover_out_of_bounds(actor: &mut ActorState, config: &SimConfig) -> bool {
    if actor.position.y >= config.fall_threshold {
        return false;
    }
    actor.respawn();
    true
}

fn horizontal(velocity: Vec3) -> Vec3 {
    Vec3::new(velocity.x, 0.0, velocity.z)
}
