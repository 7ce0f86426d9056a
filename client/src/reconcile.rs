use common::{
    actor::{ActorState, MAX_STAMINA, StaminaPhase},
    config::SimConfig,
    snapshot::ActorSnapshot,
};

pub fn reconcile(
    actor: &mut ActorState,
    authoritative: &ActorSnapshot,
    alpha: f32,
    now_ms: f64,
    config: &SimConfig,
) {
    let alpha = alpha.clamp(0.0, 1.0);
    actor.position += (authoritative.position - actor.position) * alpha;
    actor.linear_velocity += (authoritative.velocity - actor.linear_velocity) * alpha;

    actor.stamina = authoritative.stamina.clamp(0.0, MAX_STAMINA);
    actor.aux = authoritative.aux;

    if authoritative.tired {
        // Re-anchor the recharge so local prediction continues from the
        // host's stamina instead of from whenever this client got tired.
        let fraction = (actor.stamina / MAX_STAMINA) as f64;
        actor.phase = StaminaPhase::Tired;
        actor.recharge_started_at = Some(now_ms - fraction * config.recharge_duration_ms);
    } else if actor.phase == StaminaPhase::Tired {
        actor.phase = StaminaPhase::Ready;
        actor.recharge_started_at = None;
    }
}
