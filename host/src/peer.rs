use std::collections::HashMap;

use tracing::{debug, info, trace, warn};

use crate::{net::HostTransport, stats::NetStats};
use common::{
    actor::{ActorId, ActorState},
    config::SimConfig,
    error::ProtocolError,
    input::{Controls, InputFrame, JumpLatch},
    physics::{FlatGround, PhysicsStep},
    protocol::Message,
    scheduler::Scheduler,
    sequence::{SequenceGuard, SequencePolicy},
    snapshot::Snapshot,
    time::Cadence,
    world::World,
};

pub struct ClientLink {
    guard: Box<dyn SequenceGuard>,
    pub over_cap_strikes: u8,
}

impl ClientLink {
    fn new(policy: SequencePolicy) -> Self {
        Self {
            guard: policy.guard(),
            over_cap_strikes: 0,
        }
    }
}

pub struct HostPeer {
    world: World,
    scheduler: Scheduler,
    physics: Box<dyn PhysicsStep>,
    inputs: HashMap<ActorId, InputFrame>,
    links: HashMap<ActorId, ClientLink>,
    policy: SequencePolicy,
    local_latch: JumpLatch,
    local_seq: u32,
    snapshot_cadence: Cadence,
    awaiting_first_snapshot: Vec<ActorId>,
    next_spawn_slot: usize,
    pub stats: NetStats,
}

impl HostPeer {
    pub fn new(config: SimConfig) -> Self {
        let physics = Box::new(FlatGround::from_config(&config));
        Self::with_physics(config, physics)
    }

    pub fn with_physics(config: SimConfig, physics: Box<dyn PhysicsStep>) -> Self {
        let scheduler = Scheduler::new(&config);
        let snapshot_cadence = Cadence::from_rate(config.snapshot_rate);
        let mut peer = Self {
            world: World::new(config),
            scheduler,
            physics,
            inputs: HashMap::new(),
            links: HashMap::new(),
            policy: SequencePolicy::default(),
            local_latch: JumpLatch::default(),
            local_seq: 0,
            snapshot_cadence,
            awaiting_first_snapshot: Vec::new(),
            next_spawn_slot: 0,
            stats: NetStats::new(),
        };
        peer.spawn_actor(ActorId::HOST);
        peer
    }

    // Applies to clients that join after this call.
    pub fn with_sequence_policy(mut self, policy: SequencePolicy) -> Self {
        self.policy = policy;
        self
    }

    fn spawn_actor(&mut self, id: ActorId) {
        let spawn_point = self.world.config().spawn_point(self.next_spawn_slot);
        self.next_spawn_slot += 1;
        self.world.spawn(id, spawn_point);
        self.inputs.insert(id, InputFrame::default());
    }

    // The client receives a full snapshot on the next frame.
    pub fn join(&mut self, id: ActorId) -> bool {
        if id == ActorId::HOST {
            warn!(actor = %id, "client id collides with the host actor; refusing");
            return false;
        }
        if self.world.contains(id) {
            debug!(actor = %id, "duplicate join ignored");
            return true;
        }

        self.spawn_actor(id);
        self.links.insert(id, ClientLink::new(self.policy));
        self.awaiting_first_snapshot.push(id);
        info!(actor = %id, players = self.world.len(), "player joined");
        true
    }

    pub fn leave(&mut self, id: ActorId) -> bool {
        if id == ActorId::HOST {
            return false;
        }
        self.inputs.remove(&id);
        self.links.remove(&id);
        self.awaiting_first_snapshot.retain(|&pending| pending != id);
        let removed = self.world.despawn(id).is_some();
        if removed {
            info!(actor = %id, players = self.world.len(), "player left");
        }
        removed
    }

    pub fn set_local_controls(&mut self, controls: &Controls) {
        let jump_edge = self.local_latch.edge(controls.jump);
        self.local_seq = self.local_seq.wrapping_add(1);
        let frame = controls.to_frame(jump_edge, self.local_seq);
        self.inputs.entry(ActorId::HOST).or_default().absorb(&frame);
    }

    // Stores an input frame received from a client. Returns `false` if the
    // actor is unknown or the sequence guard rejected it.
    pub fn receive_input(&mut self, id: ActorId, frame: &InputFrame) -> bool {
        let (Some(link), Some(stored)) = (self.links.get_mut(&id), self.inputs.get_mut(&id)) else {
            trace!(actor = %id, "input for unknown actor dropped");
            return false;
        };

        if !link.guard.admit(frame.seq) {
            trace!(actor = %id, seq = frame.seq, "stale input rejected");
            self.stats.inputs_rejected += 1;
            return false;
        }

        stored.absorb(frame);
        if let Some(actor) = self.world.get_mut(id) {
            actor.input_seq = frame.seq;
        }
        self.stats.inputs_applied += 1;
        true
    }

    pub fn frame(
        &mut self,
        network: &mut dyn HostTransport,
        elapsed_ms: f64,
        now_ms: f64,
    ) -> Result<u32, ProtocolError> {
        let Self {
            world,
            scheduler,
            physics,
            inputs,
            ..
        } = self;
        let ticks = scheduler.advance(elapsed_ms, |tick| {
            world.step(tick, inputs, physics.as_mut());
        });

        if !self.awaiting_first_snapshot.is_empty() {
            let payload = Message::Snapshot(self.snapshot(now_ms)).encode()?;
            for id in std::mem::take(&mut self.awaiting_first_snapshot) {
                self.stats.note_egress_bytes(payload.len());
                network.send_snapshot(id.0, payload.clone());
            }
        }

        let due = self.snapshot_cadence.ready(elapsed_ms);
        let recipients = network.connected_clients().len();
        if due && recipients > 0 {
            let payload = Message::Snapshot(self.snapshot(now_ms)).encode()?;
            self.stats
                .note_egress_bytes(payload.len().saturating_mul(recipients));
            self.stats.snapshots_sent += 1;
            trace!(bytes = payload.len(), recipients, "snapshot broadcast");
            network.broadcast_snapshot(payload);
        }

        Ok(ticks)
    }

    pub fn snapshot(&self, server_time: f64) -> Snapshot {
        Snapshot::capture(&self.world, server_time)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    // Gameplay hook: race rules write checkpoint and finish flags here.
    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut ActorState> {
        self.world.get_mut(id)
    }

    pub fn input(&self, id: ActorId) -> Option<&InputFrame> {
        self.inputs.get(&id)
    }

    pub fn link_mut(&mut self, id: ActorId) -> Option<&mut ClientLink> {
        self.links.get_mut(&id)
    }
}
