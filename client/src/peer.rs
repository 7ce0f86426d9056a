use std::collections::{HashMap, HashSet};

use tracing::{debug, info, trace, warn};

use crate::{input::InputChannel, net::NetworkHandle, reconcile::reconcile};
use common::{
    actor::{ActorId, ActorState, StaminaPhase},
    config::SimConfig,
    error::ProtocolError,
    input::{Controls, InputFrame},
    interpolation::{InterpolationBuffer, InterpolationSample, Pose},
    net::AppChannel,
    physics::{FlatGround, PhysicsStep},
    protocol::Message,
    scheduler::Scheduler,
    snapshot::{ActorSnapshot, Snapshot},
    world::World,
};

pub struct ClientPeer {
    own_id: ActorId,
    world: World,
    scheduler: Scheduler,
    physics: Box<dyn PhysicsStep>,
    inputs: HashMap<ActorId, InputFrame>,
    channel: InputChannel,
    buffers: HashMap<ActorId, InterpolationBuffer>,
    latest_server_time: Option<f64>,
    snapshots_received: u64,
}

impl ClientPeer {
    pub fn new(own_id: ActorId, config: SimConfig) -> Self {
        let physics = Box::new(FlatGround::from_config(&config));
        Self::with_physics(own_id, config, physics)
    }

    pub fn with_physics(own_id: ActorId, config: SimConfig, physics: Box<dyn PhysicsStep>) -> Self {
        let channel = InputChannel::new(config.input_send_rate);
        let scheduler = Scheduler::new(&config);
        Self {
            own_id,
            world: World::new(config),
            scheduler,
            physics,
            inputs: HashMap::new(),
            channel,
            buffers: HashMap::new(),
            latest_server_time: None,
            snapshots_received: 0,
        }
    }

    pub fn set_controls(&mut self, controls: &Controls) {
        let frame = self.channel.sample(controls);
        if self.world.contains(self.own_id) {
            self.inputs.entry(self.own_id).or_default().absorb(&frame);
        }
    }

    // Snapshots are full, so a remote actor missing from the newest one has
    // left. An older snapshot arriving late only adds samples to actors we
    // still know about; it never removes or revives anyone.
    pub fn on_snapshot(&mut self, snapshot: &Snapshot) {
        self.snapshots_received += 1;
        let is_newest = self
            .latest_server_time
            .is_none_or(|latest| snapshot.server_time > latest);
        if is_newest {
            self.latest_server_time = Some(snapshot.server_time);
        } else {
            trace!(server_time = snapshot.server_time, "late snapshot");
        }
        let config = self.world.config().clone();
        let capacity = config.interpolation_buffer_length;
        let mut present = HashSet::with_capacity(snapshot.actors.len());

        for entry in &snapshot.actors {
            present.insert(entry.id);

            if entry.id == self.own_id {
                self.apply_own(entry, &config);
                continue;
            }

            let sample = InterpolationSample::from_snapshot(snapshot.server_time, entry);
            if !self.world.contains(entry.id) {
                if !is_newest {
                    continue;
                }
                debug!(actor = %entry.id, "remote actor appeared");
                let actor = self.world.spawn(entry.id, entry.position);
                write_pose(actor, &Pose::from(&sample));
            }
            self.buffers
                .entry(entry.id)
                .or_insert_with(|| InterpolationBuffer::new(capacity))
                .push(sample);
        }

        if !is_newest {
            return;
        }
        let departed: Vec<ActorId> = self
            .world
            .ids()
            .into_iter()
            .filter(|id| *id != self.own_id && !present.contains(id))
            .collect();
        for id in departed {
            self.remove_actor(id);
        }
    }

    fn apply_own(&mut self, entry: &ActorSnapshot, config: &SimConfig) {
        let now_ms = self.scheduler.now_ms();
        if let Some(actor) = self.world.get_mut(self.own_id) {
            reconcile(actor, entry, config.reconciliation_alpha, now_ms, config);
            return;
        }

        // First contact: nothing to blend from yet.
        let actor = self.world.spawn(self.own_id, entry.position);
        actor.orientation = entry.orientation;
        actor.linear_velocity = entry.velocity;
        reconcile(actor, entry, 1.0, now_ms, config);
        self.inputs.entry(self.own_id).or_default();
        info!(actor = %self.own_id, "own actor spawned from host snapshot");
    }

    pub fn frame(
        &mut self,
        network: &mut dyn NetworkHandle,
        elapsed_ms: f64,
        now_ms: f64,
    ) -> Result<u32, ProtocolError> {
        while let Some(data) = network.receive_message(AppChannel::Unreliable) {
            match Message::decode(&data) {
                Ok(Message::Snapshot(snapshot)) => self.on_snapshot(&snapshot),
                Ok(other) => {
                    trace!(kind = other.variant_name(), "ignoring message not meant for clients");
                }
                Err(error) => {
                    warn!(bytes = data.len(), %error, "dropping inbound message");
                }
            }
        }

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

        if let Some(frame) = self.channel.poll_send(elapsed_ms) {
            if network.is_connected() {
                network.send_message(AppChannel::Unreliable, Message::Input(frame).encode()?);
            }
        }

        self.place_remotes(now_ms);
        Ok(ticks)
    }

    fn place_remotes(&mut self, now_ms: f64) {
        let render_time = now_ms - self.world.config().interpolation_delay_ms;
        for (id, buffer) in &mut self.buffers {
            let Some(pose) = buffer.sample_at(render_time) else {
                continue;
            };
            if let Some(actor) = self.world.get_mut(*id) {
                write_pose(actor, &pose);
            }
        }
    }

    pub fn remove_actor(&mut self, id: ActorId) -> bool {
        if id == self.own_id {
            return false;
        }
        self.buffers.remove(&id);
        self.inputs.remove(&id);
        let removed = self.world.despawn(id).is_some();
        if removed {
            debug!(actor = %id, "remote actor removed");
        }
        removed
    }

    pub fn own_actor(&self) -> Option<&ActorState> {
        self.world.get(self.own_id)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn buffer(&self, id: ActorId) -> Option<&InterpolationBuffer> {
        self.buffers.get(&id)
    }

    pub fn snapshots_received(&self) -> u64 {
        self.snapshots_received
    }
}

fn write_pose(actor: &mut ActorState, pose: &Pose) {
    actor.position = pose.position;
    actor.orientation = pose.orientation;
    actor.stamina = pose.stamina;
    actor.aux = pose.aux;
    actor.phase = if pose.tired {
        StaminaPhase::Tired
    } else {
        StaminaPhase::Ready
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MockNetwork;
    use common::actor::AuxFlags;
    use glam::{Quat, Vec3, vec3};

    const FRAME_MS: f64 = 1000.0 / 60.0 + 0.01;
    const OWN: ActorId = ActorId(7);

    fn entry(id: ActorId, position: Vec3) -> ActorSnapshot {
        ActorSnapshot {
            id,
            position,
            orientation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            stamina: 100.0,
            tired: false,
            aux: AuxFlags::default(),
        }
    }

    fn snapshot(server_time: f64, actors: Vec<ActorSnapshot>) -> Snapshot {
        Snapshot { server_time, actors }
    }

    fn joined_peer() -> ClientPeer {
        let mut peer = ClientPeer::new(OWN, SimConfig::default());
        let spawn = SimConfig::default().spawn_point(1);
        peer.on_snapshot(&snapshot(0.0, vec![entry(OWN, spawn)]));
        peer
    }

    #[test]
    fn first_snapshot_spawns_the_own_actor_where_the_host_has_it() {
        let peer = joined_peer();
        let own = peer.own_actor().unwrap();
        assert_eq!(own.position, SimConfig::default().spawn_point(1));
        assert!(peer.buffer(OWN).is_none());
    }

    #[test]
    fn controls_before_the_first_snapshot_do_not_create_an_actor() {
        let mut peer = ClientPeer::new(OWN, SimConfig::default());
        let mut network = MockNetwork::new();
        peer.set_controls(&Controls {
            move_x: 1.0,
            ..Controls::default()
        });
        peer.frame(&mut network, FRAME_MS, 0.0).unwrap();
        assert!(peer.own_actor().is_none());
    }

    #[test]
    fn own_actor_is_predicted_without_waiting_for_the_host() {
        let mut peer = joined_peer();
        let mut network = MockNetwork::new();
        let start = peer.own_actor().unwrap().position;

        for _ in 0..10 {
            peer.set_controls(&Controls {
                move_x: 1.0,
                ..Controls::default()
            });
            peer.frame(&mut network, FRAME_MS, 0.0).unwrap();
        }

        let own = peer.own_actor().unwrap();
        assert!(own.position.x > start.x);
        assert!(own.linear_velocity.x > 0.0);
    }

    #[test]
    fn host_snapshot_pulls_the_prediction_a_quarter_of_the_way() {
        let mut peer = joined_peer();
        let before = peer.own_actor().unwrap().position;
        let host_position = before + vec3(4.0, 0.0, 0.0);

        peer.on_snapshot(&snapshot(100.0, vec![entry(OWN, host_position)]));

        let after = peer.own_actor().unwrap().position;
        assert!((after.x - (before.x + 1.0)).abs() < 1e-4);
    }

    #[test]
    fn remote_actors_are_interpolated_behind_the_clock() {
        let mut peer = joined_peer();
        let mut network = MockNetwork::new();
        let remote = ActorId(3);
        peer.on_snapshot(&snapshot(1000.0, vec![entry(remote, Vec3::ZERO)]));
        peer.on_snapshot(&snapshot(1100.0, vec![entry(remote, vec3(10.0, 0.0, 0.0))]));

        // 120ms behind 1170 is 1050, halfway between the two samples.
        peer.frame(&mut network, 0.0, 1170.0).unwrap();

        let actor = peer.world().get(remote).unwrap();
        assert!((actor.position.x - 5.0).abs() < 1e-4);
    }

    #[test]
    fn remote_with_one_sample_stays_frozen() {
        let mut peer = joined_peer();
        let mut network = MockNetwork::new();
        let remote = ActorId(3);
        peer.on_snapshot(&snapshot(1000.0, vec![entry(remote, vec3(2.0, 1.0, 0.0))]));

        peer.frame(&mut network, FRAME_MS, 5000.0).unwrap();

        assert_eq!(peer.world().get(remote).unwrap().position, vec3(2.0, 1.0, 0.0));
    }

    #[test]
    fn remote_tiredness_comes_from_the_snapshot() {
        let mut peer = joined_peer();
        let mut network = MockNetwork::new();
        let remote = ActorId(3);
        let tired = ActorSnapshot {
            stamina: 0.0,
            tired: true,
            ..entry(remote, Vec3::ZERO)
        };
        peer.on_snapshot(&snapshot(1000.0, vec![entry(remote, Vec3::ZERO)]));
        peer.on_snapshot(&snapshot(1100.0, vec![tired]));

        peer.frame(&mut network, 0.0, 1300.0).unwrap();

        let actor = peer.world().get(remote).unwrap();
        assert!(actor.is_tired());
        assert_eq!(actor.stamina, 0.0);
    }

    #[test]
    fn actors_missing_from_a_snapshot_are_pruned() {
        let mut peer = joined_peer();
        let spawn = SimConfig::default().spawn_point(1);
        peer.on_snapshot(&snapshot(
            100.0,
            vec![entry(OWN, spawn), entry(ActorId(3), Vec3::ZERO)],
        ));
        assert!(peer.world().contains(ActorId(3)));

        peer.on_snapshot(&snapshot(200.0, vec![entry(OWN, spawn)]));

        assert!(!peer.world().contains(ActorId(3)));
        assert!(peer.buffer(ActorId(3)).is_none());
        assert!(peer.own_actor().is_some());
    }

    #[test]
    fn late_snapshot_without_a_remote_keeps_its_history() {
        let mut peer = joined_peer();
        let mut network = MockNetwork::new();
        let remote = ActorId(3);
        for (server_time, x) in [(1000.0, 0.0), (1066.0, 2.0), (1133.0, 4.0)] {
            peer.on_snapshot(&snapshot(server_time, vec![entry(remote, vec3(x, 0.0, 0.0))]));
        }

        // Sent before the remote joined, delivered after.
        peer.on_snapshot(&snapshot(950.0, Vec::new()));
        assert!(peer.world().contains(remote));

        peer.on_snapshot(&snapshot(1200.0, vec![entry(remote, vec3(6.0, 0.0, 0.0))]));
        peer.frame(&mut network, 0.0, 1190.0).unwrap();

        // 1070 sits just past the 1066 sample.
        let expected = 2.0 + 2.0 * (4.0 / 67.0);
        let actor = peer.world().get(remote).unwrap();
        assert!((actor.position.x - expected).abs() < 1e-3, "x = {}", actor.position.x);
        assert_eq!(peer.buffer(remote).unwrap().len(), 3);
    }

    #[test]
    fn late_snapshot_does_not_revive_a_departed_remote() {
        let mut peer = joined_peer();
        let remote = ActorId(3);
        peer.on_snapshot(&snapshot(1000.0, vec![entry(remote, Vec3::ZERO)]));
        peer.on_snapshot(&snapshot(1100.0, Vec::new()));
        assert!(!peer.world().contains(remote));

        peer.on_snapshot(&snapshot(1050.0, vec![entry(remote, Vec3::ZERO)]));

        assert!(!peer.world().contains(remote));
        assert!(peer.buffer(remote).is_none());
    }

    #[test]
    fn late_snapshot_still_feeds_a_known_remote() {
        let mut peer = joined_peer();
        let remote = ActorId(3);
        peer.on_snapshot(&snapshot(1000.0, vec![entry(remote, Vec3::ZERO)]));
        peer.on_snapshot(&snapshot(1100.0, vec![entry(remote, Vec3::ZERO)]));

        peer.on_snapshot(&snapshot(1050.0, vec![entry(remote, Vec3::ZERO)]));

        assert_eq!(peer.buffer(remote).unwrap().len(), 3);
    }

    #[test]
    fn own_actor_cannot_be_removed() {
        let mut peer = joined_peer();
        assert!(!peer.remove_actor(OWN));
        assert!(peer.own_actor().is_some());
    }

    #[test]
    fn inputs_are_sent_at_the_channel_rate() {
        let mut peer = joined_peer();
        let mut network = MockNetwork::new();
        network.set_connected(true);

        for _ in 0..60 {
            peer.set_controls(&Controls::default());
            peer.frame(&mut network, FRAME_MS, 0.0).unwrap();
        }

        let seqs: Vec<u32> = network
            .sent_messages
            .iter()
            .map(|(_, data)| match Message::decode(data).unwrap() {
                Message::Input(frame) => frame.seq,
                other => panic!("unexpected {}", other.variant_name()),
            })
            .collect();
        assert_eq!(seqs.len(), 30);
        assert_eq!(seqs.first(), Some(&1));
        assert_eq!(seqs.last(), Some(&30));
    }

    #[test]
    fn nothing_is_sent_while_disconnected() {
        let mut peer = joined_peer();
        let mut network = MockNetwork::new();

        for _ in 0..10 {
            peer.frame(&mut network, FRAME_MS, 0.0).unwrap();
        }

        assert!(network.sent_messages.is_empty());
    }

    #[test]
    fn snapshots_arrive_through_the_network() {
        let mut peer = ClientPeer::new(OWN, SimConfig::default());
        let mut network = MockNetwork::new();
        network.queue_message(Message::Snapshot(snapshot(0.0, vec![entry(OWN, Vec3::ZERO)])));
        network.queue_raw(vec![0xff, 0x00, 0x13]);

        peer.frame(&mut network, 0.0, 0.0).unwrap();

        assert_eq!(peer.snapshots_received(), 1);
        assert!(peer.own_actor().is_some());
    }
}
