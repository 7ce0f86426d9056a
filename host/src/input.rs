use std::time::{Duration, Instant};

use rand::{rng, seq::SliceRandom};
use tracing::{error, warn};

use crate::{net::HostTransport, peer::HostPeer};
use common::{
    actor::ActorId,
    constants::{MAX_INPUT_MESSAGES_PER_FRAME, MAX_OVER_CAP_STRIKES},
    error::ProtocolError,
    input::InputFrame,
    protocol::Message,
};

const NETWORK_TIME_BUDGET: Duration = Duration::from_millis(2);

// Drains every client's queue and stores the inputs on the peer. Arrival
// order is applied as-is; the channel doesn't promise any other.
pub fn receive_inputs(network: &mut dyn HostTransport, peer: &mut HostPeer) {
    let start_time = Instant::now();
    let mut total_messages_received: u32 = 0;

    let mut is_shedding_load = false;

    let mut client_ids = network.connected_clients();

    // If the host is overloaded, spread the loss across players instead of
    // starving the same one every frame.
    client_ids.shuffle(&mut rng());

    for client_id in client_ids {
        let actor_id = ActorId(client_id);
        let mut messages_this_client = 0;
        let mut ingress_bytes = 0usize;

        while let Some(data) = network.receive_input(client_id) {
            ingress_bytes = ingress_bytes.saturating_add(data.len());
            if total_messages_received % 10 == 0
                && start_time.elapsed() > NETWORK_TIME_BUDGET
                && !is_shedding_load
            {
                warn!("{}", TimeBudgetEvent::Exceeded.message());
                is_shedding_load = true;
            }

            if is_shedding_load {
                continue;
            }

            let Some(link) = peer.link_mut(actor_id) else {
                // Connected at the transport level but not joined yet.
                continue;
            };

            total_messages_received += 1;

            let cap_outcome = apply_input_cap(&mut link.over_cap_strikes, &mut messages_this_client);

            if let Some(event) = cap_outcome.event {
                match event {
                    InputCapEvent::OverLimit { strikes } => {
                        warn!(actor = %actor_id, strikes, "{}", event.message());
                    }
                    InputCapEvent::Disconnected => {
                        error!(actor = %actor_id, "{}", event.message());
                    }
                }
            }

            match cap_outcome.action {
                InputCapAction::Process => {}
                InputCapAction::Skip => {
                    continue;
                }
                InputCapAction::Disconnect => {
                    network.disconnect(client_id);
                    break;
                }
            }

            match decode_input(&data) {
                Ok(frame) => {
                    peer.receive_input(actor_id, &frame);
                }
                Err(error) => {
                    // Loss and garbage look alike on this channel; neither is fatal.
                    warn!(actor = %actor_id, bytes = data.len(), %error, "dropping inbound message");
                }
            }
        }

        // Forgive one strike for every frame spent under the limit.
        if messages_this_client < MAX_INPUT_MESSAGES_PER_FRAME {
            if let Some(link) = peer.link_mut(actor_id) {
                link.over_cap_strikes = link.over_cap_strikes.saturating_sub(1);
            }
        }

        peer.stats.note_ingress_bytes(ingress_bytes);
    }
}

fn decode_input(data: &[u8]) -> Result<InputFrame, ProtocolError> {
    match Message::decode(data)? {
        Message::Input(frame) => Ok(frame),
        other => Err(ProtocolError::UnexpectedMessage(other.variant_name())),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputCapAction {
    Process,
    Skip,
    Disconnect,
}

struct InputCapOutcome {
    action: InputCapAction,
    event: Option<InputCapEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputCapEvent {
    OverLimit { strikes: u8 },
    Disconnected,
}

impl InputCapEvent {
    fn message(&self) -> &'static str {
        match self {
            InputCapEvent::OverLimit { .. } => {
                "exceeded the per-frame input limit; discarding further inputs this frame"
            }
            InputCapEvent::Disconnected => {
                "repeatedly exceeded the input limit; disconnecting"
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimeBudgetEvent {
    Exceeded,
}

impl TimeBudgetEvent {
    fn message(&self) -> &'static str {
        match self {
            TimeBudgetEvent::Exceeded => {
                "time budget exceeded; dropping remaining inputs to flush the queue"
            }
        }
    }
}

fn apply_input_cap(strikes: &mut u8, messages_received: &mut u32) -> InputCapOutcome {
    if *messages_received >= MAX_INPUT_MESSAGES_PER_FRAME {
        let mut event = None;

        // Only strike once, when the limit is first hit.
        if *messages_received == MAX_INPUT_MESSAGES_PER_FRAME {
            *strikes = strikes.saturating_add(1);

            if *strikes >= MAX_OVER_CAP_STRIKES {
                event = Some(InputCapEvent::Disconnected);
            } else {
                event = Some(InputCapEvent::OverLimit { strikes: *strikes });
            }
        }

        *messages_received += 1;

        let action = if *strikes >= MAX_OVER_CAP_STRIKES {
            InputCapAction::Disconnect
        } else {
            InputCapAction::Skip
        };

        return InputCapOutcome { action, event };
    }

    *messages_received += 1;
    InputCapOutcome {
        action: InputCapAction::Process,
        event: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MockHostTransport;
    use common::{config::SimConfig, snapshot::Snapshot};

    fn input_bytes(frame: InputFrame) -> Vec<u8> {
        Message::Input(frame).encode().unwrap()
    }

    fn setup() -> (MockHostTransport, HostPeer) {
        let mut network = MockHostTransport::new();
        let mut peer = HostPeer::new(SimConfig::default());
        network.add_client(1);
        peer.join(ActorId(1));
        (network, peer)
    }

    #[test]
    fn inputs_are_applied_in_arrival_order() {
        let (mut network, mut peer) = setup();
        network.queue_input_bytes(
            1,
            input_bytes(InputFrame {
                move_x: 1.0,
                jump_edge: true,
                seq: 5,
                ..InputFrame::default()
            }),
        );
        network.queue_input_bytes(
            1,
            input_bytes(InputFrame {
                move_x: -0.5,
                seq: 4,
                ..InputFrame::default()
            }),
        );

        receive_inputs(&mut network, &mut peer);

        let stored = peer.input(ActorId(1)).unwrap();
        assert_eq!(stored.move_x, -0.5);
        assert_eq!(stored.seq, 4);
        assert!(stored.jump_edge);
        assert!(peer.stats.ingress_bytes > 0);
    }

    #[test]
    fn malformed_and_unexpected_messages_are_dropped() {
        let (mut network, mut peer) = setup();
        network.queue_input_bytes(1, vec![0xde, 0xad, 0xbe, 0xef]);
        network.queue_input_bytes(1, Message::Snapshot(Snapshot::default()).encode().unwrap());
        network.queue_input_bytes(
            1,
            input_bytes(InputFrame {
                move_y: 1.0,
                seq: 1,
                ..InputFrame::default()
            }),
        );

        receive_inputs(&mut network, &mut peer);

        assert!(network.disconnected_clients.is_empty());
        assert_eq!(peer.input(ActorId(1)).unwrap().move_y, 1.0);
    }

    #[test]
    fn flood_is_capped_per_frame() {
        let (mut network, mut peer) = setup();
        for seq in 0..MAX_INPUT_MESSAGES_PER_FRAME + 10 {
            network.queue_input_bytes(
                1,
                input_bytes(InputFrame {
                    seq,
                    ..InputFrame::default()
                }),
            );
        }

        receive_inputs(&mut network, &mut peer);

        assert_eq!(
            peer.input(ActorId(1)).unwrap().seq,
            MAX_INPUT_MESSAGES_PER_FRAME - 1
        );
        assert_eq!(peer.link_mut(ActorId(1)).unwrap().over_cap_strikes, 1);
        assert_eq!(network.pending_inputs(1), 0);
    }

    #[test]
    fn repeated_floods_disconnect() {
        let (mut network, mut peer) = setup();
        for _ in 0..MAX_OVER_CAP_STRIKES {
            for _ in 0..=MAX_INPUT_MESSAGES_PER_FRAME {
                network.queue_input_bytes(1, input_bytes(InputFrame::default()));
            }
            receive_inputs(&mut network, &mut peer);
        }

        assert_eq!(network.disconnected_clients, vec![1]);
    }

    #[test]
    fn quiet_frames_forgive_strikes() {
        let (mut network, mut peer) = setup();
        peer.link_mut(ActorId(1)).unwrap().over_cap_strikes = 3;

        receive_inputs(&mut network, &mut peer);

        assert_eq!(peer.link_mut(ActorId(1)).unwrap().over_cap_strikes, 2);
    }

    #[test]
    fn cap_strikes_once_per_frame() {
        let mut strikes = 0;
        let mut received = MAX_INPUT_MESSAGES_PER_FRAME;

        let first = apply_input_cap(&mut strikes, &mut received);
        let second = apply_input_cap(&mut strikes, &mut received);

        assert_eq!(first.action, InputCapAction::Skip);
        assert_eq!(first.event, Some(InputCapEvent::OverLimit { strikes: 1 }));
        assert_eq!(second.event, None);
        assert_eq!(strikes, 1);
    }
}
