use std::{net::SocketAddr, time::Duration};

use renet::{RenetServer, ServerEvent};
use renet_netcode::{ServerAuthentication, ServerConfig};

use common::{constants::MAX_PLAYERS, net::AppChannel};

pub enum PeerEvent {
    Joined { client_id: u64 },
    Left { client_id: u64, reason: String },
}

// What the host needs from the transport. Inputs come in and snapshots go out
// on the one unreliable channel; nothing here waits for delivery.
pub trait HostTransport {
    fn next_event(&mut self) -> Option<PeerEvent>;
    fn connected_clients(&self) -> Vec<u64>;
    fn receive_input(&mut self, client_id: u64) -> Option<Vec<u8>>;
    // Full snapshot for a single peer, e.g. one that has just joined.
    fn send_snapshot(&mut self, client_id: u64, payload: Vec<u8>);
    fn broadcast_snapshot(&mut self, payload: Vec<u8>);
    fn disconnect(&mut self, client_id: u64);
}

pub struct RenetHostTransport<'a> {
    pub server: &'a mut RenetServer,
}

impl HostTransport for RenetHostTransport<'_> {
    fn next_event(&mut self) -> Option<PeerEvent> {
        match self.server.get_event()? {
            ServerEvent::ClientConnected { client_id } => Some(PeerEvent::Joined { client_id }),
            ServerEvent::ClientDisconnected { client_id, reason } => Some(PeerEvent::Left {
                client_id,
                reason: reason.to_string(),
            }),
        }
    }

    fn connected_clients(&self) -> Vec<u64> {
        self.server.clients_id()
    }

    fn receive_input(&mut self, client_id: u64) -> Option<Vec<u8>> {
        self.server
            .receive_message(client_id, AppChannel::Unreliable)
            .map(|bytes| bytes.to_vec())
    }

    fn send_snapshot(&mut self, client_id: u64, payload: Vec<u8>) {
        self.server
            .send_message(client_id, AppChannel::Unreliable, payload);
    }

    fn broadcast_snapshot(&mut self, payload: Vec<u8>) {
        self.server.broadcast_message(AppChannel::Unreliable, payload);
    }

    fn disconnect(&mut self, client_id: u64) {
        self.server.disconnect(client_id);
    }
}

// Secure netcode: clients must present a token signed with the shared key.
pub fn build_server_config(
    current_time: Duration,
    protocol_id: u64,
    listen_addr: SocketAddr,
    private_key: [u8; 32],
) -> ServerConfig {
    ServerConfig {
        current_time,
        max_clients: MAX_PLAYERS,
        protocol_id,
        public_addresses: vec![listen_addr],
        authentication: ServerAuthentication::Secure { private_key },
    }
}
