use std::{net::SocketAddr, time::Duration};

use renet::RenetClient;
use renet_netcode::ConnectToken;

use common::net::AppChannel;

const TOKEN_EXPIRE_SECS: u64 = 3600;
const TIMEOUT_SECS: i32 = 15;

pub trait NetworkHandle {
    fn is_connected(&self) -> bool;
    fn is_disconnected(&self) -> bool;
    fn get_disconnect_reason(&self) -> String;
    fn send_message(&mut self, channel: AppChannel, message: Vec<u8>);
    fn receive_message(&mut self, channel: AppChannel) -> Option<Vec<u8>>;
}

pub struct RenetNetworkHandle<'a> {
    pub client: &'a mut RenetClient,
}

impl NetworkHandle for RenetNetworkHandle<'_> {
    fn is_connected(&self) -> bool {
        self.client.is_connected()
    }

    fn is_disconnected(&self) -> bool {
        self.client.is_disconnected()
    }

    fn get_disconnect_reason(&self) -> String {
        self.client
            .disconnect_reason()
            .map_or_else(|| "unknown".to_string(), |reason| reason.to_string())
    }

    fn send_message(&mut self, channel: AppChannel, message: Vec<u8>) {
        self.client.send_message(channel, message);
    }

    fn receive_message(&mut self, channel: AppChannel) -> Option<Vec<u8>> {
        self.client.receive_message(channel).map(|bytes| bytes.to_vec())
    }
}

// Self-issued until there is a matchmaker to hand tokens out.
pub fn create_connect_token(
    current_time: Duration,
    protocol_id: u64,
    client_id: u64,
    server_addr: SocketAddr,
    private_key: &[u8; 32],
) -> Result<ConnectToken, String> {
    ConnectToken::generate(
        current_time,
        protocol_id,
        TOKEN_EXPIRE_SECS,
        client_id,
        TIMEOUT_SECS,
        vec![server_addr],
        None,
        private_key,
    )
    .map_err(|e| e.to_string())
}
