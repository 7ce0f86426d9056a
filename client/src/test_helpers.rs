use std::collections::VecDeque;

use crate::net::NetworkHandle;
use common::{net::AppChannel, protocol::Message};

#[derive(Default)]
pub struct MockNetwork {
    is_connected_val: bool,
    is_disconnected_val: bool,
    disconnect_reason_val: String,
    messages_to_receive: VecDeque<Vec<u8>>,
    pub sent_messages: VecDeque<(AppChannel, Vec<u8>)>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.is_connected_val = connected;
    }

    pub fn set_disconnected(&mut self, disconnected: bool, reason: &str) {
        self.is_disconnected_val = disconnected;
        self.disconnect_reason_val = reason.to_string();
    }

    pub fn queue_message(&mut self, message: Message) {
        let data = message.encode().expect("failed to serialize test message");
        self.messages_to_receive.push_back(data);
    }

    pub fn queue_raw(&mut self, data: Vec<u8>) {
        self.messages_to_receive.push_back(data);
    }
}

impl NetworkHandle for MockNetwork {
    fn is_connected(&self) -> bool {
        self.is_connected_val
    }

    fn is_disconnected(&self) -> bool {
        self.is_disconnected_val
    }

    fn get_disconnect_reason(&self) -> String {
        self.disconnect_reason_val.clone()
    }

    fn send_message(&mut self, channel: AppChannel, message: Vec<u8>) {
        self.sent_messages.push_back((channel, message));
    }

    fn receive_message(&mut self, _channel: AppChannel) -> Option<Vec<u8>> {
        self.messages_to_receive.pop_front()
    }
}
