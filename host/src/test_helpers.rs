use std::collections::{HashMap, VecDeque};

use crate::net::{HostTransport, PeerEvent};

#[derive(Default)]
pub struct MockHostTransport {
    /// **Incoming Event Queue:** joins and leaves drained by `process_events`
    /// through `next_event()`.
    events: VecDeque<PeerEvent>,

    /// **Incoming Input Queue (Client -> Host):** raw payloads drained by
    /// `receive_inputs`. Filled in tests with `queue_input_bytes`.
    inputs: HashMap<u64, VecDeque<Vec<u8>>>,

    /// **Unicast Snapshot Log (Host -> One Client):** e.g. the snapshot a newly
    /// joined client receives.
    unicast: HashMap<u64, Vec<Vec<u8>>>,

    /// **Broadcast Snapshot Log (Host -> All):** the regular cadence.
    broadcast: Vec<Vec<u8>>,

    /// **Disconnection Log:** client ids passed to `disconnect()`.
    pub disconnected_clients: Vec<u64>,

    /// **Connected Clients:** who `connected_clients()` reports.
    client_ids: Vec<u64>,
}

impl MockHostTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_client(&mut self, client_id: u64) {
        self.client_ids.push(client_id);
        self.inputs.entry(client_id).or_default();
        self.unicast.entry(client_id).or_default();
    }

    pub fn queue_event(&mut self, event: PeerEvent) {
        self.events.push_back(event);
    }

    pub fn queue_input_bytes(&mut self, client_id: u64, payload: Vec<u8>) {
        self.inputs.entry(client_id).or_default().push_back(payload);
    }

    pub fn pending_inputs(&self, client_id: u64) -> usize {
        self.inputs.get(&client_id).map_or(0, VecDeque::len)
    }

    pub fn sent_snapshots(&self, client_id: u64) -> Vec<Vec<u8>> {
        self.unicast.get(&client_id).cloned().unwrap_or_default()
    }

    pub fn broadcast_snapshots(&self) -> &[Vec<u8>] {
        &self.broadcast
    }
}

impl HostTransport for MockHostTransport {
    fn next_event(&mut self) -> Option<PeerEvent> {
        self.events.pop_front()
    }

    fn connected_clients(&self) -> Vec<u64> {
        self.client_ids.clone()
    }

    fn receive_input(&mut self, client_id: u64) -> Option<Vec<u8>> {
        self.inputs.get_mut(&client_id)?.pop_front()
    }

    fn send_snapshot(&mut self, client_id: u64, payload: Vec<u8>) {
        self.unicast.entry(client_id).or_default().push(payload);
    }

    fn broadcast_snapshot(&mut self, payload: Vec<u8>) {
        self.broadcast.push(payload);
    }

    fn disconnect(&mut self, client_id: u64) {
        self.disconnected_clients.push(client_id);
        self.client_ids.retain(|&id| id != client_id);
    }
}
