pub mod input;
pub mod net;
pub mod peer;
pub mod run;
pub mod stats;

#[cfg(test)]
pub mod test_helpers;

pub use net::{RenetHostTransport, PeerEvent, HostTransport};
pub use peer::HostPeer;
pub use run::{RunError, process_events, update_host};
