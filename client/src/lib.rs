pub mod input;
pub mod net;
pub mod peer;
pub mod reconcile;
pub mod run;

#[cfg(test)]
pub mod test_helpers;

pub use net::{NetworkHandle, RenetNetworkHandle};
pub use peer::ClientPeer;
pub use run::{RunError, update_client};
