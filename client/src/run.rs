use std::{
    io,
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use renet::RenetClient;
use renet_netcode::{ClientAuthentication, NetcodeClientTransport};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    net::{self, NetworkHandle, RenetNetworkHandle},
    peer::ClientPeer,
};
use common::{
    actor::ActorId,
    config::{NetConfig, SimConfig},
    input::{Controls, InputSource},
    net::connection_config,
    time,
    wander::Wander,
};

const FRAME_SLEEP: Duration = Duration::from_millis(16);

#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to generate connect token: {0}")]
    Token(String),

    #[error("failed to create transport: {0}")]
    Transport(String),

    #[error("disconnected: {0}")]
    Disconnected(String),

    #[error("failed to set Ctrl-C handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

pub fn run_client(net_config: &NetConfig, sim_config: SimConfig) -> Result<(), RunError> {
    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))?;
    }

    // Zero belongs to the host's own actor.
    let client_id = rand::random_range(1..=u64::MAX);
    let current_time = time::since_epoch();
    let connect_token = net::create_connect_token(
        current_time,
        net_config.protocol_id,
        client_id,
        net_config.address,
        &net_config.private_key,
    )
    .map_err(RunError::Token)?;

    let local_addr = SocketAddr::new(unspecified_for(net_config.address), 0);
    let socket = UdpSocket::bind(local_addr).map_err(|source| RunError::Bind {
        addr: local_addr,
        source,
    })?;
    let authentication = ClientAuthentication::Secure { connect_token };
    let mut transport = NetcodeClientTransport::new(current_time, authentication, socket)
        .map_err(|e| RunError::Transport(e.to_string()))?;
    let mut client = RenetClient::new(connection_config());
    let mut peer = ClientPeer::new(ActorId(client_id), sim_config);
    let mut local_input = Wander::new();

    info!(
        client_id,
        version = net_config.protocol_id,
        server = %net_config.address,
        "connecting"
    );

    let mut last_updated = Instant::now();
    let mut result = Ok(());
    while running.load(Ordering::SeqCst) {
        let now = Instant::now();
        let duration = now - last_updated;
        last_updated = now;

        if let Err(e) = transport.update(duration, &mut client) {
            result = Err(RunError::Transport(e.to_string()));
            break;
        }
        client.update(duration);

        let elapsed_ms = duration.as_secs_f64() * 1000.0;
        let controls = local_input.sample(elapsed_ms);
        let mut network_handle = RenetNetworkHandle {
            client: &mut client,
        };
        if let Err(e) = update_client(
            &mut network_handle,
            &mut peer,
            &controls,
            elapsed_ms,
            time::now_ms(),
        ) {
            result = Err(e);
            break;
        }

        if let Err(e) = transport.send_packets(&mut client) {
            warn!(error = %e, "packet send failed");
        }
        thread::sleep(FRAME_SLEEP);
    }

    info!(snapshots = peer.snapshots_received(), "client shutting down");
    if client.is_connected() {
        transport.disconnect();
    }
    result
}

// One rendered frame on a client. Fails only once the connection is gone.
pub fn update_client(
    network: &mut dyn NetworkHandle,
    peer: &mut ClientPeer,
    controls: &Controls,
    elapsed_ms: f64,
    now_ms: f64,
) -> Result<(), RunError> {
    if network.is_disconnected() {
        return Err(RunError::Disconnected(network.get_disconnect_reason()));
    }

    peer.set_controls(controls);
    if let Err(error) = peer.frame(network, elapsed_ms, now_ms) {
        warn!(%error, "input not sent");
    }
    Ok(())
}

fn unspecified_for(server: SocketAddr) -> IpAddr {
    match server {
        SocketAddr::V4(_) => Ipv4Addr::UNSPECIFIED.into(),
        SocketAddr::V6(_) => Ipv6Addr::UNSPECIFIED.into(),
    }
}
