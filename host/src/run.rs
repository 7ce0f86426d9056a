use std::{
    io,
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use renet::RenetServer;
use renet_netcode::NetcodeServerTransport;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    input,
    net::{self, RenetHostTransport, PeerEvent, HostTransport},
    peer::HostPeer,
};
use common::{
    actor::ActorId,
    config::{NetConfig, SimConfig},
    input::{Controls, InputSource},
    net::{bind_socket, connection_config},
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

    #[error("failed to create transport: {0}")]
    Transport(#[source] io::Error),

    #[error("transport update failed: {0}")]
    Update(String),

    #[error("failed to set Ctrl-C handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

pub fn run_host(net_config: &NetConfig, sim_config: SimConfig) -> Result<(), RunError> {
    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))?;
    }

    let socket = bind_socket(net_config.address).map_err(|source| RunError::Bind {
        addr: net_config.address,
        source,
    })?;

    let server_config = net::build_server_config(
        time::since_epoch(),
        net_config.protocol_id,
        net_config.address,
        net_config.private_key,
    );
    let mut transport =
        NetcodeServerTransport::new(server_config, socket).map_err(RunError::Transport)?;
    let mut server = RenetServer::new(connection_config());
    let mut peer = HostPeer::new(sim_config);
    let mut local_input = Wander::new();

    info!(
        version = net_config.protocol_id,
        address = %net_config.address,
        "host listening"
    );

    let mut last_updated = Instant::now();
    while running.load(Ordering::SeqCst) {
        let now = Instant::now();
        let duration = now - last_updated;
        last_updated = now;

        transport
            .update(duration, &mut server)
            .map_err(|e| RunError::Update(e.to_string()))?;
        server.update(duration);

        let elapsed_ms = duration.as_secs_f64() * 1000.0;
        let controls = local_input.sample(elapsed_ms);
        let mut transport_handle = RenetHostTransport {
            server: &mut server,
        };
        update_host(
            &mut transport_handle,
            &mut peer,
            &controls,
            elapsed_ms,
            time::now_ms(),
        );

        transport.send_packets(&mut server);
        thread::sleep(FRAME_SLEEP);
    }

    info!("host shutting down");
    server.disconnect_all();
    transport.send_packets(&mut server);
    Ok(())
}

// One rendered frame on the host: connection events, inbound inputs, the
// host's own controls, then the simulation and any due snapshots.
pub fn update_host(
    network: &mut dyn HostTransport,
    peer: &mut HostPeer,
    controls: &Controls,
    elapsed_ms: f64,
    now_ms: f64,
) {
    process_events(network, peer);
    input::receive_inputs(network, peer);
    peer.set_local_controls(controls);

    if let Err(error) = peer.frame(network, elapsed_ms, now_ms) {
        warn!(%error, "snapshot not sent");
    }
    peer.stats.log_if_ready();
}

pub fn process_events(network: &mut dyn HostTransport, peer: &mut HostPeer) {
    while let Some(event) = network.next_event() {
        match event {
            PeerEvent::Joined { client_id } => {
                info!(client_id, "client connected");
                if !peer.join(ActorId(client_id)) {
                    network.disconnect(client_id);
                }
            }
            PeerEvent::Left { client_id, reason } => {
                info!(client_id, %reason, "client disconnected");
                peer.leave(ActorId(client_id));
            }
        }
    }
}
