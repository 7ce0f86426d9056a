use std::{
    io,
    net::{SocketAddr, UdpSocket},
};

use renet::{ChannelConfig, ConnectionConfig, SendType};
use socket2::{Domain, Socket, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppChannel {
    // Unordered, unreliable, zero retransmits. Inputs and snapshots both
    // travel here; neither side assumes delivery or order.
    Unreliable,
}

impl From<AppChannel> for u8 {
    fn from(channel: AppChannel) -> Self {
        match channel {
            AppChannel::Unreliable => 0,
        }
    }
}

pub fn connection_config() -> ConnectionConfig {
    let unreliable_config = ChannelConfig {
        channel_id: AppChannel::Unreliable.into(),
        max_memory_usage_bytes: 5 * 1024 * 1024,
        send_type: SendType::Unreliable,
    };

    ConnectionConfig {
        client_channels_config: vec![unreliable_config.clone()],
        server_channels_config: vec![unreliable_config],
        ..Default::default()
    }
}

pub fn bind_socket(addr: SocketAddr) -> io::Result<UdpSocket> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };
    let socket = Socket::new(domain, Type::DGRAM, None)?;
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.set_nonblocking(true)?;
    Ok(socket.into())
}
