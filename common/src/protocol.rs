use bincode::{
    config::standard,
    serde::{decode_from_slice, encode_to_vec},
};
use serde::{Deserialize, Serialize};

use crate::{error::ProtocolError, input::InputFrame, snapshot::Snapshot};

// Everything that crosses the unreliable channel. Clients only ever send
// `Input`; the host only ever sends `Snapshot`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Message {
    Input(InputFrame),
    Snapshot(Snapshot),
}

impl Message {
    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::Input(_) => "Input",
            Self::Snapshot(_) => "Snapshot",
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(encode_to_vec(self, standard())?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let (message, _) = decode_from_slice::<Message, _>(bytes, standard())?;
        Ok(message)
    }
}

// Major package version, used as the netcode protocol id so that peers from
// incompatible releases refuse each other.
pub fn version() -> u64 {
    env!("CARGO_PKG_VERSION")
        .split('.')
        .next()
        .and_then(|major| major.parse().ok())
        .unwrap_or(0)
}
