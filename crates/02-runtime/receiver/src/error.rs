use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReceiverError {
    #[error("invalid listener config: {0}")]
    InvalidConfig(&'static str),

    #[error("failed to bind udp port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("failed to configure socket: {0}")]
    Socket(#[source] io::Error),

    #[error("failed to spawn receive thread: {0}")]
    Spawn(#[source] io::Error),
}
