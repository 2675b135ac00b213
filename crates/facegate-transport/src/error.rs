use std::net::SocketAddr;

use crate::kind::TransportKind;

/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The host/port pair did not resolve to any socket address.
    #[error("failed to resolve {target}: {source}")]
    Resolve {
        target: String,
        source: std::io::Error,
    },

    /// Failed to bind to the specified address.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Failed to connect to the specified address.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The selected transport has no implementation.
    #[error("transport '{0}' is not supported")]
    Unsupported(TransportKind),

    /// The transport name is not one of the known identifiers.
    #[error("unknown transport '{0}' (expected one of: tcp, udp)")]
    UnknownKind(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;
