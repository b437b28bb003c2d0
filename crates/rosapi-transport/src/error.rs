use std::net::SocketAddr;

/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Host name resolution failed.
    #[error("failed to resolve {host}: {source}")]
    Resolve {
        host: String,
        source: std::io::Error,
    },

    /// Resolution succeeded but produced no usable address.
    #[error("no address found for {host}")]
    NoAddress { host: String },

    /// Failed to connect to the specified address.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
