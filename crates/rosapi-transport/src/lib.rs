//! Transport abstraction for the RouterOS management API.
//!
//! Provides the connected stream type the rest of the stack reads and writes
//! sentences through. The API runs over plain TCP (port 8728) or TLS (8729);
//! this crate handles the TCP case, and everything above it is generic over
//! `Read + Write`, so a TLS stream can be plugged in at the same seam.
//!
//! This is the lowest layer of rosapi. Everything else builds on top of the
//! [`ApiStream`] type provided here.

pub mod error;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
pub use stream::ApiStream;
pub use tcp::TcpConnector;

/// Default API port for plaintext connections.
pub const DEFAULT_PORT: u16 = 8728;

/// Default API port for TLS connections.
pub const DEFAULT_TLS_PORT: u16 = 8729;
