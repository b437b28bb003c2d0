use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};

use crate::error::Result;

/// A connected API stream — implements Read + Write.
///
/// This is the fundamental I/O type returned by transport operations.
/// Currently wraps a TCP stream; a TLS variant slots in here without
/// touching the layers above.
pub struct ApiStream {
    inner: ApiStreamInner,
}

enum ApiStreamInner {
    Tcp(TcpStream),
}

impl Read for ApiStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            ApiStreamInner::Tcp(stream) => stream.read(buf),
        }
    }
}

impl Write for ApiStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            ApiStreamInner::Tcp(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            ApiStreamInner::Tcp(stream) => stream.flush(),
        }
    }
}

impl ApiStream {
    /// Create an ApiStream from a connected TCP stream.
    pub(crate) fn from_tcp(stream: TcpStream) -> Self {
        Self {
            inner: ApiStreamInner::Tcp(stream),
        }
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<std::time::Duration>) -> Result<()> {
        match &self.inner {
            ApiStreamInner::Tcp(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
        }
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<std::time::Duration>) -> Result<()> {
        match &self.inner {
            ApiStreamInner::Tcp(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
        }
    }

    /// Try to clone this stream (creates a new file descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            ApiStreamInner::Tcp(stream) => {
                let cloned = stream.try_clone()?;
                Ok(Self::from_tcp(cloned))
            }
        }
    }

    /// Address of the connected peer.
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        match &self.inner {
            ApiStreamInner::Tcp(stream) => stream.peer_addr().map_err(Into::into),
        }
    }

    /// Shut down both halves of the connection.
    ///
    /// Unblocks any thread parked in a read on a clone of this stream.
    pub fn shutdown(&self) -> Result<()> {
        match &self.inner {
            ApiStreamInner::Tcp(stream) => stream.shutdown(Shutdown::Both).map_err(Into::into),
        }
    }
}

impl std::fmt::Debug for ApiStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            ApiStreamInner::Tcp(stream) => f
                .debug_struct("ApiStream")
                .field("type", &"tcp")
                .field("peer", &stream.peer_addr().ok())
                .finish(),
        }
    }
}
