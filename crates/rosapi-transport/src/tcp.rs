use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::stream::ApiStream;

/// TCP connector for the management API.
///
/// Resolves the host (name resolution is delegated to the standard library),
/// then tries each resolved address in order until one connects.
pub struct TcpConnector;

impl TcpConnector {
    /// Connect to `host:port` with an optional per-address connect timeout.
    pub fn connect(host: &str, port: u16, timeout: Option<Duration>) -> Result<ApiStream> {
        let addrs: Vec<_> = (host, port)
            .to_socket_addrs()
            .map_err(|source| TransportError::Resolve {
                host: host.to_string(),
                source,
            })?
            .collect();

        if addrs.is_empty() {
            return Err(TransportError::NoAddress {
                host: host.to_string(),
            });
        }

        let mut last_err = None;
        for addr in addrs {
            debug!(%addr, "connecting");
            let attempt = match timeout {
                Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => {
                    // Sentences are small and latency-sensitive.
                    stream.set_nodelay(true)?;
                    debug!(%addr, "connected");
                    return Ok(ApiStream::from_tcp(stream));
                }
                Err(source) => last_err = Some(TransportError::Connect { addr, source }),
            }
        }

        Err(last_err.unwrap_or(TransportError::NoAddress {
            host: host.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;

    use super::*;

    #[test]
    fn connects_to_local_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4];
            stream.read_exact(&mut buf).unwrap();
            assert_eq!(&buf, b"ping");
        });

        let mut stream =
            TcpConnector::connect("127.0.0.1", port, Some(Duration::from_secs(5))).unwrap();
        stream.write_all(b"ping").unwrap();

        server.join().unwrap();
    }

    #[test]
    fn connect_refused_reports_address() {
        // Bind then drop to get a port that is very likely closed.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let err = TcpConnector::connect("127.0.0.1", port, Some(Duration::from_secs(1)))
            .expect_err("closed port should refuse");
        assert!(matches!(err, TransportError::Connect { .. }));
    }

    #[test]
    fn resolve_failure_reports_host() {
        let err = TcpConnector::connect("invalid.invalid", 8728, Some(Duration::from_secs(1)))
            .expect_err("bogus host should not resolve");
        assert!(matches!(err, TransportError::Resolve { .. }));
    }

    #[test]
    fn shutdown_unblocks_reader_clone() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = std::thread::spawn(move || {
            let (_stream, _) = listener.accept().unwrap();
            std::thread::sleep(Duration::from_millis(200));
        });

        let stream = TcpConnector::connect("127.0.0.1", port, None).unwrap();
        let mut reader = stream.try_clone().unwrap();

        let read_thread = std::thread::spawn(move || {
            let mut buf = [0u8; 1];
            reader.read(&mut buf)
        });

        std::thread::sleep(Duration::from_millis(50));
        stream.shutdown().unwrap();

        let result = read_thread.join().unwrap();
        // Either EOF or a reset, never a hang.
        match result {
            Ok(0) => {}
            Ok(n) => panic!("unexpected {n} bytes"),
            Err(_) => {}
        }
        server.join().unwrap();
    }
}
