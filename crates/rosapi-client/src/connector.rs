use std::time::Duration;

use rosapi_frame::{CodecConfig, SentenceReader, SentenceWriter, DEFAULT_MAX_WORD};
use rosapi_transport::{TcpConnector, DEFAULT_PORT};
use tracing::debug;

use crate::connection::Connection;
use crate::error::Result;
use crate::login::{login, AuthMethod, Credentials};

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    /// API port. Default 8728.
    pub port: u16,
    /// Inactivity timeout applied until the session is established.
    /// Covers the TCP connect and the whole login exchange.
    pub timeout: Duration,
    /// How credentials are presented.
    pub auth: AuthMethod,
    /// Maximum accepted word size.
    pub max_word_len: usize,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            timeout: Duration::from_secs(5),
            auth: AuthMethod::default(),
            max_word_len: DEFAULT_MAX_WORD,
        }
    }
}

/// Connect and log in with default configuration.
pub fn connect(host: &str, credentials: &Credentials) -> Result<Connection> {
    connect_with_config(host, credentials, &ConnectConfig::default())
}

/// Connect and log in with explicit configuration.
pub fn connect_with_config(
    host: &str,
    credentials: &Credentials,
    config: &ConnectConfig,
) -> Result<Connection> {
    let stream = TcpConnector::connect(host, config.port, Some(config.timeout))?;
    let reader_stream = stream.try_clone()?;
    let control = stream.try_clone()?;

    let codec_config = CodecConfig {
        max_word_len: config.max_word_len,
        read_timeout: Some(config.timeout),
        write_timeout: Some(config.timeout),
    };

    let mut reader = SentenceReader::with_config_stream(reader_stream, codec_config.clone())?;
    let mut writer = SentenceWriter::with_config_stream(stream, codec_config)?;

    debug!(host, port = config.port, "logging in");
    if let Err(err) = login(&mut reader, &mut writer, credentials, config.auth, config.timeout) {
        let _ = control.shutdown();
        return Err(err);
    }

    // The inactivity timeout only applies before the session is
    // established; from here on reads block until traffic or close.
    reader.set_read_timeout(None)?;

    Connection::from_parts(reader, writer, control)
}
