use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use rosapi_transport::ApiStream;

use crate::codec::{decode_sentence, CodecConfig, Sentence};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete sentences from any `Read` stream.
///
/// Handles partial reads internally — callers always get complete sentences.
/// The accumulation buffer carries the leftover of an incomplete trailing
/// sentence between reads, so sentence boundaries never depend on how the
/// transport chunked the byte stream.
pub struct SentenceReader<T> {
    inner: T,
    buf: BytesMut,
    config: CodecConfig,
}

impl<T: Read> SentenceReader<T> {
    /// Create a new sentence reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, CodecConfig::default())
    }

    /// Create a new sentence reader with explicit configuration.
    pub fn with_config(inner: T, config: CodecConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read the next complete sentence (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_sentence(&mut self) -> Result<Sentence> {
        loop {
            if let Some(sentence) = decode_sentence(&mut self.buf, self.config.max_word_len)? {
                return Ok(sentence);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current codec configuration.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }
}

impl SentenceReader<ApiStream> {
    /// Create a sentence reader for `ApiStream` and apply the read timeout
    /// from config.
    pub fn with_config_stream(inner: ApiStream, config: CodecConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }

    /// Replace the stream read timeout.
    pub fn set_read_timeout(&mut self, timeout: Option<std::time::Duration>) -> Result<()> {
        self.config.read_timeout = timeout;
        self.inner
            .set_read_timeout(timeout)
            .map_err(transport_to_frame_error)
    }
}

fn transport_to_frame_error(err: rosapi_transport::TransportError) -> FrameError {
    match err {
        rosapi_transport::TransportError::Io(io) => FrameError::Io(io),
        rosapi_transport::TransportError::Resolve { source, .. }
        | rosapi_transport::TransportError::Connect { source, .. } => FrameError::Io(source),
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}
