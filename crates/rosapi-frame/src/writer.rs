use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use rosapi_transport::ApiStream;

use crate::codec::{encode_sentence, CodecConfig};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete sentences to any `Write` stream.
///
/// A sentence is always written and flushed as a unit, so concurrent callers
/// serialized on this writer never interleave words on the wire.
pub struct SentenceWriter<T> {
    inner: T,
    buf: BytesMut,
    config: CodecConfig,
}

impl<T: Write> SentenceWriter<T> {
    /// Create a new sentence writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, CodecConfig::default())
    }

    /// Create a new sentence writer with explicit configuration.
    pub fn with_config(inner: T, config: CodecConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Encode and send one sentence (blocking).
    pub fn send<S: AsRef<str>>(&mut self, words: &[S]) -> Result<()> {
        for word in words {
            let len = word.as_ref().len();
            if len > self.config.max_word_len {
                return Err(FrameError::WordTooLong {
                    len,
                    max: self.config.max_word_len,
                });
            }
        }

        self.buf.clear();
        encode_sentence(words, &mut self.buf)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
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

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current codec configuration.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }
}

impl SentenceWriter<ApiStream> {
    /// Create a sentence writer for `ApiStream` and apply the write timeout
    /// from config.
    pub fn with_config_stream(inner: ApiStream, config: CodecConfig) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
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
