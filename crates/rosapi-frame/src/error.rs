/// Errors that can occur during sentence encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The first byte of a length prefix matches none of the known tag-bit
    /// patterns (`0xF1..=0xFF`). The stream cannot be resynchronized.
    #[error("unrecognized framing byte 0x{byte:02X}")]
    UnknownControlByte { byte: u8 },

    /// A word exceeds the configured maximum size.
    #[error("word too long ({len} bytes, max {max})")]
    WordTooLong { len: usize, max: usize },

    /// A word's payload is not valid UTF-8.
    #[error("word is not valid UTF-8")]
    InvalidUtf8,

    /// An I/O error occurred while reading or writing sentences.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete sentence was received.
    #[error("connection closed (incomplete sentence)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
