use crate::command::TrapInfo;

/// Errors that can occur in client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] rosapi_transport::TransportError),

    /// Framing error. Fatal: the stream cannot be resynchronized.
    #[error("frame error: {0}")]
    Frame(#[from] rosapi_frame::FrameError),

    /// Reply grammar error.
    #[error("protocol error: {0}")]
    Proto(#[from] rosapi_proto::ProtoError),

    /// The peer rejected the credentials.
    #[error("login failed: {0}")]
    LoginFailed(String),

    /// The login challenge was not 16 bytes.
    #[error("malformed login challenge ({len} bytes, expected 16)")]
    BadChallenge { len: usize },

    /// The command failed with a `!trap`. Local to that one command.
    #[error("{0}")]
    Trap(TrapInfo),

    /// Write attempted on a closed or closing channel.
    #[error("channel is closed")]
    ChannelClosed,

    /// A channel with this id is already open.
    #[error("channel id '{0}' already in use")]
    DuplicateChannel(String),

    /// The connection terminated.
    #[error("disconnected: {0}")]
    Disconnected(String),

    /// An operation timed out.
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl ClientError {
    /// The trap payload, when this error is a command trap.
    pub fn trap(&self) -> Option<&TrapInfo> {
        match self {
            Self::Trap(info) => Some(info),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
