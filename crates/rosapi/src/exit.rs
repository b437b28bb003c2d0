use std::fmt;
use std::io;

use rosapi_client::ClientError;
use rosapi_frame::FrameError;
use rosapi_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Resolve { source, .. }
        | TransportError::Connect { source, .. }
        | TransportError::Io(source) => io_error(context, source),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::WordTooLong { .. }
        | FrameError::UnknownControlByte { .. }
        | FrameError::InvalidUtf8 => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        FrameError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn client_error(context: &str, err: ClientError) -> CliError {
    match err {
        ClientError::Transport(err) => transport_error(context, err),
        ClientError::Frame(err) => frame_error(context, err),
        ClientError::Proto(err) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        ClientError::LoginFailed(_) => CliError::new(PERMISSION_DENIED, format!("{context}: {err}")),
        ClientError::BadChallenge { .. } => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        ClientError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        ClientError::DuplicateChannel(_) => CliError::new(USAGE, format!("{context}: {err}")),
        ClientError::Trap(_) | ClientError::ChannelClosed | ClientError::Disconnected(_) => {
            CliError::new(FAILURE, format!("{context}: {err}"))
        }
    }
}
