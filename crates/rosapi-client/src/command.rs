use std::fmt;
use std::sync::mpsc;
use std::time::Duration;

use rosapi_proto::Event;

use crate::error::ClientError;

/// The aggregated result of one settled command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    /// Channel the command ran on.
    pub channel: String,
    /// The command word as submitted.
    pub command: String,
    /// One attribute list per `!re` record, in arrival order. A `=ret=`
    /// value on the closing `!done` appears as a final `("ret", value)`
    /// record.
    pub records: Vec<Vec<(String, String)>>,
}

impl CommandReply {
    /// The records flattened into maps, wire order preserved across records.
    pub fn record_maps(&self) -> Vec<std::collections::BTreeMap<String, String>> {
        self.records
            .iter()
            .map(|attrs| rosapi_proto::record_map(attrs))
            .collect()
    }
}

/// Payload of a `!trap` reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrapInfo {
    /// The trap message, when the peer sent one.
    pub message: Option<String>,
    /// The trap category, when the peer sent one.
    pub category: Option<String>,
    /// All attributes of the trap sentence.
    pub attributes: Vec<(String, String)>,
}

impl TrapInfo {
    pub(crate) fn from_event(event: &Event) -> Self {
        Self {
            message: event.message().map(str::to_string),
            category: event.attr("category").map(str::to_string),
            attributes: event.attributes.clone(),
        }
    }
}

impl fmt::Display for TrapInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "command trap: {message}"),
            None => write!(f, "command trap"),
        }
    }
}

pub(crate) type CommandOutcome = Result<CommandReply, ClientError>;

/// Deferred result of a submitted command.
///
/// Settles exactly once: with the aggregated reply when the command's
/// `!done` arrives, or with the error when it traps, is rejected locally,
/// or the connection dies first.
pub struct CommandHandle {
    channel: String,
    command: String,
    id: Option<u64>,
    rx: mpsc::Receiver<CommandOutcome>,
}

impl CommandHandle {
    pub(crate) fn new(
        channel: String,
        command: String,
        id: Option<u64>,
        rx: mpsc::Receiver<CommandOutcome>,
    ) -> Self {
        Self {
            channel,
            command,
            id,
            rx,
        }
    }

    /// Channel the command was submitted on.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// The command word.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Channel-local command id, when one was allocated.
    pub fn id(&self) -> Option<u64> {
        self.id
    }

    /// Block until the command settles.
    pub fn wait(self) -> CommandOutcome {
        self.rx.recv().unwrap_or_else(|_| {
            Err(ClientError::Disconnected(
                "connection closed before the command settled".to_string(),
            ))
        })
    }

    /// Block up to `timeout` for the command to settle.
    pub fn wait_timeout(self, timeout: Duration) -> CommandOutcome {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(ClientError::Timeout(timeout)),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(ClientError::Disconnected(
                "connection closed before the command settled".to_string(),
            )),
        }
    }
}

/// A registered, not-yet-settled command.
pub(crate) struct PendingCommand {
    pub command: String,
    pub args: Vec<String>,
    pub records: Vec<Vec<(String, String)>>,
    pub outcome: mpsc::Sender<CommandOutcome>,
    /// False while a sync-mode command waits for its predecessor to settle.
    pub written: bool,
    /// `listen`-style commands stream records indefinitely and are never
    /// given an aggregate.
    pub listen: bool,
}

/// True for long-lived `listen`-style commands.
pub(crate) fn is_listen_command(command: &str) -> bool {
    command.split('/').skip(1).any(|segment| segment == "listen")
}
