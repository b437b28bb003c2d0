use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use rosapi_frame::{FrameError, SentenceReader, SentenceWriter};
use rosapi_proto::{parse_sentence, EventKind};
use rosapi_transport::ApiStream;
use tracing::{debug, trace, warn};

use crate::channel::{Channel, ChannelCore};
use crate::error::{ClientError, Result};
use crate::status::ConnectionStatus;
use crate::subscription::{EventStream, SubscriberList};

/// An authenticated API session.
///
/// Owns the socket, the dispatcher thread and the set of open channels.
/// Dropping the connection closes it.
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

pub(crate) struct ConnectionInner {
    control: ApiStream,
    pub(crate) writer: Mutex<SentenceWriter<ApiStream>>,
    state: Mutex<ConnectionState>,
}

struct ConnectionState {
    status: ConnectionStatus,
    channels: HashMap<String, Arc<ChannelCore>>,
    close_on_done: bool,
    close_subs: SubscriberList<()>,
}

impl Connection {
    /// Assemble a connection from an already-authenticated stream pair and
    /// start the dispatcher thread. Called by the connector after login.
    pub(crate) fn from_parts(
        reader: SentenceReader<ApiStream>,
        writer: SentenceWriter<ApiStream>,
        control: ApiStream,
    ) -> Result<Self> {
        let inner = Arc::new(ConnectionInner {
            control,
            writer: Mutex::new(writer),
            state: Mutex::new(ConnectionState {
                status: ConnectionStatus::Connected,
                channels: HashMap::new(),
                close_on_done: false,
                close_subs: SubscriberList::new(),
            }),
        });

        let dispatch = Arc::clone(&inner);
        std::thread::Builder::new()
            .name("rosapi-dispatch".to_string())
            .spawn(move || dispatch_loop(dispatch, reader))
            .map_err(|err| ClientError::Transport(rosapi_transport::TransportError::Io(err)))?;

        Ok(Self { inner })
    }

    /// Open a channel with a time-derived unique id that closes itself once
    /// its last command settles.
    pub fn open_channel(&self) -> Result<Channel> {
        self.open_channel_with(None, true)
    }

    /// Open a channel with an explicit id.
    pub fn open_channel_with_id(&self, id: &str) -> Result<Channel> {
        self.open_channel_with(Some(id), true)
    }

    /// Open a channel, choosing the id (or `None` to derive one) and whether
    /// it closes itself when its last command settles.
    pub fn open_channel_with(&self, id: Option<&str>, close_on_done: bool) -> Result<Channel> {
        let mut state = self.inner.state.lock().unwrap();
        if state.status != ConnectionStatus::Connected {
            return Err(ClientError::Disconnected(
                "connection is not established".to_string(),
            ));
        }

        let id = match id {
            Some(id) => {
                if state.channels.contains_key(id) {
                    return Err(ClientError::DuplicateChannel(id.to_string()));
                }
                id.to_string()
            }
            None => {
                let mut candidate = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|elapsed| elapsed.as_millis() as u64)
                    .unwrap_or(0);
                while state.channels.contains_key(&candidate.to_string()) {
                    candidate += 1;
                }
                candidate.to_string()
            }
        };

        debug!(channel = %id, "opening channel");
        let core = ChannelCore::new(id.clone(), Arc::downgrade(&self.inner), close_on_done);
        state.channels.insert(id, Arc::clone(&core));
        Ok(Channel::new(core))
    }

    /// Look up an open channel by id.
    pub fn channel(&self, id: &str) -> Option<Channel> {
        self.inner
            .state
            .lock()
            .unwrap()
            .channels
            .get(id)
            .cloned()
            .map(Channel::new)
    }

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        self.inner.state.lock().unwrap().status
    }

    /// True while the session is established.
    pub fn connected(&self) -> bool {
        self.status() == ConnectionStatus::Connected
    }

    /// Whether the connection closes itself once no channel remains open or
    /// running.
    pub fn close_on_done(&self) -> bool {
        self.inner.state.lock().unwrap().close_on_done
    }

    pub fn set_close_on_done(&self, close_on_done: bool) {
        self.inner.state.lock().unwrap().close_on_done = close_on_done;
    }

    /// Fires once when the connection has fully closed.
    pub fn on_close(&self) -> EventStream<()> {
        self.inner.state.lock().unwrap().close_subs.subscribe()
    }

    /// Close the connection: force-close every channel (rejecting whatever
    /// is still pending), then shut the socket down. Idempotent.
    pub fn close(&self) {
        teardown(&self.inner, "closed by client", false);
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock().unwrap();
        f.debug_struct("Connection")
            .field("status", &state.status)
            .field("channels", &state.channels.len())
            .finish()
    }
}

impl ConnectionInner {
    /// Remove a closed channel from the registry; when connection-level
    /// close-on-done is set and nothing remains open or running, close the
    /// whole connection.
    pub(crate) fn release_channel(self: &Arc<Self>, id: &str) {
        let should_close = {
            let mut state = self.state.lock().unwrap();
            if state.channels.remove(id).is_none() {
                trace!(channel = id, "release for unknown channel");
            }
            state.close_on_done
                && state.status == ConnectionStatus::Connected
                && state.channels.values().all(|core| !core.is_open_or_running())
        };
        if should_close {
            debug!("all channels done, closing connection");
            teardown(self, "all channels closed", false);
        }
    }
}

/// Terminate the session: force-close every channel, fire the close
/// notification, shut the socket down. Safe to call from any thread and
/// idempotent.
pub(crate) fn teardown(inner: &Arc<ConnectionInner>, reason: &str, is_error: bool) {
    let channels = {
        let mut state = inner.state.lock().unwrap();
        if state.status != ConnectionStatus::Connected {
            return;
        }
        state.status = ConnectionStatus::Closing;
        std::mem::take(&mut state.channels)
    };

    for core in channels.values() {
        core.abort(reason);
    }

    let mut state = inner.state.lock().unwrap();
    state.status = if is_error {
        ConnectionStatus::Error
    } else {
        ConnectionStatus::Closed
    };
    state.close_subs.publish(());
    state.close_subs.clear();
    drop(state);

    if let Err(err) = inner.control.shutdown() {
        trace!(%err, "socket shutdown after teardown");
    }
}

/// The per-connection event pump. Owns the reader; every protocol event is
/// routed from here in network-receipt order.
fn dispatch_loop(inner: Arc<ConnectionInner>, mut reader: SentenceReader<ApiStream>) {
    loop {
        let sentence = match reader.read_sentence() {
            Ok(sentence) => sentence,
            Err(FrameError::ConnectionClosed) => {
                debug!("event stream completed");
                teardown(&inner, "connection closed by peer", false);
                return;
            }
            Err(err) => {
                warn!(%err, "event stream failed");
                teardown(&inner, &err.to_string(), true);
                return;
            }
        };

        if sentence.is_empty() {
            continue;
        }

        let event = match parse_sentence(&sentence) {
            Ok(event) => event,
            Err(err) => {
                debug!(%err, "dropping unparseable sentence");
                continue;
            }
        };
        trace!(kind = ?event.kind, tag = event.tag.as_deref(), "event received");

        match event.tag.clone() {
            Some(tag) => {
                let (channel_id, cmd_id) = split_tag(&tag);
                let core = inner.state.lock().unwrap().channels.get(channel_id).cloned();
                match core {
                    Some(core) => core.dispatch(event, cmd_id),
                    None => trace!(%tag, "event for unknown channel dropped"),
                }
            }
            None => {
                if event.kind == EventKind::Fatal {
                    let reason = event
                        .message()
                        .map(str::to_string)
                        .or_else(|| event.attributes.first().map(|(word, _)| word.clone()))
                        .unwrap_or_else(|| "fatal from peer".to_string());
                    warn!(%reason, "connection terminated by peer");
                    teardown(&inner, &reason, true);
                    return;
                }
                trace!(kind = ?event.kind, "untagged event dropped");
            }
        }
    }
}

/// Split `"<channel>-<command>"` at the last dash. A tag without a numeric
/// suffix routes to the channel named by the whole tag.
fn split_tag(tag: &str) -> (&str, Option<u64>) {
    match tag.rsplit_once('-') {
        Some((channel, cmd)) => match cmd.parse::<u64>() {
            Ok(id) => (channel, Some(id)),
            Err(_) => (tag, None),
        },
        None => (tag, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_tag_at_last_dash() {
        assert_eq!(split_tag("c1-7"), ("c1", Some(7)));
        assert_eq!(split_tag("edge-router-42"), ("edge-router", Some(42)));
    }

    #[test]
    fn split_tag_without_command_suffix() {
        assert_eq!(split_tag("lonely"), ("lonely", None));
        assert_eq!(split_tag("c1-xyz"), ("c1-xyz", None));
    }
}
