use std::collections::BTreeMap;
use std::sync::{mpsc, Arc, Mutex, MutexGuard, Weak};

use rosapi_proto::{Event, EventKind};
use tracing::{debug, trace};

use crate::command::{
    is_listen_command, CommandHandle, CommandReply, PendingCommand, TrapInfo,
};
use crate::connection::ConnectionInner;
use crate::error::ClientError;
use crate::status::ChannelStatus;
use crate::subscription::{EventStream, SubscriberList};

/// An event projected onto one channel.
#[derive(Debug, Clone)]
pub struct ChannelEvent {
    /// Channel the event was routed to.
    pub channel: String,
    /// Command id extracted from the tag suffix.
    pub command_id: Option<u64>,
    /// The parsed event as received.
    pub event: Event,
}

/// A logical command queue multiplexed over the connection.
///
/// Cheap to clone; all clones share the same underlying channel.
#[derive(Clone)]
pub struct Channel {
    core: Arc<ChannelCore>,
}

impl Channel {
    pub(crate) fn new(core: Arc<ChannelCore>) -> Self {
        Self { core }
    }

    /// Channel id (the tag prefix of every command issued here).
    pub fn id(&self) -> &str {
        &self.core.id
    }

    /// Current status flags.
    pub fn status(&self) -> ChannelStatus {
        self.core.inner.lock().unwrap().status
    }

    /// Submit a command with no arguments.
    pub fn submit(&self, command: &str) -> CommandHandle {
        self.submit_with_args(command, &[])
    }

    /// Submit a command with argument words (`=key=value`, query words, …).
    ///
    /// Never blocks on the network reply: the returned handle settles with
    /// the aggregated records on `!done` or the trap payload on `!trap`.
    /// Local failures (closed channel, dead socket) settle the handle
    /// immediately.
    pub fn submit_with_args(&self, command: &str, args: &[String]) -> CommandHandle {
        let core = &self.core;
        let (tx, rx) = mpsc::channel();

        let mut inner = core.inner.lock().unwrap();

        if inner
            .status
            .intersects(ChannelStatus::CLOSED | ChannelStatus::CLOSING)
        {
            let _ = tx.send(Err(ClientError::ChannelClosed));
            return CommandHandle::new(core.id.clone(), command.to_string(), None, rx);
        }

        // `/cancel` is fire-and-forget: one cancel word per pending command,
        // resolved immediately without a correlation entry.
        if command == "/cancel" {
            let ids: Vec<u64> = inner.pending.keys().copied().collect();
            for cmd_id in ids {
                if let Err(err) = core.write_tagged(command, args, cmd_id) {
                    debug!(channel = %core.id, %err, "cancel write failed");
                }
            }
            let _ = tx.send(Ok(CommandReply {
                channel: core.id.clone(),
                command: command.to_string(),
                records: Vec::new(),
            }));
            return CommandHandle::new(core.id.clone(), command.to_string(), None, rx);
        }

        let cmd_id = inner.next_command_id;
        inner.next_command_id += 1;

        // Sync mode holds the write until the previous command settles.
        let write_now = !inner.sync || inner.pending.is_empty();
        inner.pending.insert(
            cmd_id,
            PendingCommand {
                command: command.to_string(),
                args: args.to_vec(),
                records: Vec::new(),
                outcome: tx,
                written: write_now,
                listen: is_listen_command(command),
            },
        );
        inner
            .status
            .remove(ChannelStatus::OPEN | ChannelStatus::DONE);
        inner.status.insert(ChannelStatus::RUNNING);

        if write_now {
            if let Err(err) = core.write_tagged(command, args, cmd_id) {
                if let Some(pending) = inner.pending.remove(&cmd_id) {
                    let _ = pending.outcome.send(Err(err));
                }
                if inner.pending.is_empty() {
                    inner.status.remove(ChannelStatus::RUNNING);
                }
            }
        }

        CommandHandle::new(core.id.clone(), command.to_string(), Some(cmd_id), rx)
    }

    /// Whether commands are issued one at a time (default).
    pub fn sync(&self) -> bool {
        self.core.inner.lock().unwrap().sync
    }

    /// Toggle sync mode. Off allows multiple commands in flight, correlated
    /// purely by tag.
    pub fn set_sync(&self, sync: bool) {
        self.core.inner.lock().unwrap().sync = sync;
    }

    /// Whether the channel closes itself once its last command settles.
    pub fn close_on_done(&self) -> bool {
        self.core.inner.lock().unwrap().close_on_done
    }

    pub fn set_close_on_done(&self, close_on_done: bool) {
        self.core.inner.lock().unwrap().close_on_done = close_on_done;
    }

    /// Whether a trap closes the channel.
    pub fn close_on_trap(&self) -> bool {
        self.core.inner.lock().unwrap().close_on_trap
    }

    pub fn set_close_on_trap(&self, close_on_trap: bool) {
        self.core.inner.lock().unwrap().close_on_trap = close_on_trap;
    }

    /// Live stream of every data record as it arrives (no buffering).
    ///
    /// Not meant to be combined with the aggregate of `listen`-style
    /// commands, which never get one.
    pub fn data(&self) -> EventStream<ChannelEvent> {
        self.core.inner.lock().unwrap().data_subs.subscribe()
    }

    /// Buffered per-command aggregates, one item per settled command.
    pub fn done(&self) -> EventStream<CommandReply> {
        self.core.inner.lock().unwrap().done_subs.subscribe()
    }

    /// Every trap event on this channel.
    pub fn trap(&self) -> EventStream<ChannelEvent> {
        self.core.inner.lock().unwrap().trap_subs.subscribe()
    }

    /// Fatal events on this channel (the peer is tearing the session down).
    pub fn fatal(&self) -> EventStream<ChannelEvent> {
        self.core.inner.lock().unwrap().fatal_subs.subscribe()
    }

    /// The raw channel-filtered event feed.
    pub fn stream(&self) -> EventStream<ChannelEvent> {
        self.core.inner.lock().unwrap().raw_subs.subscribe()
    }

    /// Fires once with the channel id when the channel fully closes.
    pub fn on_close(&self) -> EventStream<String> {
        self.core.inner.lock().unwrap().close_subs.subscribe()
    }

    /// Close the channel.
    ///
    /// While commands are pending this only marks the channel CLOSING (with
    /// `force`, a `/cancel` is broadcast for each of them) and lets it
    /// drain; the transition to CLOSED happens when the last command
    /// settles. Closing a CLOSED channel is a no-op.
    pub fn close(&self, force: bool) {
        self.core.close(force);
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.core.inner.lock().unwrap();
        f.debug_struct("Channel")
            .field("id", &self.core.id)
            .field("status", &inner.status)
            .field("pending", &inner.pending.len())
            .finish()
    }
}

/// Shared channel state. The public [`Channel`] is a handle to this.
pub(crate) struct ChannelCore {
    pub(crate) id: String,
    conn: Weak<ConnectionInner>,
    inner: Mutex<ChannelInner>,
}

struct ChannelInner {
    status: ChannelStatus,
    sync: bool,
    close_on_done: bool,
    close_on_trap: bool,
    next_command_id: u64,
    pending: BTreeMap<u64, PendingCommand>,
    data_subs: SubscriberList<ChannelEvent>,
    done_subs: SubscriberList<CommandReply>,
    trap_subs: SubscriberList<ChannelEvent>,
    fatal_subs: SubscriberList<ChannelEvent>,
    raw_subs: SubscriberList<ChannelEvent>,
    close_subs: SubscriberList<String>,
}

impl ChannelCore {
    pub(crate) fn new(id: String, conn: Weak<ConnectionInner>, close_on_done: bool) -> Arc<Self> {
        Arc::new(Self {
            id,
            conn,
            inner: Mutex::new(ChannelInner {
                status: ChannelStatus::OPEN,
                sync: true,
                close_on_done,
                close_on_trap: false,
                next_command_id: 1,
                pending: BTreeMap::new(),
                data_subs: SubscriberList::new(),
                done_subs: SubscriberList::new(),
                trap_subs: SubscriberList::new(),
                fatal_subs: SubscriberList::new(),
                raw_subs: SubscriberList::new(),
                close_subs: SubscriberList::new(),
            }),
        })
    }

    /// Encode and send `command` with the channel/command tag trailer.
    fn write_tagged(&self, command: &str, args: &[String], cmd_id: u64) -> Result<(), ClientError> {
        let conn = self.conn.upgrade().ok_or_else(|| {
            ClientError::Disconnected("connection is gone".to_string())
        })?;
        let mut words = Vec::with_capacity(args.len() + 2);
        words.push(command.to_string());
        words.extend(args.iter().cloned());
        words.push(format!(".tag={}-{}", self.id, cmd_id));
        let mut writer = conn.writer.lock().unwrap();
        writer.send(&words).map_err(ClientError::from)
    }

    /// Route one event into this channel. Called only from the dispatcher
    /// thread, which is what serializes all correlation state transitions.
    pub(crate) fn dispatch(self: &Arc<Self>, event: Event, cmd_id: Option<u64>) {
        let mut inner = self.inner.lock().unwrap();
        if inner.status.contains(ChannelStatus::CLOSED) {
            trace!(channel = %self.id, "event after close dropped");
            return;
        }

        let projected = ChannelEvent {
            channel: self.id.clone(),
            command_id: cmd_id,
            event: event.clone(),
        };
        inner.raw_subs.publish(projected.clone());

        if event.kind == EventKind::Fatal {
            inner.fatal_subs.publish(projected);
            inner
                .status
                .insert(ChannelStatus::FATAL | ChannelStatus::CLOSING);
            drop(inner);
            self.close(false);
        } else if event.kind.is_data() {
            collect_record(&mut inner, cmd_id, event.attributes.clone());
            inner.data_subs.publish(projected);
        } else if event.kind.is_done() {
            if let Some(ret) = event.ret.clone() {
                // The =ret= of a closing !done is still command output
                // (e.g. the id of a created object); surface it as one more
                // data record before settling.
                let attributes = vec![("ret".to_string(), ret.clone())];
                collect_record(&mut inner, cmd_id, attributes.clone());
                inner.data_subs.publish(ChannelEvent {
                    channel: self.id.clone(),
                    command_id: cmd_id,
                    event: Event {
                        kind: EventKind::Data,
                        tag: event.tag.clone(),
                        attributes,
                        ret: Some(ret),
                    },
                });
            }
            self.settle_success(&mut inner, cmd_id);
            self.after_settle(inner);
        } else if event.kind.is_trap() {
            inner.trap_subs.publish(projected);
            self.settle_failure(&mut inner, cmd_id, &event);
            self.after_settle(inner);
        }
    }

    fn settle_success(&self, inner: &mut ChannelInner, cmd_id: Option<u64>) {
        let Some(id) = cmd_id else {
            trace!(channel = %self.id, "untagged done dropped");
            return;
        };
        let Some(pending) = inner.pending.remove(&id) else {
            trace!(channel = %self.id, command = id, "done for unknown command");
            return;
        };

        inner.status.insert(ChannelStatus::DONE);
        let reply = CommandReply {
            channel: self.id.clone(),
            command: pending.command,
            records: pending.records,
        };
        inner.done_subs.publish(reply.clone());
        let _ = pending.outcome.send(Ok(reply));
    }

    fn settle_failure(&self, inner: &mut ChannelInner, cmd_id: Option<u64>, event: &Event) {
        let Some(id) = cmd_id else {
            trace!(channel = %self.id, "untagged trap dropped");
            return;
        };
        let Some(pending) = inner.pending.remove(&id) else {
            trace!(channel = %self.id, command = id, "trap for unknown command");
            return;
        };

        inner.status.insert(ChannelStatus::DONE);
        let _ = pending
            .outcome
            .send(Err(ClientError::Trap(TrapInfo::from_event(event))));

        if inner.close_on_trap {
            inner.status.insert(ChannelStatus::CLOSING);
            let ids: Vec<u64> = inner.pending.keys().copied().collect();
            for other in ids {
                if let Err(err) = self.write_tagged("/cancel", &[], other) {
                    debug!(channel = %self.id, %err, "cancel write failed");
                }
            }
            inner.close_on_done = true;
            inner.sync = true;
        }
    }

    /// Bookkeeping after a command settles: release the next queued write,
    /// then close if the channel has drained and wants closing.
    fn after_settle(self: &Arc<Self>, mut inner: MutexGuard<'_, ChannelInner>) {
        loop {
            let next = inner
                .pending
                .iter()
                .find(|(_, pending)| !pending.written)
                .map(|(&id, _)| id);
            let Some(id) = next else { break };

            let Some((command, args)) = inner.pending.get_mut(&id).map(|pending| {
                pending.written = true;
                (pending.command.clone(), pending.args.clone())
            }) else {
                break;
            };
            match self.write_tagged(&command, &args, id) {
                Ok(()) => break,
                Err(err) => {
                    if let Some(pending) = inner.pending.remove(&id) {
                        let _ = pending.outcome.send(Err(err));
                    }
                }
            }
        }

        if inner.pending.is_empty() {
            inner.status.remove(ChannelStatus::RUNNING);
            if inner.status.contains(ChannelStatus::CLOSING) || inner.close_on_done {
                finalize_locked(&mut inner, &self.id);
                drop(inner);
                self.deregister();
            }
        }
    }

    pub(crate) fn close(self: &Arc<Self>, force: bool) {
        let mut inner = self.inner.lock().unwrap();
        if inner.status.contains(ChannelStatus::CLOSED) {
            return;
        }
        if inner.status.contains(ChannelStatus::RUNNING) {
            if force {
                let ids: Vec<u64> = inner.pending.keys().copied().collect();
                for cmd_id in ids {
                    if let Err(err) = self.write_tagged("/cancel", &[], cmd_id) {
                        debug!(channel = %self.id, %err, "cancel write failed");
                    }
                }
            }
            inner.close_on_done = true;
            inner.sync = true;
            inner.status.insert(ChannelStatus::CLOSING);
            return;
        }
        finalize_locked(&mut inner, &self.id);
        drop(inner);
        self.deregister();
    }

    /// Teardown path: the socket is gone, so pending commands cannot drain.
    /// Reject them all and close immediately.
    pub(crate) fn abort(&self, reason: &str) {
        let mut inner = self.inner.lock().unwrap();
        if inner.status.contains(ChannelStatus::CLOSED) {
            return;
        }
        let pending = std::mem::take(&mut inner.pending);
        for (_, command) in pending {
            let _ = command
                .outcome
                .send(Err(ClientError::Disconnected(reason.to_string())));
        }
        finalize_locked(&mut inner, &self.id);
    }

    /// True while the channel counts against connection close-on-done.
    pub(crate) fn is_open_or_running(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        inner
            .status
            .intersects(ChannelStatus::OPEN | ChannelStatus::RUNNING)
    }

    fn deregister(self: &Arc<Self>) {
        if let Some(conn) = self.conn.upgrade() {
            conn.release_channel(&self.id);
        }
    }
}

/// Final transition to CLOSED: complete every stream, emit the close
/// notification. Caller deregisters from the connection afterwards.
fn finalize_locked(inner: &mut ChannelInner, id: &str) {
    inner.status = ChannelStatus::CLOSED;
    inner.data_subs.clear();
    inner.done_subs.clear();
    inner.trap_subs.clear();
    inner.fatal_subs.clear();
    inner.raw_subs.clear();
    inner.close_subs.publish(id.to_string());
    inner.close_subs.clear();
}

fn collect_record(
    inner: &mut ChannelInner,
    cmd_id: Option<u64>,
    attributes: Vec<(String, String)>,
) {
    let Some(id) = cmd_id else { return };
    if let Some(pending) = inner.pending.get_mut(&id) {
        if !pending.listen {
            pending.records.push(attributes);
        }
    }
}
