//! Channel multiplexing and command correlation for the RouterOS API.
//!
//! This is the "just works" layer. One [`Connection`] owns the socket, the
//! login state and a set of logical [`Channel`]s. Each channel issues tagged
//! commands, correlates the tagged `!done`/`!trap` outcome back to the
//! caller's [`CommandHandle`], and exposes the per-channel event streams.
//!
//! All protocol events arrive on one dispatcher thread in network order;
//! correlation state is only ever touched from that thread, which is what
//! makes the done/trap race deterministic.

pub mod channel;
pub mod command;
pub mod connection;
pub mod connector;
pub mod error;
pub mod login;
pub mod status;
pub mod subscription;

pub use channel::{Channel, ChannelEvent};
pub use command::{CommandHandle, CommandReply, TrapInfo};
pub use connection::Connection;
pub use connector::{connect, connect_with_config, ConnectConfig};
pub use error::{ClientError, Result};
pub use login::{AuthMethod, Credentials};
pub use status::{ChannelStatus, ConnectionStatus};
pub use subscription::EventStream;
