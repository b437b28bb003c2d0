//! RouterOS management API client.
//!
//! rosapi speaks the router's binary word/sentence protocol and multiplexes
//! any number of logical command channels over one TCP connection, with
//! per-command correlation of `!done`/`!trap` outcomes.
//!
//! # Crate Structure
//!
//! - [`transport`] — TCP stream abstraction
//! - [`frame`] — Word/sentence wire codec
//! - [`proto`] — Reply grammar and typed events
//! - [`client`] — Connection, channels, login, command correlation
//!   (behind the `client` feature)

/// Re-export transport types.
pub mod transport {
    pub use rosapi_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use rosapi_frame::*;
}

/// Re-export protocol grammar types.
pub mod proto {
    pub use rosapi_proto::*;
}

/// Re-export client types (requires `client` feature).
#[cfg(feature = "client")]
pub mod client {
    pub use rosapi_client::*;
}
