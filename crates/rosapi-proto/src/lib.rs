//! Reply-sentence grammar for the RouterOS API.
//!
//! Turns a decoded word list into a typed [`Event`]: the reply class
//! (`!re`/`!done`/`!trap`/`!fatal`), the routing tag, the `=ret=` value and
//! the remaining attributes. The channel layer routes and correlates events
//! purely through this representation.

pub mod args;
pub mod error;
pub mod event;
pub mod parser;

pub use args::{args_from_pairs, record_map};
pub use error::{ProtoError, Result};
pub use event::{Event, EventKind};
pub use parser::parse_sentence;
