//! CQL native protocol client for cqldump
//!
//! A synchronous, single-connection client for native protocol version 4:
//! - Frame: header layout and opcodes
//! - Codec: body notation types (`[string]`, `[bytes]`, ...)
//! - Types: result metadata types and value decoding
//! - Response: ERROR, READY, AUTHENTICATE, RESULT, ...
//! - Connection: handshake, password authentication, QUERY with paging
//! - Session: [`cqldump_core::Session`] with schema read from `system_schema`
//!
//! TLS and protocol version 1 authentication are not supported.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod connection;
pub mod frame;
pub mod options;
pub mod response;
pub mod session;
pub mod types;

pub use connection::Connection;
pub use frame::{Frame, FrameError, Opcode};
pub use options::{ConnectOptions, CONFIG_FILE_NAME};
pub use response::{QueryResult, Response, RowsPage};
pub use session::NativeSession;
