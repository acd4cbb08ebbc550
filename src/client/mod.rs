//! Operator UI client subsystem.
//!
//! # Data Flow
//! ```text
//! Server.Address (config)
//!     → address.rs (strip unix:// and flag local sockets)
//!     → connection.rs (compare with active target, disconnect, commit)
//!     → transport reconnects to the committed target
//! ```

pub mod address;
pub mod connection;

pub use address::{resolve_address, SocketTarget};
pub use connection::{ClientConnection, ReconnectPoller, Transport};
