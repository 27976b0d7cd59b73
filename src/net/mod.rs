//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Endpoint (tcp://host:port | unix://path)
//!     → listener.rs (bind, stale socket recovery, connection limits)
//!     → stream.rs (TCP/Unix stream behind one AsyncRead + AsyncWrite type)
//!     → connection.rs (lifecycle tracking for drain)
//!     → Hand off to the echo handler
//! ```
//!
//! # Design Decisions
//! - Bounded admission prevents resource exhaustion
//! - Each connection tracked for graceful shutdown
//! - Unix socket files are owned by a shared handle, removed exactly once

pub mod connection;
pub mod endpoint;
pub mod listener;
pub mod stream;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use endpoint::{Endpoint, EndpointError};
pub use listener::{bind_unix, ConnectionPermit, ConnectionSource, Incoming, Listener, ListenerError};
pub use stream::{EchoStream, PeerAddr};
