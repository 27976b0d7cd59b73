//! Echo service subsystem.
//!
//! # Data Flow
//! ```text
//! Listener (TCP or Unix)
//!     → server.rs (accept loop, one task per connection, drain on shutdown)
//!     → handler.rs (one read, one write, close)
//! ```
//!
//! # Design Decisions
//! - Handler failures are values returned from their own task, never process exits
//! - Connections are accepted in arrival order; handlers finish in any order
//! - No framing: a message is whatever the first read returned

pub mod handler;
pub mod server;

pub use handler::{handle_connection, ConnectionError, EchoOutcome, HandlerConfig};
pub use server::{EchoServer, ServeReport, ServerError};
