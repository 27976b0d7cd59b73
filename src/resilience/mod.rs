//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Accept loop:
//!     → accept.rs (transient vs fatal accept errors)
//!     → backoff.rs (sleep before retrying a transient error)
//!
//! Connection handler:
//!     → timeouts.rs (deadline on each read and write)
//! ```
//!
//! # Design Decisions
//! - Accept errors never panic; only unrecoverable ones stop the loop
//! - Timeout errors are distinct from other I/O errors

pub mod accept;
pub mod backoff;
pub mod timeouts;

pub use accept::{classify_accept_error, AcceptErrorKind};
pub use backoff::{calculate_backoff, Backoff};
pub use timeouts::with_deadline;
