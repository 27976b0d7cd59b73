//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!     second SIGTERM/SIGINT → remove socket file, exit immediately
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Exit
//!
//! Socket file (socket_file.rs):
//!     Created by bind → removed once, by drain completion or forced exit
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: stop accept, drain, remove socket file
//! - Shutdown has timeout: in-flight handlers are aborted after the grace period

pub mod shutdown;
pub mod signals;
pub mod socket_file;

pub use shutdown::Shutdown;
pub use signals::{spawn_signal_watcher, TerminationSignal, TerminationSignals, SIGNAL_EXIT_CODE};
pub use socket_file::SocketFile;
