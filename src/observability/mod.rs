//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (connection_id, peer, bytes, error)
//!     → logging.rs (subscriber: env filter + fmt layer to stdout)
//! ```
//!
//! # Design Decisions
//! - Structured fields instead of formatted strings where possible
//! - Per-connection events at debug, so the default level stays quiet under load

pub mod logging;

pub use logging::init_logging;
