//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → EchoConfig (validated, immutable)
//!     → CLI flags override individual fields in main
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AcceptConfig, ConnectionConfig, EchoConfig, ErrorPolicy, HttpConfig, ListenerConfig,
    ObservabilityConfig, OverflowPolicy, StaleSocketPolicy, TcpConfig, TimeoutConfig, UnixConfig,
};
pub use validation::{validate_config, ValidationError};
