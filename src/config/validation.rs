//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, buffer sizes bounded)
//! - Check that addresses and paths are usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EchoConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::EchoConfig;

/// Largest accepted per-connection read buffer.
pub const MAX_BUFFER_SIZE: usize = 1024 * 1024;

/// Longest pause after a transient accept error.
pub const MAX_ACCEPT_DELAY_MS: u64 = 60_000;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.max_connections must be greater than 0")]
    ZeroConnections,

    #[error("connection.buffer_size must be between 1 and {MAX_BUFFER_SIZE}, got {0}")]
    BufferSize(usize),

    #[error("{field} is not a valid socket address: {value}")]
    Address { field: &'static str, value: String },

    #[error("{0} must not be empty")]
    EmptyPath(&'static str),

    #[error("accept.base_delay_ms ({base}) exceeds accept.max_delay_ms ({max})")]
    Backoff { base: u64, max: u64 },

    #[error("accept.max_delay_ms must be at most {MAX_ACCEPT_DELAY_MS}, got {0}")]
    BackoffCeiling(u64),

    #[error("http.proxy_route must start with '/', got {0:?}")]
    Route(String),
}

/// Check every semantic constraint, collecting all failures.
pub fn validate_config(config: &EchoConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroConnections);
    }

    let size = config.connection.buffer_size;
    if size == 0 || size > MAX_BUFFER_SIZE {
        errors.push(ValidationError::BufferSize(size));
    }

    for (field, value) in [
        ("tcp.bind_address", &config.tcp.bind_address),
        ("http.proxy_bind_address", &config.http.proxy_bind_address),
    ] {
        if value.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::Address {
                field,
                value: value.clone(),
            });
        }
    }

    for (field, value) in [
        ("unix.socket_path", &config.unix.socket_path),
        ("http.socket_path", &config.http.socket_path),
    ] {
        if value.trim().is_empty() {
            errors.push(ValidationError::EmptyPath(field));
        }
    }

    if config.accept.base_delay_ms > config.accept.max_delay_ms {
        errors.push(ValidationError::Backoff {
            base: config.accept.base_delay_ms,
            max: config.accept.max_delay_ms,
        });
    }

    if config.accept.max_delay_ms > MAX_ACCEPT_DELAY_MS {
        errors.push(ValidationError::BackoffCeiling(config.accept.max_delay_ms));
    }

    if !config.http.proxy_route.starts_with('/') {
        errors.push(ValidationError::Route(config.http.proxy_route.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&EchoConfig::default()), Ok(()));
    }

    #[test]
    fn rejects_oversized_buffer() {
        let mut config = EchoConfig::default();
        config.connection.buffer_size = MAX_BUFFER_SIZE + 1;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::BufferSize(MAX_BUFFER_SIZE + 1)]);
    }

    #[test]
    fn rejects_unbounded_backoff() {
        let mut config = EchoConfig::default();
        config.accept.max_delay_ms = u64::MAX;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::BackoffCeiling(u64::MAX)]);
    }

    #[test]
    fn collects_independent_errors() {
        let mut config = EchoConfig::default();
        config.tcp.bind_address = "not-an-address".into();
        config.unix.socket_path = "  ".into();
        config.accept.base_delay_ms = 10;
        config.accept.max_delay_ms = 1;
        config.http.proxy_route = "test".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::EmptyPath("unix.socket_path")));
        assert!(errors.contains(&ValidationError::Route("test".into())));
    }
}
