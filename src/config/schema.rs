//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the echo
//! services. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the echo services.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EchoConfig {
    /// Admission control shared by every listener.
    pub listener: ListenerConfig,

    /// TCP echo server settings.
    pub tcp: TcpConfig,

    /// Unix-domain-socket echo server settings.
    pub unix: UnixConfig,

    /// Per-connection handler settings.
    pub connection: ConnectionConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Accept loop backoff for transient errors.
    pub accept: AcceptConfig,

    /// HTTP-over-UDS server and proxy settings.
    pub http: HttpConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener admission control.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,

    /// What to do with a connection that arrives while all slots are taken.
    pub overflow: OverflowPolicy,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            max_connections: 10_000,
            overflow: OverflowPolicy::Queue,
        }
    }
}

/// Behavior when `max_connections` is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Stop accepting until a slot frees up.
    #[default]
    Queue,
    /// Accept and immediately close the connection.
    Reject,
}

/// TCP echo listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TcpConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Unix-domain-socket echo listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UnixConfig {
    /// Filesystem path of the socket file.
    pub socket_path: String,

    /// How to treat a socket file left behind by a previous run.
    pub stale_socket: StaleSocketPolicy,
}

impl Default for UnixConfig {
    fn default() -> Self {
        Self {
            socket_path: "/tmp/echo.sock".to_string(),
            stale_socket: StaleSocketPolicy::Remove,
        }
    }
}

/// Handling of a pre-existing path when binding a Unix socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StaleSocketPolicy {
    /// Bind fails if anything exists at the path.
    Fail,
    /// Remove the path if it is a socket nobody is listening on.
    #[default]
    Remove,
}

/// Connection handler settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Size of the single read performed per connection.
    pub buffer_size: usize,

    /// Whether a failed connection is contained or stops the server.
    pub on_error: ErrorPolicy,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            buffer_size: 4096,
            on_error: ErrorPolicy::Isolate,
        }
    }
}

/// Scope of a connection handler failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Log and close only the failing connection.
    #[default]
    Isolate,
    /// Stop the server on the first failed connection.
    Abort,
}

/// Timeout configuration for connection I/O and shutdown.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for the read in seconds (0 waits forever).
    pub read_secs: u64,

    /// Deadline for the echo write in seconds (0 waits forever).
    pub write_secs: u64,

    /// Time in-flight connections get to finish after a shutdown signal.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            read_secs: 30,
            write_secs: 30,
            shutdown_grace_secs: 5,
        }
    }
}

/// Backoff applied after transient accept errors.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AcceptConfig {
    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for AcceptConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 5,
            max_delay_ms: 1000,
        }
    }
}

/// HTTP over Unix socket.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Socket file the HTTP server listens on and the proxy dials.
    pub socket_path: String,

    /// Body returned for `GET /`.
    pub greeting: String,

    /// TCP address of the proxy.
    pub proxy_bind_address: String,

    /// Route on the proxy that is forwarded through the socket.
    pub proxy_route: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// How to treat a socket file left behind by a previous run.
    pub stale_socket: StaleSocketPolicy,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            socket_path: "/tmp/httpecho.sock".to_string(),
            greeting: "Hello kung fu developer! ".to_string(),
            proxy_bind_address: "0.0.0.0:8000".to_string(),
            proxy_route: "/test".to_string(),
            request_timeout_secs: 30,
            stale_socket: StaleSocketPolicy::Remove,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_well_known_endpoints() {
        let config = EchoConfig::default();
        assert_eq!(config.tcp.bind_address, "0.0.0.0:8000");
        assert_eq!(config.unix.socket_path, "/tmp/echo.sock");
        assert_eq!(config.http.socket_path, "/tmp/httpecho.sock");
        assert_eq!(config.connection.buffer_size, 4096);
        assert_eq!(config.connection.on_error, ErrorPolicy::Isolate);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let toml_str = r#"
            [unix]
            socket_path = "/run/echo.sock"
            stale_socket = "fail"

            [timeouts]
            read_secs = 2

            [listener]
            overflow = "reject"
        "#;

        let config: EchoConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.unix.socket_path, "/run/echo.sock");
        assert_eq!(config.unix.stale_socket, StaleSocketPolicy::Fail);
        assert_eq!(config.timeouts.read_secs, 2);
        assert_eq!(config.timeouts.write_secs, 30);
        assert_eq!(config.listener.overflow, OverflowPolicy::Reject);
        assert_eq!(config.listener.max_connections, 10_000);
        assert_eq!(config.tcp.bind_address, "0.0.0.0:8000");
    }
}
