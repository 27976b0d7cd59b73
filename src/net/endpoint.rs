//! Endpoint descriptors.
//!
//! An [`Endpoint`] names where a listener binds or a client dials: a TCP
//! `host:port` or a filesystem path for a Unix-domain socket.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Error returned when an endpoint string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    #[error("endpoint is empty")]
    Empty,

    #[error("TCP endpoint {0:?} is missing a port")]
    MissingPort(String),
}

/// Where to bind or connect.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `host:port`, resolved when binding or dialing.
    Tcp(String),
    /// Path of the socket file.
    Unix(PathBuf),
}

impl Endpoint {
    /// Socket file path, for Unix endpoints.
    pub fn socket_path(&self) -> Option<&Path> {
        match self {
            Endpoint::Tcp(_) => None,
            Endpoint::Unix(path) => Some(path),
        }
    }
}

impl FromStr for Endpoint {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EndpointError::Empty);
        }

        if let Some(rest) = s.strip_prefix("unix://").or_else(|| s.strip_prefix("unix:")) {
            if rest.is_empty() {
                return Err(EndpointError::Empty);
            }
            return Ok(Endpoint::Unix(PathBuf::from(rest)));
        }
        if s.starts_with('/') || s.starts_with('.') {
            return Ok(Endpoint::Unix(PathBuf::from(s)));
        }

        let addr = s.strip_prefix("tcp://").unwrap_or(s);
        match addr.rsplit_once(':') {
            Some((_, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => {
                Ok(Endpoint::Tcp(addr.to_string()))
            }
            _ => Err(EndpointError::MissingPort(addr.to_string())),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Tcp(addr) => write!(f, "tcp://{}", addr),
            Endpoint::Unix(path) => write!(f, "unix://{}", path.display()),
        }
    }
}
