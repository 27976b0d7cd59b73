//! HTTP over Unix-domain sockets.
//!
//! # Data Flow
//! ```text
//! TCP client
//!     → proxy.rs (GET /test on 0.0.0.0:8000)
//!     → client.rs (hyper HTTP/1.1 over a fresh UnixStream)
//!     → server.rs (Axum on /tmp/httpecho.sock, returns the greeting)
//! ```

pub mod client;
pub mod proxy;
pub mod server;

pub use client::{ClientError, UnixHttpClient, UpstreamResponse};
pub use proxy::ProxyServer;
pub use server::GreetingServer;
