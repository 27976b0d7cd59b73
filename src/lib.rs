//! Socket echo services library

pub mod bench;
pub mod config;
pub mod echo;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resilience;

pub use config::schema::EchoConfig;
pub use echo::EchoServer;
pub use lifecycle::Shutdown;
pub use net::{Endpoint, Listener};
