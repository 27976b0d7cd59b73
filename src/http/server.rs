//! HTTP server bound to a Unix socket.
//!
//! # Responsibilities
//! - Create the Axum router answering every request with the greeting
//! - Wire up middleware (tracing, request timeout)
//! - Serve on a `UnixListener` until shutdown, then remove the socket file

use axum::{extract::State, Router};
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UnixListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::HttpConfig;
use crate::lifecycle::SocketFile;

/// Application state injected into handlers.
#[derive(Clone)]
struct GreetingState {
    greeting: Arc<str>,
}

/// HTTP server that greets every caller.
pub struct GreetingServer {
    router: Router,
}

impl GreetingServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: &HttpConfig) -> Self {
        Self {
            router: Self::build_router(config),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &HttpConfig) -> Router {
        let state = GreetingState {
            greeting: Arc::from(config.greeting.as_str()),
        };

        // Every path is served, like a mux rooted at "/".
        Router::new()
            .fallback(greet)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(TraceLayer::new_for_http())
    }

    /// The router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires, then remove the socket file.
    pub async fn run(
        self,
        listener: UnixListener,
        socket_file: Arc<SocketFile>,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), io::Error> {
        tracing::info!(path = %socket_file.path().display(), "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        socket_file.remove()?;
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn greet(State(state): State<GreetingState>) -> String {
    state.greeting.to_string()
}
