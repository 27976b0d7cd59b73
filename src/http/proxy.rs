//! TCP-facing HTTP proxy that tunnels one route through the Unix socket.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::future::Future;
use std::io;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::HttpConfig;
use crate::http::client::UnixHttpClient;

#[derive(Clone)]
struct ProxyState {
    client: UnixHttpClient,
}

/// HTTP proxy: `GET <proxy_route>` → `GET /` over the Unix socket.
pub struct ProxyServer {
    router: Router,
}

impl ProxyServer {
    pub fn new(config: &HttpConfig) -> Self {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let state = ProxyState {
            client: UnixHttpClient::new(&config.socket_path).with_timeout(timeout),
        };

        #[allow(deprecated)]
        let router = Router::new()
            .route(&config.proxy_route, get(forward))
            .with_state(state)
            .layer(TimeoutLayer::new(timeout))
            .layer(TraceLayer::new_for_http());

        Self { router }
    }

    /// The router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP proxy starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP proxy stopped");
        Ok(())
    }
}

/// Return the upstream body verbatim, or 500 with the error text.
async fn forward(State(state): State<ProxyState>) -> Response {
    match state.client.get("/").await {
        Ok(upstream) => upstream.body.into_response(),
        Err(e) => {
            tracing::warn!(
                socket = %state.client.socket_path().display(),
                error = %e,
                "Upstream request failed"
            );
            (StatusCode::INTERNAL_SERVER_ERROR, format!("{e}\n")).into_response()
        }
    }
}
