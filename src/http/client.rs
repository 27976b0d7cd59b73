//! HTTP/1.1 client that dials a Unix socket.
//!
//! Each request opens its own connection, so a dead server is noticed on the
//! next call rather than through a stale pooled connection.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::UnixStream;

use crate::resilience::with_deadline;

/// Largest response body the client buffers.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Error type for requests over the socket.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("dial unix {}: {source}", path.display())]
    Connect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("HTTP handshake failed: {0}")]
    Handshake(#[source] hyper::Error),

    #[error("request failed: {0}")]
    Request(#[source] hyper::Error),

    #[error("invalid request: {0}")]
    Build(#[from] axum::http::Error),

    #[error("failed to read response body: {0}")]
    Body(#[source] axum::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

/// Status and buffered body of an upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

#[derive(Debug, Clone)]
pub struct UnixHttpClient {
    socket_path: PathBuf,
    timeout: Option<Duration>,
}

impl UnixHttpClient {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            timeout: None,
        }
    }

    /// Bound the whole request (dial, handshake, response body).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// `GET path` on the server behind the socket.
    pub async fn get(&self, path: &str) -> Result<UpstreamResponse, ClientError> {
        with_deadline(self.timeout, self.send(Method::GET, path))
            .await
            .map_err(|_| ClientError::Timeout(self.timeout.unwrap_or_default()))?
    }

    async fn send(&self, method: Method, path: &str) -> Result<UpstreamResponse, ClientError> {
        let stream = UnixStream::connect(&self.socket_path)
            .await
            .map_err(|source| ClientError::Connect {
                path: self.socket_path.clone(),
                source,
            })?;

        let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
            .await
            .map_err(ClientError::Handshake)?;
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!(error = %e, "Upstream connection closed with error");
            }
        });

        // The authority is a placeholder; the socket path decides where this goes.
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header(header::HOST, "unix")
            .body(Body::empty())?;

        let response = sender
            .send_request(request)
            .await
            .map_err(ClientError::Request)?;
        let status = response.status();
        let body = axum::body::to_bytes(Body::new(response.into_body()), MAX_BODY_BYTES)
            .await
            .map_err(ClientError::Body)?;

        tracing::debug!(status = %status, bytes = body.len(), "Upstream response");
        Ok(UpstreamResponse { status, body })
    }
}
