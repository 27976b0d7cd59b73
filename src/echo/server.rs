//! Accept loop for the echo service.
//!
//! # Responsibilities
//! - Pull connections off the listener and spawn one handler task each
//! - Keep handler failures (errors and panics) inside their own task
//! - Retry transient accept errors with backoff, stop on fatal ones
//! - On shutdown: stop accepting, drain in-flight handlers, remove the socket file

use std::io;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinSet};
use tokio::time::{sleep_until, Instant};

use crate::config::{AcceptConfig, EchoConfig, ErrorPolicy};
use crate::echo::handler::{handle_connection, ConnectionError, EchoOutcome, HandlerConfig};
use crate::net::{ConnectionId, ConnectionSource, ConnectionTracker, Incoming};
use crate::resilience::{classify_accept_error, AcceptErrorKind, Backoff};

type HandlerResult = (ConnectionId, Result<EchoOutcome, ConnectionError>);

/// Ceiling for a backoff pause whose deadline would overflow the clock.
const MAX_PAUSE: Duration = Duration::from_secs(3600);

/// Error that stops the accept loop.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    #[error("connection {id} failed: {source}")]
    ConnectionAborted {
        id: ConnectionId,
        #[source]
        source: ConnectionError,
    },
}

/// Counters for one run of the accept loop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServeReport {
    pub accepted: u64,
    pub echoed: u64,
    pub empty: u64,
    pub failed: u64,
    pub rejected: u64,
    /// Handlers still running when the grace period ran out.
    pub aborted: u64,
    pub accept_errors: u64,
}

/// Echo server: accept loop plus shutdown drain.
pub struct EchoServer {
    handler: Arc<HandlerConfig>,
    on_error: ErrorPolicy,
    accept: AcceptConfig,
    shutdown_grace: Duration,
    tracker: ConnectionTracker,
}

impl EchoServer {
    /// Create a new server with the given configuration.
    pub fn new(config: &EchoConfig) -> Self {
        Self {
            handler: Arc::new(HandlerConfig::new(&config.connection, &config.timeouts)),
            on_error: config.connection.on_error,
            accept: config.accept.clone(),
            shutdown_grace: Duration::from_secs(config.timeouts.shutdown_grace_secs),
            tracker: ConnectionTracker::new(),
        }
    }

    /// Live connection counter, shared with the running loop.
    pub fn tracker(&self) -> ConnectionTracker {
        self.tracker.clone()
    }

    /// Run the accept loop until `shutdown` fires (or its sender is dropped).
    pub async fn run<L: ConnectionSource>(
        &self,
        listener: L,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<ServeReport, ServerError> {
        if let Ok(endpoint) = listener.local_endpoint() {
            tracing::info!(endpoint = %endpoint, "Echo server accepting connections");
        }

        let mut tasks: JoinSet<HandlerResult> = JoinSet::new();
        let mut report = ServeReport::default();
        let mut backoff = Backoff::new(&self.accept);
        // Set while backing off from a transient accept error.
        let mut resume_at: Option<Instant> = None;

        let outcome = loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!(in_flight = tasks.len(), "Shutdown signal received, no longer accepting");
                    break Ok(());
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = self.record(joined, &mut report) {
                        break Err(e);
                    }
                }
                _ = sleep_until(resume_at.unwrap_or_else(Instant::now)), if resume_at.is_some() => {
                    resume_at = None;
                }
                incoming = listener.accept(), if resume_at.is_none() => match incoming {
                    Ok(Incoming::Admitted(stream, peer, permit)) => {
                        backoff.reset();
                        report.accepted += 1;

                        let guard = self.tracker.track();
                        let handler = Arc::clone(&self.handler);
                        tracing::debug!(connection_id = %guard.id(), peer = %peer, "New connection");

                        tasks.spawn(async move {
                            let result = handle_connection(stream, &handler).await;
                            drop(permit);
                            (guard.id(), result)
                        });
                    }
                    Ok(Incoming::Rejected(_)) => {
                        backoff.reset();
                        report.rejected += 1;
                    }
                    Err(e) => match classify_accept_error(&e) {
                        AcceptErrorKind::Transient => {
                            report.accept_errors += 1;
                            let delay = backoff.next_delay();
                            tracing::warn!(
                                error = %e,
                                attempt = backoff.attempt(),
                                delay = ?delay,
                                "Transient accept error, backing off"
                            );
                            let now = Instant::now();
                            resume_at = Some(now.checked_add(delay).unwrap_or(now + MAX_PAUSE));
                        }
                        AcceptErrorKind::Fatal => {
                            tracing::error!(error = %e, "Fatal accept error");
                            break Err(ServerError::Accept(e));
                        }
                    },
                },
            }
        };

        // Stop accepting before draining so queued peers see the close.
        let socket_file = listener.stop();

        if !tasks.is_empty() {
            tracing::info!(
                in_flight = self.tracker.active_count(),
                grace = ?self.shutdown_grace,
                "Draining connections"
            );
            if !self.tracker.drain(self.shutdown_grace).await {
                tracing::warn!(
                    remaining = self.tracker.active_count(),
                    "Grace period elapsed, aborting remaining connections"
                );
                tasks.abort_all();
            }
        }
        while let Some(joined) = tasks.join_next().await {
            // The first abort-policy failure already ended the loop.
            let _ = self.record(joined, &mut report);
        }

        if let Some(socket_file) = socket_file {
            if let Err(e) = socket_file.remove() {
                tracing::warn!(path = %socket_file.path().display(), error = %e, "Failed to remove socket file");
            }
        }

        tracing::info!(
            accepted = report.accepted,
            echoed = report.echoed,
            failed = report.failed,
            aborted = report.aborted,
            "Echo server stopped"
        );
        outcome.map(|()| report)
    }

    fn record(
        &self,
        joined: Result<HandlerResult, JoinError>,
        report: &mut ServeReport,
    ) -> Result<(), ServerError> {
        match joined {
            Ok((id, Ok(EchoOutcome::Echoed(bytes)))) => {
                report.echoed += 1;
                tracing::debug!(connection_id = %id, bytes, "Echoed message");
            }
            Ok((id, Ok(EchoOutcome::Empty))) => {
                report.empty += 1;
                tracing::debug!(connection_id = %id, "Peer closed without sending data");
            }
            Ok((id, Err(e))) => {
                report.failed += 1;
                tracing::warn!(connection_id = %id, error = %e, "Connection failed");
                if self.on_error == ErrorPolicy::Abort {
                    return Err(ServerError::ConnectionAborted { id, source: e });
                }
            }
            Err(e) if e.is_cancelled() => report.aborted += 1,
            Err(e) => {
                report.failed += 1;
                tracing::error!(error = %e, "Connection handler panicked");
            }
        }
        Ok(())
    }
}
