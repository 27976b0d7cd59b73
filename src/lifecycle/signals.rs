//! OS signal handling.
//!
//! # Responsibilities
//! - Register SIGINT and SIGTERM handlers
//! - First signal starts a graceful shutdown
//! - A second signal removes the socket file and exits immediately

use std::io;
use std::sync::Arc;

use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::task::JoinHandle;

use crate::lifecycle::{Shutdown, SocketFile};

/// Exit status used for every signal-triggered exit.
pub const SIGNAL_EXIT_CODE: u8 = 1;

/// The termination signal that was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    Interrupt,
    Terminate,
}

impl std::fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationSignal::Interrupt => f.write_str("SIGINT"),
            TerminationSignal::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Registered SIGINT and SIGTERM streams.
pub struct TerminationSignals {
    interrupt: Signal,
    terminate: Signal,
}

impl TerminationSignals {
    /// Register the handlers. Signals delivered after this returns are queued.
    pub fn install() -> io::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    /// Wait for the next SIGINT or SIGTERM.
    pub async fn recv(&mut self) -> TerminationSignal {
        tokio::select! {
            _ = self.interrupt.recv() => TerminationSignal::Interrupt,
            _ = self.terminate.recv() => TerminationSignal::Terminate,
        }
    }
}

/// Install the signal handlers and return the task that watches them.
///
/// The task resolves with the first signal after triggering `shutdown`, but
/// keeps listening in the background: a second signal removes the socket
/// file and exits the process with [`SIGNAL_EXIT_CODE`].
pub fn spawn_signal_watcher(
    shutdown: Shutdown,
    socket_file: Option<Arc<SocketFile>>,
) -> io::Result<JoinHandle<TerminationSignal>> {
    let mut signals = TerminationSignals::install()?;

    Ok(tokio::spawn(async move {
        let first = signals.recv().await;
        tracing::info!(signal = %first, "Termination signal received, shutting down");
        shutdown.trigger();

        tokio::spawn(async move {
            let second = signals.recv().await;
            tracing::warn!(signal = %second, "Second termination signal, exiting immediately");
            if let Some(socket_file) = socket_file {
                if let Err(e) = socket_file.remove() {
                    tracing::error!(
                        path = %socket_file.path().display(),
                        error = %e,
                        "Failed to remove socket file"
                    );
                }
            }
            std::process::exit(i32::from(SIGNAL_EXIT_CODE));
        });

        first
    }))
}
