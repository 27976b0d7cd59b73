//! Listener provider with backpressure.
//!
//! # Responsibilities
//! - Bind a TCP port or a Unix socket file
//! - Recover from socket files left behind by a crashed run
//! - Enforce max_connections limit via semaphore
//! - Hand accept errors back unclassified (the accept loop decides)

use std::fs;
use std::future::Future;
use std::io;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::net::{TcpListener, UnixListener, UnixStream};
use tokio::sync::Semaphore;

use crate::config::{ListenerConfig, OverflowPolicy, StaleSocketPolicy};
use crate::lifecycle::SocketFile;
use crate::net::endpoint::Endpoint;
use crate::net::stream::{EchoStream, PeerAddr};

/// Error type for listener setup.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("Failed to bind {endpoint}: {source}")]
    Bind {
        endpoint: Endpoint,
        #[source]
        source: io::Error,
    },

    /// A live server already answers on the socket path.
    #[error("Socket {} is in use by another process", .0.display())]
    SocketInUse(PathBuf),

    /// Something other than a socket occupies the path.
    #[error("{} exists and is not a socket", .0.display())]
    NotASocket(PathBuf),
}

enum Inner {
    Tcp(TcpListener),
    Unix {
        listener: UnixListener,
        socket_file: Arc<SocketFile>,
    },
}

/// Outcome of one accept.
#[derive(Debug)]
pub enum Incoming {
    /// The connection holds a slot until the permit is dropped.
    Admitted(EchoStream, PeerAddr, ConnectionPermit),
    /// No slot was free; the connection has already been closed.
    Rejected(PeerAddr),
}

/// What the accept loop needs from a listener.
pub trait ConnectionSource: Send + Sync {
    /// Wait for the next connection.
    fn accept(&self) -> impl Future<Output = io::Result<Incoming>> + Send;

    /// The endpoint peers dial, for logging.
    fn local_endpoint(&self) -> io::Result<Endpoint>;

    /// Stop accepting, handing back the socket file if there is one.
    fn stop(self) -> Option<Arc<SocketFile>>;
}

/// A bounded listener that limits concurrent connections.
///
/// Uses a semaphore to enforce `max_connections`. With
/// [`OverflowPolicy::Queue`] new connections wait in the kernel backlog until
/// a slot becomes available; with [`OverflowPolicy::Reject`] they are
/// accepted and closed straight away.
pub struct Listener {
    inner: Inner,
    connection_limit: Arc<Semaphore>,
    max_connections: usize,
    overflow: OverflowPolicy,
}

impl Listener {
    /// Bind to the endpoint with connection limits.
    pub async fn bind(
        endpoint: &Endpoint,
        config: &ListenerConfig,
        stale_socket: StaleSocketPolicy,
    ) -> Result<Self, ListenerError> {
        let inner = match endpoint {
            Endpoint::Tcp(addr) => {
                let listener = TcpListener::bind(addr.as_str())
                    .await
                    .map_err(|source| ListenerError::Bind {
                        endpoint: endpoint.clone(),
                        source,
                    })?;
                Inner::Tcp(listener)
            }
            Endpoint::Unix(path) => {
                let (listener, socket_file) = bind_unix(path, stale_socket).await?;
                Inner::Unix {
                    listener,
                    socket_file,
                }
            }
        };

        tracing::info!(
            endpoint = %endpoint,
            max_connections = config.max_connections,
            overflow = ?config.overflow,
            "Listener bound"
        );

        Ok(Self {
            inner,
            connection_limit: Arc::new(Semaphore::new(config.max_connections)),
            max_connections: config.max_connections,
            overflow: config.overflow,
        })
    }

    /// Accept a new connection, respecting the connection limit.
    pub async fn accept(&self) -> io::Result<Incoming> {
        match self.overflow {
            OverflowPolicy::Queue => {
                // Acquire permit first (backpressure)
                let permit = self
                    .connection_limit
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|_| io::Error::other("connection limit closed"))?;

                let (stream, peer) = self.accept_raw().await?;
                self.log_accepted(&peer);
                Ok(Incoming::Admitted(stream, peer, ConnectionPermit { _permit: permit }))
            }
            OverflowPolicy::Reject => {
                let (stream, peer) = self.accept_raw().await?;
                match self.connection_limit.clone().try_acquire_owned() {
                    Ok(permit) => {
                        self.log_accepted(&peer);
                        Ok(Incoming::Admitted(stream, peer, ConnectionPermit { _permit: permit }))
                    }
                    Err(_) => {
                        drop(stream);
                        tracing::warn!(
                            peer_addr = %peer,
                            max_connections = self.max_connections,
                            "Connection rejected: limit reached"
                        );
                        Ok(Incoming::Rejected(peer))
                    }
                }
            }
        }
    }

    async fn accept_raw(&self) -> io::Result<(EchoStream, PeerAddr)> {
        match &self.inner {
            Inner::Tcp(listener) => {
                let (stream, addr) = listener.accept().await?;
                Ok((EchoStream::Tcp(stream), PeerAddr::Tcp(addr)))
            }
            Inner::Unix { listener, .. } => {
                let (stream, addr) = listener.accept().await?;
                let path = addr.as_pathname().map(Path::to_path_buf);
                Ok((EchoStream::Unix(stream), PeerAddr::Unix(path)))
            }
        }
    }

    fn log_accepted(&self, peer: &PeerAddr) {
        tracing::debug!(
            peer_addr = %peer,
            available_permits = self.available_permits(),
            "Connection accepted"
        );
    }

    /// The endpoint this listener is actually bound to (resolves port 0).
    pub fn local_endpoint(&self) -> io::Result<Endpoint> {
        match &self.inner {
            Inner::Tcp(listener) => Ok(Endpoint::Tcp(listener.local_addr()?.to_string())),
            Inner::Unix { socket_file, .. } => {
                Ok(Endpoint::Unix(socket_file.path().to_path_buf()))
            }
        }
    }

    /// Shared handle on the socket file, for Unix listeners.
    pub fn socket_file(&self) -> Option<Arc<SocketFile>> {
        match &self.inner {
            Inner::Tcp(_) => None,
            Inner::Unix { socket_file, .. } => Some(Arc::clone(socket_file)),
        }
    }

    /// Close the listening socket, keeping the socket file for the caller to remove.
    pub fn stop(self) -> Option<Arc<SocketFile>> {
        match self.inner {
            Inner::Tcp(_) => None,
            Inner::Unix { socket_file, .. } => Some(socket_file),
        }
    }

    /// Get current available connection slots.
    pub fn available_permits(&self) -> usize {
        self.connection_limit.available_permits()
    }
}

impl ConnectionSource for Listener {
    async fn accept(&self) -> io::Result<Incoming> {
        Listener::accept(self).await
    }

    fn local_endpoint(&self) -> io::Result<Endpoint> {
        Listener::local_endpoint(self)
    }

    fn stop(self) -> Option<Arc<SocketFile>> {
        Listener::stop(self)
    }
}

/// Bind a bare Unix listener with stale-socket handling.
///
/// The HTTP server uses this directly; [`Listener::bind`] wraps it.
pub async fn bind_unix(
    path: &Path,
    stale_socket: StaleSocketPolicy,
) -> Result<(UnixListener, Arc<SocketFile>), ListenerError> {
    let endpoint = Endpoint::Unix(path.to_path_buf());
    if stale_socket == StaleSocketPolicy::Remove {
        clear_stale_socket(path).await.map_err(|e| match e {
            StaleCheck::Io(source) => ListenerError::Bind {
                endpoint: endpoint.clone(),
                source,
            },
            StaleCheck::InUse => ListenerError::SocketInUse(path.to_path_buf()),
            StaleCheck::NotASocket => ListenerError::NotASocket(path.to_path_buf()),
        })?;
    }
    let listener =
        UnixListener::bind(path).map_err(|source| ListenerError::Bind { endpoint, source })?;
    tracing::debug!(path = %path.display(), "Socket file created");
    Ok((listener, Arc::new(SocketFile::new(path))))
}

enum StaleCheck {
    Io(io::Error),
    InUse,
    NotASocket,
}

/// Remove `path` if it is a socket file that nobody is listening on.
async fn clear_stale_socket(path: &Path) -> Result<(), StaleCheck> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(StaleCheck::Io(e)),
    };

    if !metadata.file_type().is_socket() {
        return Err(StaleCheck::NotASocket);
    }

    match UnixStream::connect(path).await {
        Ok(_) => Err(StaleCheck::InUse),
        Err(e) if e.kind() == io::ErrorKind::ConnectionRefused => {
            fs::remove_file(path).map_err(StaleCheck::Io)?;
            tracing::warn!(path = %path.display(), "Removed stale socket file");
            Ok(())
        }
        Err(e) => Err(StaleCheck::Io(e)),
    }
}

/// A permit representing a connection slot.
///
/// When dropped, the connection slot is released back to the pool.
/// This ensures backpressure is maintained even if the connection handler panics.
#[derive(Debug)]
pub struct ConnectionPermit {
    _permit: tokio::sync::OwnedSemaphorePermit,
}
