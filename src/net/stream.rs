//! Transport-independent stream and peer address.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::{TcpStream, UnixStream};

use crate::net::endpoint::Endpoint;

/// An accepted (or dialed) byte stream.
#[derive(Debug)]
pub enum EchoStream {
    Tcp(TcpStream),
    Unix(UnixStream),
}

impl EchoStream {
    /// Dial an endpoint.
    pub async fn connect(endpoint: &Endpoint) -> io::Result<Self> {
        match endpoint {
            Endpoint::Tcp(addr) => Ok(EchoStream::Tcp(TcpStream::connect(addr.as_str()).await?)),
            Endpoint::Unix(path) => Ok(EchoStream::Unix(UnixStream::connect(path).await?)),
        }
    }
}

impl AsyncRead for EchoStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            EchoStream::Tcp(s) => Pin::new(s).poll_read(cx, buf),
            EchoStream::Unix(s) => Pin::new(s).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for EchoStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            EchoStream::Tcp(s) => Pin::new(s).poll_write(cx, buf),
            EchoStream::Unix(s) => Pin::new(s).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            EchoStream::Tcp(s) => Pin::new(s).poll_flush(cx),
            EchoStream::Unix(s) => Pin::new(s).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            EchoStream::Tcp(s) => Pin::new(s).poll_shutdown(cx),
            EchoStream::Unix(s) => Pin::new(s).poll_shutdown(cx),
        }
    }
}

/// Address of the remote side of an accepted connection.
#[derive(Debug, Clone)]
pub enum PeerAddr {
    Tcp(SocketAddr),
    /// Unix peers are usually unnamed.
    Unix(Option<std::path::PathBuf>),
}

impl fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerAddr::Tcp(addr) => write!(f, "{}", addr),
            PeerAddr::Unix(Some(path)) => write!(f, "{}", path.display()),
            PeerAddr::Unix(None) => f.write_str("unix:unnamed"),
        }
    }
}
