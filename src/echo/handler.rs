//! Per-connection echo handler.
//!
//! One read of up to `buffer_size` bytes, one write of exactly those bytes,
//! then the stream is closed. There is no framing: whatever arrived in the
//! first read is the message.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::config::{ConnectionConfig, TimeoutConfig};
use crate::resilience::timeouts::{deadline_from_secs, with_deadline};

/// How long a handler keeps reading (and discarding) after its echo.
pub const DEFAULT_LINGER: Duration = Duration::from_millis(250);

/// Settings each handler task runs with.
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    pub buffer_size: usize,
    pub read_deadline: Option<Duration>,
    pub write_deadline: Option<Duration>,
    /// Budget for the write-side shutdown plus discarding unread input.
    pub linger: Duration,
}

impl HandlerConfig {
    pub fn new(connection: &ConnectionConfig, timeouts: &TimeoutConfig) -> Self {
        Self {
            buffer_size: connection.buffer_size,
            read_deadline: deadline_from_secs(timeouts.read_secs),
            write_deadline: deadline_from_secs(timeouts.write_secs),
            linger: DEFAULT_LINGER,
        }
    }
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self::new(&ConnectionConfig::default(), &TimeoutConfig::default())
    }
}

/// What a successful handler did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoOutcome {
    /// This many bytes were read and written back.
    Echoed(usize),
    /// The peer closed its write side before sending anything.
    Empty,
}

/// Failure of a single connection. Never affects other connections.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("read failed: {0}")]
    Read(#[source] io::Error),

    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    #[error("read timed out after {0:?}")]
    ReadTimeout(Duration),

    #[error("write timed out after {0:?}")]
    WriteTimeout(Duration),
}

impl ConnectionError {
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ConnectionError::ReadTimeout(_) | ConnectionError::WriteTimeout(_)
        )
    }
}

/// Echo one message back on `stream`, consuming (and thereby closing) it.
pub async fn handle_connection<S>(
    mut stream: S,
    config: &HandlerConfig,
) -> Result<EchoOutcome, ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; config.buffer_size];

    let n = with_deadline(config.read_deadline, stream.read(&mut buf))
        .await
        .map_err(|_| ConnectionError::ReadTimeout(config.read_deadline.unwrap_or_default()))?
        .map_err(ConnectionError::Read)?;

    if n == 0 {
        return Ok(EchoOutcome::Empty);
    }

    with_deadline(config.write_deadline, stream.write_all(&buf[..n]))
        .await
        .map_err(|_| ConnectionError::WriteTimeout(config.write_deadline.unwrap_or_default()))?
        .map_err(ConnectionError::Write)?;

    // A TCP socket closed with unread input sends RST, and the peer may lose
    // the echo. Send FIN first, then read to EOF and throw the rest away.
    let closed = with_deadline(Some(config.linger), async {
        stream.shutdown().await?;
        let discarded = discard_unread(&mut stream, &mut buf).await?;
        Ok::<_, io::Error>(discarded)
    })
    .await;
    match closed {
        Ok(Ok(discarded)) if discarded > 0 => {
            tracing::trace!(discarded, "Dropped input beyond the first read");
        }
        Ok(Ok(_)) => {}
        Ok(Err(e)) => tracing::trace!(error = %e, "Close after echo failed"),
        Err(_) => tracing::trace!(linger = ?config.linger, "Peer kept the connection open past linger"),
    }

    Ok(EchoOutcome::Echoed(n))
}

/// Read until EOF, returning how many bytes were thrown away.
async fn discard_unread<S>(stream: &mut S, buf: &mut [u8]) -> io::Result<usize>
where
    S: AsyncRead + Unpin,
{
    let mut total = 0;
    loop {
        match stream.read(buf).await? {
            0 => return Ok(total),
            n => total += n,
        }
    }
}
