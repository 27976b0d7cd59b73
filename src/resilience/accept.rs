//! Accept error classification.

use std::io;

/// How the accept loop should react to an error from `accept()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptErrorKind {
    /// The listener is fine; back off and accept again.
    Transient,
    /// The listener is unusable; stop serving.
    Fatal,
}

/// Classify an `accept()` failure.
///
/// Aborted handshakes and interrupted calls concern a single peer. Running out
/// of descriptors or buffer memory clears up once other connections close.
pub fn classify_accept_error(err: &io::Error) -> AcceptErrorKind {
    match err.kind() {
        io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::Interrupted
        | io::ErrorKind::WouldBlock
        | io::ErrorKind::TimedOut => return AcceptErrorKind::Transient,
        _ => {}
    }

    match err.raw_os_error() {
        Some(libc::EMFILE | libc::ENFILE | libc::ENOBUFS | libc::ENOMEM) => {
            AcceptErrorKind::Transient
        }
        _ => AcceptErrorKind::Fatal,
    }
}
