//! Ownership of a Unix socket's filesystem entry.
//!
//! The listener, the signal path and the orderly shutdown path all hold the
//! same [`SocketFile`]; whichever calls [`SocketFile::remove`] first unlinks
//! the file, later calls are no-ops.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug)]
pub struct SocketFile {
    path: PathBuf,
    removed: AtomicBool,
}

impl SocketFile {
    /// Take ownership of the socket file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            removed: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unlink the socket file.
    ///
    /// Returns `Ok(true)` if this call removed it, `Ok(false)` if another
    /// caller got there first or the file was already gone.
    pub fn remove(&self) -> io::Result<bool> {
        if self.removed.swap(true, Ordering::SeqCst) {
            return Ok(false);
        }

        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), "Socket file removed");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

impl Drop for SocketFile {
    fn drop(&mut self) {
        if let Err(e) = self.remove() {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove socket file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("echo.sock");
        fs::write(&path, b"").unwrap();

        let file = SocketFile::new(&path);
        assert!(file.remove().unwrap());
        assert!(!path.exists());

        // A new file at the same path belongs to someone else now.
        fs::write(&path, b"").unwrap();
        assert!(!file.remove().unwrap());
        assert!(path.exists());
    }

    #[test]
    fn drop_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("echo.sock");
        fs::write(&path, b"").unwrap();

        drop(SocketFile::new(&path));
        assert!(!path.exists());
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = SocketFile::new(dir.path().join("never-created.sock"));
        assert!(!file.remove().unwrap());
        assert!(!file.remove().unwrap());
    }
}
