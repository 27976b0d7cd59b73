//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap connection reads and writes with a deadline
//! - Cancel operations cleanly on timeout
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - A missing deadline means the operation may wait forever

use std::future::Future;
use std::time::Duration;

use tokio::time::error::Elapsed;

/// Run `fut` under an optional deadline.
pub async fn with_deadline<F: Future>(
    deadline: Option<Duration>,
    fut: F,
) -> Result<F::Output, Elapsed> {
    match deadline {
        Some(limit) => tokio::time::timeout(limit, fut).await,
        None => Ok(fut.await),
    }
}

/// Seconds from config to a deadline; zero disables it.
pub fn deadline_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
