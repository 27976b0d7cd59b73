//! Sequential request/response load.

use std::io;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::net::{EchoStream, Endpoint};

/// Parameters of a sequential run.
#[derive(Debug, Clone)]
pub struct BenchOptions {
    pub requests: u64,
    pub message: String,
}

impl Default for BenchOptions {
    fn default() -> Self {
        Self {
            requests: 10_000,
            message: "I'm a Kungfu Dev".to_string(),
        }
    }
}

/// A round trip failed; the run stops there.
#[derive(Debug, thiserror::Error)]
#[error("request {request} to {endpoint} failed while {stage}: {source}")]
pub struct BenchError {
    pub endpoint: Endpoint,
    pub request: u64,
    pub stage: &'static str,
    #[source]
    pub source: io::Error,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct BenchReport {
    pub endpoint: String,
    pub requests: u64,
    pub succeeded: u64,
    /// Replies that differed from the message sent.
    pub mismatched: u64,
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

impl BenchReport {
    pub fn requests_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.requests as f64 / secs
        } else {
            0.0
        }
    }
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Dial, send, read back, close; `options.requests` times in a row.
pub async fn run_sequential(
    endpoint: &Endpoint,
    options: &BenchOptions,
) -> Result<BenchReport, BenchError> {
    let message = options.message.as_bytes();
    let mut buf = vec![0u8; message.len()];
    let mut succeeded = 0;
    let mut mismatched = 0;

    let fail = |request, stage, source| BenchError {
        endpoint: endpoint.clone(),
        request,
        stage,
        source,
    };

    let start = Instant::now();
    for request in 1..=options.requests {
        let mut stream = EchoStream::connect(endpoint)
            .await
            .map_err(|e| fail(request, "connecting", e))?;
        stream
            .write_all(message)
            .await
            .map_err(|e| fail(request, "writing", e))?;
        let n = stream
            .read(&mut buf)
            .await
            .map_err(|e| fail(request, "reading", e))?;

        if buf[..n] == *message {
            succeeded += 1;
        } else {
            mismatched += 1;
            tracing::warn!(request, got = %String::from_utf8_lossy(&buf[..n]), "Echo mismatch");
        }
        tracing::trace!(request, reply = %String::from_utf8_lossy(&buf[..n]), "Round trip");
    }
    let elapsed = start.elapsed();

    let report = BenchReport {
        endpoint: endpoint.to_string(),
        requests: options.requests,
        succeeded,
        mismatched,
        elapsed,
    };
    tracing::info!(
        endpoint = %endpoint,
        requests = report.requests,
        elapsed = ?report.elapsed,
        rps = report.requests_per_sec(),
        "{} requests to {} took {:?}",
        report.requests,
        endpoint,
        report.elapsed
    );
    Ok(report)
}
