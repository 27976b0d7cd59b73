//! CPU profiling of a load run.
//!
//! Samples every thread of the process with `SIGPROF` while the guard is
//! alive and writes a pprof protobuf profile, readable by `go tool pprof` or
//! `pprof -http`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use pprof::protos::Message;
use pprof::{ProfilerGuard, ProfilerGuardBuilder};

/// Sampling frequency in Hz, the same default as Go's `runtime/pprof`.
pub const DEFAULT_FREQUENCY: i32 = 100;

/// Error type for CPU profiling.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("failed to start CPU profiler: {0}")]
    Start(#[source] pprof::Error),

    #[error("failed to build CPU profile: {0}")]
    Report(#[source] pprof::Error),

    #[error("failed to write CPU profile to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What was written by [`CpuProfiler::finish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileSummary {
    pub samples: u64,
    pub bytes: usize,
}

/// A running CPU profile. Only one can exist per process.
pub struct CpuProfiler {
    guard: ProfilerGuard<'static>,
}

impl CpuProfiler {
    pub fn start(frequency: i32) -> Result<Self, ProfileError> {
        let guard = ProfilerGuardBuilder::default()
            .frequency(frequency)
            .blocklist(&["libc", "libgcc", "pthread", "vdso"])
            .build()
            .map_err(ProfileError::Start)?;
        tracing::debug!(frequency, "CPU profiler started");
        Ok(Self { guard })
    }

    /// Stop sampling and write the profile to `path`.
    pub fn finish(self, path: &Path) -> Result<ProfileSummary, ProfileError> {
        let report = self.guard.report().build().map_err(ProfileError::Report)?;
        let samples = report
            .data
            .values()
            .map(|&count| u64::try_from(count).unwrap_or(0))
            .sum();
        let profile = report.pprof().map_err(ProfileError::Report)?;
        let encoded = profile.encode_to_vec();

        fs::write(path, &encoded).map_err(|source| ProfileError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(ProfileSummary {
            samples,
            bytes: encoded.len(),
        })
    }
}
