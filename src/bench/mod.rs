//! Load clients for the echo servers.
//!
//! # Data Flow
//! ```text
//! echo-bench <endpoint>
//!     → sequential.rs (N round trips, a fresh connection each)
//!     → BenchReport (counts, elapsed, requests/sec)
//!
//! echo-bench --profile FILE
//!     → profile.rs (SIGPROF sampling around the run, pprof protobuf output)
//! ```

pub mod profile;
pub mod sequential;

pub use profile::{CpuProfiler, ProfileError, ProfileSummary};
pub use sequential::{run_sequential, BenchError, BenchOptions, BenchReport};
