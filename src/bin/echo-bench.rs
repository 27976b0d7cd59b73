use std::path::PathBuf;

use clap::Parser;

use socket_echo::bench::profile::DEFAULT_FREQUENCY;
use socket_echo::bench::{run_sequential, BenchOptions, CpuProfiler};
use socket_echo::net::Endpoint;
use socket_echo::observability::init_logging;

#[derive(Parser)]
#[command(name = "echo-bench")]
#[command(about = "Sequential round trips against a socket echo server", long_about = None)]
struct Cli {
    /// Server to hit: tcp://host:port, host:port, unix:///path or /path
    #[arg(default_value = "unix:///tmp/echo.sock")]
    endpoint: Endpoint,

    /// Number of round trips, each on a fresh connection
    #[arg(short = 'n', long, default_value_t = 10_000)]
    requests: u64,

    /// Payload sent on every connection
    #[arg(short, long, default_value = "I'm a Kungfu Dev")]
    message: String,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Write a CPU profile of the run (pprof protobuf) to FILE
    #[arg(long, value_name = "FILE")]
    profile: Option<PathBuf>,

    /// Profiler sampling frequency in Hz
    #[arg(long, default_value_t = DEFAULT_FREQUENCY)]
    profile_frequency: i32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let options = BenchOptions {
        requests: cli.requests,
        message: cli.message,
    };
    let profiler = match &cli.profile {
        Some(_) => Some(CpuProfiler::start(cli.profile_frequency)?),
        None => None,
    };

    let result = run_sequential(&cli.endpoint, &options).await;

    // Written even when the run failed part way.
    if let (Some(profiler), Some(path)) = (profiler, &cli.profile) {
        let summary = profiler.finish(path)?;
        tracing::info!(
            path = %path.display(),
            samples = summary.samples,
            bytes = summary.bytes,
            "CPU profile written"
        );
    }

    let report = result?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Endpoint:     {}", report.endpoint);
        println!("Requests:     {}", report.requests);
        println!("Succeeded:    {}", report.succeeded);
        println!("Mismatched:   {}", report.mismatched);
        println!("Duration:     {:?}", report.elapsed);
        println!("Requests/sec: {:.2}", report.requests_per_sec());
    }
    Ok(())
}
