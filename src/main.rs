//! Socket echo services
//!
//! Minimal servers over TCP and Unix-domain sockets.
//!
//! # Architecture Overview
//!
//! ```text
//!   tcp / unix echo:
//!
//!     Client ──▶ net::listener ──▶ echo::server ──spawn──▶ echo::handler
//!                (bind, limits)    (accept loop)           (read once, write back, close)
//!                      ▲                 │
//!                      │                 ▼
//!              lifecycle::socket_file ◀── lifecycle::signals / shutdown
//!              (removed exactly once)     (SIGINT/SIGTERM → drain → exit 1)
//!
//!   http-unix / http-proxy:
//!
//!     Client ──TCP──▶ http::proxy ──UDS──▶ http::server
//!                     (GET /test)          (GET / → greeting)
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use socket_echo::config::{load_config, validate_config, ConfigError, EchoConfig, StaleSocketPolicy};
use socket_echo::echo::EchoServer;
use socket_echo::http::{GreetingServer, ProxyServer};
use socket_echo::lifecycle::{spawn_signal_watcher, Shutdown, SIGNAL_EXIT_CODE};
use socket_echo::net::{bind_unix, Endpoint, Listener};
use socket_echo::observability::init_logging;

#[derive(Parser)]
#[command(name = "socket-echo")]
#[command(version)]
#[command(about = "Echo services over TCP and Unix-domain sockets", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Echo server on a TCP port
    Tcp {
        /// Address to bind (default 0.0.0.0:8000)
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Echo server on a Unix socket
    Unix {
        /// Socket file path (default /tmp/echo.sock)
        #[arg(short, long)]
        path: Option<String>,
    },
    /// HTTP greeting server on a Unix socket
    HttpUnix {
        /// Socket file path (default /tmp/httpecho.sock)
        #[arg(short, long)]
        path: Option<String>,
    },
    /// HTTP proxy on TCP that forwards one route over the Unix socket
    HttpProxy {
        /// Address to bind (default 0.0.0.0:8000)
        #[arg(short, long)]
        bind: Option<String>,

        /// Socket file of the HTTP server (default /tmp/httpecho.sock)
        #[arg(short, long)]
        upstream: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => EchoConfig::default(),
    };
    apply_overrides(&mut config, &cli);
    validate_config(&config).map_err(ConfigError::Validation)?;

    init_logging(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "socket-echo starting");

    let shutdown = Shutdown::new();

    match cli.command {
        Command::Tcp { .. } => {
            let endpoint = Endpoint::Tcp(config.tcp.bind_address.clone());
            run_echo(&endpoint, StaleSocketPolicy::Fail, &config, shutdown).await?;
        }
        Command::Unix { .. } => {
            let endpoint = Endpoint::Unix(PathBuf::from(&config.unix.socket_path));
            run_echo(&endpoint, config.unix.stale_socket, &config, shutdown).await?;
        }
        Command::HttpUnix { .. } => {
            let path = PathBuf::from(&config.http.socket_path);
            let (listener, socket_file) = bind_unix(&path, config.http.stale_socket).await?;
            let signalled = shutdown.signalled();
            let _watcher = spawn_signal_watcher(shutdown, Some(socket_file.clone()))?;
            GreetingServer::new(&config.http)
                .run(listener, socket_file, signalled)
                .await?;
        }
        Command::HttpProxy { .. } => {
            let listener = tokio::net::TcpListener::bind(&config.http.proxy_bind_address).await?;
            let signalled = shutdown.signalled();
            let _watcher = spawn_signal_watcher(shutdown, None)?;
            ProxyServer::new(&config.http).run(listener, signalled).await?;
        }
    }

    // Servers only return cleanly after a termination signal.
    tracing::info!("Shutdown complete");
    Ok(ExitCode::from(SIGNAL_EXIT_CODE))
}

/// CLI flags take precedence over config file values.
fn apply_overrides(config: &mut EchoConfig, cli: &Cli) {
    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }

    match &cli.command {
        Command::Tcp { bind } => {
            if let Some(bind) = bind {
                config.tcp.bind_address = bind.clone();
            }
        }
        Command::Unix { path } => {
            if let Some(path) = path {
                config.unix.socket_path = path.clone();
            }
        }
        Command::HttpUnix { path } => {
            if let Some(path) = path {
                config.http.socket_path = path.clone();
            }
        }
        Command::HttpProxy { bind, upstream } => {
            if let Some(bind) = bind {
                config.http.proxy_bind_address = bind.clone();
            }
            if let Some(upstream) = upstream {
                config.http.socket_path = upstream.clone();
            }
        }
    }
}

async fn run_echo(
    endpoint: &Endpoint,
    stale_socket: StaleSocketPolicy,
    config: &EchoConfig,
    shutdown: Shutdown,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = Listener::bind(endpoint, &config.listener, stale_socket).await?;
    let rx = shutdown.subscribe();
    let _watcher = spawn_signal_watcher(shutdown, listener.socket_file())?;

    let report = EchoServer::new(config).run(listener, rx).await?;
    tracing::info!(
        accepted = report.accepted,
        echoed = report.echoed,
        empty = report.empty,
        failed = report.failed,
        rejected = report.rejected,
        aborted = report.aborted,
        "Echo server report"
    );
    Ok(())
}
