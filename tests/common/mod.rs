//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::time::Duration;

use socket_echo::config::{EchoConfig, StaleSocketPolicy};
use socket_echo::echo::{EchoServer, ServeReport, ServerError};
use socket_echo::lifecycle::Shutdown;
use socket_echo::net::{ConnectionTracker, EchoStream, Endpoint, Listener};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::task::JoinHandle;

/// An echo server running on the test runtime.
pub struct RunningServer {
    pub endpoint: Endpoint,
    pub shutdown: Shutdown,
    pub tracker: ConnectionTracker,
    handle: JoinHandle<Result<ServeReport, ServerError>>,
}

impl RunningServer {
    /// Trigger shutdown and wait for the drain to finish.
    pub async fn stop(self) -> ServeReport {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(10), self.handle)
            .await
            .expect("server did not stop")
            .expect("server task panicked")
            .expect("server failed")
    }
}

/// Bind `endpoint` (port 0 allowed) and run an echo server on it.
pub async fn start_echo_server(endpoint: Endpoint, config: EchoConfig) -> RunningServer {
    let listener = Listener::bind(&endpoint, &config.listener, StaleSocketPolicy::Remove)
        .await
        .unwrap();
    let endpoint = listener.local_endpoint().unwrap();

    let shutdown = Shutdown::new();
    let server = EchoServer::new(&config);
    let tracker = server.tracker();
    let rx = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, rx).await });

    RunningServer {
        endpoint,
        shutdown,
        tracker,
        handle,
    }
}

/// Send `payload` on a fresh connection and read until the server closes.
pub async fn round_trip(endpoint: &Endpoint, payload: &[u8]) -> Vec<u8> {
    let mut stream = EchoStream::connect(endpoint).await.unwrap();
    stream.write_all(payload).await.unwrap();
    let mut echoed = Vec::new();
    stream.read_to_end(&mut echoed).await.unwrap();
    echoed
}

/// Test config with short deadlines so a broken test fails fast.
pub fn test_config() -> EchoConfig {
    let mut config = EchoConfig::default();
    config.timeouts.read_secs = 5;
    config.timeouts.write_secs = 5;
    config.timeouts.shutdown_grace_secs = 2;
    config
}
