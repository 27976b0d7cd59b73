//! End-to-end echo behavior over TCP and Unix sockets.

use std::time::Duration;

use socket_echo::config::OverflowPolicy;
use socket_echo::net::{EchoStream, Endpoint};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

mod common;

use common::{round_trip, start_echo_server, test_config};

fn tcp() -> Endpoint {
    Endpoint::Tcp("127.0.0.1:0".into())
}

fn unix(dir: &tempfile::TempDir) -> Endpoint {
    Endpoint::Unix(dir.path().join("echo.sock"))
}

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[tokio::test]
async fn test_echo_identity_tcp() {
    let server = start_echo_server(tcp(), test_config()).await;

    for len in [1, 16, 1000, 4096] {
        let sent = payload(len);
        assert_eq!(round_trip(&server.endpoint, &sent).await, sent, "len {len}");
    }

    let report = server.stop().await;
    assert_eq!(report.echoed, 4);
    assert_eq!(report.failed, 0);
}

#[tokio::test]
async fn test_echo_identity_unix() {
    let dir = tempfile::tempdir().unwrap();
    let server = start_echo_server(unix(&dir), test_config()).await;

    assert_eq!(round_trip(&server.endpoint, b"I'm a Kungfu Dev").await, b"I'm a Kungfu Dev");
    assert_eq!(round_trip(&server.endpoint, &[0u8, 255, 10, 13]).await, [0u8, 255, 10, 13]);

    let path = server.endpoint.socket_path().unwrap().to_path_buf();
    server.stop().await;
    assert!(!path.exists(), "socket file must be removed on shutdown");
}

#[tokio::test]
async fn test_concurrent_clients_get_their_own_bytes() {
    let server = start_echo_server(tcp(), test_config()).await;

    let mut tasks = Vec::new();
    for i in 0..50 {
        let endpoint = server.endpoint.clone();
        tasks.push(tokio::spawn(async move {
            let msg = format!("client-{i}");
            let echoed = round_trip(&endpoint, msg.as_bytes()).await;
            (msg, echoed)
        }));
    }

    for task in tasks {
        let (msg, echoed) = task.await.unwrap();
        assert_eq!(String::from_utf8(echoed).unwrap(), msg);
    }

    let report = server.stop().await;
    assert_eq!(report.accepted, 50);
    assert_eq!(report.echoed, 50);
}

#[tokio::test]
async fn test_slow_client_does_not_block_others() {
    let server = start_echo_server(tcp(), test_config()).await;

    // Connected but silent; the accept loop must keep serving.
    let mut slow = EchoStream::connect(&server.endpoint).await.unwrap();

    for i in 0..5 {
        let msg = format!("fast-{i}");
        assert_eq!(round_trip(&server.endpoint, msg.as_bytes()).await, msg.as_bytes());
    }

    slow.write_all(b"finally").await.unwrap();
    let mut echoed = Vec::new();
    slow.read_to_end(&mut echoed).await.unwrap();
    assert_eq!(echoed, b"finally");

    server.stop().await;
}

#[tokio::test]
async fn test_zero_byte_send_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let server = start_echo_server(unix(&dir), test_config()).await;

    // An in-flight connection that has not sent yet.
    let mut in_flight = EchoStream::connect(&server.endpoint).await.unwrap();

    // Send nothing, close the write side.
    let mut empty = EchoStream::connect(&server.endpoint).await.unwrap();
    empty.shutdown().await.unwrap();
    let mut echoed = Vec::new();
    empty.read_to_end(&mut echoed).await.unwrap();
    assert!(echoed.is_empty());

    in_flight.write_all(b"still here").await.unwrap();
    let mut echoed = Vec::new();
    in_flight.read_to_end(&mut echoed).await.unwrap();
    assert_eq!(echoed, b"still here");

    assert_eq!(round_trip(&server.endpoint, b"after").await, b"after");

    let report = server.stop().await;
    assert_eq!(report.empty, 1);
    assert_eq!(report.echoed, 2);
    assert_eq!(report.failed, 0);
}

#[tokio::test]
async fn test_buffer_boundary_unix() {
    let dir = tempfile::tempdir().unwrap();
    let server = start_echo_server(unix(&dir), test_config()).await;

    let exact = payload(4096);
    assert_eq!(round_trip(&server.endpoint, &exact).await, exact);

    // Only the first read is echoed; the extra byte is dropped.
    let over = payload(4097);
    assert_eq!(round_trip(&server.endpoint, &over).await, &over[..4096]);

    server.stop().await;
}

#[tokio::test]
async fn test_buffer_boundary_tcp() {
    let server = start_echo_server(tcp(), test_config()).await;

    let exact = payload(4096);
    assert_eq!(round_trip(&server.endpoint, &exact).await, exact);

    // The unread tail must not turn the close into a reset.
    let over = payload(4097);
    for _ in 0..50 {
        assert_eq!(round_trip(&server.endpoint, &over).await, &over[..4096]);
    }

    let report = server.stop().await;
    assert_eq!(report.echoed, 51);
    assert_eq!(report.failed, 0);
}

#[tokio::test]
async fn test_silent_client_times_out_without_affecting_server() {
    let mut config = test_config();
    config.timeouts.read_secs = 1;
    let server = start_echo_server(tcp(), config).await;

    let mut silent = EchoStream::connect(&server.endpoint).await.unwrap();
    let mut buf = Vec::new();
    let n = tokio::time::timeout(Duration::from_secs(5), silent.read_to_end(&mut buf))
        .await
        .expect("server should close the silent connection")
        .unwrap_or(0);
    assert_eq!(n, 0);

    assert_eq!(round_trip(&server.endpoint, b"ok").await, b"ok");

    let report = server.stop().await;
    assert_eq!(report.failed, 1);
    assert_eq!(report.echoed, 1);
}

#[tokio::test]
async fn test_reject_overflow_keeps_admitted_connection() {
    let mut config = test_config();
    config.listener.max_connections = 1;
    config.listener.overflow = OverflowPolicy::Reject;
    let dir = tempfile::tempdir().unwrap();
    let server = start_echo_server(unix(&dir), config).await;

    let mut holder = EchoStream::connect(&server.endpoint).await.unwrap();
    while server.tracker.active_count() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    // Over the limit: closed without an echo.
    let mut extra = EchoStream::connect(&server.endpoint).await.unwrap();
    let mut buf = Vec::new();
    let n = extra.read_to_end(&mut buf).await.unwrap_or(0);
    assert_eq!(n, 0);

    holder.write_all(b"first").await.unwrap();
    let mut echoed = Vec::new();
    holder.read_to_end(&mut echoed).await.unwrap();
    assert_eq!(echoed, b"first");

    let report = server.stop().await;
    assert_eq!(report.rejected, 1);
    assert_eq!(report.echoed, 1);
}
