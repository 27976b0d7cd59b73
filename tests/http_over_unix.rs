//! HTTP served on a Unix socket and reached through the TCP proxy.

use std::time::Duration;

use socket_echo::config::{HttpConfig, StaleSocketPolicy};
use socket_echo::http::{GreetingServer, ProxyServer, UnixHttpClient};
use socket_echo::lifecycle::Shutdown;
use socket_echo::net::bind_unix;

struct Setup {
    _dir: tempfile::TempDir,
    config: HttpConfig,
    proxy_url: String,
    upstream: Shutdown,
    upstream_handle: tokio::task::JoinHandle<std::io::Result<()>>,
    proxy: Shutdown,
}

async fn setup() -> Setup {
    let dir = tempfile::tempdir().unwrap();
    let config = HttpConfig {
        socket_path: dir.path().join("httpecho.sock").display().to_string(),
        request_timeout_secs: 5,
        ..HttpConfig::default()
    };

    let (listener, socket_file) = bind_unix(std::path::Path::new(&config.socket_path), StaleSocketPolicy::Remove)
        .await
        .unwrap();
    let upstream = Shutdown::new();
    let signalled = upstream.signalled();
    let greeting = GreetingServer::new(&config);
    let upstream_handle =
        tokio::spawn(async move { greeting.run(listener, socket_file, signalled).await });

    let tcp = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let proxy_url = format!("http://{}", tcp.local_addr().unwrap());
    let proxy = Shutdown::new();
    let signalled = proxy.signalled();
    let server = ProxyServer::new(&config);
    tokio::spawn(async move { server.run(tcp, signalled).await });

    Setup {
        _dir: dir,
        config,
        proxy_url,
        upstream,
        upstream_handle,
        proxy,
    }
}

#[tokio::test]
async fn test_unix_client_gets_greeting() {
    let setup = setup().await;

    let client = UnixHttpClient::new(&setup.config.socket_path);
    for path in ["/", "/anything/else"] {
        let res = client.get(path).await.unwrap();
        assert_eq!(res.status, 200);
        assert_eq!(&res.body[..], b"Hello kung fu developer! ");
    }

    setup.upstream.trigger();
    setup.proxy.trigger();
}

#[tokio::test]
async fn test_proxy_forwards_greeting() {
    let setup = setup().await;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap();

    for _ in 0..3 {
        let res = client
            .get(format!("{}/test", setup.proxy_url))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        assert_eq!(res.text().await.unwrap(), "Hello kung fu developer! ");
    }

    // Only the configured route is proxied.
    let res = client.get(format!("{}/", setup.proxy_url)).send().await.unwrap();
    assert_eq!(res.status(), 404);

    setup.upstream.trigger();
    setup.proxy.trigger();
}

#[tokio::test]
async fn test_proxy_reports_upstream_failure() {
    let setup = setup().await;
    let socket_path = std::path::PathBuf::from(&setup.config.socket_path);

    setup.upstream.trigger();
    setup.upstream_handle.await.unwrap().unwrap();
    assert!(!socket_path.exists(), "greeting server must remove its socket file");

    let res = reqwest::get(format!("{}/test", setup.proxy_url)).await.unwrap();
    assert_eq!(res.status(), 500);
    let text = res.text().await.unwrap();
    assert!(text.starts_with("dial unix"), "got {text:?}");
    assert!(text.ends_with('\n'));

    setup.proxy.trigger();
}
