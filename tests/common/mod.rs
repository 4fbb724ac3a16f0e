//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use subweave::config::schema::{AppBinding, TemplateSet};
use subweave::config::ServiceConfig;
use subweave::http::HttpServer;

/// A fake subscription provider serving one fixed response.
pub struct MockUpstream {
    pub addr: SocketAddr,
    hits: Arc<AtomicU32>,
}

impl MockUpstream {
    /// Absolute URL of `path` on this provider.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Number of connections the provider has accepted.
    pub fn hits(&self) -> u32 {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Start a provider that answers every request with the given status
/// line, extra header lines (each `Name: value\r\n`), and body.
pub async fn start_mock_upstream(
    status: &'static str,
    extra_headers: &'static str,
    body: &'static str,
) -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicU32::new(0));
    let counter = hits.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(async move {
                        let mut request = [0u8; 4096];
                        let _ = socket.read(&mut request).await;
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n{}",
                            status,
                            body.len(),
                            extra_headers,
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockUpstream { addr, hits }
}

/// One app binding for test configs.
pub fn app(name: &str, token: &str, clash: Option<&str>, surge: Option<&str>) -> AppBinding {
    AppBinding {
        name: name.to_string(),
        token: token.to_string(),
        templates: TemplateSet {
            clash: clash.map(str::to_string),
            surge: surge.map(str::to_string),
        },
    }
}

/// Start the service over the given template directory and bindings,
/// returning the address it listens on.
pub async fn start_service(templates_dir: &Path, apps: Vec<AppBinding>) -> SocketAddr {
    let mut config = ServiceConfig::default();
    config.templates.dir = templates_dir.to_path_buf();
    config.apps = apps;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(Arc::new(config)).unwrap();
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });
    addr
}

/// A client that ignores any ambient proxy configuration.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
