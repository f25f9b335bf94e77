//! Test helpers for integration tests
//!
//! Mock upstreams speak just enough HTTP/1.1 over raw tokio sockets to
//! answer the relay's pooled client.

#![allow(dead_code)]

use anyhow::{Result, bail};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use tunnel_relay::config::UpstreamTarget;
use tunnel_relay::types::{HostName, Port};
use tunnel_relay::{MetricsCollector, RelayListener, Shutdown};

/// A request as parsed by a mock upstream
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub target: String,
    /// Raw header block, lower-cased
    pub head: String,
    pub body: Vec<u8>,
}

/// Read one request head plus its Content-Length body
pub async fn read_request<S: AsyncRead + Unpin>(stream: &mut S) -> Result<Option<SeenRequest>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut request_line = head.lines().next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or_default().to_string();
    let head = head.to_ascii_lowercase();

    let content_length = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[head_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            bail!("upstream saw a truncated request body");
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Ok(Some(SeenRequest {
        method,
        target,
        head,
        body,
    }))
}

/// Build a complete HTTP/1.1 response
pub fn http_response(status: u16, reason: &str, body: &[u8]) -> Vec<u8> {
    let mut out = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n",
        body.len()
    )
    .into_bytes();
    out.extend_from_slice(body);
    out
}

/// Spawn an upstream that echoes each request back in the response body
///
/// The body is `METHOD TARGET\n<lower-cased head>\n<request body>`.
/// Requests whose target starts with `/status/NNN` are answered with NNN.
pub async fn spawn_echo_upstream() -> (SocketAddr, JoinHandle<()>) {
    spawn_echo_upstream_on("127.0.0.1:0").await.unwrap()
}

/// Echo upstream on an explicit bind address
pub async fn spawn_echo_upstream_on(bind: &str) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind(bind).await?;
    let addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                while let Ok(Some(req)) = read_request(&mut stream).await {
                    let status = req
                        .target
                        .strip_prefix("/status/")
                        .and_then(|s| s.get(..3))
                        .and_then(|s| s.parse::<u16>().ok())
                        .unwrap_or(200);

                    let mut body = format!("{} {}\n{}\n", req.method, req.target, req.head).into_bytes();
                    body.extend_from_slice(&req.body);

                    let response = http_response(status, "Mock", &body);
                    if stream.write_all(&response).await.is_err()
                        || req.head.contains("connection: close")
                    {
                        break;
                    }
                }
            });
        }
    });

    Ok((addr, handle))
}

/// Spawn an upstream that accepts connections and never answers
pub async fn spawn_silent_upstream() -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    (addr, handle)
}

/// Spawn an upstream that sends the first chunk of a chunked response, then
/// waits for `release` before sending the rest
pub async fn spawn_streaming_upstream(release: Arc<Notify>) -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let Ok((mut stream, _)) = listener.accept().await else {
            return;
        };
        if !matches!(read_request(&mut stream).await, Ok(Some(_))) {
            return;
        }
        let head = "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n";
        let _ = stream.write_all(head.as_bytes()).await;
        let _ = stream.write_all(b"5\r\nfirst\r\n").await;
        let _ = stream.flush().await;

        release.notified().await;

        let _ = stream.write_all(b"6\r\nsecond\r\n0\r\n\r\n").await;
        let _ = stream.flush().await;
    });

    (addr, handle)
}

/// A port that nothing is listening on
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

/// A relay bound to an ephemeral port and running in the background
pub struct TestRelay {
    pub addr: SocketAddr,
    pub metrics: MetricsCollector,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<()>,
}

/// Start a relay in front of `127.0.0.1:upstream_port`
pub async fn start_relay(upstream_port: u16) -> TestRelay {
    start_relay_with_grace(upstream_port, Duration::from_secs(1)).await
}

pub async fn start_relay_with_grace(upstream_port: u16, grace: Duration) -> TestRelay {
    let upstream = UpstreamTarget::new(
        "127.0.0.1".parse::<HostName>().unwrap(),
        Port::new(upstream_port).unwrap(),
    );
    start_relay_to(upstream, grace).await
}

/// Start a relay in front of an arbitrary upstream
pub async fn start_relay_to(upstream: UpstreamTarget, grace: Duration) -> TestRelay {
    let metrics = MetricsCollector::new();
    let relay = RelayListener::bind_to("127.0.0.1:0", upstream, grace, metrics.clone())
        .await
        .unwrap();
    let addr = relay.local_addr();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(relay.run(shutdown.subscribe()));

    TestRelay {
        addr,
        metrics,
        shutdown,
        handle,
    }
}

/// Send a raw request and read until the server closes the connection
pub async fn send_raw(addr: SocketAddr, request: &str) -> Result<String> {
    let mut stream = TcpStream::connect(addr).await?;
    stream.write_all(request.as_bytes()).await?;

    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response)).await??;
    Ok(String::from_utf8_lossy(&response).to_string())
}

/// `GET path` with `Connection: close`
pub async fn get(addr: SocketAddr, path: &str) -> Result<String> {
    send_raw(
        addr,
        &format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n"),
    )
    .await
}

/// Poll until `active` exchanges are in flight
pub async fn wait_for_active(metrics: &MetricsCollector, active: u64) -> Result<()> {
    let deadline = Instant::now() + Duration::from_secs(5);
    while metrics.active() != active {
        if Instant::now() > deadline {
            bail!("expected {} active exchanges, still at {}", active, metrics.active());
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    Ok(())
}

/// Poll until the collector has recorded at least `total` events
pub async fn wait_for_total(metrics: &MetricsCollector, total: u64) -> Result<()> {
    let deadline = Instant::now() + Duration::from_secs(5);
    while metrics.total() < total {
        if Instant::now() > deadline {
            bail!(
                "expected {} recorded events, still at {}",
                total,
                metrics.total()
            );
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_upstream_answers() {
        let (addr, _handle) = spawn_echo_upstream().await;
        let response = get(addr, "/ping").await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("GET /ping"));
    }

    #[tokio::test]
    async fn test_echo_upstream_status_override() {
        let (addr, _handle) = spawn_echo_upstream().await;
        let response = get(addr, "/status/404").await.unwrap();
        assert!(response.starts_with("HTTP/1.1 404"));
    }

    #[tokio::test]
    async fn test_closed_port_refuses() {
        let port = closed_port().await;
        assert!(TcpStream::connect(("127.0.0.1", port)).await.is_err());
    }
}
