//! End-to-end tests: a real listener on an ephemeral port, raw HTTP/1.1 over TCP.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use devserve::config::SiteRoot;
use devserve::handler::RequestHandler;
use devserve::server::{
    bind_listener, start_server_loop, ConnectionSettings, ServerLoopConfig, Shutdown,
};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

struct TestServer {
    addr: SocketAddr,
    shutdown: Shutdown,
    task: JoinHandle<()>,
    root: TempDir,
}

impl TestServer {
    async fn start() -> Self {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("docs")).unwrap();
        std::fs::create_dir_all(root.path().join("empty")).unwrap();
        std::fs::write(root.path().join("index.html"), b"<h1>home</h1>").unwrap();
        std::fs::write(root.path().join("docs/guide.md"), b"# Guide\n").unwrap();
        std::fs::write(root.path().join("docs/notes.txt"), b"notes").unwrap();

        let site = SiteRoot::new(
            root.path(),
            vec!["index.html".to_string()],
            "devserve/test",
        )
        .unwrap();
        let listener = bind_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let config = ServerLoopConfig {
            connection: ConnectionSettings {
                keep_alive: true,
                connection_timeout: Duration::from_secs(10),
            },
            shutdown_timeout: Duration::from_secs(2),
        };
        let shutdown = Shutdown::new();
        let task = tokio::spawn(start_server_loop(
            listener,
            RequestHandler::new(Arc::new(site)),
            config,
            shutdown.subscribe(),
        ));
        Self {
            addr,
            shutdown,
            task,
            root,
        }
    }

    async fn stop(self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .expect("server loop did not stop")
            .unwrap();
    }
}

struct RawResponse {
    status: u16,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

async fn send_raw(addr: SocketAddr, request: &str) -> RawResponse {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut raw = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut raw))
        .await
        .expect("response timed out")
        .unwrap();
    parse_response(&raw)
}

async fn request(addr: SocketAddr, method: &str, path: &str) -> RawResponse {
    send_raw(
        addr,
        &format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n"),
    )
    .await
}

fn parse_response(raw: &[u8]) -> RawResponse {
    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("no header terminator");
    let head = std::str::from_utf8(&raw[..split]).unwrap();
    let mut lines = head.split("\r\n");
    let status_line = lines.next().unwrap();
    let status = status_line.split(' ').nth(1).unwrap().parse().unwrap();
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();
    RawResponse {
        status,
        headers,
        body: raw[split + 4..].to_vec(),
    }
}

fn assert_dev_headers(response: &RawResponse) {
    assert_eq!(response.headers["access-control-allow-origin"], "*");
    assert_eq!(response.headers["cache-control"], "no-cache");
    assert!(response.headers.contains_key("date"));
    assert_eq!(response.headers["server"], "devserve/test");
}

#[tokio::test]
async fn test_get_file_over_tcp() {
    let server = TestServer::start().await;
    let response = request(server.addr, "GET", "/docs/guide.md").await;
    assert_eq!(response.status, 200);
    assert_dev_headers(&response);
    assert_eq!(response.headers["content-length"], "8");
    assert_eq!(response.body, b"# Guide\n");
    server.stop().await;
}

#[tokio::test]
async fn test_dev_headers_on_every_status() {
    let server = TestServer::start().await;
    for (method, path, status) in [
        ("GET", "/", 200),
        ("GET", "/missing.js", 404),
        ("GET", "/../../etc/passwd", 403),
        ("POST", "/index.html", 405),
        ("GET", "/docs", 301),
    ] {
        let response = request(server.addr, method, path).await;
        assert_eq!(response.status, status, "{method} {path}");
        assert_dev_headers(&response);
    }
    server.stop().await;
}

#[tokio::test]
async fn test_index_and_listing() {
    let server = TestServer::start().await;

    let home = request(server.addr, "GET", "/").await;
    assert_eq!(home.body, b"<h1>home</h1>");

    let listing = request(server.addr, "GET", "/docs/").await;
    assert_eq!(listing.status, 200);
    let html = String::from_utf8(listing.body).unwrap();
    assert!(html.contains("href=\"guide.md\""));
    assert!(html.contains("href=\"notes.txt\""));

    let empty = request(server.addr, "GET", "/empty/").await;
    assert_eq!(empty.status, 200);
    assert!(String::from_utf8(empty.body).unwrap().contains("<ul>\n</ul>"));
    server.stop().await;
}

#[tokio::test]
async fn test_missing_path_has_body() {
    let server = TestServer::start().await;
    let response = request(server.addr, "GET", "/no/such/file").await;
    assert_eq!(response.status, 404);
    assert!(!response.body.is_empty());
    server.stop().await;
}

#[tokio::test]
async fn test_head_has_length_and_no_body() {
    let server = TestServer::start().await;
    let response = request(server.addr, "HEAD", "/docs/notes.txt").await;
    assert_eq!(response.status, 200);
    assert_dev_headers(&response);
    assert_eq!(response.headers["content-length"], "5");
    assert!(response.body.is_empty());
    server.stop().await;
}

#[tokio::test]
async fn test_concurrent_requests_are_independent() {
    let server = TestServer::start().await;
    let big_a = vec![b'a'; 256 * 1024];
    let big_b = vec![b'b'; 256 * 1024];
    std::fs::write(server.root.path().join("a.bin"), &big_a).unwrap();
    std::fs::write(server.root.path().join("b.bin"), &big_b).unwrap();

    let addr = server.addr;
    let requests = (0..8).map(|i| {
        tokio::spawn(async move {
            let name = if i % 2 == 0 { "a" } else { "b" };
            (name, request(addr, "GET", &format!("/{name}.bin")).await)
        })
    });
    for handle in requests.collect::<Vec<_>>() {
        let (name, response) = handle.await.unwrap();
        assert_eq!(response.status, 200);
        let expected = if name == "a" { &big_a } else { &big_b };
        assert_eq!(&response.body, expected);
    }
    server.stop().await;
}

#[tokio::test]
async fn test_keep_alive_serves_several_requests() {
    let server = TestServer::start().await;
    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream
        .write_all(
            b"GET /docs/notes.txt HTTP/1.1\r\nHost: localhost\r\n\r\n\
              GET /docs/notes.txt HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await
        .unwrap();
    let mut raw = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut raw))
        .await
        .unwrap()
        .unwrap();
    let text = String::from_utf8(raw).unwrap();
    assert_eq!(text.matches("HTTP/1.1 200 OK").count(), 2);
    assert_eq!(text.matches("access-control-allow-origin: *").count(), 2);
    server.stop().await;
}

#[tokio::test]
async fn test_malformed_request_is_rejected() {
    let server = TestServer::start().await;
    let response = send_raw(server.addr, "THIS IS NOT HTTP\r\n\r\n").await;
    assert_eq!(response.status, 400);
    server.stop().await;
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let server = TestServer::start().await;
    let addr = server.addr;
    server.stop().await;
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_two_servers_in_one_process() {
    let first = TestServer::start().await;
    let second = TestServer::start().await;
    std::fs::write(second.root.path().join("index.html"), b"<h1>second</h1>").unwrap();

    assert_eq!(request(first.addr, "GET", "/").await.body, b"<h1>home</h1>");
    assert_eq!(request(second.addr, "GET", "/").await.body, b"<h1>second</h1>");
    first.stop().await;
    second.stop().await;
}
