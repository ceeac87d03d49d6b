//! End-to-end tests for the origin server.
//!
//! These tests start an in-process server backed by an in-memory bucket and
//! talk to it over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::Method;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use tokio::sync::oneshot;

use s3web::{MemoryStorage, Storage, router, server};

/// Test server handle that manages the server lifecycle.
struct TestServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    runtime: Arc<tokio::runtime::Runtime>,
    storage: Arc<MemoryStorage>,
}

impl TestServer {
    /// Start a new test server with an empty bucket and the given index name.
    fn start(index: &str) -> Self {
        let runtime = Arc::new(tokio::runtime::Runtime::new().unwrap());
        let storage = Arc::new(MemoryStorage::new());
        let app = router(Arc::clone(&storage), index);

        // Bind to a random available port
        let listener = runtime.block_on(async {
            tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("Failed to bind")
        });
        let addr = listener.local_addr().expect("Failed to get local addr");

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let rt = Arc::clone(&runtime);
        std::thread::spawn(move || {
            rt.block_on(async move {
                server::serve(
                    listener,
                    app,
                    async {
                        let _ = shutdown_rx.await;
                    },
                    Duration::from_secs(1),
                )
                .await
                .expect("Server error");
            });
        });

        // Give server a moment to start
        std::thread::sleep(Duration::from_millis(50));

        TestServer {
            addr,
            shutdown_tx: Some(shutdown_tx),
            runtime,
            storage,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Store an object directly in the bucket, bypassing HTTP.
    fn seed(&self, key: &str, data: &'static [u8]) {
        self.runtime
            .block_on(self.storage.put(key, Bytes::from_static(data)))
            .expect("Failed to seed object");
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

#[test]
fn test_get_existing_object() {
    let server = TestServer::start("");
    server.seed("report.txt", b"quarterly numbers");

    let response = Client::new().get(server.url("/report.txt")).send().unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("etag"));
    assert!(response.headers().contains_key("last-modified"));
    assert_eq!(response.headers()["content-length"], "17");
    assert_eq!(response.bytes().unwrap(), "quarterly numbers");
}

#[test]
fn test_get_missing_object() {
    let server = TestServer::start("");

    let response = Client::new().get(server.url("/missing.txt")).send().unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response.text().unwrap();
    assert!(
        body.contains("Path 'missing.txt' not found:"),
        "unexpected body: {body}"
    );
}

#[test]
fn test_directory_index_fallback() {
    let server = TestServer::start("index.html");
    server.seed("dir/index.html", b"<h1>dir</h1>");
    server.seed("index.html", b"<h1>home</h1>");

    let client = Client::new();

    let response = client.get(server.url("/dir/")).send().unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().unwrap(), "<h1>dir</h1>");

    let response = client.get(server.url("/")).send().unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().unwrap(), "<h1>home</h1>");
}

#[test]
fn test_directory_without_index() {
    let server = TestServer::start("");

    let response = Client::new().get(server.url("/dir/")).send().unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text().unwrap(), "Path must be provided");
}

#[test]
fn test_put_then_get() {
    let server = TestServer::start("");
    let client = Client::new();

    let response = client
        .put(server.url("/new.txt"))
        .body("fresh content")
        .send()
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()["location"], "/new.txt");
    assert!(response.headers().contains_key("etag"));

    let response = client.get(server.url("/new.txt")).send().unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().unwrap(), "fresh content");
}

#[test]
fn test_delete_then_get() {
    let server = TestServer::start("");
    server.seed("new.txt", b"short lived");
    let client = Client::new();

    let response = client.delete(server.url("/new.txt")).send().unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.bytes().unwrap().is_empty());

    let response = client.get(server.url("/new.txt")).send().unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_unsupported_method() {
    let server = TestServer::start("");

    let response = Client::new()
        .request(Method::PATCH, server.url("/x"))
        .send()
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[test]
fn test_repeated_delete_and_put() {
    let server = TestServer::start("");
    let client = Client::new();

    for _ in 0..2 {
        let response = client.delete(server.url("/gone.txt")).send().unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    let mut etags = Vec::new();
    for _ in 0..2 {
        let response = client
            .put(server.url("/same.txt"))
            .body("identical")
            .send()
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        etags.push(response.headers()["etag"].clone());
    }
    assert_eq!(etags[0], etags[1]);

    // A write made behind the server's back is visible immediately.
    server.seed("same.txt", b"changed");
    let response = client.get(server.url("/same.txt")).send().unwrap();
    assert_eq!(response.text().unwrap(), "changed");
}

#[test]
fn test_head_and_conditional_head() {
    let server = TestServer::start("");
    server.seed("page.html", b"<p>hi</p>");
    let client = Client::new();

    let response = client.head(server.url("/page.html")).send().unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-length"], "9");
    let etag = response.headers()["etag"].clone();

    let response = client
        .head(server.url("/page.html"))
        .header("if-none-match", etag)
        .send()
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);

    let response = client.head(server.url("/absent.html")).send().unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
