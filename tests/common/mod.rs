//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use console_client::config::ClientConfig;
use console_client::resilience::Sleeper;
use console_client::session::{MemorySession, Notifier, SessionState, SessionStore};
use console_client::HttpClient;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// A request as the mock backend saw it.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub target: String,
    /// Lower-cased header names.
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn body_json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// What the mock backend answers with.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl MockResponse {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            headers: Vec::new(),
            body: body.to_string().into_bytes(),
        }
    }

    /// A success envelope around `data`.
    pub fn ok(data: serde_json::Value) -> Self {
        Self::json(
            200,
            serde_json::json!({
                "code": "0", "msg": "ok", "success": true, "timestamp": 0, "data": data
            }),
        )
    }

    pub fn envelope(status: u16, code: &str, msg: &str) -> Self {
        Self::json(
            status,
            serde_json::json!({
                "code": code, "msg": msg, "success": false, "timestamp": 0, "data": null
            }),
        )
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn binary(body: &[u8], file_name: &str) -> Self {
        Self {
            status: 200,
            content_type: "application/octet-stream",
            headers: vec![(
                "Content-Disposition".to_string(),
                format!("attachment; filename={file_name}"),
            )],
            body: body.to_vec(),
        }
    }
}

/// Handle on a running mock backend.
#[derive(Clone)]
pub struct MockBackend {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl MockBackend {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

/// Start a backend that always answers with the same response.
pub async fn start_mock_backend(response: MockResponse) -> MockBackend {
    start_programmable_backend(move |_req| {
        let response = response.clone();
        async move { response }
    })
    .await
}

/// Start a programmable mock backend with async support.
pub async fn start_programmable_backend<F, Fut>(f: F) -> MockBackend
where
    F: Fn(CapturedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MockResponse> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let captured = requests.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let captured = captured.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        captured.lock().unwrap().push(request.clone());
                        let response = f(request).await;
                        let _ = write_response(&mut socket, &response).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockBackend { addr, requests }
}

async fn read_request(socket: &mut TcpStream) -> Option<CapturedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();

    let headers: HashMap<String, String> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let mut body = buf[header_end + 4..].to_vec();
    if let Some(len) = headers.get("content-length").and_then(|v| v.parse::<usize>().ok()) {
        while body.len() < len {
            let n = socket.read(&mut chunk).await.ok()?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
    } else if headers
        .get("transfer-encoding")
        .is_some_and(|v| v.eq_ignore_ascii_case("chunked"))
    {
        while find(&body, b"0\r\n\r\n").is_none() {
            let n = socket.read(&mut chunk).await.ok()?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
        body = decode_chunked(&body);
    }

    Some(CapturedRequest {
        method,
        target,
        headers,
        body,
    })
}

async fn write_response(socket: &mut TcpStream, response: &MockResponse) -> std::io::Result<()> {
    let mut head = format!(
        "HTTP/1.1 {} Mock\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        response.status,
        response.content_type,
        response.body.len()
    );
    for (k, v) in &response.headers {
        head.push_str(&format!("{k}: {v}\r\n"));
    }
    head.push_str("\r\n");

    socket.write_all(head.as_bytes()).await?;
    socket.write_all(&response.body).await?;
    socket.flush().await
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn decode_chunked(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut rest = raw;
    while let Some(pos) = find(rest, b"\r\n") {
        let size_str = String::from_utf8_lossy(&rest[..pos]).to_string();
        let size = usize::from_str_radix(size_str.trim(), 16).unwrap_or(0);
        if size == 0 {
            break;
        }
        let start = pos + 2;
        let end = (start + size).min(rest.len());
        out.extend_from_slice(&rest[start..end]);
        rest = &rest[(end + 2).min(rest.len())..];
    }
    out
}

/// Notifier that remembers every toast.
#[derive(Default)]
pub struct RecordingNotifier {
    pub errors: Mutex<Vec<String>>,
    pub successes: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn successes(&self) -> Vec<String> {
        self.successes.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn show_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }

    fn show_success(&self, message: &str) {
        self.successes.lock().unwrap().push(message.to_string());
    }
}

/// Session store that counts teardowns.
#[derive(Default)]
pub struct CountingSession {
    pub inner: MemorySession,
    pub log_outs: AtomicUsize,
}

impl CountingSession {
    pub fn with_token(token: &str) -> Self {
        Self {
            inner: MemorySession::new(SessionState {
                access_token: Some(token.to_string()),
                ..SessionState::default()
            }),
            log_outs: AtomicUsize::new(0),
        }
    }

    pub fn log_out_count(&self) -> usize {
        self.log_outs.load(Ordering::SeqCst)
    }
}

impl SessionStore for CountingSession {
    fn access_token(&self) -> Option<String> {
        self.inner.access_token()
    }

    fn tenant_enabled(&self) -> bool {
        self.inner.tenant_enabled()
    }

    fn tenant_id(&self) -> Option<String> {
        self.inner.tenant_id()
    }

    fn log_out(&self) {
        self.log_outs.fetch_add(1, Ordering::SeqCst);
        self.inner.log_out();
    }
}

/// Sleeper that records requested delays and returns at once.
#[derive(Default)]
pub struct RecordingSleeper {
    pub delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

/// A client wired to recording collaborators.
pub struct Harness {
    pub client: HttpClient,
    pub session: Arc<CountingSession>,
    pub notifier: Arc<RecordingNotifier>,
    pub sleeper: Arc<RecordingSleeper>,
}

/// Configuration pointing at `backend`, with an immediate logout.
pub fn test_config(backend: &MockBackend) -> ClientConfig {
    let mut config = ClientConfig::default();
    config.endpoint.base_url = backend.base_url();
    config.unauthorized.logout_delay_ms = 0;
    config.timeouts.request_ms = 5_000;
    config
}

pub fn harness(backend: &MockBackend, tweak: impl FnOnce(&mut ClientConfig)) -> Harness {
    harness_with_session(backend, CountingSession::with_token("test-token"), tweak)
}

pub fn harness_with_session(
    backend: &MockBackend,
    session: CountingSession,
    tweak: impl FnOnce(&mut ClientConfig),
) -> Harness {
    let mut config = test_config(backend);
    tweak(&mut config);

    let session = Arc::new(session);
    let notifier = Arc::new(RecordingNotifier::default());
    let sleeper = Arc::new(RecordingSleeper::default());

    let client = HttpClient::builder(config)
        .session(session.clone())
        .notifier(notifier.clone())
        .sleeper(sleeper.clone())
        .build()
        .unwrap();

    Harness {
        client,
        session,
        notifier,
        sleeper,
    }
}
