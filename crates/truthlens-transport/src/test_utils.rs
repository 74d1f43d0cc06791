//! Test utilities for transport consumers
//!
//! - [`FakeTransport`] - scripted in-memory [`TransportClient`] for state machine tests
//! - [`MockService`] - minimal HTTP/1.1 service on a local port for wire-level tests

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use truthlens_core::{
    DetectError, DetectionResult, HealthStatus, HistoryEntry, SelectedFile, SessionStats,
    VerdictCode,
};

use crate::client::TransportClient;
use crate::progress::ProgressReporter;

// ─────────────────────────────────────────────────────────────────
// Fixtures
// ─────────────────────────────────────────────────────────────────

/// A consistent detection result for `filename` with the given verdict.
pub fn test_result(filename: &str, verdict: VerdictCode) -> DetectionResult {
    DetectionResult {
        request_id: format!("req-{}", filename),
        filename: filename.to_string(),
        verdict,
        confidence: 0.92,
        fake_probability: 0.87,
        frames_analyzed: 120,
        total_frames: 150,
        processing_time_sec: 3.4,
        file_size_mb: Some(10.0),
        message: None,
    }
}

/// A history entry wrapping [`test_result`], without a timestamp.
pub fn test_entry(filename: &str, verdict: VerdictCode) -> HistoryEntry {
    HistoryEntry {
        result: test_result(filename, verdict),
        timestamp: None,
    }
}

/// Stats whose breakdown sums to the total.
pub fn test_stats(breakdown: &[(VerdictCode, u64)], avg_time: f64) -> SessionStats {
    let total = breakdown.iter().map(|(_, n)| n).sum();
    SessionStats {
        total_detections: total,
        avg_processing_time_sec: if total == 0 { 0.0 } else { avg_time },
        verdict_breakdown: breakdown.iter().cloned().collect(),
        avg_confidence: None,
    }
}

// ─────────────────────────────────────────────────────────────────
// FakeTransport
// ─────────────────────────────────────────────────────────────────

/// A call observed by [`FakeTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    Submit { name: String },
    History { limit: usize },
    Stats,
    Health,
}

#[derive(Debug, Default)]
struct FakeState {
    submit_results: VecDeque<Result<DetectionResult, DetectError>>,
    progress_steps: Vec<u8>,
    history_results: VecDeque<Result<Vec<HistoryEntry>, DetectError>>,
    stats_results: VecDeque<Result<SessionStats, DetectError>>,
    health_results: VecDeque<Result<HealthStatus, DetectError>>,
    calls: Vec<TransportCall>,
}

/// Scripted transport. Each call pops the next queued result.
///
/// Empty queues answer with an empty history, default stats/health, and a
/// local error for submissions. When gated, submissions report their
/// progress steps and then wait for [`FakeTransport::release_submission`].
#[derive(Debug, Clone, Default)]
pub struct FakeTransport {
    state: Arc<Mutex<FakeState>>,
    gate: Option<Arc<Notify>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_submit_result(self, result: Result<DetectionResult, DetectError>) -> Self {
        self.with_state(|s| s.submit_results.push_back(result));
        self
    }

    /// Progress values reported by each submission before it completes.
    pub fn with_progress(self, steps: &[u8]) -> Self {
        let steps = steps.to_vec();
        self.with_state(|s| s.progress_steps = steps);
        self
    }

    pub fn with_history(self, result: Result<Vec<HistoryEntry>, DetectError>) -> Self {
        self.with_state(|s| s.history_results.push_back(result));
        self
    }

    pub fn with_stats(self, result: Result<SessionStats, DetectError>) -> Self {
        self.with_state(|s| s.stats_results.push_back(result));
        self
    }

    pub fn with_health(self, result: Result<HealthStatus, DetectError>) -> Self {
        self.with_state(|s| s.health_results.push_back(result));
        self
    }

    /// Hold every submission until released.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Notify::new()));
        self
    }

    /// Let one gated submission complete.
    pub fn release_submission(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    /// Calls observed so far, in order.
    pub fn calls(&self) -> Vec<TransportCall> {
        self.state
            .lock()
            .map(|s| s.calls.clone())
            .unwrap_or_default()
    }

    pub fn submit_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, TransportCall::Submit { .. }))
            .count()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> Option<R> {
        self.state.lock().ok().map(|mut s| f(&mut s))
    }
}

impl TransportClient for FakeTransport {
    async fn submit_file(
        &self,
        file: &SelectedFile,
        mut progress: ProgressReporter,
    ) -> Result<DetectionResult, DetectError> {
        let steps = self
            .with_state(|s| {
                s.calls.push(TransportCall::Submit {
                    name: file.name.clone(),
                });
                s.progress_steps.clone()
            })
            .unwrap_or_default();

        for step in steps {
            progress.report(step);
            tokio::task::yield_now().await;
        }

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        self.with_state(|s| s.submit_results.pop_front())
            .flatten()
            .unwrap_or_else(|| Err(DetectError::local("no scripted submission result")))
    }

    async fn fetch_history(&self, limit: usize) -> Result<Vec<HistoryEntry>, DetectError> {
        self.with_state(|s| {
            s.calls.push(TransportCall::History { limit });
            s.history_results.pop_front()
        })
        .flatten()
        .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn fetch_stats(&self) -> Result<SessionStats, DetectError> {
        self.with_state(|s| {
            s.calls.push(TransportCall::Stats);
            s.stats_results.pop_front()
        })
        .flatten()
        .unwrap_or_else(|| Ok(SessionStats::default()))
    }

    async fn fetch_health(&self) -> Result<HealthStatus, DetectError> {
        self.with_state(|s| {
            s.calls.push(TransportCall::Health);
            s.health_results.pop_front()
        })
        .flatten()
        .unwrap_or_else(|| Ok(HealthStatus::default()))
    }
}

// ─────────────────────────────────────────────────────────────────
// MockService
// ─────────────────────────────────────────────────────────────────

/// API prefix the mock serves under, matching the real service.
pub const MOCK_API_PREFIX: &str = "/api/v1";

/// A canned response for one method + path.
#[derive(Debug, Clone)]
pub struct MockRoute {
    pub method: String,
    /// Path relative to the API prefix, e.g. `detect/video`.
    pub path: String,
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl MockRoute {
    pub fn get(path: &str, status: u16, body: &str) -> Self {
        Self::new("GET", path, status, body)
    }

    pub fn post(path: &str, status: u16, body: &str) -> Self {
        Self::new("POST", path, status, body)
    }

    fn new(method: &str, path: &str, status: u16, body: &str) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_string(),
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    /// Wait before answering (after the request body has been read).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn matches(&self, method: &str, path: &str) -> bool {
        self.method == method && path == format!("{}/{}", MOCK_API_PREFIX, self.path)
    }
}

/// A request received by [`MockService`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Local HTTP/1.1 service answering from a fixed route table.
///
/// Unrouted requests get `404 {"detail":"Not Found"}`. Each connection is
/// closed after one response.
#[derive(Debug)]
pub struct MockService {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    task: JoinHandle<()>,
}

impl MockService {
    pub async fn start(routes: Vec<MockRoute>) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let requests = Arc::new(Mutex::new(Vec::new()));
        let routes = Arc::new(routes);

        let recorded = requests.clone();
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let routes = routes.clone();
                let recorded = recorded.clone();
                tokio::spawn(async move {
                    if let Err(e) = serve_connection(stream, &routes, &recorded).await {
                        tracing::debug!("Mock service connection error: {}", e);
                    }
                });
            }
        });

        Ok(Self {
            addr,
            requests,
            task,
        })
    }

    /// Base URL including the API prefix.
    pub fn base_url(&self) -> String {
        format!("http://{}{}", self.addr, MOCK_API_PREFIX)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl Drop for MockService {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve_connection(
    mut stream: TcpStream,
    routes: &[MockRoute],
    recorded: &Mutex<Vec<RecordedRequest>>,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];

    let header_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or_default().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let header = |name: &str| {
        headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    };
    let content_length = header("content-length").and_then(|v| v.parse::<usize>().ok());
    let chunked = header("transfer-encoding").is_some_and(|v| v.contains("chunked"));

    let mut body = buf[header_end..].to_vec();
    loop {
        let complete = match content_length {
            Some(len) => body.len() >= len,
            None if chunked => body.ends_with(b"0\r\n\r\n"),
            None => true,
        };
        if complete {
            break;
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    let (path, query) = match target.split_once('?') {
        Some((p, q)) => (p.to_string(), Some(q.to_string())),
        None => (target.clone(), None),
    };

    let route = routes.iter().find(|r| r.matches(&method, &path)).cloned();

    if let Ok(mut r) = recorded.lock() {
        r.push(RecordedRequest {
            method,
            path,
            query,
            headers,
            body,
        });
    }

    let (status, response_body) = match route {
        Some(route) => {
            if !route.delay.is_zero() {
                tokio::time::sleep(route.delay).await;
            }
            (route.status, route.body)
        }
        None => (404, r#"{"detail":"Not Found"}"#.to_string()),
    };

    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason_phrase(status),
        response_body.len(),
        response_body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        413 => "Payload Too Large",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    }
}
