//! `reqwest`-backed transport for the detection service
//!
//! Endpoints are resolved relative to the configured base URL, which carries
//! the service's API prefix (e.g. `http://localhost:8000/api/v1`).

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response};
use tokio::io::AsyncReadExt;
use truthlens_core::prelude::*;
use truthlens_core::{DetectionResult, HealthStatus, HistoryEntry, SelectedFile, SessionStats};
use url::Url;

use crate::client::TransportClient;
use crate::outcome::{
    classify_send_error, decode_detection, decode_history, decode_response, decode_stats,
};
use crate::progress::ProgressReporter;

/// Size of each upload body chunk; progress is reported per chunk.
pub const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Multipart field name the service expects.
pub const UPLOAD_FIELD_NAME: &str = "file";

const DETECT_PATH: &str = "detect/video";
const HISTORY_PATH: &str = "history";
const STATS_PATH: &str = "stats";
const HEALTH_PATH: &str = "health";

/// HTTP client for one detection service.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    /// Create a transport for `base_url`.
    ///
    /// `timeout` bounds each whole exchange (upload plus analysis); `None`
    /// disables it. An elapsed timeout surfaces as a network error.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let base_url = normalize_base_url(base_url)?;

        let mut builder = Client::builder().user_agent(concat!(
            "truthlens/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> std::result::Result<Url, DetectError> {
        self.base_url
            .join(path)
            .map_err(|e| DetectError::local(format!("Invalid endpoint '{}': {}", path, e)))
    }

    /// Send a prepared request and return `(status, body text)`.
    async fn exchange(
        &self,
        request: reqwest::RequestBuilder,
    ) -> std::result::Result<(u16, String), DetectError> {
        let response = request.send().await.map_err(|e| {
            warn!("Request to {} failed: {}", self.base_url, e);
            classify_send_error(&e)
        })?;
        read_body(response).await
    }

    async fn get(&self, url: Url) -> std::result::Result<(u16, String), DetectError> {
        debug!("GET {}", url);
        self.exchange(self.client.get(url)).await
    }
}

async fn read_body(response: Response) -> std::result::Result<(u16, String), DetectError> {
    let status = response.status().as_u16();
    let body = response.text().await.map_err(|e| {
        warn!("Failed to read response body (status {}): {}", status, e);
        classify_send_error(&e)
    })?;
    if !(200..300).contains(&status) {
        warn!("Service answered {}: {}", status, body);
    }
    Ok((status, body))
}

/// Parse a base URL and make sure relative joins append to its path.
pub fn normalize_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };

    let url = Url::parse(&with_slash).map_err(|e| Error::invalid_service_url(raw, e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::invalid_service_url(
            raw,
            format!("unsupported scheme '{}'", other),
        )),
    }
}

/// Stream the file from disk in chunks, reporting progress as each chunk is
/// handed to the HTTP stack.
async fn upload_part(
    file: &SelectedFile,
    mut progress: ProgressReporter,
) -> std::result::Result<Part, DetectError> {
    let handle = tokio::fs::File::open(&file.uri)
        .await
        .map_err(|e| DetectError::local(format!("Could not read {}: {}", file.name, e)))?;
    let total = handle
        .metadata()
        .await
        .map_err(|e| DetectError::local(format!("Could not read {}: {}", file.name, e)))?
        .len();

    progress.report(0);

    let chunks = futures_util::stream::try_unfold(
        (handle, progress, 0u64),
        move |(mut handle, mut progress, sent)| async move {
            let mut buf = vec![0u8; UPLOAD_CHUNK_SIZE];
            let read = handle.read(&mut buf).await?;
            if read == 0 {
                progress.report(100);
                return Ok::<_, std::io::Error>(None);
            }
            buf.truncate(read);
            let sent = sent + read as u64;
            progress.report_bytes(sent, total);
            Ok(Some((buf, (handle, progress, sent))))
        },
    );

    Part::stream_with_length(Body::wrap_stream(chunks), total)
        .file_name(file.name.clone())
        .mime_str(&file.mime_type)
        .map_err(|e| {
            DetectError::local(format!("Invalid mime type '{}': {}", file.mime_type, e))
        })
}

impl TransportClient for HttpTransport {
    async fn submit_file(
        &self,
        file: &SelectedFile,
        progress: ProgressReporter,
    ) -> std::result::Result<DetectionResult, DetectError> {
        let url = self.endpoint(DETECT_PATH)?;
        let part = upload_part(file, progress).await?;
        let form = Form::new().part(UPLOAD_FIELD_NAME, part);

        info!(
            "Submitting {} ({} bytes, {}) to {}",
            file.name, file.size_bytes, file.mime_type, url
        );
        let (status, body) = self.exchange(self.client.post(url).multipart(form)).await?;
        let result = decode_detection(status, &body)?;
        info!(
            "Detection {} for {}: {} ({:.0}% confidence)",
            result.request_id,
            file.name,
            result.verdict,
            result.confidence * 100.0
        );
        Ok(result)
    }

    async fn fetch_history(
        &self,
        limit: usize,
    ) -> std::result::Result<Vec<HistoryEntry>, DetectError> {
        let mut url = self.endpoint(HISTORY_PATH)?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        let (status, body) = self.get(url).await?;
        decode_history(status, &body)
    }

    async fn fetch_stats(&self) -> std::result::Result<SessionStats, DetectError> {
        let url = self.endpoint(STATS_PATH)?;
        let (status, body) = self.get(url).await?;
        decode_stats(status, &body)
    }

    async fn fetch_health(&self) -> std::result::Result<HealthStatus, DetectError> {
        let url = self.endpoint(HEALTH_PATH)?;
        let (status, body) = self.get(url).await?;
        decode_response(status, &body)
    }
}
