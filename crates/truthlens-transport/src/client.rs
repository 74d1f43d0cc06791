//! Transport contract between the client core and the detection service
//!
//! `TransportClient` is the `Send` variant generated by `trait_variant`; the
//! application spawns its futures on the tokio runtime, so implementations
//! provide that variant. `LocalTransportClient` is available for
//! single-threaded hosts.

use truthlens_core::{
    DetectError, DetectionResult, HealthStatus, HistoryEntry, SelectedFile, SessionStats,
};

use crate::progress::ProgressReporter;

/// One request/response exchange per call. Every failure is already
/// classified into the [`DetectError`] taxonomy.
#[trait_variant::make(TransportClient: Send)]
pub trait LocalTransportClient {
    /// `POST detect/video` with the file as multipart field `file`.
    ///
    /// Progress is reported through `progress` while the body is sent.
    async fn submit_file(
        &self,
        file: &SelectedFile,
        progress: ProgressReporter,
    ) -> Result<DetectionResult, DetectError>;

    /// `GET history?limit=N`, newest first.
    async fn fetch_history(&self, limit: usize) -> Result<Vec<HistoryEntry>, DetectError>;

    /// `GET stats`
    async fn fetch_stats(&self) -> Result<SessionStats, DetectError>;

    /// `GET health`
    async fn fetch_health(&self) -> Result<HealthStatus, DetectError>;
}
