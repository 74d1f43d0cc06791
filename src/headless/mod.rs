//! Headless mode - JSON event output for scripts
//!
//! With `--headless` the CLI prints structured JSON events instead of human
//! text, so wrappers and test scripts never parse free-form output.
//!
//! # Event Format
//!
//! Events are output as NDJSON (newline-delimited JSON), one event per line.
//! Each event has an "event" field indicating its type, along with event-specific data.
//!
//! # Example Output
//!
//! ```json
//! {"event":"file_selected","name":"clip.mp4","size_bytes":1048576,"mime_type":"video/mp4","timestamp":1704700001000}
//! {"event":"phase_changed","from":"file_selected","to":"uploading","timestamp":1704700001005}
//! {"event":"upload_progress","percent":100,"timestamp":1704700001900}
//! {"event":"detection_completed","verdict":"FAKE","label":"Deepfake Detected",...,"timestamp":1704700004200}
//! ```

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use tracing::error;
use truthlens_app::{AppState, EngineEvent, HealthState, HistoryView, UploadPhase};
use truthlens_core::{
    DetectError, DetectionResult, HistoryEntry, LoadState, SelectedFile, SessionStats,
    VerdictDescriptor,
};

use crate::Reporter;

/// Events emitted in headless mode
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HeadlessEvent {
    /// A file was accepted for submission
    FileSelected {
        name: String,
        size_bytes: u64,
        mime_type: String,
        timestamp: i64,
    },

    /// The file's mime type is outside the allowed set
    MimeWarning {
        name: String,
        message: String,
        timestamp: i64,
    },

    /// The upload session moved between phases
    PhaseChanged {
        from: UploadPhase,
        to: UploadPhase,
        timestamp: i64,
    },

    UploadProgress { percent: u8, timestamp: i64 },

    /// The service returned a verdict
    DetectionCompleted {
        request_id: String,
        filename: String,
        verdict: String,
        label: String,
        emoji: String,
        color: String,
        confidence: f64,
        fake_probability: f64,
        frames_analyzed: u32,
        total_frames: u32,
        processing_time_sec: f64,
        message: Option<String>,
        timestamp: i64,
    },

    /// The submission ended in `Failed`
    DetectionFailed {
        kind: String,
        message: String,
        timestamp: i64,
    },

    /// One row of the history view, newest first
    HistoryEntry {
        request_id: String,
        filename: String,
        verdict: String,
        confidence: f64,
        recorded_at: Option<String>,
        timestamp: i64,
    },

    /// Session aggregates
    Stats {
        total_detections: u64,
        avg_processing_time_sec: f64,
        avg_confidence: Option<f64>,
        verdict_breakdown: BTreeMap<String, u64>,
        timestamp: i64,
    },

    /// A history or stats read failed
    HistoryFailed {
        kind: String,
        message: String,
        timestamp: i64,
    },

    /// Result of a health check
    Health {
        status: String,
        healthy: bool,
        components: BTreeMap<String, serde_json::Value>,
        timestamp: i64,
    },

    /// The default config file exists at `path`
    ConfigWritten { path: String, timestamp: i64 },

    /// Error occurred
    Error {
        message: String,
        fatal: bool,
        timestamp: i64,
    },
}

impl HeadlessEvent {
    /// Emit this event to stdout as JSON
    pub fn emit(&self) {
        let mut stdout = io::stdout().lock();
        if let Err(e) = self.write_to(&mut stdout) {
            error!("Failed to write headless event to stdout: {}", e);
        }
    }

    /// Write this event as one NDJSON line and flush.
    pub fn write_to(&self, out: &mut impl Write) -> io::Result<()> {
        let json = serde_json::to_string(self).map_err(io::Error::other)?;
        writeln!(out, "{}", json)?;
        out.flush()
    }

    /// Get current timestamp in milliseconds
    fn now() -> i64 {
        Utc::now().timestamp_millis()
    }

    // ─────────────────────────────────────────────────────────
    // Convenience constructors
    // ─────────────────────────────────────────────────────────

    pub fn file_selected(file: &SelectedFile) -> Self {
        Self::FileSelected {
            name: file.name.clone(),
            size_bytes: file.size_bytes,
            mime_type: file.mime_type.clone(),
            timestamp: Self::now(),
        }
    }

    pub fn mime_warning(file: &SelectedFile, message: &str) -> Self {
        Self::MimeWarning {
            name: file.name.clone(),
            message: message.to_string(),
            timestamp: Self::now(),
        }
    }

    pub fn phase_changed(from: UploadPhase, to: UploadPhase) -> Self {
        Self::PhaseChanged {
            from,
            to,
            timestamp: Self::now(),
        }
    }

    pub fn upload_progress(percent: u8) -> Self {
        Self::UploadProgress {
            percent,
            timestamp: Self::now(),
        }
    }

    pub fn detection_completed(result: &DetectionResult, descriptor: &VerdictDescriptor) -> Self {
        Self::DetectionCompleted {
            request_id: result.request_id.clone(),
            filename: result.filename.clone(),
            verdict: result.verdict.to_string(),
            label: descriptor.label.to_string(),
            emoji: descriptor.emoji.to_string(),
            color: descriptor.color.to_string(),
            confidence: result.confidence,
            fake_probability: result.fake_probability,
            frames_analyzed: result.frames_analyzed,
            total_frames: result.total_frames,
            processing_time_sec: result.processing_time_sec,
            message: result.message.clone(),
            timestamp: Self::now(),
        }
    }

    pub fn detection_failed(error: &DetectError) -> Self {
        Self::DetectionFailed {
            kind: error.kind().to_string(),
            message: error.user_message(),
            timestamp: Self::now(),
        }
    }

    pub fn history_entry(entry: &HistoryEntry) -> Self {
        Self::HistoryEntry {
            request_id: entry.result.request_id.clone(),
            filename: entry.result.filename.clone(),
            verdict: entry.result.verdict.to_string(),
            confidence: entry.result.confidence,
            recorded_at: entry
                .timestamp
                .map(|ts| ts.format("%Y-%m-%dT%H:%M:%S").to_string()),
            timestamp: Self::now(),
        }
    }

    pub fn stats(stats: &SessionStats) -> Self {
        Self::Stats {
            total_detections: stats.total_detections,
            avg_processing_time_sec: stats.avg_processing_time_sec,
            avg_confidence: stats.avg_confidence,
            verdict_breakdown: stats
                .verdict_breakdown
                .iter()
                .map(|(verdict, count)| (verdict.to_string(), *count))
                .collect(),
            timestamp: Self::now(),
        }
    }

    pub fn history_failed(error: &DetectError) -> Self {
        Self::HistoryFailed {
            kind: error.kind().to_string(),
            message: error.user_message(),
            timestamp: Self::now(),
        }
    }

    pub fn config_written(path: &Path) -> Self {
        Self::ConfigWritten {
            path: path.display().to_string(),
            timestamp: Self::now(),
        }
    }

    pub fn error(message: String, fatal: bool) -> Self {
        Self::Error {
            message,
            fatal,
            timestamp: Self::now(),
        }
    }
}

/// Writes one [`HeadlessEvent`] per line.
pub struct HeadlessReporter<W> {
    out: W,
}

impl HeadlessReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> HeadlessReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, event: HeadlessEvent) -> io::Result<()> {
        event.write_to(&mut self.out)
    }
}

impl<W: Write> Reporter for HeadlessReporter<W> {
    fn engine_event(&mut self, event: &EngineEvent, state: &AppState) -> io::Result<()> {
        match event {
            EngineEvent::UploadPhaseChanged { from, to } => {
                if *to == UploadPhase::FileSelected {
                    if let Some(file) = state.upload.state().file() {
                        self.emit(HeadlessEvent::file_selected(file))?;
                    }
                }
                self.emit(HeadlessEvent::phase_changed(*from, *to))
            }
            EngineEvent::UploadProgress { percent } => {
                self.emit(HeadlessEvent::upload_progress(*percent))
            }
            EngineEvent::DetectionCompleted { result, descriptor } => {
                self.emit(HeadlessEvent::detection_completed(result, descriptor))
            }
            EngineEvent::DetectionFailed { error } => {
                self.emit(HeadlessEvent::detection_failed(error))
            }
            EngineEvent::HistoryUpdated { .. }
            | EngineEvent::HealthUpdated { .. }
            | EngineEvent::Shutdown => Ok(()),
        }
    }

    fn mime_warning(&mut self, file: &SelectedFile, warning: &str) -> io::Result<()> {
        self.emit(HeadlessEvent::mime_warning(file, warning))
    }

    fn history(&mut self, view: &HistoryView) -> io::Result<()> {
        if view.load_state() == LoadState::Error {
            if let Some(error) = view.last_error() {
                self.emit(HeadlessEvent::history_failed(error))?;
            }
        }
        for entry in view.entries() {
            self.emit(HeadlessEvent::history_entry(entry))?;
        }
        if let Some(stats) = view.stats() {
            self.emit(HeadlessEvent::stats(stats))?;
        }
        Ok(())
    }

    fn health(&mut self, health: &HealthState) -> io::Result<()> {
        if let Some(error) = &health.error {
            self.emit(HeadlessEvent::error(
                format!("Health check failed: {}", error.user_message()),
                false,
            ))?;
        }
        if let Some(status) = &health.status {
            self.emit(HeadlessEvent::Health {
                status: status.status.clone(),
                healthy: status.is_healthy(),
                components: status.components.clone(),
                timestamp: HeadlessEvent::now(),
            })?;
        }
        Ok(())
    }

    fn config_written(&mut self, path: &Path) -> io::Result<()> {
        self.emit(HeadlessEvent::config_written(path))
    }

    fn error(&mut self, message: &str) -> io::Result<()> {
        self.emit(HeadlessEvent::error(message.to_string(), true))
    }
}
