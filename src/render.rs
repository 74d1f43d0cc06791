//! Human-readable terminal output
//!
//! The `format_*` functions are pure so they can be snapshot-tested; the
//! [`HumanReporter`] writes them to any `Write` sink.

use std::fmt::Write as _;
use std::io::{self, Write};
use std::path::Path;

use truthlens_app::{AppState, EngineEvent, HealthState, HistoryView, UploadPhase};
use truthlens_core::{
    classify, DetectionResult, HistoryEntry, LoadState, SelectedFile, SessionStats,
    VerdictDescriptor,
};

/// Progress is printed once per quarter of the upload.
const PROGRESS_STEP: u8 = 25;

/// Writes plain text for a terminal user.
pub struct HumanReporter<W> {
    out: W,
    last_progress_step: Option<u8>,
}

impl HumanReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> HumanReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last_progress_step: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn phase_changed(&mut self, to: UploadPhase, state: &AppState) -> io::Result<()> {
        let file = state.upload.state().file();
        match (to, file) {
            (UploadPhase::FileSelected, Some(file)) => {
                writeln!(self.out, "Selected {}", describe_file(file))
            }
            (UploadPhase::Uploading, Some(file)) => {
                self.last_progress_step = None;
                writeln!(self.out, "Uploading {}...", file.name)
            }
            (UploadPhase::Analyzing, _) => writeln!(self.out, "Upload complete. Analyzing..."),
            _ => Ok(()),
        }
    }

    fn progress(&mut self, percent: u8) -> io::Result<()> {
        let step = percent / PROGRESS_STEP;
        if self.last_progress_step.is_some_and(|last| step <= last) {
            return Ok(());
        }
        self.last_progress_step = Some(step);
        writeln!(self.out, "  {}%", percent)
    }
}

impl<W: Write> crate::Reporter for HumanReporter<W> {
    fn engine_event(&mut self, event: &EngineEvent, state: &AppState) -> io::Result<()> {
        match event {
            EngineEvent::UploadPhaseChanged { to, .. } => self.phase_changed(*to, state),
            EngineEvent::UploadProgress { percent } => self.progress(*percent),
            EngineEvent::DetectionCompleted { result, descriptor } => {
                writeln!(self.out)?;
                write!(self.out, "{}", format_result_card(result, descriptor))
            }
            EngineEvent::DetectionFailed { error } => {
                writeln!(self.out, "Error: {}", error.user_message())
            }
            EngineEvent::HistoryUpdated { .. }
            | EngineEvent::HealthUpdated { .. }
            | EngineEvent::Shutdown => Ok(()),
        }
    }

    fn mime_warning(&mut self, _file: &SelectedFile, warning: &str) -> io::Result<()> {
        writeln!(self.out, "Warning: {}", warning)
    }

    fn history(&mut self, view: &HistoryView) -> io::Result<()> {
        write!(self.out, "{}", format_history(view))
    }

    fn health(&mut self, health: &HealthState) -> io::Result<()> {
        write!(self.out, "{}", format_health(health))
    }

    fn config_written(&mut self, path: &Path) -> io::Result<()> {
        writeln!(self.out, "Config file: {}", path.display())
    }

    fn error(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "Error: {}", message)
    }
}

fn describe_file(file: &SelectedFile) -> String {
    format!("{} ({:.1} MB, {})", file.name, file.size_mb(), file.mime_type)
}

/// The verdict card shown after a detection completes.
pub fn format_result_card(result: &DetectionResult, descriptor: &VerdictDescriptor) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", descriptor.emoji, descriptor.label);
    let _ = writeln!(out, "  File:             {}", result.filename);
    let _ = writeln!(out, "  Verdict:          {}", result.verdict);
    let _ = writeln!(out, "  Confidence:       {}%", result.confidence_pct());
    let _ = writeln!(out, "  Fake probability: {}%", result.fake_probability_pct());
    let _ = writeln!(out, "  Frames:           {}", result.frames_summary());
    let _ = writeln!(
        out,
        "  Processing time:  {:.1}s",
        result.processing_time_sec
    );
    if let Some(size) = result.file_size_mb {
        let _ = writeln!(out, "  Size:             {:.1} MB", size);
    }
    if !result.request_id.is_empty() {
        let _ = writeln!(out, "  Request:          {}", result.request_id);
    }
    if let Some(message) = &result.message {
        let _ = writeln!(out, "  Note:             {}", message);
    }
    out
}

/// Recent detections followed by the session stats.
///
/// Cached entries stay visible when the last refresh failed.
pub fn format_history(view: &HistoryView) -> String {
    let mut out = String::new();

    if view.load_state() == LoadState::Error {
        if let Some(error) = view.last_error() {
            let _ = writeln!(out, "History unavailable: {}", error.user_message());
        }
    }

    if view.is_empty() {
        if view.load_state() == LoadState::Ready {
            let _ = writeln!(out, "No detections yet.");
        }
    } else {
        let _ = writeln!(out, "Recent detections ({})", view.entries().len());
        for entry in view.entries() {
            let _ = writeln!(out, "{}", format_history_row(entry));
        }
    }

    if let Some(stats) = view.stats().filter(|_| view.has_stats()) {
        let _ = writeln!(out);
        out.push_str(&format_stats(stats));
    }

    out
}

fn format_history_row(entry: &HistoryEntry) -> String {
    let result = &entry.result;
    let descriptor = classify(&result.verdict);
    format!(
        "  {:<16}  {:<10} {:>3}%  {} {}",
        entry.display_timestamp(),
        result.verdict.as_str(),
        result.confidence_pct(),
        descriptor.emoji,
        result.filename
    )
}

fn format_stats(stats: &SessionStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Session stats");
    let _ = writeln!(out, "  Total detections:    {}", stats.total_detections);
    let _ = writeln!(
        out,
        "  Avg processing time: {:.1}s",
        stats.avg_processing_time_sec
    );
    if let Some(confidence) = stats.avg_confidence {
        let _ = writeln!(
            out,
            "  Avg confidence:      {}%",
            (confidence.clamp(0.0, 1.0) * 100.0).round() as u8
        );
    }
    let breakdown: Vec<String> = stats
        .verdict_breakdown
        .iter()
        .map(|(verdict, count)| format!("{} {}", verdict, count))
        .collect();
    let _ = writeln!(out, "  Breakdown:           {}", breakdown.join(", "));
    out
}

/// Health payload, or the failure of the last check.
pub fn format_health(health: &HealthState) -> String {
    let mut out = String::new();

    if let Some(error) = &health.error {
        let _ = writeln!(out, "Health check failed: {}", error.user_message());
    }

    if let Some(status) = &health.status {
        let _ = writeln!(out, "Service: {}", status.status);
        for (name, value) in status.components.iter().chain(status.extra.iter()) {
            let _ = writeln!(out, "  {}: {}", name, plain_value(value));
        }
        if let Some(timestamp) = &status.timestamp {
            let _ = writeln!(out, "Checked at: {}", timestamp);
        }
    }

    out
}

/// Footer pointing at the log file after a fatal error.
pub fn format_log_hint(log_file: &Path) -> String {
    format!("Logs: {}\n", log_file.display())
}

fn plain_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
