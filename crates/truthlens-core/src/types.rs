//! Domain types shared by the transport and application crates
//!
//! Wire-facing types deserialize from the detection service's snake_case JSON.
//! Invariant checks (`validate`) run when a response is decoded; the client
//! never repairs figures produced by the service.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Bytes per megabyte as used for size limits (2^20).
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Mime type used when the extension is not recognised.
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

// ─────────────────────────────────────────────────────────────────
// SelectedFile
// ─────────────────────────────────────────────────────────────────

/// A file the user picked for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedFile {
    /// Location of the file contents.
    pub uri: PathBuf,
    /// Display/upload file name.
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
}

impl SelectedFile {
    pub fn new(
        uri: impl Into<PathBuf>,
        name: impl Into<String>,
        size_bytes: u64,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
            size_bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Build a candidate from a path on disk (size from metadata, mime from extension).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(Error::NotAFile {
                path: path.to_path_buf(),
            });
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            uri: path.to_path_buf(),
            mime_type: mime_for_path(path).to_string(),
            name,
            size_bytes: metadata.len(),
        })
    }

    /// Size in megabytes (2^20 bytes).
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / BYTES_PER_MB as f64
    }
}

/// Guess the mime type of a media file from its extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" => "video/mp4",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        _ => FALLBACK_MIME_TYPE,
    }
}

// ─────────────────────────────────────────────────────────────────
// VerdictCode
// ─────────────────────────────────────────────────────────────────

/// Categorical outcome of a detection request.
///
/// Unrecognised codes are kept verbatim in [`VerdictCode::Unknown`] so newer
/// service versions never break decoding.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VerdictCode {
    Authentic,
    Fake,
    Suspicious,
    NoFaces,
    DemoMode,
    Unknown(String),
}

impl VerdictCode {
    /// All codes the client knows how to present.
    pub const KNOWN: [VerdictCode; 5] = [
        VerdictCode::Authentic,
        VerdictCode::Fake,
        VerdictCode::Suspicious,
        VerdictCode::NoFaces,
        VerdictCode::DemoMode,
    ];

    /// Wire representation (`AUTHENTIC`, `FAKE`, ...).
    pub fn as_str(&self) -> &str {
        match self {
            VerdictCode::Authentic => "AUTHENTIC",
            VerdictCode::Fake => "FAKE",
            VerdictCode::Suspicious => "SUSPICIOUS",
            VerdictCode::NoFaces => "NO_FACES",
            VerdictCode::DemoMode => "DEMO_MODE",
            VerdictCode::Unknown(code) => code,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, VerdictCode::Unknown(_))
    }
}

impl From<&str> for VerdictCode {
    fn from(code: &str) -> Self {
        match code {
            "AUTHENTIC" => VerdictCode::Authentic,
            "FAKE" => VerdictCode::Fake,
            "SUSPICIOUS" => VerdictCode::Suspicious,
            "NO_FACES" => VerdictCode::NoFaces,
            "DEMO_MODE" => VerdictCode::DemoMode,
            other => VerdictCode::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for VerdictCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for VerdictCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for VerdictCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(VerdictCode::from(code.as_str()))
    }
}

// ─────────────────────────────────────────────────────────────────
// DetectionResult
// ─────────────────────────────────────────────────────────────────

/// Result of one detection request, as produced by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub filename: String,
    pub verdict: VerdictCode,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub fake_probability: f64,
    #[serde(default)]
    pub frames_analyzed: u32,
    #[serde(default)]
    pub total_frames: u32,
    #[serde(default)]
    pub processing_time_sec: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size_mb: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DetectionResult {
    /// Check the invariants the service guarantees for a result.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.frames_analyzed > self.total_frames {
            return Err(format!(
                "frames_analyzed ({}) exceeds total_frames ({})",
                self.frames_analyzed, self.total_frames
            ));
        }
        check_unit_interval("confidence", self.confidence)?;
        check_unit_interval("fake_probability", self.fake_probability)?;
        Ok(())
    }

    /// Confidence as a whole percentage.
    pub fn confidence_pct(&self) -> u8 {
        to_pct(self.confidence)
    }

    /// Fake probability as a whole percentage.
    pub fn fake_probability_pct(&self) -> u8 {
        to_pct(self.fake_probability)
    }

    /// "120 / 150 frames"
    pub fn frames_summary(&self) -> String {
        format!("{} / {} frames", self.frames_analyzed, self.total_frames)
    }
}

fn check_unit_interval(field: &str, value: f64) -> std::result::Result<(), String> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(format!("{} ({}) is outside [0, 1]", field, value))
    }
}

fn to_pct(value: f64) -> u8 {
    (value.clamp(0.0, 1.0) * 100.0).round() as u8
}

// ─────────────────────────────────────────────────────────────────
// HistoryEntry
// ─────────────────────────────────────────────────────────────────

/// Timestamp format used by the service (`datetime.isoformat()`, no zone).
const SERVICE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A past detection plus the time the service recorded it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub result: DetectionResult,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<NaiveDateTime>,
}

impl HistoryEntry {
    /// Timestamp for display, or an em dash when the service sent none.
    pub fn display_timestamp(&self) -> String {
        self.timestamp
            .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "—".to_string())
    }
}

/// Accept ISO timestamps with or without fractional seconds; anything else is `None`.
fn lenient_timestamp<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        NaiveDateTime::parse_from_str(&s, SERVICE_TIMESTAMP_FORMAT)
            .ok()
            .or_else(|| {
                chrono::DateTime::parse_from_rfc3339(&s)
                    .ok()
                    .map(|dt| dt.naive_local())
            })
    }))
}

// ─────────────────────────────────────────────────────────────────
// SessionStats
// ─────────────────────────────────────────────────────────────────

/// Aggregate figures for the current service session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionStats {
    #[serde(default)]
    pub total_detections: u64,
    #[serde(
        default,
        rename = "avg_processing_time",
        alias = "avg_processing_time_sec"
    )]
    pub avg_processing_time_sec: f64,
    #[serde(default)]
    pub verdict_breakdown: BTreeMap<VerdictCode, u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_confidence: Option<f64>,
}

impl SessionStats {
    /// Check the aggregate invariants.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let sum = self
            .verdict_breakdown
            .values()
            .try_fold(0u64, |acc, n| acc.checked_add(*n));
        match sum {
            Some(sum) if sum == self.total_detections => {}
            Some(sum) => {
                return Err(format!(
                    "verdict_breakdown sums to {} but total_detections is {}",
                    sum, self.total_detections
                ));
            }
            None => {
                return Err(format!(
                    "verdict_breakdown overflows but total_detections is {}",
                    self.total_detections
                ));
            }
        }
        if self.total_detections == 0 && self.avg_processing_time_sec != 0.0 {
            return Err(format!(
                "avg_processing_time is {} with no detections",
                self.avg_processing_time_sec
            ));
        }
        Ok(())
    }

    /// Count for one verdict, zero when absent.
    pub fn count_for(&self, verdict: &VerdictCode) -> u64 {
        self.verdict_breakdown.get(verdict).copied().unwrap_or(0)
    }
}

// ─────────────────────────────────────────────────────────────────
// HealthStatus
// ─────────────────────────────────────────────────────────────────

/// Service health payload. Informational only.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub components: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Any further model/session metadata the service reports.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy") || self.status.eq_ignore_ascii_case("ok")
    }
}

// ─────────────────────────────────────────────────────────────────
// LoadState
// ─────────────────────────────────────────────────────────────────

/// Lifecycle of a fetch-and-cache view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}
