//! Message types for the application (TEA pattern)

use truthlens_core::{
    DetectError, DetectionResult, HealthStatus, HistoryEntry, SelectedFile, SessionStats,
};

use crate::history_view::RefreshId;

/// All possible messages in the application
#[derive(Debug, Clone)]
pub enum Message {
    // ─────────────────────────────────────────────────────────
    // User Intents
    // ─────────────────────────────────────────────────────────
    /// User picked a file
    SelectFile(SelectedFile),

    /// Submit the selected file for detection
    Submit,

    /// Clear file, result and error; abandon any request in flight
    Reset,

    /// Dismiss the displayed error
    DismissError,

    /// History view became visible
    HistoryActivated,

    /// Explicit user-initiated history refresh
    RefreshHistory,

    /// Fetch service health for display
    FetchHealth,

    /// Request application quit
    Quit,

    // ─────────────────────────────────────────────────────────
    // Transport Completions
    // ─────────────────────────────────────────────────────────
    /// Upload progress for the submission with `generation`
    UploadProgress { generation: u64, percent: u8 },

    /// The service returned a result
    UploadCompleted {
        generation: u64,
        result: DetectionResult,
    },

    /// The submission failed
    UploadFailed { generation: u64, error: DetectError },

    /// Both history reads finished
    HistoryLoaded {
        refresh_id: RefreshId,
        history: Result<Vec<HistoryEntry>, DetectError>,
        stats: Result<SessionStats, DetectError>,
    },

    /// Health read finished
    HealthLoaded(Result<HealthStatus, DetectError>),
}
