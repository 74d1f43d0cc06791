//! Domain events emitted by the Engine for external consumers
//!
//! Presentation adapters subscribe through `Engine::subscribe()` and render
//! from these events plus the engine state; they never mutate state
//! themselves. Events are broadcast after each message processing cycle.

use truthlens_core::{DetectError, DetectionResult, LoadState, VerdictDescriptor};

use crate::upload_session::UploadPhase;

/// Domain events emitted by the Engine for external consumers.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    // ─────────────────────────────────────────────────────────
    // Upload Session
    // ─────────────────────────────────────────────────────────
    /// The upload session moved between phases
    UploadPhaseChanged { from: UploadPhase, to: UploadPhase },

    /// Upload progress of the current submission
    UploadProgress { percent: u8 },

    /// The service returned a verdict
    DetectionCompleted {
        result: DetectionResult,
        descriptor: VerdictDescriptor,
    },

    /// The session entered `Failed`
    DetectionFailed { error: DetectError },

    // ─────────────────────────────────────────────────────────
    // History View
    // ─────────────────────────────────────────────────────────
    /// History entries, stats or load state changed
    HistoryUpdated {
        load_state: LoadState,
        entry_count: usize,
        error: Option<DetectError>,
    },

    /// A health result was applied
    HealthUpdated {
        load_state: LoadState,
        healthy: Option<bool>,
    },

    // ─────────────────────────────────────────────────────────
    // Engine Lifecycle
    // ─────────────────────────────────────────────────────────
    /// Engine is shutting down
    Shutdown,
}

impl EngineEvent {
    /// Returns a short string label for this event type (for logging/debugging).
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::UploadPhaseChanged { .. } => "upload_phase_changed",
            Self::UploadProgress { .. } => "upload_progress",
            Self::DetectionCompleted { .. } => "detection_completed",
            Self::DetectionFailed { .. } => "detection_failed",
            Self::HistoryUpdated { .. } => "history_updated",
            Self::HealthUpdated { .. } => "health_updated",
            Self::Shutdown => "shutdown",
        }
    }

    /// Whether this event ends a submission.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::DetectionCompleted { .. } | Self::DetectionFailed { .. }
        )
    }
}
