//! Upload session state machine
//!
//! Owns file selection, validation, submission, progress and outcome for a
//! single detection request. Every submission takes a new generation; progress
//! and completions carrying an older generation are discarded, which is how
//! [`UploadSession::reset`] cancels interest in a request still on the wire.

use serde::Serialize;
use truthlens_core::prelude::*;
use truthlens_core::{DetectionResult, SelectedFile};

use crate::config::SessionConfig;

/// Current state of the session.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum UploadState {
    #[default]
    Idle,
    FileSelected(SelectedFile),
    Uploading {
        file: SelectedFile,
        progress: u8,
    },
    /// Upload finished; the service is still working. No progress signal.
    Analyzing(SelectedFile),
    Completed(DetectionResult),
    Failed(DetectError),
}

/// Payload-free tag of [`UploadState`], used for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPhase {
    Idle,
    FileSelected,
    Uploading,
    Analyzing,
    Completed,
    Failed,
}

impl UploadPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::FileSelected => "file_selected",
            Self::Uploading => "uploading",
            Self::Analyzing => "analyzing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl UploadState {
    pub fn phase(&self) -> UploadPhase {
        match self {
            Self::Idle => UploadPhase::Idle,
            Self::FileSelected(_) => UploadPhase::FileSelected,
            Self::Uploading { .. } => UploadPhase::Uploading,
            Self::Analyzing(_) => UploadPhase::Analyzing,
            Self::Completed(_) => UploadPhase::Completed,
            Self::Failed(_) => UploadPhase::Failed,
        }
    }

    /// The selected file, while one is held.
    pub fn file(&self) -> Option<&SelectedFile> {
        match self {
            Self::FileSelected(file) | Self::Analyzing(file) => Some(file),
            Self::Uploading { file, .. } => Some(file),
            _ => None,
        }
    }

    pub fn progress(&self) -> Option<u8> {
        match self {
            Self::Uploading { progress, .. } => Some(*progress),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&DetectionResult> {
        match self {
            Self::Completed(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&DetectError> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// A transport call is outstanding.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Uploading { .. } | Self::Analyzing(_))
    }
}

/// A phase change recorded by the session, drained by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    pub from: UploadPhase,
    pub to: UploadPhase,
}

/// The submission workflow for one client session.
#[derive(Debug)]
pub struct UploadSession {
    config: SessionConfig,
    state: UploadState,
    /// Token of the current submission; bumped by `submit` and `reset`.
    generation: u64,
    /// Where `dismiss_error` returns to.
    before_failure: Option<UploadState>,
    mime_warning: Option<String>,
    transitions: Vec<PhaseTransition>,
}

impl UploadSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: UploadState::Idle,
            generation: 0,
            before_failure: None,
            mime_warning: None,
            transitions: Vec::new(),
        }
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn phase(&self) -> UploadPhase {
        self.state.phase()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Hint for a selected file whose mime type is outside the allowed set.
    pub fn mime_warning(&self) -> Option<&str> {
        self.mime_warning.as_deref()
    }

    /// Phase changes since the last call.
    pub fn take_transitions(&mut self) -> Vec<PhaseTransition> {
        std::mem::take(&mut self.transitions)
    }

    /// Pick a file. Valid from `Idle`, `Completed` and `Failed`.
    ///
    /// An oversized file moves to `Failed(Validation)` and keeps whatever the
    /// session held before, so dismissing the error restores it. Returns
    /// whether the call was accepted.
    pub fn select_file(&mut self, candidate: SelectedFile) -> bool {
        if !matches!(
            self.state,
            UploadState::Idle | UploadState::Completed(_) | UploadState::Failed(_)
        ) {
            debug!(
                "Ignoring file selection of {} while {}",
                candidate.name,
                self.phase().as_str()
            );
            return false;
        }

        if candidate.size_bytes > self.config.max_size_bytes() {
            info!(
                "Rejected {} ({:.1} MB): limit is {} MB",
                candidate.name,
                candidate.size_mb(),
                self.config.max_size_mb
            );
            let error = DetectError::validation(format!(
                "File too large. Maximum size is {} MB.",
                self.config.max_size_mb
            ));
            self.fail_keeping_current(error);
            return true;
        }

        self.mime_warning = if self.config.is_mime_allowed(&candidate.mime_type) {
            None
        } else {
            Some(format!(
                "{} is not a supported video type; the service may reject it.",
                candidate.mime_type
            ))
        };

        self.before_failure = None;
        self.set_state(UploadState::FileSelected(candidate));
        true
    }

    /// Start the submission of the selected file.
    ///
    /// Valid only from `FileSelected`; anything else is a no-op returning
    /// `None`. On success returns the new generation and the file to send.
    pub fn submit(&mut self) -> Option<(u64, SelectedFile)> {
        let UploadState::FileSelected(file) = &self.state else {
            debug!("Ignoring submit while {}", self.phase().as_str());
            return None;
        };
        let file = file.clone();

        self.generation += 1;
        self.set_state(UploadState::Uploading {
            file: file.clone(),
            progress: 0,
        });
        Some((self.generation, file))
    }

    /// Apply a progress report from the transport.
    ///
    /// Ignored unless the generation is current and the session is
    /// `Uploading`. Progress never decreases; reaching 100 moves to `Analyzing`.
    /// Returns whether the state changed.
    pub fn on_progress(&mut self, generation: u64, percent: u8) -> bool {
        if !self.is_current(generation, "progress") {
            return false;
        }

        if !matches!(self.state, UploadState::Uploading { .. }) {
            debug!("Ignoring progress {}% while {}", percent, self.phase().as_str());
            return false;
        }
        let UploadState::Uploading { file, progress } = &mut self.state else {
            return false;
        };

        let percent = percent.min(100);
        if percent <= *progress {
            return false;
        }
        *progress = percent;

        if percent == 100 {
            let file = file.clone();
            self.set_state(UploadState::Analyzing(file));
        }
        true
    }

    /// The service returned a result.
    ///
    /// Accepted from `Uploading` or `Analyzing`; a completion that arrives
    /// before the 100% report still passes through `Analyzing`.
    pub fn on_completed(&mut self, generation: u64, result: DetectionResult) -> bool {
        if !self.is_current(generation, "completion") {
            return false;
        }

        match &self.state {
            UploadState::Uploading { file, .. } => {
                let file = file.clone();
                self.set_state(UploadState::Analyzing(file));
            }
            UploadState::Analyzing(_) => {}
            other => {
                debug!("Ignoring completion while {}", other.phase().as_str());
                return false;
            }
        }

        info!(
            "Detection {} finished: {}",
            result.request_id, result.verdict
        );
        self.set_state(UploadState::Completed(result));
        true
    }

    /// The transport call failed.
    ///
    /// Accepted from `Uploading` or `Analyzing`. Dismissing the error returns
    /// to `FileSelected` with the same file.
    pub fn on_failed(&mut self, generation: u64, error: DetectError) -> bool {
        if !self.is_current(generation, "failure") {
            return false;
        }

        let file = match &self.state {
            UploadState::Uploading { file, .. } | UploadState::Analyzing(file) => file.clone(),
            other => {
                debug!("Ignoring failure while {}", other.phase().as_str());
                return false;
            }
        };

        warn!("Submission of {} failed: {}", file.name, error);
        self.before_failure = Some(UploadState::FileSelected(file));
        self.set_state(UploadState::Failed(error));
        true
    }

    /// Return to `Idle` from any state, dropping file, result and error.
    ///
    /// Bumps the generation so late callbacks from an in-flight request are
    /// discarded. Returns whether a request was in flight.
    pub fn reset(&mut self) -> bool {
        let was_in_flight = self.state.is_in_flight();
        self.generation += 1;
        self.before_failure = None;
        self.mime_warning = None;
        self.set_state(UploadState::Idle);
        was_in_flight
    }

    /// Dismiss the current error and return to the state before it.
    ///
    /// Never retries. A no-op outside `Failed`.
    pub fn dismiss_error(&mut self) -> bool {
        if !matches!(self.state, UploadState::Failed(_)) {
            debug!("Nothing to dismiss while {}", self.phase().as_str());
            return false;
        }
        let previous = self.before_failure.take().unwrap_or_default();
        self.set_state(previous);
        true
    }

    fn is_current(&self, generation: u64, what: &str) -> bool {
        if generation == self.generation {
            return true;
        }
        debug!(
            "Discarding stale {} (generation {}, current {})",
            what, generation, self.generation
        );
        false
    }

    fn fail_keeping_current(&mut self, error: DetectError) {
        // Failed -> Failed keeps the first pre-failure state.
        if !matches!(self.state, UploadState::Failed(_)) {
            self.before_failure = Some(self.state.clone());
        }
        self.set_state(UploadState::Failed(error));
    }

    fn set_state(&mut self, next: UploadState) {
        let from = self.state.phase();
        let to = next.phase();
        self.state = next;
        // Failed -> Failed still counts: the error changed.
        if from != to || to == UploadPhase::Failed {
            debug!("Upload session: {} -> {}", from.as_str(), to.as_str());
            self.transitions.push(PhaseTransition { from, to });
        }
    }
}

impl Default for UploadSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
