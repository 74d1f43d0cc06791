//! Application state (Model in TEA pattern)

use truthlens_core::{DetectError, HealthStatus, LoadState};

use crate::config::SessionConfig;
use crate::history_view::HistoryView;
use crate::upload_session::UploadSession;

/// Application lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppPhase {
    #[default]
    Running,
    Quitting,
}

/// Last health check, informational only.
#[derive(Debug, Default)]
pub struct HealthState {
    pub load_state: LoadState,
    pub status: Option<HealthStatus>,
    pub error: Option<DetectError>,
    /// Bumped whenever a health result is applied.
    pub revision: u64,
}

/// Complete application state (the Model in TEA)
///
/// The upload session and the history view are owned independently; a
/// history failure never touches the upload session.
#[derive(Debug)]
pub struct AppState {
    pub upload: UploadSession,
    pub history: HistoryView,
    pub health: HealthState,
    pub phase: AppPhase,
}

impl AppState {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            history: HistoryView::new(config.history_limit),
            upload: UploadSession::new(config),
            health: HealthState::default(),
            phase: AppPhase::Running,
        }
    }

    pub fn request_quit(&mut self) {
        self.phase = AppPhase::Quitting;
    }

    pub fn should_quit(&self) -> bool {
        self.phase == AppPhase::Quitting
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
