//! truthlens-app - Upload workflow and orchestration for TruthLens
//!
//! This crate implements the TEA (The Elm Architecture) pattern for state
//! management: the upload session state machine, the history view-model, the
//! Engine that runs transport calls on tokio, and configuration loading.

pub mod actions;
pub mod config;
pub mod engine;
pub mod engine_event;
pub mod handler;
pub mod history_view;
pub mod message;
pub mod process;
pub mod state;
pub mod upload_session;

// Re-export primary types
pub use config::{SessionConfig, Settings};
pub use engine::Engine;
pub use engine_event::EngineEvent;
pub use handler::{UpdateAction, UpdateResult};
pub use history_view::{HistoryView, RefreshId};
pub use message::Message;
pub use state::{AppPhase, AppState, HealthState};
pub use upload_session::{PhaseTransition, UploadPhase, UploadSession, UploadState};
