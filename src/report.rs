//! Output seam shared by the human and headless adapters
//!
//! The runner forwards every [`EngineEvent`] and the final view-models to a
//! [`Reporter`]. Reporters only read state; they never drive the engine.

use std::io;
use std::path::Path;

use truthlens_app::{AppState, EngineEvent, HealthState, HistoryView};
use truthlens_core::SelectedFile;

/// Renders engine output for one presentation mode.
pub trait Reporter {
    /// An event broadcast by the engine. `state` is the state after the
    /// message that produced it.
    fn engine_event(&mut self, event: &EngineEvent, state: &AppState) -> io::Result<()>;

    /// The selected file is outside the allowed mime types but was accepted.
    fn mime_warning(&mut self, file: &SelectedFile, warning: &str) -> io::Result<()>;

    /// The history view after a refresh settled.
    fn history(&mut self, view: &HistoryView) -> io::Result<()>;

    /// The health state after a check settled.
    fn health(&mut self, health: &HealthState) -> io::Result<()>;

    fn config_written(&mut self, path: &Path) -> io::Result<()>;

    /// A failure outside the detection workflow (unreadable path, cancel).
    fn error(&mut self, message: &str) -> io::Result<()>;
}
