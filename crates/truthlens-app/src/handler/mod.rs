//! Handler module - TEA update function and message handlers
//!
//! Organized into submodules:
//! - `update`: Main update() function and message dispatch
//! - `upload`: Upload session intents and transport completions
//! - `history`: History view and health handlers

pub(crate) mod history;
pub(crate) mod update;
pub(crate) mod upload;

#[cfg(test)]
mod tests;

use truthlens_core::SelectedFile;

use crate::history_view::RefreshId;
use crate::message::Message;

// Re-export main entry point
pub use update::update;

/// Actions that the event loop should perform after update
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateAction {
    /// Send `file` to the service, tagging every callback with `generation`
    SubmitUpload { generation: u64, file: SelectedFile },

    /// Abandon the in-flight upload task
    CancelUpload,

    /// Fetch history and stats concurrently
    RefreshHistory { refresh_id: RefreshId, limit: usize },

    /// Fetch service health
    FetchHealth,
}

/// Result of processing a message
#[derive(Debug, Default)]
pub struct UpdateResult {
    /// Optional follow-up message to process
    pub message: Option<Message>,
    /// Optional action for the event loop to perform
    pub action: Option<UpdateAction>,
}

impl UpdateResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn message(msg: Message) -> Self {
        Self {
            message: Some(msg),
            action: None,
        }
    }

    pub fn action(action: UpdateAction) -> Self {
        Self {
            message: None,
            action: Some(action),
        }
    }
}
