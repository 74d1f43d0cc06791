//! Main update function - handles state transitions (TEA pattern)

use crate::message::Message;
use crate::state::AppState;

use super::{history, upload, UpdateAction, UpdateResult};

/// Process a message and update state.
///
/// Synchronous; any I/O the message calls for is returned as an action.
pub fn update(state: &mut AppState, message: Message) -> UpdateResult {
    match message {
        Message::SelectFile(file) => upload::handle_select_file(state, file),
        Message::Submit => upload::handle_submit(state),
        Message::Reset => upload::handle_reset(state),
        Message::DismissError => upload::handle_dismiss_error(state),

        Message::UploadProgress {
            generation,
            percent,
        } => upload::handle_progress(state, generation, percent),
        Message::UploadCompleted { generation, result } => {
            upload::handle_completed(state, generation, result)
        }
        Message::UploadFailed { generation, error } => {
            upload::handle_failed(state, generation, error)
        }

        Message::HistoryActivated => history::handle_activated(state),
        Message::RefreshHistory => history::handle_refresh(state),
        Message::HistoryLoaded {
            refresh_id,
            history,
            stats,
        } => history::handle_loaded(state, refresh_id, history, stats),

        Message::FetchHealth => history::handle_fetch_health(state),
        Message::HealthLoaded(result) => history::handle_health_loaded(state, result),

        Message::Quit => {
            state.request_quit();
            if state.upload.state().is_in_flight() {
                state.upload.reset();
                return UpdateResult::action(UpdateAction::CancelUpload);
            }
            UpdateResult::none()
        }
    }
}
