//! Upload session handlers

use truthlens_core::{DetectError, DetectionResult, SelectedFile};

use crate::state::AppState;

use super::{UpdateAction, UpdateResult};

pub(crate) fn handle_select_file(state: &mut AppState, file: SelectedFile) -> UpdateResult {
    state.upload.select_file(file);
    UpdateResult::none()
}

pub(crate) fn handle_submit(state: &mut AppState) -> UpdateResult {
    match state.upload.submit() {
        Some((generation, file)) => {
            UpdateResult::action(UpdateAction::SubmitUpload { generation, file })
        }
        None => UpdateResult::none(),
    }
}

pub(crate) fn handle_reset(state: &mut AppState) -> UpdateResult {
    if state.upload.reset() {
        UpdateResult::action(UpdateAction::CancelUpload)
    } else {
        UpdateResult::none()
    }
}

pub(crate) fn handle_dismiss_error(state: &mut AppState) -> UpdateResult {
    state.upload.dismiss_error();
    UpdateResult::none()
}

pub(crate) fn handle_progress(state: &mut AppState, generation: u64, percent: u8) -> UpdateResult {
    state.upload.on_progress(generation, percent);
    UpdateResult::none()
}

pub(crate) fn handle_completed(
    state: &mut AppState,
    generation: u64,
    result: DetectionResult,
) -> UpdateResult {
    state.upload.on_completed(generation, result);
    UpdateResult::none()
}

pub(crate) fn handle_failed(
    state: &mut AppState,
    generation: u64,
    error: DetectError,
) -> UpdateResult {
    state.upload.on_failed(generation, error);
    UpdateResult::none()
}
