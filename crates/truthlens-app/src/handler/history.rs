//! History view and health handlers

use truthlens_core::prelude::*;
use truthlens_core::{HealthStatus, HistoryEntry, LoadState, SessionStats};

use crate::history_view::RefreshId;
use crate::state::AppState;

use super::{UpdateAction, UpdateResult};

fn refresh_action(state: &AppState, refresh_id: Option<RefreshId>) -> UpdateResult {
    match refresh_id {
        Some(refresh_id) => UpdateResult::action(UpdateAction::RefreshHistory {
            refresh_id,
            limit: state.history.limit(),
        }),
        None => UpdateResult::none(),
    }
}

pub(crate) fn handle_activated(state: &mut AppState) -> UpdateResult {
    let refresh_id = state.history.activate();
    refresh_action(state, refresh_id)
}

pub(crate) fn handle_refresh(state: &mut AppState) -> UpdateResult {
    let refresh_id = state.history.refresh();
    refresh_action(state, refresh_id)
}

pub(crate) fn handle_loaded(
    state: &mut AppState,
    refresh_id: RefreshId,
    history: std::result::Result<Vec<HistoryEntry>, DetectError>,
    stats: std::result::Result<SessionStats, DetectError>,
) -> UpdateResult {
    state.history.apply(refresh_id, history, stats);
    UpdateResult::none()
}

pub(crate) fn handle_fetch_health(state: &mut AppState) -> UpdateResult {
    if state.health.load_state == LoadState::Loading {
        debug!("Health check already in flight");
        return UpdateResult::none();
    }
    state.health.load_state = LoadState::Loading;
    UpdateResult::action(UpdateAction::FetchHealth)
}

pub(crate) fn handle_health_loaded(
    state: &mut AppState,
    result: std::result::Result<HealthStatus, DetectError>,
) -> UpdateResult {
    let health = &mut state.health;
    match result {
        Ok(status) => {
            debug!("Service health: {}", status.status);
            health.load_state = LoadState::Ready;
            health.status = Some(status);
            health.error = None;
        }
        Err(e) => {
            warn!("Health check failed: {}", e);
            health.load_state = LoadState::Error;
            health.error = Some(e);
        }
    }
    health.revision += 1;
    UpdateResult::none()
}
