//! Tests for handler module

use super::*;
use crate::message::Message;
use crate::state::{AppPhase, AppState};
use crate::upload_session::{UploadPhase, UploadState};
use truthlens_core::{
    DetectError, HealthStatus, LoadState, SessionStats, VerdictCode, BYTES_PER_MB,
};
use truthlens_transport::test_utils::{test_entry, test_result, test_stats};

fn clip(size_mb: u64) -> SelectedFile {
    SelectedFile::new("/videos/clip.mp4", "clip.mp4", size_mb * BYTES_PER_MB, "video/mp4")
}

/// Select and submit a 10 MB file, returning the submission generation.
fn submitted(state: &mut AppState) -> u64 {
    update(state, Message::SelectFile(clip(10)));
    match update(state, Message::Submit).action {
        Some(UpdateAction::SubmitUpload { generation, .. }) => generation,
        other => panic!("expected SubmitUpload, got {:?}", other),
    }
}

#[test]
fn test_quit_message_sets_quitting_phase() {
    let mut state = AppState::default();
    assert_ne!(state.phase, AppPhase::Quitting);

    let result = update(&mut state, Message::Quit);

    assert!(state.should_quit());
    assert!(result.action.is_none());
}

#[test]
fn test_quit_during_upload_cancels_it() {
    let mut state = AppState::default();
    submitted(&mut state);

    let result = update(&mut state, Message::Quit);

    assert_eq!(result.action, Some(UpdateAction::CancelUpload));
    assert_eq!(state.upload.phase(), UploadPhase::Idle);
}

#[test]
fn test_submit_returns_upload_action() {
    let mut state = AppState::default();
    update(&mut state, Message::SelectFile(clip(10)));

    let result = update(&mut state, Message::Submit);

    assert_eq!(
        result.action,
        Some(UpdateAction::SubmitUpload {
            generation: 1,
            file: clip(10)
        })
    );
    assert_eq!(state.upload.state().progress(), Some(0));
}

#[test]
fn test_submit_without_file_has_no_action() {
    let mut state = AppState::default();
    let result = update(&mut state, Message::Submit);
    assert!(result.action.is_none());
    assert_eq!(state.upload.phase(), UploadPhase::Idle);
}

#[test]
fn test_double_submit_has_single_action() {
    let mut state = AppState::default();
    submitted(&mut state);
    let result = update(&mut state, Message::Submit);
    assert!(result.action.is_none());
}

#[test]
fn test_oversized_file_is_rejected_before_any_action() {
    let mut state = AppState::default();
    let result = update(&mut state, Message::SelectFile(clip(150)));

    assert!(result.action.is_none());
    assert_eq!(
        state.upload.state().error().map(DetectError::user_message),
        Some("File too large. Maximum size is 100 MB.".to_string())
    );
    assert!(update(&mut state, Message::Submit).action.is_none());
}

#[test]
fn test_full_detection_flow() {
    let mut state = AppState::default();
    let generation = submitted(&mut state);

    for percent in [0, 45, 100] {
        update(&mut state, Message::UploadProgress { generation, percent });
    }
    assert_eq!(state.upload.phase(), UploadPhase::Analyzing);

    let result = test_result("clip.mp4", VerdictCode::Fake);
    update(
        &mut state,
        Message::UploadCompleted {
            generation,
            result: result.clone(),
        },
    );

    assert_eq!(state.upload.state(), &UploadState::Completed(result));
    let descriptor = truthlens_core::classify(&VerdictCode::Fake);
    assert_eq!(descriptor.label, "Deepfake Detected");
}

#[test]
fn test_server_failure_then_dismiss() {
    let mut state = AppState::default();
    let generation = submitted(&mut state);

    update(
        &mut state,
        Message::UploadFailed {
            generation,
            error: DetectError::server(500, r#"{"detail":"model unavailable"}"#),
        },
    );
    assert_eq!(
        state.upload.state().error().unwrap().user_message(),
        "Server error 500: {detail: model unavailable}"
    );

    let result = update(&mut state, Message::DismissError);
    assert!(result.action.is_none());
    assert_eq!(state.upload.phase(), UploadPhase::FileSelected);
}

#[test]
fn test_reset_during_upload_cancels_and_discards_late_callbacks() {
    let mut state = AppState::default();
    let generation = submitted(&mut state);

    let result = update(&mut state, Message::Reset);
    assert_eq!(result.action, Some(UpdateAction::CancelUpload));

    update(&mut state, Message::UploadProgress { generation, percent: 80 });
    update(
        &mut state,
        Message::UploadCompleted {
            generation,
            result: test_result("clip.mp4", VerdictCode::Fake),
        },
    );
    assert_eq!(state.upload.state(), &UploadState::Idle);
}

#[test]
fn test_reset_when_idle_has_no_action() {
    let mut state = AppState::default();
    let result = update(&mut state, Message::Reset);
    assert!(result.action.is_none());
}

#[test]
fn test_history_activation_refreshes_once() {
    let mut state = AppState::default();

    let result = update(&mut state, Message::HistoryActivated);
    assert_eq!(
        result.action,
        Some(UpdateAction::RefreshHistory {
            refresh_id: 1,
            limit: 10
        })
    );

    update(
        &mut state,
        Message::HistoryLoaded {
            refresh_id: 1,
            history: Ok(vec![]),
            stats: Ok(SessionStats::default()),
        },
    );
    assert!(update(&mut state, Message::HistoryActivated).action.is_none());
}

#[test]
fn test_manual_refresh_is_coalesced() {
    let mut state = AppState::default();
    assert!(update(&mut state, Message::RefreshHistory).action.is_some());
    assert!(update(&mut state, Message::RefreshHistory).action.is_none());
}

#[test]
fn test_history_partial_failure() {
    let mut state = AppState::default();
    update(&mut state, Message::RefreshHistory);

    update(
        &mut state,
        Message::HistoryLoaded {
            refresh_id: 1,
            history: Ok(vec![test_entry("a.mp4", VerdictCode::Fake)]),
            stats: Err(DetectError::network("down")),
        },
    );

    assert_eq!(state.history.load_state(), LoadState::Error);
    assert_eq!(state.history.entries().len(), 1);
    assert!(state.history.stats().is_none());
}

#[test]
fn test_history_failure_does_not_affect_upload() {
    let mut state = AppState::default();
    let generation = submitted(&mut state);
    update(&mut state, Message::RefreshHistory);

    update(
        &mut state,
        Message::HistoryLoaded {
            refresh_id: 1,
            history: Err(DetectError::server(500, "boom")),
            stats: Err(DetectError::server(500, "boom")),
        },
    );

    assert_eq!(state.upload.phase(), UploadPhase::Uploading);
    assert_eq!(state.upload.generation(), generation);
}

#[test]
fn test_history_limit_comes_from_config() {
    let config = crate::config::SessionConfig {
        history_limit: 20,
        ..Default::default()
    };
    let mut state = AppState::new(config);
    let result = update(&mut state, Message::RefreshHistory);
    assert!(matches!(
        result.action,
        Some(UpdateAction::RefreshHistory { limit: 20, .. })
    ));
}

#[test]
fn test_health_round_trip() {
    let mut state = AppState::default();

    let result = update(&mut state, Message::FetchHealth);
    assert_eq!(result.action, Some(UpdateAction::FetchHealth));
    assert_eq!(state.health.load_state, LoadState::Loading);
    assert!(update(&mut state, Message::FetchHealth).action.is_none());

    let status = HealthStatus {
        status: "healthy".to_string(),
        ..Default::default()
    };
    update(&mut state, Message::HealthLoaded(Ok(status)));
    assert_eq!(state.health.load_state, LoadState::Ready);
    assert!(state.health.status.as_ref().unwrap().is_healthy());
    assert_eq!(state.health.revision, 1);
}

#[test]
fn test_health_failure_keeps_previous_status() {
    let mut state = AppState::default();
    update(&mut state, Message::FetchHealth);
    update(
        &mut state,
        Message::HealthLoaded(Ok(HealthStatus {
            status: "healthy".to_string(),
            ..Default::default()
        })),
    );

    update(&mut state, Message::FetchHealth);
    update(
        &mut state,
        Message::HealthLoaded(Err(DetectError::network("down"))),
    );

    assert_eq!(state.health.load_state, LoadState::Error);
    assert!(state.health.status.is_some());
    assert!(state.health.error.is_some());
}

#[test]
fn test_stats_pass_through_unchanged() {
    let mut state = AppState::default();
    update(&mut state, Message::RefreshHistory);
    let stats = test_stats(&[(VerdictCode::Fake, 3), (VerdictCode::NoFaces, 1)], 2.25);

    update(
        &mut state,
        Message::HistoryLoaded {
            refresh_id: 1,
            history: Ok(vec![]),
            stats: Ok(stats.clone()),
        },
    );

    assert_eq!(state.history.stats(), Some(&stats));
    assert_eq!(state.history.load_state(), LoadState::Ready);
}
