//! Engine - orchestration state shared by every frontend
//!
//! The Engine owns the TEA state, the message channel, the transport and the
//! handle of the in-flight upload task. Frontends feed it messages, drive
//! [`Engine::run_until`] and render from [`EngineEvent`]s and `state`.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};
use truthlens_core::{classify, LoadState, Result};
use truthlens_transport::{HttpTransport, TransportClient};

use crate::actions::UploadTaskSlot;
use crate::config::{self, SessionConfig, Settings};
use crate::engine_event::EngineEvent;
use crate::message::Message;
use crate::process;
use crate::state::AppState;
use crate::upload_session::UploadPhase;

/// Lightweight snapshot of state for change detection.
///
/// Captured before message processing, compared after to detect
/// what changed and emit appropriate EngineEvents. Upload phase changes come
/// from the session's own transition log so pass-through phases are not lost.
#[derive(Debug, Clone, PartialEq)]
struct StateSnapshot {
    progress: Option<u8>,
    history_revision: u64,
    history_load_state: LoadState,
    health_revision: u64,
}

impl StateSnapshot {
    fn capture(state: &AppState) -> Self {
        Self {
            progress: state.upload.state().progress(),
            history_revision: state.history.revision(),
            history_load_state: state.history.load_state(),
            health_revision: state.health.revision,
        }
    }
}

/// Orchestration engine for TruthLens.
///
/// Generic over the transport so tests can drive it with a scripted client.
pub struct Engine<T> {
    /// TEA application state (the Model)
    pub state: AppState,

    /// Sender half of the unified message channel.
    pub msg_tx: mpsc::Sender<Message>,

    /// Receiver half of the unified message channel.
    pub msg_rx: mpsc::Receiver<Message>,

    transport: Arc<T>,

    /// At most one upload task; aborted on reset.
    upload_task: UploadTaskSlot,

    /// Event broadcaster for external consumers.
    event_tx: broadcast::Sender<EngineEvent>,
}

impl Engine<HttpTransport> {
    /// Build an engine talking HTTP to the configured service.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let url = config::service_url(settings)?;
        let transport = HttpTransport::new(url.as_str(), settings.service.timeout())?;
        info!("Using detection service at {}", transport.base_url());
        Ok(Self::new(transport, settings.session_config()))
    }
}

impl<T> Engine<T>
where
    T: TransportClient + Sync + 'static,
{
    /// Create an engine with a fresh state.
    ///
    /// Message channel and event broadcast both have capacity 256.
    pub fn new(transport: T, config: SessionConfig) -> Self {
        Self::with_shared_transport(Arc::new(transport), config)
    }

    pub fn with_shared_transport(transport: Arc<T>, config: SessionConfig) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel::<Message>(256);
        let (event_tx, _) = broadcast::channel(256);

        Self {
            state: AppState::new(config),
            msg_tx,
            msg_rx,
            transport,
            upload_task: None,
            event_tx,
        }
    }

    /// Subscribe to engine events.
    ///
    /// If the subscriber falls behind (buffer full), older events are
    /// dropped. Use `broadcast::error::RecvError::Lagged` to detect this.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_tx.subscribe()
    }

    /// Process a single message through the TEA update cycle and emit the
    /// events its state changes imply.
    pub fn process_message(&mut self, msg: Message) {
        let pre = StateSnapshot::capture(&self.state);

        process::process_message(
            &mut self.state,
            msg,
            &self.msg_tx,
            &self.transport,
            &mut self.upload_task,
        );

        let post = StateSnapshot::capture(&self.state);
        self.emit_events(&pre, &post);
    }

    /// Drain and process all pending messages from the channel.
    ///
    /// Returns the number of messages processed.
    pub fn drain_pending_messages(&mut self) -> usize {
        let mut count = 0;
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.process_message(msg);
            count += 1;
        }
        count
    }

    /// Process messages as they arrive until `done` holds for the state.
    pub async fn run_until<F>(&mut self, done: F)
    where
        F: Fn(&AppState) -> bool,
    {
        while !done(&self.state) {
            match self.msg_rx.recv().await {
                Some(msg) => self.process_message(msg),
                None => break,
            }
        }
    }

    /// Get a clone of the message sender for input sources.
    pub fn msg_sender(&self) -> mpsc::Sender<Message> {
        self.msg_tx.clone()
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Check if the application should quit.
    pub fn should_quit(&self) -> bool {
        self.state.should_quit()
    }

    /// Whether an upload task is still running.
    pub fn has_upload_task(&self) -> bool {
        self.upload_task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Abort background work and notify subscribers.
    pub fn shutdown(&mut self) {
        self.emit(EngineEvent::Shutdown);
        if let Some(task) = self.upload_task.take() {
            task.abort();
        }
        info!("Engine shut down");
    }

    /// Emit EngineEvents based on state changes after processing.
    fn emit_events(&mut self, pre: &StateSnapshot, post: &StateSnapshot) {
        let transitions = self.state.upload.take_transitions();
        let final_phase = self.state.upload.phase();

        for transition in &transitions {
            // Leaving Uploading means the body went out in full.
            if transition.from == UploadPhase::Uploading && transition.to == UploadPhase::Analyzing {
                self.emit(EngineEvent::UploadProgress { percent: 100 });
            }
            self.emit(EngineEvent::UploadPhaseChanged {
                from: transition.from,
                to: transition.to,
            });
        }

        if transitions.last().map(|t| t.to) == Some(final_phase) {
            match final_phase {
                UploadPhase::Completed => {
                    if let Some(result) = self.state.upload.state().result() {
                        self.emit(EngineEvent::DetectionCompleted {
                            descriptor: classify(&result.verdict),
                            result: result.clone(),
                        });
                    }
                }
                UploadPhase::Failed => {
                    if let Some(error) = self.state.upload.state().error() {
                        self.emit(EngineEvent::DetectionFailed {
                            error: error.clone(),
                        });
                    }
                }
                _ => {}
            }
        }

        if let Some(percent) = post.progress {
            if pre.progress != post.progress {
                self.emit(EngineEvent::UploadProgress { percent });
            }
        }

        if pre.history_revision != post.history_revision
            || pre.history_load_state != post.history_load_state
        {
            self.emit(EngineEvent::HistoryUpdated {
                load_state: post.history_load_state,
                entry_count: self.state.history.entries().len(),
                error: self.state.history.last_error().cloned(),
            });
        }

        if pre.health_revision != post.health_revision {
            self.emit(EngineEvent::HealthUpdated {
                load_state: self.state.health.load_state,
                healthy: self.state.health.status.as_ref().map(|s| s.is_healthy()),
            });
        }
    }

    /// Emit a single EngineEvent to all subscribers.
    ///
    /// send() returns Err only if there are no receivers.
    fn emit(&self, event: EngineEvent) {
        debug!("Engine event: {}", event.event_type());
        let _ = self.event_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::broadcast::error::TryRecvError;
    use truthlens_core::{DetectError, SelectedFile, VerdictCode, BYTES_PER_MB};
    use truthlens_transport::test_utils::{test_entry, test_result, test_stats, FakeTransport};

    fn clip(size_mb: u64) -> SelectedFile {
        SelectedFile::new("/videos/clip.mp4", "clip.mp4", size_mb * BYTES_PER_MB, "video/mp4")
    }

    fn engine(transport: FakeTransport) -> Engine<FakeTransport> {
        Engine::new(transport, SessionConfig::default())
    }

    fn drain(rx: &mut broadcast::Receiver<EngineEvent>) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        events
    }

    fn settled(state: &AppState) -> bool {
        matches!(
            state.upload.phase(),
            UploadPhase::Completed | UploadPhase::Failed
        )
    }

    #[tokio::test]
    async fn test_successful_detection_emits_ordered_events() {
        let mut engine = engine(
            FakeTransport::new()
                .with_progress(&[0, 45, 100])
                .with_submit_result(Ok(test_result("clip.mp4", VerdictCode::Fake))),
        );
        let mut events = engine.subscribe();

        engine.process_message(Message::SelectFile(clip(10)));
        engine.process_message(Message::Submit);
        engine.run_until(settled).await;

        let events = drain(&mut events);
        let phases: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                EngineEvent::UploadPhaseChanged { to, .. } => Some(*to),
                _ => None,
            })
            .collect();
        assert_eq!(
            phases,
            vec![
                UploadPhase::FileSelected,
                UploadPhase::Uploading,
                UploadPhase::Analyzing,
                UploadPhase::Completed
            ]
        );

        let progress: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                EngineEvent::UploadProgress { percent } => Some(*percent),
                _ => None,
            })
            .collect();
        assert_eq!(progress, vec![0, 45, 100]);

        match events.last() {
            Some(EngineEvent::DetectionCompleted { result, descriptor }) => {
                assert_eq!(result.verdict, VerdictCode::Fake);
                assert_eq!(descriptor.emoji, "❌");
                assert_eq!(descriptor.color, "#e74c3c");
                assert_eq!(descriptor.label, "Deepfake Detected");
            }
            other => panic!("expected DetectionCompleted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_early_completion_still_reports_full_progress() {
        let mut engine = engine(
            FakeTransport::new()
                .with_progress(&[30])
                .with_submit_result(Ok(test_result("clip.mp4", VerdictCode::Authentic))),
        );
        let mut events = engine.subscribe();

        engine.process_message(Message::SelectFile(clip(10)));
        engine.process_message(Message::Submit);
        engine.run_until(settled).await;

        let events = drain(&mut events);
        let full = events
            .iter()
            .position(|e| matches!(e, EngineEvent::UploadProgress { percent: 100 }))
            .expect("no 100% progress event");
        let analyzing = events
            .iter()
            .position(|e| {
                matches!(
                    e,
                    EngineEvent::UploadPhaseChanged {
                        to: UploadPhase::Analyzing,
                        ..
                    }
                )
            })
            .expect("never analyzing");
        assert!(full < analyzing);
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, EngineEvent::UploadProgress { percent: 100 }))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_server_error_emits_failure() {
        let mut engine = engine(FakeTransport::new().with_submit_result(Err(
            DetectError::server(500, r#"{"detail":"model unavailable"}"#),
        )));
        let mut events = engine.subscribe();

        engine.process_message(Message::SelectFile(clip(10)));
        engine.process_message(Message::Submit);
        engine.run_until(settled).await;

        let events = drain(&mut events);
        match events.last() {
            Some(EngineEvent::DetectionFailed { error }) => {
                assert_eq!(
                    error.user_message(),
                    "Server error 500: {detail: model unavailable}"
                );
            }
            other => panic!("expected DetectionFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_validation_failure_never_reaches_transport() {
        let transport = FakeTransport::new();
        let mut engine = engine(transport.clone());
        let mut events = engine.subscribe();

        engine.process_message(Message::SelectFile(clip(150)));
        engine.process_message(Message::Submit);

        assert_eq!(transport.submit_count(), 0);
        assert!(drain(&mut events).iter().any(|e| matches!(
            e,
            EngineEvent::DetectionFailed {
                error: DetectError::Validation { .. }
            }
        )));
    }

    #[tokio::test]
    async fn test_reset_aborts_upload_and_ignores_late_results() {
        let transport = FakeTransport::new()
            .gated()
            .with_progress(&[30])
            .with_submit_result(Ok(test_result("clip.mp4", VerdictCode::Fake)));
        let mut engine = engine(transport.clone());

        engine.process_message(Message::SelectFile(clip(10)));
        engine.process_message(Message::Submit);
        engine
            .run_until(|s| s.upload.state().progress() == Some(30))
            .await;
        assert!(engine.has_upload_task());

        engine.process_message(Message::Reset);
        transport.release_submission();
        tokio::time::sleep(Duration::from_millis(20)).await;
        engine.drain_pending_messages();

        assert_eq!(engine.state.upload.phase(), UploadPhase::Idle);
        assert!(!engine.has_upload_task());
    }

    #[tokio::test]
    async fn test_only_one_transport_call_in_flight() {
        let transport = FakeTransport::new()
            .gated()
            .with_submit_result(Ok(test_result("clip.mp4", VerdictCode::Fake)));
        let mut engine = engine(transport.clone());

        engine.process_message(Message::SelectFile(clip(10)));
        engine.process_message(Message::Submit);
        engine.process_message(Message::Submit);
        tokio::task::yield_now().await;
        engine.process_message(Message::Submit);

        transport.release_submission();
        engine.run_until(settled).await;

        assert_eq!(transport.submit_count(), 1);
        assert_eq!(engine.state.upload.phase(), UploadPhase::Completed);
    }

    #[tokio::test]
    async fn test_history_refresh_partial_failure() {
        let transport = FakeTransport::new()
            .with_history(Ok(vec![
                test_entry("b.mp4", VerdictCode::Fake),
                test_entry("a.mp4", VerdictCode::Authentic),
            ]))
            .with_stats(Err(DetectError::network("down")));
        let mut engine = engine(transport);
        let mut events = engine.subscribe();

        engine.process_message(Message::HistoryActivated);
        engine
            .run_until(|s| s.history.load_state() != LoadState::Loading)
            .await;

        assert_eq!(engine.state.history.load_state(), LoadState::Error);
        assert_eq!(engine.state.history.entries().len(), 2);
        assert!(engine.state.history.stats().is_none());

        let updates: Vec<_> = drain(&mut events)
            .into_iter()
            .filter_map(|e| match e {
                EngineEvent::HistoryUpdated { load_state, entry_count, .. } => {
                    Some((load_state, entry_count))
                }
                _ => None,
            })
            .collect();
        assert_eq!(
            updates,
            vec![(LoadState::Loading, 0), (LoadState::Error, 2)]
        );
    }

    #[tokio::test]
    async fn test_history_refresh_success() {
        let stats = test_stats(&[(VerdictCode::Fake, 1)], 3.4);
        let transport = FakeTransport::new()
            .with_history(Ok(vec![test_entry("a.mp4", VerdictCode::Fake)]))
            .with_stats(Ok(stats.clone()));
        let mut engine = engine(transport);

        engine.process_message(Message::RefreshHistory);
        engine
            .run_until(|s| s.history.load_state() == LoadState::Ready)
            .await;

        assert_eq!(engine.state.history.stats(), Some(&stats));
        assert!(engine.state.history.has_stats());
    }

    #[tokio::test]
    async fn test_history_failure_leaves_upload_untouched() {
        let transport = FakeTransport::new()
            .with_history(Err(DetectError::server(500, "boom")))
            .with_stats(Err(DetectError::server(500, "boom")));
        let mut engine = engine(transport);

        engine.process_message(Message::SelectFile(clip(10)));
        engine.process_message(Message::RefreshHistory);
        engine
            .run_until(|s| s.history.load_state() == LoadState::Error)
            .await;

        assert_eq!(engine.state.upload.phase(), UploadPhase::FileSelected);
    }

    #[tokio::test]
    async fn test_health_updated_event() {
        let mut engine = engine(FakeTransport::new());
        let mut events = engine.subscribe();

        engine.process_message(Message::FetchHealth);
        engine
            .run_until(|s| s.health.load_state != LoadState::Loading)
            .await;

        assert!(drain(&mut events).iter().any(|e| matches!(
            e,
            EngineEvent::HealthUpdated {
                load_state: LoadState::Ready,
                ..
            }
        )));
    }

    #[tokio::test]
    async fn test_shutdown_emits_event() {
        let mut engine = engine(FakeTransport::new());
        let mut events = engine.subscribe();

        engine.process_message(Message::Quit);
        assert!(engine.should_quit());
        engine.shutdown();

        assert!(matches!(
            drain(&mut events).last(),
            Some(EngineEvent::Shutdown)
        ));
    }
}
