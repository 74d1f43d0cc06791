//! Command runner - drives the engine for one CLI command
//!
//! Each command sends its intent to the [`Engine`], then processes completion
//! messages until the relevant view settles, forwarding engine events to a
//! [`Reporter`] as they are broadcast.

use std::path::Path;

use tokio::sync::broadcast::{self, error::TryRecvError};
use truthlens_app::config::{init_config_dir, load_settings};
use truthlens_app::{AppState, Engine, EngineEvent, Message, UploadPhase};
use truthlens_core::prelude::*;
use truthlens_core::{LoadState, SelectedFile};
use truthlens_transport::TransportClient;

use crate::cli::Command;
use crate::signals::spawn_signal_handler;
use crate::Reporter;

/// Run one command against the configured service.
///
/// Returns whether the command succeeded; a failed detection or an
/// unavailable history/health read is `Ok(false)`, not an error.
pub async fn run<R: Reporter>(
    command: Command,
    config_dir: &Path,
    reporter: &mut R,
) -> Result<bool> {
    if command == Command::Init {
        let path = init_config_dir(config_dir)?;
        reporter.config_written(&path)?;
        return Ok(true);
    }

    let mut settings = load_settings(config_dir);
    if let Command::History { limit: Some(limit) } = &command {
        settings.history.limit = *limit;
    }

    info!("═══════════════════════════════════════════════════════");
    info!("Command: {:?}", command);
    info!("Config dir: {}", config_dir.display());
    info!("═══════════════════════════════════════════════════════");

    let mut engine = Engine::from_settings(&settings)?;
    spawn_signal_handler(engine.msg_sender());

    let outcome = match command {
        Command::Detect { path } => detect(&mut engine, &path, reporter).await,
        Command::History { .. } => history(&mut engine, reporter).await,
        Command::Health => health(&mut engine, reporter).await,
        Command::Init => Ok(true),
    };

    engine.shutdown();
    outcome
}

/// Select and submit `path`, reporting progress and the verdict.
pub async fn detect<T, R>(engine: &mut Engine<T>, path: &Path, reporter: &mut R) -> Result<bool>
where
    T: TransportClient + Sync + 'static,
    R: Reporter,
{
    let file = match SelectedFile::from_path(path) {
        Ok(file) => file,
        Err(e) => {
            warn!("Cannot select {}: {}", path.display(), e);
            reporter.error(&format!("Cannot read {}: {}", path.display(), e))?;
            return Ok(false);
        }
    };

    let mut events = engine.subscribe();

    engine.process_message(Message::SelectFile(file));
    forward_events(&mut events, &engine.state, reporter)?;
    if let (Some(warning), Some(file)) = (
        engine.state.upload.mime_warning(),
        engine.state.upload.state().file(),
    ) {
        reporter.mime_warning(file, warning)?;
    }

    engine.process_message(Message::Submit);
    pump(engine, &mut events, reporter, |state| {
        state.upload.state().is_in_flight()
    })
    .await?;

    if engine.should_quit() {
        reporter.error("Cancelled")?;
        return Ok(false);
    }
    Ok(engine.state.upload.phase() == UploadPhase::Completed)
}

/// Refresh the history view and report it once both reads settle.
pub async fn history<T, R>(engine: &mut Engine<T>, reporter: &mut R) -> Result<bool>
where
    T: TransportClient + Sync + 'static,
    R: Reporter,
{
    let mut events = engine.subscribe();

    engine.process_message(Message::HistoryActivated);
    pump(engine, &mut events, reporter, |state| {
        state.history.is_refreshing()
    })
    .await?;

    reporter.history(&engine.state.history)?;
    Ok(engine.state.history.load_state() == LoadState::Ready)
}

/// Fetch and report the service health.
pub async fn health<T, R>(engine: &mut Engine<T>, reporter: &mut R) -> Result<bool>
where
    T: TransportClient + Sync + 'static,
    R: Reporter,
{
    let mut events = engine.subscribe();

    engine.process_message(Message::FetchHealth);
    pump(engine, &mut events, reporter, |state| {
        state.health.load_state == LoadState::Loading
    })
    .await?;

    reporter.health(&engine.state.health)?;
    Ok(engine.state.health.load_state == LoadState::Ready)
}

/// Process incoming messages while `pending` holds and no quit was requested.
async fn pump<T, R, F>(
    engine: &mut Engine<T>,
    events: &mut broadcast::Receiver<EngineEvent>,
    reporter: &mut R,
    pending: F,
) -> Result<()>
where
    T: TransportClient + Sync + 'static,
    R: Reporter,
    F: Fn(&AppState) -> bool,
{
    forward_events(events, &engine.state, reporter)?;

    while pending(&engine.state) && !engine.should_quit() {
        let Some(msg) = engine.msg_rx.recv().await else {
            warn!("Message channel closed");
            break;
        };
        engine.process_message(msg);
        forward_events(events, &engine.state, reporter)?;
    }

    Ok(())
}

/// Hand every queued engine event to the reporter.
fn forward_events<R: Reporter>(
    events: &mut broadcast::Receiver<EngineEvent>,
    state: &AppState,
    reporter: &mut R,
) -> Result<()> {
    loop {
        match events.try_recv() {
            Ok(event) => {
                trace!("Forwarding {}", event.event_type());
                reporter.engine_event(&event, state)?;
            }
            Err(TryRecvError::Lagged(skipped)) => {
                warn!("Reporter lagged behind, {} events dropped", skipped);
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use std::path::PathBuf;

    use tempfile::TempDir;
    use truthlens_app::SessionConfig;
    use truthlens_core::{DetectError, HealthStatus, VerdictCode};
    use truthlens_transport::test_utils::{
        test_entry, test_result, test_stats, FakeTransport, TransportCall,
    };

    use crate::headless::HeadlessReporter;
    use crate::render::HumanReporter;

    fn write_clip(dir: &TempDir, name: &str, bytes: usize) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&vec![0u8; bytes]).unwrap();
        path
    }

    fn headless_events(reporter: HeadlessReporter<Vec<u8>>) -> Vec<String> {
        String::from_utf8(reporter.into_inner())
            .unwrap()
            .lines()
            .map(|line| {
                let value: serde_json::Value = serde_json::from_str(line).unwrap();
                value["event"].as_str().unwrap().to_string()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_detect_success_reports_verdict() {
        let dir = TempDir::new().unwrap();
        let path = write_clip(&dir, "clip.mp4", 2048);
        let transport = FakeTransport::new()
            .with_progress(&[50, 100])
            .with_submit_result(Ok(test_result("clip.mp4", VerdictCode::Fake)));
        let mut engine = Engine::new(transport.clone(), SessionConfig::default());
        let mut reporter = HeadlessReporter::new(Vec::new());

        let ok = detect(&mut engine, &path, &mut reporter).await.unwrap();

        assert!(ok);
        assert_eq!(
            transport.calls(),
            vec![TransportCall::Submit {
                name: "clip.mp4".to_string()
            }]
        );
        let events = headless_events(reporter);
        assert_eq!(events.first().map(String::as_str), Some("file_selected"));
        assert_eq!(
            events.last().map(String::as_str),
            Some("detection_completed")
        );
        assert!(events.iter().any(|e| e == "upload_progress"));
    }

    #[tokio::test]
    async fn test_detect_server_error_fails() {
        let dir = TempDir::new().unwrap();
        let path = write_clip(&dir, "clip.mp4", 16);
        let transport = FakeTransport::new()
            .with_submit_result(Err(DetectError::server(500, "Model crashed")));
        let mut engine = Engine::new(transport, SessionConfig::default());
        let mut reporter = HumanReporter::new(Vec::new());

        let ok = detect(&mut engine, &path, &mut reporter).await.unwrap();

        assert!(!ok);
        let out = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(out.contains("Error: Server error 500: Model crashed\n"));
    }

    #[tokio::test]
    async fn test_detect_oversized_file_never_calls_transport() {
        let dir = TempDir::new().unwrap();
        let path = write_clip(&dir, "big.mp4", 2 * 1024 * 1024 + 1);
        let transport = FakeTransport::new();
        let config = SessionConfig {
            max_size_mb: 2,
            ..SessionConfig::default()
        };
        let mut engine = Engine::new(transport.clone(), config);
        let mut reporter = HumanReporter::new(Vec::new());

        let ok = detect(&mut engine, &path, &mut reporter).await.unwrap();

        assert!(!ok);
        assert_eq!(transport.submit_count(), 0);
        let out = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(out, "Error: File too large. Maximum size is 2 MB.\n");
    }

    #[tokio::test]
    async fn test_detect_missing_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let transport = FakeTransport::new();
        let mut engine = Engine::new(transport.clone(), SessionConfig::default());
        let mut reporter = HeadlessReporter::new(Vec::new());

        let ok = detect(&mut engine, &dir.path().join("nope.mp4"), &mut reporter)
            .await
            .unwrap();

        assert!(!ok);
        assert_eq!(transport.submit_count(), 0);
        assert_eq!(headless_events(reporter), vec!["error"]);
    }

    #[tokio::test]
    async fn test_detect_warns_on_unlisted_mime_type() {
        let dir = TempDir::new().unwrap();
        let path = write_clip(&dir, "still.png", 16);
        let transport = FakeTransport::new()
            .with_submit_result(Ok(test_result("still.png", VerdictCode::NoFaces)));
        let mut engine = Engine::new(transport, SessionConfig::default());
        let mut reporter = HeadlessReporter::new(Vec::new());

        let ok = detect(&mut engine, &path, &mut reporter).await.unwrap();

        assert!(ok);
        let events = headless_events(reporter);
        assert_eq!(events[0], "file_selected");
        assert_eq!(events[1], "phase_changed");
        assert_eq!(events[2], "mime_warning");
    }

    #[tokio::test]
    async fn test_history_partial_failure_reports_entries() {
        let transport = FakeTransport::new()
            .with_history(Ok(vec![test_entry("a.mp4", VerdictCode::Authentic)]))
            .with_stats(Err(DetectError::network("reset")));
        let mut engine = Engine::new(transport.clone(), SessionConfig::default());
        let mut reporter = HeadlessReporter::new(Vec::new());

        let ok = history(&mut engine, &mut reporter).await.unwrap();

        assert!(!ok);
        assert_eq!(
            headless_events(reporter),
            vec!["history_failed", "history_entry"]
        );
        assert!(transport
            .calls()
            .contains(&TransportCall::History { limit: 10 }));
    }

    #[tokio::test]
    async fn test_history_success() {
        let transport = FakeTransport::new()
            .with_history(Ok(vec![test_entry("a.mp4", VerdictCode::Fake)]))
            .with_stats(Ok(test_stats(&[(VerdictCode::Fake, 1)], 1.5)));
        let mut engine = Engine::new(transport, SessionConfig::default());
        let mut reporter = HumanReporter::new(Vec::new());

        let ok = history(&mut engine, &mut reporter).await.unwrap();

        assert!(ok);
        let out = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(out.starts_with("Recent detections (1)\n"));
        assert!(out.contains("Session stats\n"));
    }

    #[tokio::test]
    async fn test_health_reports_status() {
        let transport = FakeTransport::new().with_health(Ok(HealthStatus {
            status: "healthy".to_string(),
            ..Default::default()
        }));
        let mut engine = Engine::new(transport, SessionConfig::default());
        let mut reporter = HumanReporter::new(Vec::new());

        let ok = health(&mut engine, &mut reporter).await.unwrap();

        assert!(ok);
        let out = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(out, "Service: healthy\n");
    }

    #[tokio::test]
    async fn test_init_writes_config() {
        let dir = TempDir::new().unwrap();
        let mut reporter = HumanReporter::new(Vec::new());

        let ok = run(Command::Init, dir.path(), &mut reporter).await.unwrap();

        assert!(ok);
        assert!(dir.path().join(".truthlens").join("config.toml").exists());
        let out = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(out.starts_with("Config file: "));
    }
}
