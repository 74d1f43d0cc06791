//! History, stats and health reads
//!
//! The reads run in an inner task so a task that dies still reports back;
//! the view never stays `Loading` waiting for a message that cannot come.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinError;
use tracing::{debug, warn};
use truthlens_core::DetectError;
use truthlens_transport::TransportClient;

use crate::history_view::RefreshId;
use crate::message::Message;

/// Fetch history and stats concurrently; report both in one message.
pub(super) fn spawn_history_refresh<T>(
    transport: Arc<T>,
    refresh_id: RefreshId,
    limit: usize,
    msg_tx: mpsc::Sender<Message>,
) where
    T: TransportClient + Sync + 'static,
{
    tokio::spawn(async move {
        let reads = tokio::spawn(async move {
            tokio::join!(transport.fetch_history(limit), transport.fetch_stats())
        });

        let (history, stats) = match reads.await {
            Ok(results) => results,
            Err(e) => {
                let error = task_failure("History refresh", e);
                (Err(error.clone()), Err(error))
            }
        };

        let message = Message::HistoryLoaded {
            refresh_id,
            history,
            stats,
        };
        if msg_tx.send(message).await.is_err() {
            debug!("Message channel closed before history refresh {} finished", refresh_id);
        }
    });
}

pub(super) fn spawn_health_check<T>(transport: Arc<T>, msg_tx: mpsc::Sender<Message>)
where
    T: TransportClient + Sync + 'static,
{
    tokio::spawn(async move {
        let read = tokio::spawn(async move { transport.fetch_health().await });
        let result = read
            .await
            .unwrap_or_else(|e| Err(task_failure("Health check", e)));
        let _ = msg_tx.send(Message::HealthLoaded(result)).await;
    });
}

fn task_failure(what: &str, e: JoinError) -> DetectError {
    warn!("{} task ended abnormally: {}", what, e);
    DetectError::local(format!("{} failed unexpectedly", what))
}

#[cfg(test)]
mod tests {
    use super::*;
    use truthlens_core::{
        DetectionResult, HealthStatus, HistoryEntry, LoadState, SelectedFile, SessionStats,
        VerdictCode,
    };
    use truthlens_transport::test_utils::{test_entry, FakeTransport, TransportCall};
    use truthlens_transport::ProgressReporter;

    use crate::handler::update::update;
    use crate::state::AppState;
    use crate::UpdateAction;

    #[tokio::test]
    async fn test_refresh_issues_both_reads() {
        let transport = Arc::new(
            FakeTransport::new()
                .with_history(Ok(vec![test_entry("a.mp4", VerdictCode::Fake)]))
                .with_stats(Err(DetectError::network("down"))),
        );
        let (tx, mut rx) = mpsc::channel(4);

        spawn_history_refresh(transport.clone(), 4, 20, tx);

        match rx.recv().await {
            Some(Message::HistoryLoaded {
                refresh_id,
                history,
                stats,
            }) => {
                assert_eq!(refresh_id, 4);
                assert_eq!(history.unwrap().len(), 1);
                assert!(stats.is_err());
            }
            other => panic!("expected HistoryLoaded, got {:?}", other),
        }

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls.contains(&TransportCall::History { limit: 20 }));
        assert!(calls.contains(&TransportCall::Stats));
    }

    /// Serves history but panics while reading stats.
    struct BrokenStats;

    impl TransportClient for BrokenStats {
        async fn submit_file(
            &self,
            _file: &SelectedFile,
            _progress: ProgressReporter,
        ) -> Result<DetectionResult, DetectError> {
            Err(DetectError::local("unused"))
        }

        async fn fetch_history(&self, _limit: usize) -> Result<Vec<HistoryEntry>, DetectError> {
            Ok(vec![test_entry("a.mp4", VerdictCode::Fake)])
        }

        async fn fetch_stats(&self) -> Result<SessionStats, DetectError> {
            panic!("stats decoder blew up")
        }

        async fn fetch_health(&self) -> Result<HealthStatus, DetectError> {
            panic!("health decoder blew up")
        }
    }

    #[tokio::test]
    async fn test_refresh_reports_back_when_reads_panic() {
        let (tx, mut rx) = mpsc::channel(4);

        spawn_history_refresh(Arc::new(BrokenStats), 9, 10, tx);

        match rx.recv().await {
            Some(Message::HistoryLoaded {
                refresh_id,
                history,
                stats,
            }) => {
                assert_eq!(refresh_id, 9);
                assert!(matches!(history, Err(DetectError::Local { .. })));
                assert!(matches!(stats, Err(DetectError::Local { .. })));
            }
            other => panic!("expected HistoryLoaded, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_panicking_refresh_leaves_view_in_error() {
        let mut state = AppState::default();
        let (tx, mut rx) = mpsc::channel(4);

        let result = update(&mut state, Message::HistoryActivated);
        let Some(UpdateAction::RefreshHistory { refresh_id, limit }) = result.action else {
            panic!("expected RefreshHistory, got {:?}", result.action);
        };
        spawn_history_refresh(Arc::new(BrokenStats), refresh_id, limit, tx);

        let loaded = rx.recv().await.expect("no HistoryLoaded");
        update(&mut state, loaded);

        assert_eq!(state.history.load_state(), LoadState::Error);
        assert!(!state.history.is_refreshing());
        let again = update(&mut state, Message::RefreshHistory);
        assert!(matches!(
            again.action,
            Some(UpdateAction::RefreshHistory { .. })
        ));
    }

    #[tokio::test]
    async fn test_health_check_reports_back_when_read_panics() {
        let (tx, mut rx) = mpsc::channel(4);

        spawn_health_check(Arc::new(BrokenStats), tx);

        assert!(matches!(
            rx.recv().await,
            Some(Message::HealthLoaded(Err(DetectError::Local { .. })))
        ));
    }

    #[tokio::test]
    async fn test_health_check_reports_result() {
        let transport = Arc::new(FakeTransport::new());
        let (tx, mut rx) = mpsc::channel(4);

        spawn_health_check(transport, tx);

        assert!(matches!(
            rx.recv().await,
            Some(Message::HealthLoaded(Ok(_)))
        ));
    }
}
