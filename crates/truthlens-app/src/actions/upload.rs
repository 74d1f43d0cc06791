//! Upload task: one transport call per submission.
//!
//! Progress is forwarded as it arrives; the terminal message is sent only
//! after every queued progress value, so the session sees reports in order
//! followed by the completion.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use truthlens_core::SelectedFile;
use truthlens_transport::{ProgressReceiver, ProgressReporter, TransportClient};

use crate::message::Message;

/// Spawn the upload of `file`, tagging every message with `generation`.
pub(super) fn spawn_submit<T>(
    transport: Arc<T>,
    generation: u64,
    file: SelectedFile,
    msg_tx: mpsc::Sender<Message>,
) -> JoinHandle<()>
where
    T: TransportClient + Sync + 'static,
{
    tokio::spawn(async move {
        info!(
            "Submitting {} ({} bytes, generation {})",
            file.name, file.size_bytes, generation
        );

        let (reporter, mut progress_rx) = ProgressReporter::channel();
        let submission = transport.submit_file(&file, reporter);
        tokio::pin!(submission);

        let outcome = loop {
            tokio::select! {
                biased;
                Some(percent) = progress_rx.recv() => {
                    if !forward_progress(&msg_tx, generation, percent).await {
                        return;
                    }
                }
                outcome = &mut submission => break outcome,
            }
        };

        if !flush_progress(&mut progress_rx, &msg_tx, generation).await {
            return;
        }

        let message = match outcome {
            Ok(result) => Message::UploadCompleted { generation, result },
            Err(error) => Message::UploadFailed { generation, error },
        };
        if msg_tx.send(message).await.is_err() {
            debug!("Message channel closed before upload {} finished", generation);
        }
    })
}

async fn forward_progress(msg_tx: &mpsc::Sender<Message>, generation: u64, percent: u8) -> bool {
    msg_tx
        .send(Message::UploadProgress {
            generation,
            percent,
        })
        .await
        .is_ok()
}

/// Forward progress still queued after the transport call returned.
async fn flush_progress(
    progress_rx: &mut ProgressReceiver,
    msg_tx: &mpsc::Sender<Message>,
    generation: u64,
) -> bool {
    while let Ok(percent) = progress_rx.try_recv() {
        if !forward_progress(msg_tx, generation, percent).await {
            return false;
        }
    }
    true
}
