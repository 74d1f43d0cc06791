//! Action handlers: UpdateAction dispatch and background task spawning

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use truthlens_transport::TransportClient;

use crate::message::Message;
use crate::UpdateAction;

mod history;
mod upload;

/// Handle of the single upload task that may be in flight.
pub type UploadTaskSlot = Option<JoinHandle<()>>;

/// Execute an action by spawning a background task
pub fn handle_action<T>(
    action: UpdateAction,
    msg_tx: mpsc::Sender<Message>,
    transport: &Arc<T>,
    upload_task: &mut UploadTaskSlot,
) where
    T: TransportClient + Sync + 'static,
{
    match action {
        UpdateAction::SubmitUpload { generation, file } => {
            if let Some(previous) = upload_task.take() {
                if !previous.is_finished() {
                    warn!("Upload task still running at new submission, aborting it");
                    previous.abort();
                }
            }
            *upload_task = Some(upload::spawn_submit(
                transport.clone(),
                generation,
                file,
                msg_tx,
            ));
        }

        UpdateAction::CancelUpload => {
            if let Some(task) = upload_task.take() {
                debug!("Aborting in-flight upload");
                task.abort();
            }
        }

        UpdateAction::RefreshHistory { refresh_id, limit } => {
            history::spawn_history_refresh(transport.clone(), refresh_id, limit, msg_tx);
        }

        UpdateAction::FetchHealth => {
            history::spawn_health_check(transport.clone(), msg_tx);
        }
    }
}
