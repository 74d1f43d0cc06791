//! Message processing
//!
//! Runs a message and its follow-ups through the TEA update function and
//! dispatches the resulting actions.

use std::sync::Arc;

use tokio::sync::mpsc;
use truthlens_transport::TransportClient;

use crate::actions::{handle_action, UploadTaskSlot};
use crate::handler;
use crate::message::Message;
use crate::state::AppState;

/// Process a message through the TEA update function
pub fn process_message<T>(
    state: &mut AppState,
    message: Message,
    msg_tx: &mpsc::Sender<Message>,
    transport: &Arc<T>,
    upload_task: &mut UploadTaskSlot,
) where
    T: TransportClient + Sync + 'static,
{
    let mut msg = Some(message);
    while let Some(m) = msg {
        let result = handler::update(state, m);

        if let Some(action) = result.action {
            handle_action(action, msg_tx.clone(), transport, upload_task);
        }

        // Continue with follow-up message
        msg = result.message;
    }
}
