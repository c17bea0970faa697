use job_board::board::{ChatId, Keyboard, MediaKind, MessageRef, Messenger, TransportError, UserId};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Stand-in transport when no bot token is configured: outbound messages are
/// written to the log and files cannot be fetched.
#[derive(Debug, Default)]
pub(crate) struct LogMessenger {
    next_message_id: AtomicI64,
}

impl LogMessenger {
    fn message_ref(&self, chat: ChatId) -> MessageRef {
        MessageRef {
            chat,
            message_id: self.next_message_id.fetch_add(1, Ordering::Relaxed) + 1,
        }
    }
}

impl Messenger for LogMessenger {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageRef, TransportError> {
        let buttons = keyboard.map(|keyboard| keyboard.actions().count()).unwrap_or(0);
        info!(%chat, buttons, text, "outbound message");
        Ok(self.message_ref(chat))
    }

    async fn edit_text(
        &self,
        message: MessageRef,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TransportError> {
        let buttons = keyboard.map(|keyboard| keyboard.actions().count()).unwrap_or(0);
        info!(
            chat = %message.chat,
            message_id = message.message_id,
            buttons,
            text,
            "outbound edit"
        );
        Ok(())
    }

    async fn send_media(
        &self,
        chat: ChatId,
        kind: MediaKind,
        file_id: &str,
        caption: &str,
    ) -> Result<(), TransportError> {
        info!(%chat, ?kind, file_id, caption, "outbound media");
        Ok(())
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>, TransportError> {
        Err(TransportError::Rejected(format!(
            "cannot download {file_id}: no chat transport configured"
        )))
    }

    async fn contact_handle(&self, _user: UserId) -> Result<Option<String>, TransportError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_messenger_hands_out_distinct_message_ids() {
        let messenger = LogMessenger::default();
        let first = messenger
            .send_text(ChatId(1), "hello", None)
            .await
            .expect("logged");
        let second = messenger
            .send_text(ChatId(1), "again", None)
            .await
            .expect("logged");
        assert_ne!(first.message_id, second.message_id);

        assert!(matches!(
            messenger.download("BQAC").await,
            Err(TransportError::Rejected(_))
        ));
    }
}
