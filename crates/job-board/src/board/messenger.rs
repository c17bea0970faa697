//! Outbound seam to the chat transport.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use super::attachments::MediaKind;
use super::domain::UserId;
use super::keyboards::Keyboard;

/// Conversation a message is delivered to. Private chats share the user's id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl From<UserId> for ChatId {
    fn from(user: UserId) -> Self {
        ChatId(user.0)
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to a delivered message so it can be edited later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub chat: ChatId,
    pub message_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("transport request failed: {0}")]
    Request(String),
    #[error("transport rejected the call: {0}")]
    Rejected(String),
}

/// Operations the board needs from the chat transport.
///
/// Implementations may use `async fn`; the returned futures must be `Send` so
/// handlers can run on the multi-threaded runtime.
pub trait Messenger: Send + Sync {
    fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> impl Future<Output = Result<MessageRef, TransportError>> + Send;

    fn edit_text(
        &self,
        message: MessageRef,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Re-send a previously uploaded file by its transport id.
    fn send_media(
        &self,
        chat: ChatId,
        kind: MediaKind,
        file_id: &str,
        caption: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn download(&self, file_id: &str)
        -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;

    /// Public handle (without `@`) if the user has one.
    fn contact_handle(
        &self,
        user: UserId,
    ) -> impl Future<Output = Result<Option<String>, TransportError>> + Send;
}
