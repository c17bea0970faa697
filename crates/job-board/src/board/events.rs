use serde::{Deserialize, Serialize};

use super::attachments::IncomingFile;
use super::domain::UserId;
use super::messenger::MessageRef;

/// One inbound update from the chat transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub sender: UserId,
    #[serde(default)]
    pub username: Option<String>,
    /// Message the tapped button was attached to.
    #[serde(default)]
    pub origin: Option<MessageRef>,
    pub payload: EventPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    Start,
    Menu,
    Callback { data: String },
    Text { text: String },
    File(IncomingFile),
    Unsupported,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::attachments::FileKind;

    #[test]
    fn decodes_tagged_payloads() {
        let event: Event = serde_json::from_value(serde_json::json!({
            "sender": 42,
            "payload": {"type": "file", "file_id": "BQAC", "kind": "document"}
        }))
        .expect("valid event");

        assert_eq!(event.sender, UserId(42));
        assert!(event.origin.is_none());
        assert_eq!(
            event.payload,
            EventPayload::File(IncomingFile {
                file_id: "BQAC".to_string(),
                file_name: None,
                kind: FileKind::Document,
            })
        );

        let callback: EventPayload =
            serde_json::from_value(serde_json::json!({"type": "callback", "data": "employer"}))
                .expect("valid payload");
        assert_eq!(
            callback,
            EventPayload::Callback {
                data: "employer".to_string()
            }
        );
    }
}
