// Wire envelopes for the push channel, one closed enum per direction

use serde::{Deserialize, Serialize};

use crate::models::{Message, MessageDraft, MessageId};

/// Server-to-client notifications, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushEvent {
    NewMessage { data: Message },
    UpdateMessage { data: Message },
    PinMessage { id: MessageId },
    HistoryUpdated,
}

impl PushEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            PushEvent::NewMessage { .. } => "new_message",
            PushEvent::UpdateMessage { .. } => "update_message",
            PushEvent::PinMessage { .. } => "pin_message",
            PushEvent::HistoryUpdated => "history_updated",
        }
    }
}

/// Client-to-server commands. Content-bearing commands nest their payload
/// under `data`; event commands carry their fields flat next to `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    NewMessage { data: MessageDraft },
    ToggleFavorite { id: MessageId },
    PinMessage { id: MessageId },
}

pub fn decode_push(text: &str) -> Result<PushEvent, serde_json::Error> {
    serde_json::from_str(text)
}

pub fn encode_command(command: &Command) -> Result<String, serde_json::Error> {
    serde_json::to_string(command)
}
