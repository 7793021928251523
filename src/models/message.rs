use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Assistant,
    Patient,
}

/// One entry in the chat transcript. The transcript is append-only:
/// messages are never mutated or removed once added.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub speaker: Speaker,
    pub text: String,
}

impl ChatMessage {
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            speaker: Speaker::Assistant,
            text: text.into(),
        }
    }

    pub fn patient(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            speaker: Speaker::Patient,
            text: text.into(),
        }
    }
}
