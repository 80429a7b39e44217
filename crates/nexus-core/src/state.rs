//! UI-agnostic message types
//!
//! These types are shared between front ends (the terminal UI, the one-shot
//! CLI commands) and don't depend on any specific UI framework.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Identity of a message within one conversation. Only used for list identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u64);

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn label(&self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Assistant => "AI",
        }
    }
}

/// A chat message. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    text: String,
    sender: Sender,
    timestamp: DateTime<Local>,
}

impl Message {
    pub(crate) fn new(id: MessageId, sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            sender,
            timestamp: Local::now(),
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    /// Hour and minute, e.g. "09:41"
    pub fn display_time(&self) -> String {
        self.timestamp.format("%H:%M").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_time_is_two_digit_hour_and_minute() {
        let msg = Message::new(MessageId(7), Sender::User, "hi");
        let shown = msg.display_time();
        assert_eq!(shown.len(), 5);
        assert_eq!(&shown[2..3], ":");
    }

    #[test]
    fn test_sender_labels() {
        assert_eq!(Sender::User.label(), "You");
        assert_eq!(Sender::Assistant.label(), "AI");
    }
}
