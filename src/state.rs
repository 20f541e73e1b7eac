//! Conversation state owned by the controller
//!
//! Nothing here knows about the terminal; the history is the record of what
//! was said, independent of whether a transcript pane exists to show it.

use chrono::{DateTime, Local};

/// Who a message came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn label(&self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Bot => "Bot",
        }
    }
}

/// A single entry in the conversation history
#[derive(Debug, Clone)]
pub struct MessageRecord {
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Local>,
    pub is_error: bool,
}

#[derive(Debug, Default)]
pub struct AppState {
    pub is_loading: bool,
    pub current_draft: String,
    history: Vec<MessageRecord>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append-only; records are never reordered or removed
    pub fn push(&mut self, record: MessageRecord) {
        self.history.push(record);
    }

    pub fn history(&self) -> &[MessageRecord] {
        &self.history
    }
}
