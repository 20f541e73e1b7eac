//! On-screen elements the controller drives.
//!
//! Each element is optional; the layout config decides which ones exist and
//! every operation that touches one checks for it first.

use ratatui::layout::Rect;

use crate::config::Layout;
use crate::state::Sender;

/// A message as it appears in the transcript, built once when added
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMessage {
    pub body: String,
    pub time: String,
    pub sender: Sender,
    pub is_error: bool,
}

#[derive(Debug, Default)]
pub struct TranscriptView {
    pub messages: Vec<RenderedMessage>,
    pub scroll: u16,
    /// Stick to the newest entry until the user scrolls away
    pub follow: bool,
    // Inner size from the last render, for scroll math
    pub width: u16,
    pub height: u16,
    pub area: Option<Rect>,
}

#[derive(Debug)]
pub struct InputBox {
    /// Cursor position in chars, not bytes
    pub cursor: usize,
    /// Content rows, excluding borders
    pub rows: u16,
    pub width: u16,
}

impl Default for InputBox {
    fn default() -> Self {
        Self {
            cursor: 0,
            rows: 1,
            width: 0,
        }
    }
}

#[derive(Debug, Default)]
pub struct SendButton {
    pub disabled: bool,
    pub area: Option<Rect>,
}

#[derive(Debug, Default)]
pub struct LoadingIndicator {
    pub visible: bool,
    pub frame: u8,
}

#[derive(Debug, Default)]
pub struct Elements {
    pub chat_container: Option<TranscriptView>,
    pub message_input: Option<InputBox>,
    pub send_button: Option<SendButton>,
    pub loading_indicator: Option<LoadingIndicator>,
}

impl Elements {
    pub fn from_layout(layout: &Layout) -> Self {
        Self {
            chat_container: layout.transcript.then(|| TranscriptView {
                follow: true,
                ..TranscriptView::default()
            }),
            message_input: layout.input.then(InputBox::default),
            send_button: layout.send_button.then(SendButton::default),
            loading_indicator: layout.loading_indicator.then(LoadingIndicator::default),
        }
    }
}

pub fn contains(area: Option<Rect>, column: u16, row: u16) -> bool {
    area.is_some_and(|a| {
        column >= a.x && column < a.x + a.width && row >= a.y && row < a.y + a.height
    })
}
