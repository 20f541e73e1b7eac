use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::api::{ApiError, ChatApi, ChatResponse};
use crate::config::Config;
use crate::elements::{Elements, RenderedMessage, TranscriptView};
use crate::state::{AppState, MessageRecord, Sender};
use crate::tui::{AppEvent, EventSender};
use crate::ui;
use crate::utils::{self, Debounced};

type SettleFn = Box<dyn Fn() + Send + Sync>;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    pub should_quit: bool,
    pub state: AppState,
    pub elements: Elements,
    pub endpoint: String,

    error_message: String,
    max_input_lines: u16,
    api: Arc<dyn ChatApi>,
    events: EventSender,
    input_settled: Debounced<SettleFn>,
}

impl App {
    pub fn new(config: &Config, api: Arc<dyn ChatApi>, events: EventSender) -> Self {
        let settle_tx = events.clone();
        let settle: SettleFn = Box::new(move || {
            let _ = settle_tx.send(AppEvent::InputSettled);
        });

        Self {
            should_quit: false,
            state: AppState::new(),
            elements: Elements::from_layout(&config.layout),
            endpoint: config.chat_url(),
            error_message: config.error_message.clone(),
            max_input_lines: config.max_input_lines.max(1),
            api,
            events,
            input_settled: utils::debounce(
                settle,
                Duration::from_millis(config.resize_debounce_ms),
            ),
        }
    }

    /// Send the current draft, unless it is blank or a send is in flight.
    ///
    /// The reply arrives later as `AppEvent::Reply` and must be handed to
    /// [`App::finish_send`].
    pub fn send_message(&mut self) {
        if self.elements.message_input.is_none() {
            return;
        }

        let message = self.state.current_draft.trim().to_string();
        if message.is_empty() || self.state.is_loading {
            return;
        }

        self.set_loading(true);
        self.add_message(&message, Sender::User, false);

        self.state.current_draft.clear();
        if let Some(input) = self.elements.message_input.as_mut() {
            input.cursor = 0;
        }
        self.auto_resize();

        debug!(chars = message.chars().count(), "sending message");

        let api = Arc::clone(&self.api);
        let tx = self.events.clone();
        tokio::spawn(async move {
            // Run the call in its own task so a panic still yields a reply
            let outcome = tokio::spawn(async move { api.send_message(&message).await }).await;
            let reply = outcome.unwrap_or_else(|err| Err(ApiError::Task(err.to_string())));
            let _ = tx.send(AppEvent::Reply(reply));
        });
    }

    pub fn finish_send(&mut self, reply: Result<ChatResponse, ApiError>) {
        match reply {
            Ok(reply) => self.add_message(&reply.response, Sender::Bot, false),
            Err(err) => {
                error!(error = %err, "failed to send message");
                let text = self.error_message.clone();
                self.add_message(&text, Sender::Bot, true);
            }
        }
        self.set_loading(false);
    }

    pub fn add_message(&mut self, text: &str, sender: Sender, is_error: bool) {
        let timestamp = Local::now();

        if let Some(view) = self.elements.chat_container.as_mut() {
            view.messages.push(RenderedMessage {
                body: utils::escape_markup(text).into_owned(),
                time: utils::format_timestamp(&timestamp),
                sender,
                is_error,
            });
            self.scroll_to_bottom();
        }

        self.state.push(MessageRecord {
            text: text.to_string(),
            sender,
            timestamp,
            is_error,
        });
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.state.is_loading = loading;

        if let Some(indicator) = self.elements.loading_indicator.as_mut() {
            indicator.visible = loading;
            indicator.frame = 0;
        }
        if let Some(button) = self.elements.send_button.as_mut() {
            button.disabled = loading;
        }
    }

    /// Grow or shrink the input box to fit the draft
    pub fn auto_resize(&mut self) {
        let max_rows = self.max_input_lines;
        let Some(input) = self.elements.message_input.as_mut() else {
            return;
        };

        let rows = ui::wrap_cells(&self.state.current_draft, input.width as usize).len();
        input.rows = ui::row_count(rows).clamp(1, max_rows);
    }

    pub fn scroll_to_bottom(&mut self) {
        if let Some(view) = self.elements.chat_container.as_mut() {
            view.follow = true;
            view.scroll = max_scroll(view);
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        if let Some(view) = self.elements.chat_container.as_mut() {
            view.scroll = view.scroll.min(max_scroll(view)).saturating_sub(lines);
            view.follow = false;
        }
    }

    pub fn scroll_down(&mut self, lines: u16) {
        if let Some(view) = self.elements.chat_container.as_mut() {
            let max = max_scroll(view);
            view.scroll = view.scroll.saturating_add(lines).min(max);
            view.follow = view.scroll >= max;
        }
    }

    /// Fire-and-forget health check; the outcome is only logged
    pub fn check_api_health(&self) -> JoinHandle<()> {
        let api = Arc::clone(&self.api);
        tokio::spawn(async move {
            match api.check_health().await {
                Ok(health) => info!(status = %health, "API status"),
                Err(err) => warn!(error = %err, "API health check failed"),
            }
        })
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if let Some(indicator) = self.elements.loading_indicator.as_mut() {
            if indicator.visible {
                indicator.frame = (indicator.frame + 1) % 3;
            }
        }
    }

    // Draft editing

    pub fn insert_char(&mut self, c: char) {
        let Some(input) = self.elements.message_input.as_mut() else {
            return;
        };
        let byte_pos = char_to_byte_index(&self.state.current_draft, input.cursor);
        self.state.current_draft.insert(byte_pos, c);
        input.cursor += 1;
        self.schedule_auto_resize();
    }

    pub fn delete_before_cursor(&mut self) {
        let Some(input) = self.elements.message_input.as_mut() else {
            return;
        };
        if input.cursor > 0 {
            input.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.state.current_draft, input.cursor);
            self.state.current_draft.remove(byte_pos);
            self.schedule_auto_resize();
        }
    }

    pub fn delete_at_cursor(&mut self) {
        let Some(input) = self.elements.message_input.as_mut() else {
            return;
        };
        if input.cursor < self.state.current_draft.chars().count() {
            let byte_pos = char_to_byte_index(&self.state.current_draft, input.cursor);
            self.state.current_draft.remove(byte_pos);
            self.schedule_auto_resize();
        }
    }

    pub fn cursor_left(&mut self) {
        if let Some(input) = self.elements.message_input.as_mut() {
            input.cursor = input.cursor.saturating_sub(1);
        }
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.state.current_draft.chars().count();
        if let Some(input) = self.elements.message_input.as_mut() {
            input.cursor = (input.cursor + 1).min(char_count);
        }
    }

    pub fn cursor_home(&mut self) {
        if let Some(input) = self.elements.message_input.as_mut() {
            input.cursor = 0;
        }
    }

    pub fn cursor_end(&mut self) {
        let char_count = self.state.current_draft.chars().count();
        if let Some(input) = self.elements.message_input.as_mut() {
            input.cursor = char_count;
        }
    }

    /// Run `auto_resize` once the draft (or the terminal) stops changing
    pub fn schedule_auto_resize(&mut self) {
        self.input_settled.call();
    }
}

fn max_scroll(view: &TranscriptView) -> u16 {
    // Fall back to a typical pane size until the first render records one
    let width = if view.width > 0 { view.width } else { 50 };
    let height = if view.height > 0 { view.height } else { 20 };

    let total = ui::row_count(ui::transcript_lines(&view.messages, width as usize).len());
    total.saturating_sub(height)
}
