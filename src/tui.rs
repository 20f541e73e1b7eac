use std::io::{self, Stderr};
use std::thread::ThreadId;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEvent, KeyEventKind, MouseEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

use crate::api::{ApiError, ChatResponse};

pub type Tui = Terminal<CrosstermBackend<Stderr>>;

pub type EventSender = mpsc::UnboundedSender<AppEvent>;

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    Tick,
    /// The draft stopped changing for the debounce period
    InputSettled,
    /// Outcome of the in-flight send
    Reply(Result<ChatResponse, ApiError>),
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<AppEvent>,
    tx: EventSender,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        // Spawn event reader task
        let tx_events = tx.clone();
        tokio::spawn(async move {
            let mut reader = event::EventStream::new();
            while let Some(evt) = reader.next().await {
                let app_event = match evt {
                    // Only handle key press events, not release
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                        Some(AppEvent::Key(key))
                    }
                    Ok(Event::Mouse(mouse)) => Some(AppEvent::Mouse(mouse)),
                    Ok(Event::Resize(w, h)) => Some(AppEvent::Resize(w, h)),
                    Ok(_) => None,
                    Err(err) => {
                        tracing::warn!(error = %err, "terminal event stream error");
                        None
                    }
                };

                if let Some(event) = app_event {
                    if tx_events.send(event).is_err() {
                        break;
                    }
                }
            }
        });

        // Spawn tick timer for animations (300ms interval)
        let tx_tick = tx.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_millis(300));
            loop {
                interval.tick().await;
                if tx_tick.send(AppEvent::Tick).is_err() {
                    break;
                }
            }
        });

        Self { rx, tx }
    }

    /// Handle for background tasks that report back into the event loop
    pub fn sender(&self) -> EventSender {
        self.tx.clone()
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }
}

pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    execute!(io::stderr(), EnterAlternateScreen)?;

    // Enable mouse capture
    execute!(io::stderr(), crossterm::event::EnableMouseCapture)?;

    let backend = CrosstermBackend::new(io::stderr());
    let terminal = Terminal::new(backend)?;

    Ok(terminal)
}

pub fn restore() -> Result<()> {
    execute!(io::stderr(), crossterm::event::DisableMouseCapture)?;
    execute!(io::stderr(), LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PanicAction {
    /// The UI itself is going down: give the terminal back first
    RestoreTerminal,
    /// A background task panicked; the UI keeps running and owns the screen
    LogOnly,
}

fn panic_action(ui_thread: ThreadId, current: ThreadId) -> PanicAction {
    if current == ui_thread {
        PanicAction::RestoreTerminal
    } else {
        PanicAction::LogOnly
    }
}

/// Install panic hook to restore terminal on panic.
///
/// Must be called from the thread that drives the event loop. Panics on
/// other threads (spawned request tasks) are caught by their `JoinHandle`,
/// so they are logged instead of tearing down the screen.
pub fn install_panic_hook() {
    let ui_thread = std::thread::current().id();
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        match panic_action(ui_thread, std::thread::current().id()) {
            PanicAction::RestoreTerminal => {
                let _ = restore();
                original_hook(panic_info);
            }
            PanicAction::LogOnly => {
                tracing::error!(panic = %panic_info, "background task panicked");
            }
        }
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ui_thread_panic_restores_terminal() {
        let ui_thread = std::thread::current().id();
        assert_eq!(panic_action(ui_thread, ui_thread), PanicAction::RestoreTerminal);
    }

    #[test]
    fn test_worker_panic_leaves_terminal_alone() {
        let ui_thread = std::thread::current().id();
        let worker = std::thread::spawn(|| std::thread::current().id())
            .join()
            .unwrap();
        assert_eq!(panic_action(ui_thread, worker), PanicAction::LogOnly);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_spawned_tasks_run_off_the_ui_thread() {
        let ui_thread = std::thread::current().id();
        let task_thread = tokio::spawn(async { std::thread::current().id() })
            .await
            .unwrap();
        assert_eq!(panic_action(ui_thread, task_thread), PanicAction::LogOnly);
    }
}
