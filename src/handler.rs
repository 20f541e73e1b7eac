use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use crate::app::App;
use crate::elements::contains;
use crate::tui::AppEvent;

const PAGE_SCROLL: u16 = 10;
const WHEEL_SCROLL: u16 = 3;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        // Geometry is refreshed on the next draw; resize the input after it
        AppEvent::Resize(_, _) => app.schedule_auto_resize(),
        AppEvent::Tick => app.tick_animation(),
        AppEvent::InputSettled => app.auto_resize(),
        AppEvent::Reply(reply) => app.finish_send(reply),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,

        // Shift+Enter only arrives on terminals with keyboard enhancement
        KeyCode::Enter
            if key.modifiers.intersects(KeyModifiers::ALT | KeyModifiers::SHIFT) =>
        {
            app.insert_char('\n');
        }
        KeyCode::Enter => app.send_message(),

        KeyCode::Backspace => app.delete_before_cursor(),
        KeyCode::Delete => app.delete_at_cursor(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),

        KeyCode::PageUp => app.scroll_up(PAGE_SCROLL),
        KeyCode::PageDown => app.scroll_down(PAGE_SCROLL),
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),

        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let transcript_area = app.elements.chat_container.as_ref().and_then(|v| v.area);
    let button_area = app.elements.send_button.as_ref().and_then(|b| b.area);

    match mouse.kind {
        MouseEventKind::ScrollUp if contains(transcript_area, mouse.column, mouse.row) => {
            app.scroll_up(WHEEL_SCROLL);
        }
        MouseEventKind::ScrollDown if contains(transcript_area, mouse.column, mouse.row) => {
            app.scroll_down(WHEEL_SCROLL);
        }
        MouseEventKind::Down(MouseButton::Left)
            if contains(button_area, mouse.column, mouse.row) =>
        {
            app.send_message();
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::*;
    use crate::state::Sender;
    use ratatui::layout::Rect;

    fn press(app: &mut App, code: KeyCode) {
        handle_event(app, AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    fn type_keys(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn click(app: &mut App, column: u16, row: u16) {
        handle_event(
            app,
            AppEvent::Mouse(MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column,
                row,
                modifiers: KeyModifiers::NONE,
            }),
        );
    }

    #[tokio::test]
    async fn test_enter_sends_and_reply_event_settles() {
        let mut h = harness(MockReply::Text("Hi!"));
        type_keys(&mut h.app, "Hello");
        press(&mut h.app, KeyCode::Enter);
        assert!(h.app.state.is_loading);

        let reply = h.next_reply().await;
        handle_event(&mut h.app, AppEvent::Reply(reply));

        let texts: Vec<&str> = h.app.state.history().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["Hello", "Hi!"]);
        assert!(!h.app.state.is_loading);
    }

    #[tokio::test]
    async fn test_whitespace_enter_is_noop() {
        let mut h = harness(MockReply::Text("Hi!"));
        type_keys(&mut h.app, "   ");
        press(&mut h.app, KeyCode::Enter);

        tokio::task::yield_now().await;
        assert!(h.app.state.history().is_empty());
        assert!(h.api.sent().is_empty());
    }

    #[tokio::test]
    async fn test_alt_enter_inserts_newline() {
        let mut h = harness(MockReply::Text("Hi!"));
        type_keys(&mut h.app, "one");
        handle_event(
            &mut h.app,
            AppEvent::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::ALT)),
        );
        type_keys(&mut h.app, "two");

        assert_eq!(h.app.state.current_draft, "one\ntwo");
        assert!(!h.app.state.is_loading);
    }

    #[tokio::test]
    async fn test_send_button_click() {
        let mut h = harness(MockReply::Text("Hi!"));
        h.app.elements.send_button.as_mut().unwrap().area = Some(Rect::new(50, 12, 10, 3));
        type_keys(&mut h.app, "Hello");

        click(&mut h.app, 0, 0);
        assert!(!h.app.state.is_loading);

        click(&mut h.app, 52, 13);
        assert!(h.app.state.is_loading);

        // Clicking again while the reply is pending does nothing
        type_keys(&mut h.app, "again");
        click(&mut h.app, 52, 13);
        assert_eq!(h.app.state.history().len(), 1);

        h.settle().await;
        assert_eq!(h.api.sent(), vec!["Hello"]);
        assert_eq!(h.app.state.history()[1].sender, Sender::Bot);
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let mut h = harness(MockReply::Text("Hi!"));
        press(&mut h.app, KeyCode::Esc);
        assert!(h.app.should_quit);

        let mut h = harness(MockReply::Text("Hi!"));
        handle_event(
            &mut h.app,
            AppEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
        );
        assert!(h.app.should_quit);
        assert!(h.app.state.current_draft.is_empty());
    }

    #[tokio::test]
    async fn test_settled_event_resizes_input() {
        let mut h = harness(MockReply::Text("Hi!"));
        h.app.elements.message_input.as_mut().unwrap().width = 4;
        type_keys(&mut h.app, "abcdefghij");
        assert_eq!(h.app.elements.message_input.as_ref().unwrap().rows, 1);

        handle_event(&mut h.app, AppEvent::InputSettled);
        assert_eq!(h.app.elements.message_input.as_ref().unwrap().rows, 3);
    }
}
