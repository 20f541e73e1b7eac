use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::task::JoinHandle;

/// Format a local time as a two-digit `HH:MM` string
pub fn format_timestamp(at: &DateTime<Local>) -> String {
    at.format("%H:%M").to_string()
}

/// Neutralize characters the terminal would interpret instead of print.
///
/// Control characters (ESC in particular) are replaced by their escaped
/// form, tabs become spaces, and a CR preceding an LF is dropped. Anything
/// else, markup-looking text included, comes back untouched.
pub fn escape_markup(text: &str) -> Cow<'_, str> {
    if !text.chars().any(needs_escape) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\r' if chars.peek() == Some(&'\n') => {}
            '\t' => escaped.push_str("    "),
            c if needs_escape(c) => escaped.extend(c.escape_default()),
            c => escaped.push(c),
        }
    }

    Cow::Owned(escaped)
}

fn needs_escape(c: char) -> bool {
    c.is_control() && c != '\n'
}

/// Wrap `f` so it only runs after `wait` has passed without another call
pub fn debounce<F>(f: F, wait: Duration) -> Debounced<F>
where
    F: Fn() + Send + Sync + 'static,
{
    Debounced {
        f: Arc::new(f),
        wait,
        pending: None,
    }
}

pub struct Debounced<F> {
    f: Arc<F>,
    wait: Duration,
    pending: Option<JoinHandle<()>>,
}

impl<F> Debounced<F>
where
    F: Fn() + Send + Sync + 'static,
{
    /// Restart the quiet period. Must be called from within a tokio runtime.
    pub fn call(&mut self) {
        self.cancel();

        let f = Arc::clone(&self.f);
        let wait = self.wait;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            f();
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl<F> Drop for Debounced<F> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_format_timestamp_two_digits() {
        let at = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 42).unwrap();
        assert_eq!(format_timestamp(&at), "09:05");
    }

    #[test]
    fn test_format_timestamp_24_hour() {
        let at = Local.with_ymd_and_hms(2024, 3, 7, 21, 30, 0).unwrap();
        assert_eq!(format_timestamp(&at), "21:30");
    }

    #[test]
    fn test_escape_keeps_markup_literal() {
        assert_eq!(escape_markup("<b>"), "<b>");
        assert_eq!(escape_markup("**not bold**"), "**not bold**");
        assert!(matches!(escape_markup("<b>"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_escape_neutralizes_ansi_sequences() {
        let escaped = escape_markup("\x1b[1mbold\x1b[0m");
        assert!(!escaped.contains('\x1b'));
        assert_eq!(escaped, "\\u{1b}[1mbold\\u{1b}[0m");
    }

    #[test]
    fn test_escape_whitespace() {
        assert_eq!(escape_markup("a\r\nb"), "a\nb");
        assert_eq!(escape_markup("a\tb"), "a    b");
        assert_eq!(escape_markup("a\rb"), "a\\rb");
        assert_eq!(escape_markup("line one\nline two"), "line one\nline two");
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_runs_once_after_quiet_period() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let mut debounced = debounce(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
            },
            Duration::from_millis(100),
        );

        for _ in 0..3 {
            debounced.call();
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_cancel_and_drop() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let mut debounced = debounce(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
            },
            Duration::from_millis(100),
        );

        debounced.call();
        debounced.cancel();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        debounced.call();
        drop(debounced);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
