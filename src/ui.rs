use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use unicode_width::UnicodeWidthChar;

use crate::app::App;
use crate::elements::RenderedMessage;
use crate::state::Sender;

const SEND_BUTTON_WIDTH: u16 = 10;

/// Hard-wrap text into rows at most `width` terminal cells wide; `\n` always
/// breaks. A width of zero disables wrapping.
pub fn wrap_cells(text: &str, width: usize) -> Vec<String> {
    let mut rows = Vec::new();

    for line in text.split('\n') {
        if width == 0 {
            rows.push(line.to_string());
            continue;
        }

        let mut row = String::new();
        let mut row_width = 0;

        for ch in line.chars() {
            let ch_width = cell_width(ch);

            if row_width + ch_width > width && !row.is_empty() {
                rows.push(std::mem::take(&mut row));
                row_width = 0;
            }

            row.push(ch);
            row_width += ch_width;
        }

        rows.push(row);
    }

    rows
}

/// Row and cell column of a char cursor within text wrapped by [`wrap_cells`]
pub fn cursor_offset(text: &str, cursor: usize, width: usize) -> (usize, usize) {
    let (mut row, mut col) = (0, 0);

    for ch in text.chars().take(cursor) {
        if ch == '\n' {
            row += 1;
            col = 0;
            continue;
        }

        let ch_width = cell_width(ch);
        if width > 0 && col + ch_width > width && col > 0 {
            row += 1;
            col = 0;
        }
        col += ch_width;
    }

    if width > 0 && col >= width {
        row += 1;
        col = 0;
    }

    (row, col)
}

fn cell_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(1)
}

/// Row count clamped into the `u16` range ratatui works in
pub fn row_count(rows: usize) -> u16 {
    u16::try_from(rows).unwrap_or(u16::MAX)
}

/// Lines for the transcript pane: a header per message, the wrapped body, a
/// blank separator. Bodies are printed verbatim, never parsed for styling.
pub fn transcript_lines(messages: &[RenderedMessage], width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for msg in messages {
        let label_style = match (msg.sender, msg.is_error) {
            (_, true) => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            (Sender::User, false) => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            (Sender::Bot, false) => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        };
        lines.push(Line::from(vec![
            Span::styled(msg.sender.label(), label_style),
            Span::styled(format!(" {}", msg.time), Style::default().fg(Color::DarkGray)),
        ]));

        let body_style = if msg.is_error {
            Style::default().fg(Color::Red)
        } else {
            Style::default()
        };
        for row in wrap_cells(&msg.body, width) {
            lines.push(Line::from(Span::styled(row, body_style)));
        }

        lines.push(Line::default());
    }

    lines
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let loading_height = match &app.elements.loading_indicator {
        Some(indicator) if indicator.visible => 1,
        _ => 0,
    };
    let input_height = app
        .elements
        .message_input
        .as_ref()
        .map_or(0, |input| input.rows + 2);

    let [header_area, transcript_area, loading_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(loading_height),
        Constraint::Length(input_height),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_transcript(app, frame, transcript_area);
    render_loading(app, frame, loading_area);
    render_input_row(app, frame, input_area);
    render_footer(frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Conversational AI ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.endpoint.clone(), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let hint = Style::default().fg(Color::DarkGray);
    let key = Style::default().fg(Color::Yellow);

    let footer = Line::from(vec![
        Span::styled(" Enter", key),
        Span::styled(" send  ", hint),
        Span::styled("Alt+Enter", key),
        Span::styled(" newline  ", hint),
        Span::styled("PgUp/PgDn", key),
        Span::styled(" scroll  ", hint),
        Span::styled("Esc", key),
        Span::styled(" quit", hint),
    ]);

    frame.render_widget(Paragraph::new(footer), area);
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    let Some(view) = app.elements.chat_container.as_mut() else {
        return;
    };

    // Store inner dimensions for scroll calculations and mouse hit-testing
    view.area = Some(area);
    view.width = area.width.saturating_sub(2);
    view.height = area.height.saturating_sub(2);

    let lines = transcript_lines(&view.messages, view.width as usize);
    let total = row_count(lines.len());
    let max_scroll = total.saturating_sub(view.height);
    view.scroll = if view.follow {
        max_scroll
    } else {
        view.scroll.min(max_scroll)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Conversation ");

    let text = if lines.is_empty() {
        Text::from(Span::styled(
            "Say something to start the conversation...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Text::from(lines)
    };

    let transcript = Paragraph::new(text).block(block).scroll((view.scroll, 0));
    frame.render_widget(transcript, area);

    if max_scroll > 0 {
        let mut scrollbar_state =
            ScrollbarState::new(max_scroll as usize).position(view.scroll as usize);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area,
            &mut scrollbar_state,
        );
    }
}

fn render_loading(app: &App, frame: &mut Frame, area: Rect) {
    let Some(indicator) = &app.elements.loading_indicator else {
        return;
    };
    if !indicator.visible || area.height == 0 {
        return;
    }

    // Animated ellipsis: cycles through ".", "..", "..."
    let dots = ".".repeat(indicator.frame as usize + 1);
    let line = Line::from(Span::styled(
        format!(" Waiting for a reply{}", dots),
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    ));
    frame.render_widget(Paragraph::new(line), area);
}

fn render_input_row(app: &mut App, frame: &mut Frame, area: Rect) {
    if area.height == 0 {
        return;
    }

    let button_width = if app.elements.send_button.is_some() {
        SEND_BUTTON_WIDTH
    } else {
        0
    };
    let [input_area, button_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(button_width),
    ])
    .areas(area);

    render_input(app, frame, input_area);
    render_send_button(app, frame, button_area);
}

fn render_input(app: &mut App, frame: &mut Frame, area: Rect) {
    let Some(input) = app.elements.message_input.as_mut() else {
        return;
    };
    let draft = &app.state.current_draft;

    input.width = area.width.saturating_sub(2);
    let width = input.width as usize;

    // Scroll vertically to keep the cursor row inside the box
    let (cursor_row, cursor_col) = cursor_offset(draft, input.cursor, width);
    let visible_rows = (input.rows as usize).max(1);
    let offset = cursor_row.saturating_sub(visible_rows - 1);

    let text = if draft.is_empty() {
        Text::from(Span::styled(
            "Type a message...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Text::from(
            wrap_cells(draft, width)
                .into_iter()
                .map(Line::from)
                .collect::<Vec<_>>(),
        )
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Message ");

    // Use cyan text to match the "You" style - visible in both light and dark terminals
    let paragraph = Paragraph::new(text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block)
        .scroll((offset as u16, 0));
    frame.render_widget(paragraph, area);

    frame.set_cursor_position((
        area.x + 1 + cursor_col as u16,
        area.y + 1 + (cursor_row - offset) as u16,
    ));
}

fn render_send_button(app: &mut App, frame: &mut Frame, area: Rect) {
    let Some(button) = app.elements.send_button.as_mut() else {
        return;
    };
    button.area = Some(area);

    let style = if button.disabled {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    };

    let label = Paragraph::new(Span::styled("Send", style))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(style));
    frame.render_widget(label, area);
}
