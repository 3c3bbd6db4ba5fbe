use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use counselor_core::{ConversationState, Sender};
use unicode_width::UnicodeWidthChar;

use crate::app::App;

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            // Consume the second *
            chars.next();

            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;

            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next();
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            current_text.push(c);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input row, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Eco-Anxiety Counselor ", Style::default().fg(Color::Green).bold()),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::Black));
    frame.render_widget(header, area);
}

fn sender_label(sender: Sender) -> Line<'static> {
    let (label, color) = match sender {
        Sender::User => ("You:", Color::Cyan),
        Sender::Ai => ("Counselor:", Color::Green),
    };
    Line::from(Span::styled(
        label,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
}

fn chat_lines(state: &ConversationState, animation_frame: u8) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    for msg in &state.messages {
        lines.push(sender_label(msg.sender));
        match msg.sender {
            Sender::User => {
                for line in msg.text.lines() {
                    lines.push(Line::from(line.to_string()));
                }
            }
            Sender::Ai => {
                for line in msg.text.lines() {
                    lines.push(parse_markdown_line(line));
                }
            }
        }
        lines.push(Line::default());
    }

    if state.render_state().show_typing_indicator {
        lines.push(sender_label(Sender::Ai));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Typing{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store chat area for mouse hit-testing and its inner height for scroll calculations
    app.chat_area = Some(area);
    app.chat_height = area.height.saturating_sub(2);
    let inner_width = area.width.saturating_sub(2);

    let lines = chat_lines(&app.view.borrow(), app.animation_frame);
    let body = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true });

    // Measure with the same wrapping that gets drawn
    app.chat_content_lines = u16::try_from(body.line_count(inner_width)).unwrap_or(u16::MAX);
    app.follow_scroll_target();

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let chat = body.block(chat_block).scroll((app.chat_scroll, 0));
    frame.render_widget(chat, area);
}

/// The part of `text` that fits in `width` columns with the cursor in view,
/// and the cursor's column within it
fn visible_input(text: &str, cursor: usize, width: usize) -> (String, u16) {
    let widths: Vec<usize> = text.chars().map(|c| c.width().unwrap_or(0)).collect();
    let cursor = cursor.min(widths.len());

    // Scroll right until the cursor column lands inside the box
    let mut start = 0;
    while start < cursor && widths[start..cursor].iter().sum::<usize>() >= width {
        start += 1;
    }

    let mut used = 0;
    let visible: String = text
        .chars()
        .skip(start)
        .take_while(|c| {
            used += c.width().unwrap_or(0);
            used <= width
        })
        .collect();

    let cursor_col = widths[start..cursor].iter().sum::<usize>();
    (visible, u16::try_from(cursor_col).unwrap_or(u16::MAX))
}

fn render_input(app: &mut App, frame: &mut Frame, area: Rect) {
    let [text_area, button_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(10),
    ])
    .areas(area);
    app.button_area = Some(button_area);

    let snapshot = app.view.borrow();
    let view = snapshot.render_state();

    let border_color = if view.input_disabled { Color::DarkGray } else { Color::Yellow };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let inner_width = text_area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_x) =
        visible_input(&snapshot.pending_input, app.input_cursor, inner_width);

    let input = if snapshot.pending_input.is_empty() {
        Paragraph::new(Span::styled(
            "Type your message...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let style = if view.input_disabled {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Cyan)
        };
        Paragraph::new(visible_text).style(style)
    };
    frame.render_widget(input.block(input_block), text_area);

    let button_style = if view.input_disabled {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Green).bold()
    };
    let button = Paragraph::new(Line::from(view.send_button_label).centered())
        .style(button_style)
        .block(Block::default().borders(Borders::ALL).border_style(button_style));
    frame.render_widget(button, button_area);

    // No cursor while the input is disabled
    if !view.input_disabled {
        frame.set_cursor_position((text_area.x + cursor_x + 1, text_area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let hints = Line::from(vec![
        Span::styled(" Enter ", Style::default().bg(Color::Blue).fg(Color::White)),
        Span::raw(" send  "),
        Span::styled(" PgUp/PgDn ", Style::default().bg(Color::Blue).fg(Color::White)),
        Span::raw(" scroll  "),
        Span::styled(" Esc ", Style::default().bg(Color::Blue).fg(Color::White)),
        Span::raw(" quit  "),
        Span::styled(app.api_url.clone(), Style::default().fg(Color::DarkGray)),
    ]);

    frame.render_widget(Paragraph::new(hints), area);
}
