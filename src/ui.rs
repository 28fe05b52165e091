use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use luma_chat::markup::{self, Segment};
use luma_chat::{ConversationView, Role};
use crate::app::{App, InputMode};

/// Convert one line of bubble markup into styled spans
fn markup_line(segments: Vec<Segment>) -> Line<'static> {
    if segments.is_empty() {
        return Line::default();
    }

    let spans: Vec<Span<'static>> = segments
        .into_iter()
        .map(|segment| {
            if segment.bold {
                Span::styled(segment.text, Style::default().add_modifier(Modifier::BOLD))
            } else {
                Span::raw(segment.text)
            }
        })
        .collect();

    Line::from(spans)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Luma ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("{} @ {} ", app.client.variant().display_name(), app.service.url()),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    app.chat_area = Some(area);

    // Inner size minus borders, used for scroll calculations
    app.pane.width = area.width.saturating_sub(2);
    app.pane.height = area.height.saturating_sub(2);

    let title = if app.pending > 0 {
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        format!(" Conversation ({} waiting{}) ", app.pending, dots)
    } else {
        " Conversation ".to_string()
    };

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    let chat_text = if app.pane.is_empty() {
        Text::from(Span::styled(
            "Ask about your energy usage...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in app.pane.messages() {
            let (label, color) = match msg.role {
                Role::Human => ("You:", Color::Cyan),
                Role::Ai => ("AI:", Color::Yellow),
            };
            lines.push(Line::from(Span::styled(
                label,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )));
            for line in markup::parse(&msg.text) {
                lines.push(markup_line(line));
            }
            lines.push(Line::default());
        }

        Text::from(lines)
    };

    let scroll = app.pane.scroll_offset().min(u16::MAX as usize) as u16;
    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Message (Enter to send) ");

    // Horizontal scrolling keeps the cursor visible
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input.cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app.input.text
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, area);

    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style, hints) = match app.input_mode {
        InputMode::Normal => (
            " NORMAL ",
            Style::default().bg(Color::Blue).fg(Color::White),
            " i: type  j/k: scroll  g/G: top/bottom  Ctrl-L: clear  q: quit ",
        ),
        InputMode::Editing => (
            " INSERT ",
            Style::default().bg(Color::Yellow).fg(Color::Black),
            " Enter: send  Esc: stop typing  PgUp/PgDn: scroll  Ctrl-C: quit ",
        ),
    };

    let footer = Line::from(vec![
        Span::styled(mode_text, mode_style),
        Span::styled(hints, Style::default().fg(Color::DarkGray)),
    ]);

    frame.render_widget(Paragraph::new(footer), area);
}
