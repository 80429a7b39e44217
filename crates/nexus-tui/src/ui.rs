use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use nexus_core::Sender;

use crate::app::{App, InputMode};

/// Style a line of model output: `#` headings, `*`/`-` bullets and `**bold**`
/// runs. An unclosed `**` is shown literally.
fn render_markdown_line(text: &str) -> Line<'static> {
    let trimmed = text.trim_start();

    let heading = trimmed.trim_start_matches('#');
    if heading.len() < trimmed.len() && heading.starts_with(' ') {
        return Line::from(Span::styled(
            heading.trim().to_string(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));
    }

    let mut spans: Vec<Span<'static>> = Vec::new();
    let body = match trimmed.strip_prefix("* ").or_else(|| trimmed.strip_prefix("- ")) {
        Some(rest) => {
            let indent = text.len() - trimmed.len();
            spans.push(Span::raw(format!("{}• ", " ".repeat(indent))));
            rest
        }
        None => text,
    };

    // Odd segments sit after an opening marker; they are bold only if a
    // closing marker follows.
    let segments: Vec<&str> = body.split("**").collect();
    let last = segments.len() - 1;
    for (i, segment) in segments.into_iter().enumerate() {
        if i % 2 == 1 && i < last {
            if !segment.is_empty() {
                spans.push(Span::styled(
                    segment.to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            }
        } else if i % 2 == 1 {
            spans.push(Span::raw(format!("**{segment}")));
        } else if !segment.is_empty() {
            spans.push(Span::raw(segment.to_string()));
        }
    }

    Line::from(spans)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, thread, input, footer
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

    if app.show_avatar_modal {
        render_avatar_modal(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = vec![
        Span::styled(" AI Nexus ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!(" Powered by Gemini · {} ", app.info.model),
            Style::default().fg(Color::Gray),
        ),
    ];

    if app.info.key_source.is_none() {
        spans.push(Span::styled(
            " no API key: set GEMINI_API_KEY ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        ));
    }

    spans.push(Span::styled(
        format!(" v{}", env!("CARGO_PKG_VERSION")),
        Style::default().fg(Color::DarkGray),
    ));

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store area for mouse hit-testing and inner size for scroll calculations
    app.chat_area = Some(area);
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let border_color = if app.input_mode == InputMode::Normal && !app.show_avatar_modal {
        Color::Cyan
    } else {
        Color::DarkGray
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Chat ");

    let mut lines: Vec<Line> = Vec::new();

    for msg in app.conversation.messages() {
        let label_color = match msg.sender() {
            Sender::User => Color::Cyan,
            Sender::Assistant => Color::Yellow,
        };
        lines.push(Line::from(vec![
            Span::styled(
                msg.sender().label(),
                Style::default().fg(label_color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}", msg.display_time()),
                Style::default().fg(Color::DarkGray),
            ),
        ]));

        match msg.sender() {
            Sender::User => {
                for line in msg.text().lines() {
                    lines.push(Line::from(line.to_string()));
                }
            }
            Sender::Assistant => {
                for line in msg.text().lines() {
                    lines.push(render_markdown_line(line));
                }
            }
        }
        lines.push(Line::default());
    }

    if app.conversation.is_waiting_for_reply() {
        lines.push(Line::from(Span::styled(
            Sender::Assistant.label(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

/// Single-line text field with horizontal scrolling that keeps the cursor in view.
fn render_text_field(
    frame: &mut Frame,
    area: Rect,
    block: Block,
    text: &str,
    placeholder: &str,
    cursor: usize,
    show_cursor: bool,
) {
    let inner_width = area.width.saturating_sub(2) as usize;

    let scroll_offset = if inner_width == 0 || cursor < inner_width {
        0
    } else {
        cursor - inner_width + 1
    };

    let field = if text.is_empty() {
        Paragraph::new(placeholder.to_string()).style(Style::default().fg(Color::DarkGray))
    } else {
        let visible_text: String = text.chars().skip(scroll_offset).take(inner_width).collect();
        Paragraph::new(visible_text).style(Style::default().fg(Color::Cyan))
    };

    frame.render_widget(field.block(block), area);

    if show_cursor {
        let cursor_x = (cursor - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing && !app.show_avatar_modal;
    let border_color = if !editing {
        Color::DarkGray
    } else if app.conversation.is_waiting_for_reply() {
        Color::Gray
    } else {
        Color::Yellow
    };

    let title = if app.conversation.is_waiting_for_reply() {
        " Message (waiting for reply) "
    } else {
        " Message "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    render_text_field(
        frame,
        area,
        block,
        app.conversation.draft(),
        "Type a message...",
        app.draft_cursor,
        editing,
    );
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let (mode_text, mode_style) = if app.show_avatar_modal {
        (" AVATAR ", Style::default().bg(Color::Magenta).fg(Color::White))
    } else {
        match app.input_mode {
            InputMode::Normal => (" CHAT ", Style::default().bg(Color::Blue).fg(Color::White)),
            InputMode::Editing => (" INSERT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
        }
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];

    let hints: &[(&str, &str)] = if app.show_avatar_modal {
        &[(" Enter ", " generate "), (" ^Y ", " copy link "), (" Esc ", " close ")]
    } else {
        match app.input_mode {
            InputMode::Normal => &[
                (" i ", " type "),
                (" j/k ", " scroll "),
                (" p ", " avatar "),
                (" q ", " quit "),
            ],
            InputMode::Editing => &[(" Enter ", " send "), (" Esc ", " done ")],
        }
    };
    for (key, label) in hints {
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::styled(*label, label_style));
    }

    if let Some(status) = &app.status {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(status.clone(), Style::default().fg(Color::Green)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_avatar_modal(app: &App, frame: &mut Frame, area: Rect) {
    // Calculate popup size and position (centered)
    let popup_width = 70.min(area.width.saturating_sub(4));
    let popup_height = 12.min(area.height.saturating_sub(2));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" AI Avatar Generator ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let [desc_area, prompt_area, result_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .areas(inner);

    let description = Paragraph::new("Describe your perfect profile picture and let AI create it.")
        .style(Style::default().fg(Color::Gray))
        .wrap(Wrap { trim: true });
    frame.render_widget(description, desc_area);

    let prompt_border = if app.avatar.is_generating() { Color::DarkGray } else { Color::Yellow };
    let prompt_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(prompt_border))
        .title(" Prompt ");
    render_text_field(
        frame,
        prompt_area,
        prompt_block,
        app.avatar.prompt_text(),
        "e.g. Cyberpunk wolf with neon glasses...",
        app.avatar_cursor,
        !app.avatar.is_generating(),
    );

    let mut lines: Vec<Line> = Vec::new();
    if app.avatar.is_generating() {
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Generating{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    } else if let Some(error) = app.avatar.error() {
        lines.push(Line::from(Span::styled(error.to_string(), Style::default().fg(Color::Red))));
    }

    if let Some(locator) = app.avatar.image_ref() {
        let options = app.avatar.options();
        lines.push(Line::from(Span::styled(
            format!("Your {}x{} avatar:", options.width, options.height),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            locator.to_string(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED),
        )));
    }

    let result = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false });
    frame.render_widget(result, result_area);
}
