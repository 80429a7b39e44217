use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Apply a single-line editing key to `text`. Returns the new text when the
/// key changed it; cursor-only keys just move `cursor`.
fn edit_line(text: &str, cursor: &mut usize, key: KeyEvent) -> Option<String> {
    let char_count = text.chars().count();
    *cursor = (*cursor).min(char_count);

    match key.code {
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            let mut edited = text.to_string();
            edited.insert(char_to_byte_index(text, *cursor), c);
            *cursor += 1;
            Some(edited)
        }
        KeyCode::Backspace if *cursor > 0 => {
            *cursor -= 1;
            let mut edited = text.to_string();
            edited.remove(char_to_byte_index(text, *cursor));
            Some(edited)
        }
        KeyCode::Delete if *cursor < char_count => {
            let mut edited = text.to_string();
            edited.remove(char_to_byte_index(text, *cursor));
            Some(edited)
        }
        KeyCode::Left => {
            *cursor = cursor.saturating_sub(1);
            None
        }
        KeyCode::Right => {
            *cursor = (*cursor + 1).min(char_count);
            None
        }
        KeyCode::Home => {
            *cursor = 0;
            None
        }
        KeyCode::End => {
            *cursor = char_count;
            None
        }
        _ => None,
    }
}

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Reply(ticket, result) => app.on_reply(ticket, result),
        AppEvent::AvatarReady(ticket, result) => app.on_avatar_ready(ticket, result),
        AppEvent::Copied(copied) => app.on_copied(copied),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    app.status = None;

    if app.show_avatar_modal {
        handle_avatar_modal(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('i') | KeyCode::Enter => app.input_mode = InputMode::Editing,
        KeyCode::Char('p') => app.open_avatar_modal(),

        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_down(app.chat_height / 2);
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_up(app.chat_height / 2);
        }
        KeyCode::Char('g') => app.chat_scroll = 0,
        KeyCode::Char('G') => app.scroll_chat_to_bottom(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => app.send_message(),
        _ => {
            let mut cursor = app.draft_cursor;
            if let Some(draft) = edit_line(app.conversation.draft(), &mut cursor, key) {
                app.conversation.update_draft(draft);
            }
            app.draft_cursor = cursor;
        }
    }
}

fn handle_avatar_modal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_avatar_modal(),
        KeyCode::Enter => app.generate_avatar(),
        KeyCode::Char('y') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.copy_image_link();
        }
        _ => {
            let mut cursor = app.avatar_cursor;
            if let Some(prompt) = edit_line(app.avatar.prompt_text(), &mut cursor, key) {
                app.avatar.update_prompt(prompt);
            }
            app.avatar_cursor = cursor;
        }
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.show_avatar_modal {
        return;
    }

    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(3),
        MouseEventKind::ScrollUp => app.scroll_up(3),
        _ => {}
    }
}
