use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::App;
use crate::tui::AppEvent;

const WHEEL_ROWS: u16 = 3;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

fn contains(area: Option<Rect>, column: u16, row: u16) -> bool {
    area.is_some_and(|r| {
        column >= r.x && column < r.x + r.width && row >= r.y && row < r.y + r.height
    })
}

/// Apply one terminal event to the app.
///
/// Returns the message to send when the event submitted the input; the caller owns the request.
pub fn handle_event(app: &mut App, event: AppEvent) -> Option<String> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => None,
        AppEvent::Tick => {
            app.tick_animation();
            None
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) -> Option<String> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return None;
    }

    // An open alert swallows everything until acknowledged
    if app.alert.is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
            app.dismiss_alert();
        }
        return None;
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Enter => return app.submit(),

        // Log scrolling
        KeyCode::PageUp => app.scroll_up(app.page_size()),
        KeyCode::PageDown => app.scroll_down(app.page_size()),
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),

        _ if !app.input_enabled() => {}

        // Input editing
        KeyCode::Backspace => {
            if app.input_cursor > 0 {
                app.input_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.input_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.input_cursor = app.input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.input_cursor = (app.input_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.input_cursor = 0;
        }
        KeyCode::End => {
            app.input_cursor = app.input.chars().count();
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
            app.input.insert(byte_pos, c);
            app.input_cursor += 1;
        }
        _ => {}
    }
    None
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) -> Option<String> {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if app.alert.is_some() {
                app.dismiss_alert();
                return None;
            }
            if contains(app.send_area, mouse.column, mouse.row) {
                return app.submit();
            }
        }
        MouseEventKind::ScrollUp if contains(app.log_area, mouse.column, mouse.row) => {
            app.scroll_up(WHEEL_ROWS);
        }
        MouseEventKind::ScrollDown if contains(app.log_area, mouse.column, mouse.row) => {
            app.scroll_down(WHEEL_ROWS);
        }
        _ => {}
    }
    None
}
