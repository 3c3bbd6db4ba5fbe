use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::App;
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,

        // Only a bare Enter sends
        KeyCode::Enter => {
            if key.modifiers.is_empty() {
                app.submit();
            }
        }

        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),

        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => {
            let step = app.half_page();
            app.scroll_up(step);
        }
        KeyCode::PageDown => {
            let step = app.half_page();
            app.scroll_down(step);
        }

        KeyCode::Char(c) => {
            if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
                app.insert_char(c);
            }
        }
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let hit = |area: Option<Rect>| {
        area.map(|r| point_in_rect(mouse.column, mouse.row, r))
            .unwrap_or(false)
    };

    match mouse.kind {
        // The Send button is the second submit trigger next to Enter
        MouseEventKind::Down(MouseButton::Left) if hit(app.button_area) => {
            app.submit();
        }
        MouseEventKind::ScrollDown if hit(app.chat_area) => app.scroll_down(3),
        MouseEventKind::ScrollUp if hit(app.chat_area) => app.scroll_up(3),
        _ => {}
    }
}
