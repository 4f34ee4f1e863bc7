use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use crate::app::{App, View};
use crate::delegate::{point_in_rect, PointerEvent};
use crate::tui::AppEvent;

/// Two presses on the same cell within this window make a double-click.
pub const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(400);
/// Lines moved by PageUp/PageDown in the chat transcript.
const PAGE_LINES: usize = 10;

/// Terminals only report presses; double-clicks are recognised here.
#[derive(Debug, Default)]
pub struct ClickTracker {
    last: Option<(Instant, u16, u16)>,
}

impl ClickTracker {
    pub fn press(&mut self, column: u16, row: u16, at: Instant) -> PointerEvent {
        let double = matches!(
            self.last,
            Some((when, c, r)) if c == column && r == row && at.duration_since(when) <= DOUBLE_CLICK_WINDOW
        );
        if double {
            // A third press starts over.
            self.last = None;
            PointerEvent::DoubleClick { column, row }
        } else {
            self.last = Some((at, column, row));
            PointerEvent::Press { column, row }
        }
    }
}

pub fn handle_event(app: &mut App, clicks: &mut ClickTracker, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, clicks, mouse, Instant::now()),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }
    app.poll_transport();
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => app.should_quit = true,
            KeyCode::Char('o') => app.open_selected_result(),
            KeyCode::Char('l') => app.clear_transcript(),
            KeyCode::Char('u') => app.clear_input(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Esc => {
            if app.input.is_empty() {
                app.should_quit = true;
            } else {
                app.clear_input();
            }
        }
        KeyCode::Enter => app.submit(),
        KeyCode::Up => {
            if app.input.is_empty() {
                app.recall_last_user_message();
            } else if app.view == View::Find {
                app.find_state.select_prev(app.find_results.len());
            }
        }
        KeyCode::Down => match app.view {
            View::Find => app.find_state.select_next(app.find_results.len()),
            View::Chat => app.chat_state.scroll_down(1),
        },
        KeyCode::PageUp => app.chat_state.scroll_up(PAGE_LINES),
        KeyCode::PageDown => app.chat_state.scroll_down(PAGE_LINES),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

fn handle_mouse(app: &mut App, clicks: &mut ClickTracker, mouse: MouseEvent, at: Instant) {
    let x = mouse.column;
    let y = mouse.row;

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let on_enter = app
                .enter_button_area
                .map(|r| point_in_rect(x, y, r))
                .unwrap_or(false);
            if on_enter {
                app.submit();
                return;
            }
            let event = clicks.press(x, y, at);
            app.handle_pointer(event);
        }
        MouseEventKind::ScrollDown => match app.view {
            View::Chat => app.chat_state.scroll_down(1),
            View::Find => app.find_state.select_next(app.find_results.len()),
        },
        MouseEventKind::ScrollUp => match app.view {
            View::Chat => app.chat_state.scroll_up(1),
            View::Find => app.find_state.select_prev(app.find_results.len()),
        },
        _ => {}
    }
}
