//! Chat transcript rows: wrapped message text plus an optional "Run Code" control.

use std::borrow::Cow;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect, Size},
    style::{Color, Style},
};

use super::{draw_line, point_in_rect, ItemDelegate, Palette, PointerEvent, RowState};
use crate::error::KueResult;
use crate::model::{Message, Role};

pub const MARGIN_X: u16 = 1;
pub const MARGIN_Y: u16 = 0;
pub const MIN_ROW_HEIGHT: u16 = 2;
/// Columns taken from the content rectangle when a message has an action control.
pub const ACTION_RESERVE: u16 = 12;
pub const ACTION_GAP: u16 = 1;
pub const ACTION_WIDTH: u16 = 10;
pub const ACTION_HEIGHT: u16 = 1;
pub const ACTION_LABEL: &str = "Run Code";

/// Receives the message whose action control was pressed.
pub trait ActionCallback {
    fn deliver(&self, msg: &Message) -> KueResult<()>;
}

/// Row geometry shared by painting, measuring and hit-testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatGeometry {
    pub content: Rect,
    pub action: Option<Rect>,
}

impl ChatGeometry {
    pub fn new(bounds: Rect, has_action: bool) -> Self {
        let mut content = inset(bounds, MARGIN_X, MARGIN_Y);
        if !has_action {
            return Self {
                content,
                action: None,
            };
        }

        content.width = content.width.saturating_sub(ACTION_RESERVE);
        let action = Rect::new(
            content.x + content.width + ACTION_GAP,
            content.y,
            ACTION_WIDTH,
            ACTION_HEIGHT,
        )
        .intersection(bounds);

        Self {
            content,
            action: Some(action),
        }
    }

    /// Width the message text is wrapped at.
    pub fn wrap_width(&self) -> u16 {
        self.content.width
    }
}

fn inset(bounds: Rect, dx: u16, dy: u16) -> Rect {
    Rect::new(
        bounds.x + dx.min(bounds.width),
        bounds.y + dy.min(bounds.height),
        bounds.width.saturating_sub(dx * 2),
        bounds.height.saturating_sub(dy * 2),
    )
}

pub fn wrap_text(text: &str, width: u16) -> Vec<Cow<'_, str>> {
    if width == 0 {
        return Vec::new();
    }
    textwrap::wrap(text, width as usize)
}

pub fn alignment_for(role: Role) -> Alignment {
    match role {
        Role::User => Alignment::Right,
        _ => Alignment::Left,
    }
}

pub struct ChatDelegate {
    palette: Palette,
    on_action: Option<Box<dyn ActionCallback>>,
}

impl ChatDelegate {
    pub fn new(palette: Palette) -> Self {
        Self {
            palette,
            on_action: None,
        }
    }

    pub fn with_action(mut self, callback: Box<dyn ActionCallback>) -> Self {
        self.on_action = Some(callback);
        self
    }

    fn text_color(&self, role: Role, state: RowState) -> Color {
        // System shares the default colour with user and assistant.
        match role {
            Role::Error => self.palette.error,
            _ => self.palette.text_for(state),
        }
    }
}

impl ItemDelegate for ChatDelegate {
    type Item = Message;

    fn paint(&self, item: Option<&Message>, area: Rect, buf: &mut Buffer, state: RowState) {
        if state.selected {
            buf.set_style(area, Style::default().bg(self.palette.highlight));
        }

        let Some(msg) = item else {
            return;
        };

        let geometry = ChatGeometry::new(area, msg.has_action());

        if let Some(action) = geometry.action {
            let button_style = Style::default().bg(self.palette.dark).fg(Color::White);
            buf.set_style(action, button_style);
            draw_line(buf, action, ACTION_LABEL, button_style, Alignment::Center);
        }

        let content = geometry.content;
        let lines = wrap_text(msg.text(), geometry.wrap_width());
        let line_count = lines.len().min(u16::MAX as usize) as u16;
        let top = content.y + content.height.saturating_sub(line_count) / 2;
        let style = Style::default().fg(self.text_color(msg.role(), state));
        let alignment = alignment_for(msg.role());

        for (offset, line) in lines.iter().take(content.height as usize).enumerate() {
            let y = top + offset as u16;
            if y >= content.bottom() {
                break;
            }
            let row = Rect::new(content.x, y, content.width, 1);
            draw_line(buf, row, line, style, alignment);
        }
    }

    fn size_hint(&self, item: Option<&Message>, width: u16) -> Size {
        let Some(msg) = item else {
            return Size::new(width, MIN_ROW_HEIGHT);
        };

        let geometry = ChatGeometry::new(Rect::new(0, 0, width, 0), msg.has_action());
        let lines = wrap_text(msg.text(), geometry.wrap_width()).len();
        let lines = lines.min(u16::MAX as usize) as u16;
        let height = lines.saturating_add(MARGIN_Y * 2).max(MIN_ROW_HEIGHT);

        Size::new(width, height)
    }

    fn editor_event(&self, item: &Message, area: Rect, event: PointerEvent) -> KueResult<bool> {
        let PointerEvent::Press { column, row } = event else {
            return Ok(false);
        };
        if !item.has_action() {
            return Ok(false);
        }

        let geometry = ChatGeometry::new(area, true);
        match geometry.action {
            Some(action) if point_in_rect(column, row, action) => {
                if let Some(callback) = &self.on_action {
                    tracing::debug!(role = item.role().label(), "chat action pressed");
                    callback.deliver(item)?;
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
