//! Item delegates: per-row painters and hit-testers for the panel lists.
//!
//! A delegate never owns row data. Every call gets the record, the row's
//! screen rectangle and the row state, so painting the same record twice
//! produces the same cells. The only thing a delegate holds is the callback
//! it was built with.

pub mod chat;
pub mod find;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect, Size},
    style::{Color, Style},
    text::Line,
    widgets::Widget,
};

use crate::error::KueResult;

pub use chat::ChatDelegate;
pub use find::FileResultDelegate;

/// Per-row state the list view passes in on every paint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowState {
    pub selected: bool,
}

/// Primary-button pointer events routed to a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Press { column: u16, row: u16 },
    DoubleClick { column: u16, row: u16 },
}

impl PointerEvent {
    pub fn position(&self) -> (u16, u16) {
        match *self {
            PointerEvent::Press { column, row } | PointerEvent::DoubleClick { column, row } => {
                (column, row)
            }
        }
    }

    /// The same kind of event at another position.
    pub fn moved_to(self, column: u16, row: u16) -> Self {
        match self {
            PointerEvent::Press { .. } => PointerEvent::Press { column, row },
            PointerEvent::DoubleClick { .. } => PointerEvent::DoubleClick { column, row },
        }
    }
}

pub trait ItemDelegate {
    type Item;

    /// Draw one row. `None` means the record is missing; draw a blank row.
    fn paint(&self, item: Option<&Self::Item>, area: Rect, buf: &mut Buffer, state: RowState);

    /// Preferred size of the row when laid out at `width` columns.
    fn size_hint(&self, item: Option<&Self::Item>, width: u16) -> Size;

    /// Offer a pointer event to the row. `Ok(true)` consumes it.
    fn editor_event(&self, item: &Self::Item, area: Rect, event: PointerEvent) -> KueResult<bool>;
}

/// Colour roles, named after the host palette the delegates were designed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub text: Color,
    pub highlight: Color,
    pub highlighted_text: Color,
    pub dark: Color,
    pub error: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            text: Color::Reset,
            highlight: Color::Blue,
            highlighted_text: Color::White,
            dark: Color::DarkGray,
            error: Color::Red,
        }
    }
}

impl Palette {
    pub fn text_for(&self, state: RowState) -> Color {
        if state.selected {
            self.highlighted_text
        } else {
            self.text
        }
    }

    /// A lighter tint of `color`: 150% for RGB, the next brighter named colour otherwise.
    pub fn lighter(color: Color) -> Color {
        match color {
            Color::Rgb(r, g, b) => {
                let up = |c: u8| ((c as u16 * 3 / 2).min(255)) as u8;
                Color::Rgb(up(r), up(g), up(b))
            }
            Color::Reset => Color::Gray,
            Color::Black => Color::DarkGray,
            Color::DarkGray => Color::Gray,
            Color::Gray => Color::White,
            Color::Red => Color::LightRed,
            Color::Green => Color::LightGreen,
            Color::Yellow => Color::LightYellow,
            Color::Blue => Color::LightBlue,
            Color::Magenta => Color::LightMagenta,
            Color::Cyan => Color::LightCyan,
            other => other,
        }
    }
}

/// Check if a point is within a rectangle
pub fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

/// Render a single line of text into a one-row rectangle.
fn draw_line(buf: &mut Buffer, area: Rect, text: &str, style: Style, alignment: Alignment) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let row = Rect { height: 1, ..area };
    Line::styled(text.to_string(), style)
        .alignment(alignment)
        .render(row, buf);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lighter_rgb_saturates() {
        assert_eq!(
            Palette::lighter(Color::Rgb(100, 200, 20)),
            Color::Rgb(150, 255, 30)
        );
    }

    #[test]
    fn test_lighter_named() {
        assert_eq!(Palette::lighter(Color::Black), Color::DarkGray);
        assert_eq!(Palette::lighter(Color::Red), Color::LightRed);
        assert_eq!(Palette::lighter(Color::White), Color::White);
    }

    #[test]
    fn test_point_in_rect_edges() {
        let rect = Rect::new(2, 3, 4, 2);
        assert!(point_in_rect(2, 3, rect));
        assert!(point_in_rect(5, 4, rect));
        assert!(!point_in_rect(6, 4, rect));
        assert!(!point_in_rect(5, 5, rect));
        assert!(!point_in_rect(1, 3, rect));
    }
}
