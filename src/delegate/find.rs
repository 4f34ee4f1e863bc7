//! Find result rows: icon, "dir (opened ...)" line, then bold file name with
//! the location label on the right. Rows are a fixed height; nothing is measured.

use std::path::{Path, PathBuf};

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect, Size},
    style::{Modifier, Style},
    text::Line,
};

use super::{draw_line, point_in_rect, ItemDelegate, Palette, PointerEvent, RowState};
use crate::error::KueResult;
use crate::model::FindResultRow;

/// Two text lines plus the divider.
pub const ROW_HEIGHT: u16 = 3;
pub const ICON_X: u16 = 1;
pub const TEXT_OFFSET: u16 = 4;
pub const RIGHT_MARGIN: u16 = 1;
pub const DIVIDER: &str = "─";

/// Receives the absolute path of a double-clicked result.
pub trait OpenCallback {
    fn open(&self, path: &Path) -> KueResult<()>;
}

pub struct FileResultDelegate {
    palette: Palette,
    home: Option<PathBuf>,
    on_open: Option<Box<dyn OpenCallback>>,
}

impl FileResultDelegate {
    pub fn new(palette: Palette, home: Option<PathBuf>) -> Self {
        Self {
            palette,
            home,
            on_open: None,
        }
    }

    pub fn with_open(mut self, callback: Box<dyn OpenCallback>) -> Self {
        self.on_open = Some(callback);
        self
    }

    /// Same path a double-click would hand to the open callback.
    pub fn open_row(&self, item: &FindResultRow) -> KueResult<bool> {
        let Some(callback) = &self.on_open else {
            return Ok(false);
        };
        let path = item.resolved_path(self.home.as_deref());
        tracing::info!(path = %path.display(), "opening find result");
        callback.open(&path)?;
        Ok(true)
    }
}

/// Row rectangles: (text area top half, bottom half, divider row).
fn split_row(area: Rect) -> (Rect, Rect, Option<Rect>) {
    let text_height = area.height.saturating_sub(1);
    let top_height = text_height.div_ceil(2);
    let top = Rect::new(area.x, area.y, area.width, top_height);
    let bottom = Rect::new(area.x, area.y + top_height, area.width, text_height - top_height);
    let divider = (area.height > 0).then(|| Rect::new(area.x, area.bottom() - 1, area.width, 1));
    (top, bottom, divider)
}

/// The centre row of `half`, indented past the icon.
fn text_row(half: Rect) -> Option<Rect> {
    if half.height == 0 {
        return None;
    }
    let x = half.x + TEXT_OFFSET.min(half.width);
    let width = half.width.saturating_sub(TEXT_OFFSET + RIGHT_MARGIN);
    Some(Rect::new(x, half.y + (half.height - 1) / 2, width, 1))
}

impl ItemDelegate for FileResultDelegate {
    type Item = FindResultRow;

    fn paint(&self, item: Option<&FindResultRow>, area: Rect, buf: &mut Buffer, state: RowState) {
        if state.selected {
            buf.set_style(area, Style::default().bg(self.palette.highlight));
        }

        let (top, bottom, divider) = split_row(area);
        if let Some(divider) = divider {
            let rule = DIVIDER.repeat(divider.width as usize);
            buf.set_string(divider.x, divider.y, rule, Style::default().fg(self.palette.dark));
        }

        let Some(row) = item else {
            return;
        };

        let text = Style::default().fg(self.palette.text_for(state));

        let icon_y = area.y + top.height.saturating_add(bottom.height).saturating_sub(1) / 2;
        if area.width > ICON_X && area.height > 0 {
            buf.set_string(area.x + ICON_X, icon_y, row.icon().glyph(), text);
        }

        if let Some(line) = text_row(top) {
            let heading = format!("{} (opened {})", row.directory(), row.access_time());
            draw_line(buf, line, &heading, text, Alignment::Left);
        }

        if let Some(line) = text_row(bottom) {
            draw_line(
                buf,
                line,
                row.file_name(),
                text.add_modifier(Modifier::BOLD),
                Alignment::Left,
            );
            let location = Style::default().fg(Palette::lighter(self.palette.text_for(state)));
            let label = row.location_label();
            let label_width = (Line::raw(label).width() as u16).min(line.width);
            let label_area = Rect::new(line.right() - label_width, line.y, label_width, 1);
            draw_line(buf, label_area, label, location, Alignment::Right);
        }
    }

    fn size_hint(&self, _item: Option<&FindResultRow>, width: u16) -> Size {
        Size::new(width, ROW_HEIGHT)
    }

    fn editor_event(
        &self,
        item: &FindResultRow,
        area: Rect,
        event: PointerEvent,
    ) -> KueResult<bool> {
        match event {
            PointerEvent::DoubleClick { column, row } if point_in_rect(column, row, area) => {
                self.open_row(item)
            }
            _ => Ok(false),
        }
    }
}
