//! A virtualized list whose rows are laid out, painted and hit-tested by an
//! [`ItemDelegate`].
//!
//! Only rows that intersect the viewport are measured and painted. Each row is
//! painted at its full size-hint height into a scratch buffer and then copied
//! into the viewport, so a row cut off at either edge looks exactly like the
//! same part of the row fully shown.
//!
//! The scroll position is a row index plus a number of lines of that row
//! hidden above the viewport, so rows taller than the viewport can be read to
//! the end. Rows are laid out in "row space": screen coordinates moved down by
//! the hidden line count. Delegates paint and hit-test in row space, and
//! [`ListViewState::hit`] translates pointer positions into it.

use ratatui::{buffer::Buffer, layout::Rect};

use crate::delegate::{point_in_rect, ItemDelegate, PointerEvent, RowState};

#[derive(Debug, Clone, Default)]
pub struct ListViewState {
    offset: usize,
    skip: u16,
    pending: isize,
    selected: Option<usize>,
    reveal_selected: bool,
    follow_tail: bool,
    viewport: Option<Rect>,
    rows: Vec<(usize, Rect)>,
}

impl ListViewState {
    /// A list that keeps its newest row in view (chat transcript).
    pub fn following() -> Self {
        Self {
            follow_tail: true,
            ..Self::default()
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// First visible row and how many of its lines are above the viewport.
    #[cfg(test)]
    pub fn position(&self) -> (usize, u16) {
        (self.offset, self.skip)
    }

    /// Select without scrolling, as a click does. The row is already on screen.
    pub fn select(&mut self, index: Option<usize>) {
        self.selected = index;
        if index.is_some() {
            self.follow_tail = false;
        }
    }

    /// Forget selection, scroll and the last layout. Used when the rows are replaced wholesale.
    pub fn reset(&mut self) {
        self.offset = 0;
        self.skip = 0;
        self.pending = 0;
        self.selected = None;
        self.reveal_selected = false;
        self.rows.clear();
    }

    pub fn scroll_to_bottom(&mut self) {
        self.follow_tail = true;
    }

    pub fn is_following(&self) -> bool {
        self.follow_tail
    }

    /// Scroll by terminal lines. Applied at the next render, where row heights are known.
    pub fn scroll_up(&mut self, lines: usize) {
        self.follow_tail = false;
        self.pending = self.pending.saturating_sub_unsigned(lines);
    }

    /// Scrolling down to the last line turns tail following back on.
    pub fn scroll_down(&mut self, lines: usize) {
        self.pending = self.pending.saturating_add_unsigned(lines);
    }

    pub fn select_next(&mut self, len: usize) {
        if len == 0 {
            self.selected = None;
            return;
        }
        let next = match self.selected {
            Some(i) if i + 1 < len => i + 1,
            Some(i) => i,
            None => 0,
        };
        self.select(Some(next));
        self.reveal_selected = true;
    }

    pub fn select_prev(&mut self, len: usize) {
        if len == 0 {
            self.selected = None;
            return;
        }
        let prev = match self.selected {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.select(Some(prev));
        self.reveal_selected = true;
    }

    /// Rows laid out by the last render, with their full rectangles in row space.
    #[cfg(test)]
    pub fn visible_rows(&self) -> &[(usize, Rect)] {
        &self.rows
    }

    /// The row under a pointer event, its rectangle, and the event moved into row space.
    pub fn hit(&self, event: PointerEvent) -> Option<(usize, Rect, PointerEvent)> {
        let viewport = self.viewport?;
        let (column, row) = event.position();
        if !point_in_rect(column, row, viewport) {
            return None;
        }
        let row = row.saturating_add(self.skip);
        self.rows
            .iter()
            .copied()
            .find(|(_, rect)| point_in_rect(column, row, *rect))
            .map(|(index, rect)| (index, rect, event.moved_to(column, row)))
    }
}

/// Position that puts the last line of the last row on the bottom line.
fn tail_position(height_of: &dyn Fn(usize) -> u16, len: usize, view: u16) -> (usize, u16) {
    let mut used: u32 = 0;
    let mut start = len;
    while start > 0 {
        start -= 1;
        used += height_of(start) as u32;
        if used >= view as u32 {
            return (start, (used - view as u32) as u16);
        }
    }
    (0, 0)
}

fn clamp_position(
    height_of: &dyn Fn(usize) -> u16,
    len: usize,
    (offset, skip): (usize, u16),
) -> (usize, u16) {
    if offset >= len {
        return (len - 1, 0);
    }
    (offset, skip.min(height_of(offset).saturating_sub(1)))
}

fn scroll_by(
    height_of: &dyn Fn(usize) -> u16,
    len: usize,
    (mut offset, mut skip): (usize, u16),
    delta: isize,
) -> (usize, u16) {
    let mut lines = delta.unsigned_abs();
    if delta > 0 {
        while lines > 0 {
            let height = height_of(offset) as usize;
            let remaining = height.saturating_sub(skip as usize);
            if lines < remaining {
                skip += lines as u16;
                break;
            }
            if offset + 1 >= len {
                skip = height.saturating_sub(1) as u16;
                break;
            }
            lines -= remaining;
            offset += 1;
            skip = 0;
        }
    } else {
        while lines > 0 {
            if skip > 0 {
                let step = lines.min(skip as usize);
                skip -= step as u16;
                lines -= step;
            } else if offset > 0 {
                offset -= 1;
                skip = height_of(offset);
            } else {
                break;
            }
        }
    }
    (offset, skip)
}

/// Smallest position change that brings `selected` fully on screen.
fn position_for_selection(
    height_of: &dyn Fn(usize) -> u16,
    view: u16,
    (mut offset, mut skip): (usize, u16),
    selected: usize,
) -> (usize, u16) {
    if selected < offset || (selected == offset && skip > 0) {
        return (selected, 0);
    }
    loop {
        let used: u32 = (offset..=selected).map(|i| height_of(i) as u32).sum::<u32>() - skip as u32;
        if used <= view as u32 || offset == selected {
            return (offset, skip);
        }
        offset += 1;
        skip = 0;
    }
}

pub fn render<D: ItemDelegate>(
    delegate: &D,
    items: &[D::Item],
    area: Rect,
    buf: &mut Buffer,
    state: &mut ListViewState,
) {
    state.viewport = Some(area);
    state.rows.clear();
    let pending = std::mem::take(&mut state.pending);
    let reveal = std::mem::take(&mut state.reveal_selected);

    if area.width == 0 || area.height == 0 || items.is_empty() {
        state.offset = 0;
        state.skip = 0;
        return;
    }

    if let Some(selected) = state.selected {
        if selected >= items.len() {
            state.selected = Some(items.len() - 1);
        }
    }

    let width = area.width;
    let height_of = |i: usize| delegate.size_hint(items.get(i), width).height;
    let tail = tail_position(&height_of, items.len(), area.height);

    let position = if state.follow_tail {
        tail
    } else if let (true, Some(selected)) = (reveal, state.selected) {
        position_for_selection(&height_of, area.height, (state.offset, state.skip), selected)
    } else {
        let current = clamp_position(&height_of, items.len(), (state.offset, state.skip));
        let moved = scroll_by(&height_of, items.len(), current, pending);
        if pending > 0 && moved >= tail {
            state.follow_tail = true;
        }
        moved
    };
    let (offset, skip) = position.min(tail);
    state.offset = offset;
    state.skip = skip;

    // The viewport in row space.
    let window = Rect::new(area.x, area.y.saturating_add(skip), area.width, area.height);
    let mut top = area.y;
    for (index, item) in items.iter().enumerate().skip(offset) {
        if top >= window.bottom() {
            break;
        }
        let height = height_of(index);
        let row = Rect::new(area.x, top, width, height);
        let row_state = RowState {
            selected: state.selected == Some(index),
        };

        let mut scratch = Buffer::empty(row);
        delegate.paint(Some(item), row, &mut scratch, row_state);
        blit(&scratch, buf, row.intersection(window), skip);

        state.rows.push((index, row));
        top = top.saturating_add(height);
    }
}

/// Copy `clip` (row space) from `src` to `dst`, `shift` lines higher.
fn blit(src: &Buffer, dst: &mut Buffer, clip: Rect, shift: u16) {
    for y in clip.top()..clip.bottom() {
        let Some(dst_y) = y.checked_sub(shift) else {
            continue;
        };
        for x in clip.left()..clip.right() {
            if !point_in_rect(x, dst_y, dst.area) {
                continue;
            }
            let cell = src.content[src.index_of(x, y)].clone();
            let idx = dst.index_of(x, dst_y);
            dst.content[idx] = cell;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KueResult;
    use ratatui::layout::Size;

    /// Rows are as tall as their number and paint their index digit in every cell.
    struct Tall;

    impl ItemDelegate for Tall {
        type Item = u16;

        fn paint(&self, item: Option<&u16>, area: Rect, buf: &mut Buffer, state: RowState) {
            let Some(n) = item else { return };
            let symbol = if state.selected { "*".to_string() } else { n.to_string() };
            for y in area.top()..area.bottom() {
                for x in area.left()..area.right() {
                    let idx = buf.index_of(x, y);
                    buf.content[idx].set_symbol(&symbol);
                }
            }
            // Mark the top line of each row so clipping is visible.
            let idx = buf.index_of(area.x, area.y);
            buf.content[idx].set_symbol("^");
        }

        fn size_hint(&self, item: Option<&u16>, width: u16) -> Size {
            Size::new(width, item.copied().unwrap_or(1))
        }

        fn editor_event(&self, _item: &u16, _area: Rect, _event: PointerEvent) -> KueResult<bool> {
            Ok(false)
        }
    }

    fn column(buf: &Buffer, x: u16) -> String {
        (buf.area.top()..buf.area.bottom())
            .map(|y| buf.content[buf.index_of(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn test_variable_height_layout() {
        let items = [1u16, 2, 3];
        let area = Rect::new(0, 0, 2, 6);
        let mut buf = Buffer::empty(area);
        let mut state = ListViewState::default();
        render(&Tall, &items, area, &mut buf, &mut state);

        assert_eq!(column(&buf, 1), "122333");
        assert_eq!(column(&buf, 0), "^^2^33");
        assert_eq!(
            state.visible_rows(),
            [
                (0, Rect::new(0, 0, 2, 1)),
                (1, Rect::new(0, 1, 2, 2)),
                (2, Rect::new(0, 3, 2, 3)),
            ]
        );
    }

    #[test]
    fn test_clipped_row_keeps_full_rect() {
        let items = [2u16, 3];
        let area = Rect::new(0, 0, 1, 4);
        let mut buf = Buffer::empty(area);
        let mut state = ListViewState::default();
        render(&Tall, &items, area, &mut buf, &mut state);

        assert_eq!(column(&buf, 0), "^2^3");
        assert_eq!(state.visible_rows()[1], (1, Rect::new(0, 2, 1, 3)));
        assert_eq!(
            state.hit(press(0, 3)),
            Some((1, Rect::new(0, 2, 1, 3), press(0, 3)))
        );
        assert_eq!(state.hit(press(0, 4)), None);
    }

    #[test]
    fn test_follow_tail_shows_last_rows() {
        let items = [3u16, 3, 2, 1];
        let area = Rect::new(0, 0, 1, 3);
        let mut buf = Buffer::empty(area);
        let mut state = ListViewState::following();
        render(&Tall, &items, area, &mut buf, &mut state);

        assert_eq!(state.position(), (2, 0));
        assert_eq!(column(&buf, 0), "^2^");
    }

    #[test]
    fn test_follow_tail_with_oversized_last_row() {
        let items = [1u16, 5];
        let area = Rect::new(0, 0, 1, 3);
        let mut buf = Buffer::empty(area);
        let mut state = ListViewState::following();
        render(&Tall, &items, area, &mut buf, &mut state);
        assert_eq!(state.position(), (1, 2));
        assert_eq!(column(&buf, 0), "555");
    }

    #[test]
    fn test_selection_scrolls_into_view() {
        let items = [2u16, 2, 2, 2];
        let area = Rect::new(0, 0, 1, 4);
        let mut buf = Buffer::empty(area);
        let mut state = ListViewState::default();
        for _ in 0..4 {
            state.select_next(items.len());
        }
        render(&Tall, &items, area, &mut buf, &mut state);

        assert_eq!(state.position(), (2, 0));
        assert_eq!(column(&buf, 0), "^2^*");

        state.select_prev(items.len());
        state.select_prev(items.len());
        state.select_prev(items.len());
        let mut buf = Buffer::empty(area);
        render(&Tall, &items, area, &mut buf, &mut state);
        assert_eq!(state.selected(), Some(0));
        assert_eq!(state.position(), (0, 0));
    }

    #[test]
    fn test_hit_outside_viewport() {
        let items = [1u16];
        let area = Rect::new(5, 5, 3, 3);
        let mut buf = Buffer::empty(area);
        let mut state = ListViewState::default();
        render(&Tall, &items, area, &mut buf, &mut state);

        assert_eq!(
            state.hit(press(5, 5)),
            Some((0, Rect::new(5, 5, 3, 1), press(5, 5)))
        );
        assert_eq!(state.hit(press(5, 6)), None);
        assert_eq!(state.hit(press(0, 0)), None);
    }

    #[test]
    fn test_reset_clears_layout() {
        let items = [1u16, 1];
        let area = Rect::new(0, 0, 1, 2);
        let mut buf = Buffer::empty(area);
        let mut state = ListViewState::default();
        state.select(Some(1));
        render(&Tall, &items, area, &mut buf, &mut state);
        assert!(!state.visible_rows().is_empty());

        state.reset();
        assert_eq!(state.selected(), None);
        assert!(state.visible_rows().is_empty());
        assert_eq!(state.hit(press(0, 0)), None);
    }

    /// Paints each line of a row with its line number (mod 10).
    struct Numbered;

    impl ItemDelegate for Numbered {
        type Item = u16;

        fn paint(&self, item: Option<&u16>, area: Rect, buf: &mut Buffer, _state: RowState) {
            if item.is_none() {
                return;
            }
            for (line, y) in (area.top()..area.bottom()).enumerate() {
                let idx = buf.index_of(area.x, y);
                buf.content[idx].set_symbol(&(line % 10).to_string());
            }
        }

        fn size_hint(&self, item: Option<&u16>, width: u16) -> Size {
            Size::new(width, item.copied().unwrap_or(1))
        }

        fn editor_event(&self, _item: &u16, _area: Rect, _event: PointerEvent) -> KueResult<bool> {
            Ok(false)
        }
    }

    fn press(column: u16, row: u16) -> PointerEvent {
        PointerEvent::Press { column, row }
    }

    fn draw<D: ItemDelegate>(
        delegate: &D,
        items: &[D::Item],
        area: Rect,
        state: &mut ListViewState,
    ) -> Buffer {
        let mut buf = Buffer::empty(area);
        render(delegate, items, area, &mut buf, state);
        buf
    }

    #[test]
    fn test_tall_row_end_reachable() {
        let items = [1u16, 12];
        let area = Rect::new(0, 0, 1, 4);
        let mut state = ListViewState::following();

        // Following: the last four lines of the tall row
        assert_eq!(column(&draw(&Numbered, &items, area, &mut state), 0), "8901");
        assert_eq!(state.position(), (1, 8));

        state.scroll_up(100);
        assert_eq!(column(&draw(&Numbered, &items, area, &mut state), 0), "0012");
        assert_eq!(state.position(), (0, 0));
        assert!(!state.is_following());

        state.scroll_down(3);
        assert_eq!(column(&draw(&Numbered, &items, area, &mut state), 0), "2345");
        assert_eq!(state.position(), (1, 2));

        state.scroll_down(6);
        assert_eq!(column(&draw(&Numbered, &items, area, &mut state), 0), "8901");
        assert!(state.is_following());
    }

    #[test]
    fn test_line_scroll_stops_at_both_ends() {
        let items = [12u16];
        let area = Rect::new(0, 0, 1, 4);
        let mut state = ListViewState::default();

        state.scroll_down(50);
        assert_eq!(column(&draw(&Numbered, &items, area, &mut state), 0), "8901");
        assert_eq!(state.position(), (0, 8));

        state.scroll_up(1);
        assert_eq!(column(&draw(&Numbered, &items, area, &mut state), 0), "7890");

        state.scroll_up(50);
        assert_eq!(column(&draw(&Numbered, &items, area, &mut state), 0), "0123");
    }

    #[test]
    fn test_hit_in_scrolled_row_uses_row_space() {
        let items = [1u16, 12];
        let area = Rect::new(0, 2, 1, 4);
        let mut state = ListViewState::following();
        let _ = draw(&Numbered, &items, area, &mut state);

        // Screen line 2 shows line 8 of the tall row, laid out from y = 2.
        assert_eq!(
            state.hit(press(0, 2)),
            Some((1, Rect::new(0, 2, 1, 12), press(0, 10)))
        );
        assert_eq!(
            state.hit(press(0, 5)),
            Some((1, Rect::new(0, 2, 1, 12), press(0, 13)))
        );
        assert_eq!(state.hit(press(0, 6)), None);
    }

    #[test]
    fn test_scroll_down_reenables_follow() {
        let items = [2u16, 2, 2, 2];
        let area = Rect::new(0, 0, 1, 4);
        let mut state = ListViewState::following();
        let _ = draw(&Tall, &items, area, &mut state);
        assert_eq!(state.position(), (2, 0));

        state.scroll_up(3);
        assert!(!state.is_following());
        let _ = draw(&Tall, &items, area, &mut state);
        assert_eq!(state.position(), (0, 1));

        state.scroll_down(10);
        let _ = draw(&Tall, &items, area, &mut state);
        assert_eq!(state.position(), (2, 0));
        assert!(state.is_following());
    }

    #[test]
    fn test_click_select_keeps_position() {
        let items = [1u16, 12];
        let area = Rect::new(0, 0, 1, 4);
        let mut state = ListViewState::following();
        let _ = draw(&Numbered, &items, area, &mut state);

        state.select(Some(1));
        let _ = draw(&Numbered, &items, area, &mut state);
        assert_eq!(state.position(), (1, 8));
        assert!(!state.is_following());
    }
}
