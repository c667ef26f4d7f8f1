use core_text::{Mark, TextSource, EPOS};

use crate::cell::CellFlags;
use crate::event::UiBackend;
use crate::register::Register;
use crate::view::View;
use crate::viewport::ScrollPolicy;

/// One cursor (spec §3): a mark plus the cached grid projection of that
/// mark, the remembered column for vertical motion, and at most one owned
/// selection.
#[derive(Debug, Clone)]
pub struct Cursor {
    pub pos: usize,
    pub row: usize,
    pub col: usize,
    pub lastcol: usize,
    pub mark: Mark,
    pub sel: Option<usize>,
    pub lastsel_anchor: usize,
    pub lastsel_cursor: usize,
    pub register: Register,
}

impl Cursor {
    fn new(mark: Mark) -> Self {
        Self {
            pos: 0,
            row: 0,
            col: 0,
            lastcol: 0,
            mark,
            sel: None,
            lastsel_anchor: EPOS,
            lastsel_cursor: EPOS,
            register: Register::default(),
        }
    }
}

/// The view's cursor population, arena-indexed so disposal never
/// invalidates other cursors' handles (spec §9 design note: "arena +
/// indices is a clean fit").
pub struct CursorSet {
    cursors: Vec<Option<Cursor>>,
    primary: usize,
}

impl CursorSet {
    pub(crate) fn new_with_primary(mark: Mark) -> Self {
        Self {
            cursors: vec![Some(Cursor::new(mark))],
            primary: 0,
        }
    }

    pub(crate) fn new_cursor(&mut self, mark: Mark, pos: usize) -> usize {
        let mut c = Cursor::new(mark);
        c.pos = pos;
        for (i, slot) in self.cursors.iter_mut().enumerate() {
            if slot.is_none() {
                *slot = Some(c);
                self.primary = i;
                return i;
            }
        }
        self.cursors.push(Some(c));
        self.primary = self.cursors.len() - 1;
        self.primary
    }

    /// No-op if `idx` is the last remaining cursor (the view always keeps
    /// at least one). Returns the selection index the cursor owned, if
    /// any, so the caller can free it.
    pub(crate) fn dispose(&mut self, idx: usize) -> Option<usize> {
        let alive = self.cursors.iter().filter(|c| c.is_some()).count();
        if alive <= 1 || self.cursors.get(idx).map(|c| c.is_none()).unwrap_or(true) {
            return None;
        }
        let sel = self.cursors[idx].take().and_then(|c| c.sel);
        if idx == self.primary {
            self.primary = self
                .next_alive(idx)
                .or_else(|| self.prev_alive(idx))
                .unwrap_or(0);
        }
        sel
    }

    fn next_alive(&self, from: usize) -> Option<usize> {
        (from + 1..self.cursors.len()).find(|&i| self.cursors[i].is_some())
    }

    fn prev_alive(&self, from: usize) -> Option<usize> {
        (0..from).rev().find(|&i| self.cursors[i].is_some())
    }

    pub fn primary(&self) -> usize {
        self.primary
    }

    pub fn get(&self, idx: usize) -> Option<&Cursor> {
        self.cursors.get(idx).and_then(|c| c.as_ref())
    }

    pub(crate) fn get_mut(&mut self, idx: usize) -> Option<&mut Cursor> {
        self.cursors.get_mut(idx).and_then(|c| c.as_mut())
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Cursor)> {
        self.cursors
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.as_ref().map(|c| (i, c)))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut Cursor)> {
        self.cursors
            .iter_mut()
            .enumerate()
            .filter_map(|(i, c)| c.as_mut().map(|c| (i, c)))
    }
}

impl<T: TextSource, U: UiBackend> View<T, U> {
    /// `cursors_new`: allocate a cursor at the primary cursor's current
    /// position and make it primary.
    pub fn cursors_new(&mut self) -> usize {
        let pos = self
            .cursors
            .get(self.cursors.primary())
            .map(|c| c.pos)
            .unwrap_or(0);
        let mark = self.text.mark_set(pos);
        self.cursors.new_cursor(mark, pos)
    }

    /// `cursors_dispose`: free `cidx` and its owning selection, unless it
    /// is the last cursor left.
    pub fn cursors_dispose(&mut self, cidx: usize) {
        if let Some(sidx) = self.cursors.dispose(cidx) {
            self.free_selection_and_scan(sidx);
        }
    }

    /// `cursor_to`: the single write point for cursor position. Rebinds
    /// the mark, updates the owning selection's orientation, projects onto
    /// the grid, and redraws.
    pub fn cursor_to(&mut self, cidx: usize, new_pos: usize) {
        let new_pos = new_pos.min(self.text.size());
        let old_pos = match self.cursors.get(cidx) {
            Some(c) => c.pos,
            None => return,
        };
        let mark = self.text.mark_set(new_pos);
        if let Some(c) = self.cursors.get_mut(cidx) {
            c.mark = mark;
            c.pos = new_pos;
            if new_pos != old_pos {
                c.lastcol = 0;
            }
        }
        if let Some(sidx) = self.cursors.get(cidx).and_then(|c| c.sel) {
            self.apply_orientation_flip(sidx, new_pos);
        }
        self.draw();
    }

    /// `cursors_to`: the viewport-aware wrapper around `cursor_to`.
    pub fn cursors_to(&mut self, cidx: usize, pos: usize) {
        let pos = pos.min(self.text.size());
        if cidx == self.cursors.primary() {
            let showed_eof = self.end >= self.text.size();
            if pos < self.start || pos >= self.end {
                let line_begin = self.text.line_begin(pos);
                self.set_start_and_redraw(line_begin);
                if pos < self.start || pos >= self.end {
                    self.set_start_and_redraw(pos);
                }
            }
            if pos == self.text.size()
                && !showed_eof
                && self.options.scroll_policy == ScrollPolicy::CenterOnAppend
            {
                self.cursor_to(cidx, pos);
                self.redraw_center(cidx);
                return;
            }
        }
        self.cursor_to(cidx, pos);
    }

    /// `cursors_scroll_to`: step the viewport one row at a time until
    /// `pos` is in range, then `cursors_to`.
    pub fn cursors_scroll_to(&mut self, cidx: usize, pos: usize) {
        let pos = pos.min(self.text.size());
        let mut guard = self.text.size() + 1;
        while (pos < self.start || pos >= self.end) && guard > 0 {
            guard -= 1;
            let moved = if pos < self.start {
                self.viewport_up(1)
            } else {
                self.viewport_down(1)
            };
            if !moved {
                break;
            }
        }
        self.cursors_to(cidx, pos);
    }

    /// `cursor_set(row, col)`: the sole screen -> text coordinate mapper.
    /// `row` is relative to `topline` (always grid row `row`).
    pub fn cursor_set(&mut self, cidx: usize, row: usize, col: usize) -> bool {
        if row >= self.grid.height() {
            return false;
        }
        let mut pos = self.start;
        for r in 0..row {
            pos += self.grid.lines[r].len;
        }
        let width = self.grid.width();
        if width == 0 {
            return false;
        }
        let mut c = col.min(width - 1);
        let cell = *self.grid.cell(row, c);
        if cell.len == 0 {
            if cell.flags.contains(CellFlags::TAB) {
                while c + 1 < width && self.grid.cell(row, c).len == 0 {
                    c += 1;
                }
            } else {
                while c > 0 && self.grid.cell(row, c).len == 0 {
                    c -= 1;
                }
            }
        }
        for k in 0..c {
            pos += self.grid.cell(row, k).len as usize;
        }
        self.cursor_to(cidx, pos);
        true
    }

    /// `screenline_down`/`screenline_up`: move within the screen-line
    /// chain, scrolling by one row first if there is no neighbor.
    pub fn screenline_down(&mut self, cidx: usize) -> bool {
        let (row, lastcol) = match self.cursors.get(cidx) {
            Some(c) => (
                c.row,
                if c.lastcol > 0 { c.lastcol } else { c.col },
            ),
            None => return false,
        };
        let target_row = match self.grid.next_row(row) {
            Some(r) => r,
            None => {
                if !self.viewport_down(1) {
                    return false;
                }
                self.bottomline().min(self.lastline)
            }
        };
        self.cursor_set(cidx, target_row, lastcol);
        if let Some(c) = self.cursors.get_mut(cidx) {
            c.lastcol = lastcol;
        }
        true
    }

    pub fn screenline_up(&mut self, cidx: usize) -> bool {
        let (row, lastcol) = match self.cursors.get(cidx) {
            Some(c) => (
                c.row,
                if c.lastcol > 0 { c.lastcol } else { c.col },
            ),
            None => return false,
        };
        let target_row = match self.grid.prev_row(row) {
            Some(r) => r,
            None => {
                if !self.viewport_up(1) {
                    return false;
                }
                0
            }
        };
        self.cursor_set(cidx, target_row, lastcol);
        if let Some(c) = self.cursors.get_mut(cidx) {
            c.lastcol = lastcol;
        }
        true
    }

    /// `line_down`/`line_up`: logical-line motion, delegating to the
    /// screen-line primitives when the neighbor row is a soft-wrap
    /// continuation of the same logical line.
    pub fn line_down(&mut self, cidx: usize) -> bool {
        let row = match self.cursors.get(cidx) {
            Some(c) => c.row,
            None => return false,
        };
        if let Some(next_row) = self.grid.next_row(row) {
            if self.grid.lines[next_row].lineno == self.grid.lines[row].lineno {
                return self.screenline_down(cidx);
            }
        }
        let pos = self.cursors.get(cidx).map(|c| c.pos).unwrap_or(0);
        let target = self.text.line_down(pos);
        if target == EPOS {
            return false;
        }
        self.cursors_to(cidx, target);
        true
    }

    pub fn line_up(&mut self, cidx: usize) -> bool {
        let row = match self.cursors.get(cidx) {
            Some(c) => c.row,
            None => return false,
        };
        if let Some(prev_row) = self.grid.prev_row(row) {
            if self.grid.lines[prev_row].lineno == self.grid.lines[row].lineno {
                return self.screenline_up(cidx);
            }
        }
        let pos = self.cursors.get(cidx).map(|c| c.pos).unwrap_or(0);
        let target = self.text.line_up(pos);
        if target == EPOS {
            return false;
        }
        self.cursors_to(cidx, target);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ViewOptions;
    use core_text::RopeBuffer;

    struct NullUi;
    impl UiBackend for NullUi {
        fn draw_text(&mut self, _topline: usize) {}
        fn syntax_style(&mut self, _slot: core_syntax::StyleSlot, _spec: &str) {}
    }

    fn view(text: &str, w: usize, h: usize) -> View<RopeBuffer, NullUi> {
        let mut v = View::new(RopeBuffer::from_str("t", text), NullUi, ViewOptions::default());
        v.resize(w, h);
        v
    }

    #[test]
    fn cursor_to_updates_position() {
        let mut v = view("hello\nworld\n", 20, 5);
        let cidx = v.cursors().primary();
        v.cursor_to(cidx, 3);
        assert_eq!(v.cursors().get(cidx).unwrap().pos, 3);
    }

    #[test]
    fn cursors_new_and_dispose() {
        let mut v = view("hello\nworld\n", 20, 5);
        let first = v.cursors().primary();
        let second = v.cursors_new();
        assert_ne!(first, second);
        v.cursors_dispose(second);
        assert!(v.cursors().get(second).is_none());
    }

    #[test]
    fn dispose_last_cursor_is_noop() {
        let mut v = view("hi\n", 20, 5);
        let only = v.cursors().primary();
        v.cursors_dispose(only);
        assert!(v.cursors().get(only).is_some());
    }

    #[test]
    fn line_down_moves_to_next_logical_line() {
        let mut v = view("aa\nbb\ncc\n", 20, 5);
        let cidx = v.cursors().primary();
        v.cursor_to(cidx, 1);
        assert!(v.line_down(cidx));
        assert_eq!(v.cursors().get(cidx).unwrap().pos, 4); // 'b' at same column
    }
}
