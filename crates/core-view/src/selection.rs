use core_text::{range_new, Mark, Range, TextSource, EPOS};

use crate::event::UiBackend;
use crate::view::View;

/// Anchor/cursor mark pair delimiting a selection (spec §3). Order encodes
/// direction: `anchor <= cursor` extends rightward, `cursor < anchor`
/// extends leftward.
#[derive(Debug, Clone, Copy)]
pub struct Selection {
    pub anchor: Mark,
    pub cursor: Mark,
}

/// All selections live here regardless of whether a cursor currently
/// references one (spec §4.5: "cursor->selection link is one-way"). An
/// arena keyed by stable index, matching the design note's recommendation
/// to model ownership with indices rather than pointers.
#[derive(Default)]
pub struct SelectionSet {
    selections: Vec<Option<Selection>>,
}

impl SelectionSet {
    pub(crate) fn alloc(&mut self, anchor: Mark, cursor: Mark) -> usize {
        let sel = Selection { anchor, cursor };
        for (i, slot) in self.selections.iter_mut().enumerate() {
            if slot.is_none() {
                *slot = Some(sel);
                return i;
            }
        }
        self.selections.push(Some(sel));
        self.selections.len() - 1
    }

    pub(crate) fn free(&mut self, idx: usize) -> Option<Selection> {
        self.selections.get_mut(idx).and_then(|s| s.take())
    }

    pub fn get(&self, idx: usize) -> Option<&Selection> {
        self.selections.get(idx).and_then(|s| s.as_ref())
    }

    pub(crate) fn get_mut(&mut self, idx: usize) -> Option<&mut Selection> {
        self.selections.get_mut(idx).and_then(|s| s.as_mut())
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Selection)> {
        self.selections
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (i, s)))
    }
}

impl<T: TextSource, U: UiBackend> View<T, U> {
    /// `selection_start`: allocate a selection one character wide,
    /// extending rightward from the cursor's position, and attach it.
    pub fn selection_start(&mut self, cidx: usize) -> Option<usize> {
        let pos = self.cursors.get(cidx)?.pos;
        let anchor_pos = pos;
        let cursor_pos = self.text.char_next(pos);
        let anchor = self.text.mark_set(anchor_pos);
        let cursor = self.text.mark_set(cursor_pos);
        let sidx = self.selections.alloc(anchor, cursor);
        self.cursors.get_mut(cidx)?.sel = Some(sidx);
        Some(sidx)
    }

    /// `selection_stop`: detach without freeing. The selection stays alive
    /// (and keeps drawing) until explicitly [`View::selection_clear`]ed.
    pub fn selection_stop(&mut self, cidx: usize) {
        if let Some(c) = self.cursors.get_mut(cidx) {
            c.sel = None;
        }
    }

    /// `selection_clear`: free the selection a cursor owns, if any, and
    /// populate the cursor's `lastsel_*` fields for later
    /// [`View::selection_restore`].
    pub fn selection_clear(&mut self, cidx: usize) {
        let sidx = match self.cursors.get_mut(cidx).and_then(|c| c.sel.take()) {
            Some(s) => s,
            None => return,
        };
        self.free_selection_and_scan(sidx);
    }

    /// Free a selection directly by index, scanning the cursor list to
    /// clear any dangling one-way reference (per the design note on the
    /// source's bidirectional-reference hazard).
    pub(crate) fn free_selection_and_scan(&mut self, sidx: usize) {
        let sel = self.selections.free(sidx);
        if let Some(sel) = sel {
            let anchor = self.text.mark_get(sel.anchor);
            let cursor = self.text.mark_get(sel.cursor);
            for (_, c) in self.cursors.iter_mut() {
                if c.sel == Some(sidx) {
                    c.sel = None;
                    c.lastsel_anchor = anchor;
                    c.lastsel_cursor = cursor;
                }
            }
        }
    }

    /// `selection_swap`: exchange anchor and cursor, moving the owning
    /// cursor to the new cursor end.
    pub fn selection_swap(&mut self, cidx: usize) {
        let sidx = match self.cursors.get(cidx).and_then(|c| c.sel) {
            Some(s) => s,
            None => return,
        };
        if let Some(sel) = self.selections.get_mut(sidx) {
            std::mem::swap(&mut sel.anchor, &mut sel.cursor);
        }
        let new_pos = self
            .selections
            .get(sidx)
            .map(|s| self.text.mark_get(s.cursor))
            .unwrap_or(EPOS);
        if new_pos != EPOS {
            self.cursor_to(cidx, new_pos);
        }
    }

    /// `selection_get`: the selection's byte range, direction-independent.
    pub fn selection_get(&self, sidx: usize) -> Option<Range> {
        let sel = self.selections.get(sidx)?;
        let a = self.text.mark_get(sel.anchor);
        let c = self.text.mark_get(sel.cursor);
        Some(range_new(a, c))
    }

    /// `selection_set`: move the selection to cover `range`, preserving its
    /// existing direction.
    pub fn selection_set(&mut self, sidx: usize, range: Range) {
        let leftward = self
            .selections
            .get(sidx)
            .map(|s| self.text.mark_get(s.cursor) < self.text.mark_get(s.anchor))
            .unwrap_or(false);
        let (anchor_pos, cursor_pos) = if leftward {
            (range.end, range.start)
        } else {
            (range.start, range.end)
        };
        let anchor = self.text.mark_set(anchor_pos);
        let cursor = self.text.mark_set(cursor_pos);
        if let Some(sel) = self.selections.get_mut(sidx) {
            sel.anchor = anchor;
            sel.cursor = cursor;
        }
    }

    /// `selection_sync`: move the owning cursor onto the selection's
    /// cursor end, one character back when the selection extends
    /// rightward so the cursor visually sits on the last selected glyph.
    pub fn selection_sync(&mut self, cidx: usize) {
        let sidx = match self.cursors.get(cidx).and_then(|c| c.sel) {
            Some(s) => s,
            None => return,
        };
        let Some(sel) = self.selections.get(sidx) else {
            return;
        };
        let anchor = self.text.mark_get(sel.anchor);
        let cursor = self.text.mark_get(sel.cursor);
        if anchor == EPOS || cursor == EPOS {
            return;
        }
        let target = if anchor <= cursor {
            self.text.char_prev(cursor)
        } else {
            cursor
        };
        self.cursor_to(cidx, target);
    }

    /// `selection_restore`: rebuild a selection from a cursor's
    /// last-remembered endpoints after it was cleared.
    pub fn selection_restore(&mut self, cidx: usize) -> Option<usize> {
        let (a, c) = {
            let cur = self.cursors.get(cidx)?;
            (cur.lastsel_anchor, cur.lastsel_cursor)
        };
        if a == EPOS || c == EPOS {
            return None;
        }
        let anchor = self.text.mark_set(a);
        let cursor = self.text.mark_set(c);
        let sidx = self.selections.alloc(anchor, cursor);
        self.cursors.get_mut(cidx)?.sel = Some(sidx);
        Some(sidx)
    }

    /// Orientation flip embedded in `cursor_to` (spec §4.5): when an
    /// extending motion crosses the anchor, nudge the anchor by one
    /// character so the visual selection never collapses to the wrong
    /// side, then extend the cursor end past `new_pos` on rightward moves.
    pub(crate) fn apply_orientation_flip(&mut self, sidx: usize, new_pos: usize) {
        let Some(sel) = self.selections.get(sidx) else {
            return;
        };
        let anchor = self.text.mark_get(sel.anchor);
        let cursor = self.text.mark_get(sel.cursor);
        if anchor == EPOS || cursor == EPOS {
            return;
        }

        let mut new_anchor = anchor;
        if new_pos < anchor && anchor < cursor {
            new_anchor = self.text.char_next(anchor);
        } else if cursor < anchor && anchor <= new_pos {
            new_anchor = self.text.char_prev(anchor);
        }

        let new_cursor_end = if new_anchor <= new_pos {
            self.text.char_next(new_pos)
        } else {
            new_pos
        };

        let anchor_mark = self.text.mark_set(new_anchor);
        let cursor_mark = self.text.mark_set(new_cursor_end);
        if let Some(sel) = self.selections.get_mut(sidx) {
            sel.anchor = anchor_mark;
            sel.cursor = cursor_mark;
        }
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
    fn start_creates_one_char_rightward_selection() {
        let mut v = view("hello world", 20, 3);
        let cidx = v.cursors().primary();
        v.cursor_to(cidx, 5);
        let sidx = v.selection_start(cidx).unwrap();
        let r = v.selection_get(sidx).unwrap();
        assert_eq!(r.start, 5);
        assert_eq!(r.end, 6);
    }

    #[test]
    fn swap_is_idempotent_under_double_application() {
        let mut v = view("hello world", 20, 3);
        let cidx = v.cursors().primary();
        v.cursor_to(cidx, 5);
        let sidx = v.selection_start(cidx).unwrap();
        let before = v.selection_get(sidx).unwrap();
        v.selection_swap(cidx);
        v.selection_swap(cidx);
        let after = v.selection_get(sidx).unwrap();
        assert_eq!(before.start, after.start);
        assert_eq!(before.end, after.end);
    }

    #[test]
    fn flip_crossing_anchor_extends_leftward() {
        // Cursor at byte 5, selection anchored at 5, cursor-mark at 6.
        let mut v = view("0123456789", 20, 3);
        let cidx = v.cursors().primary();
        v.cursor_to(cidx, 5);
        let sidx = v.selection_start(cidx).unwrap();
        // Move the cursor left across the anchor to byte 2.
        v.cursor_to(cidx, 2);
        let r = v.selection_get(sidx).unwrap();
        assert_eq!(r.start, 2);
        assert_eq!(r.end, 6);
    }
}
