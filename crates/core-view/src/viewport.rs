use core_text::TextSource;

use crate::event::UiBackend;
use crate::view::View;

/// Resolves the open question in spec §9 over what `cursors_to` should do
/// when appending at end-of-file and the viewport doesn't already show it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollPolicy {
    /// Scroll so the cursor lands mid-screen (the source's behavior).
    CenterOnAppend,
    /// Never scroll implicitly on EOF append; the caller must ask.
    Never,
}

impl Default for ScrollPolicy {
    fn default() -> Self {
        ScrollPolicy::CenterOnAppend
    }
}

impl<T: TextSource, U: UiBackend> View<T, U> {
    /// Reallocate (only grows), zero, and redraw at the new size.
    pub fn resize(&mut self, width: usize, height: usize) {
        if width == 0 || height == 0 {
            tracing::warn!(width, height, "resizing view to a degenerate viewport");
        }
        tracing::debug!(width, height, "resizing view");
        self.grid.resize(width, height);
        self.draw();
    }

    pub(crate) fn set_start_and_redraw(&mut self, new_start: usize) {
        self.start = new_start.min(self.text.size());
        self.start_mark = self.text.mark_set(self.start);
        self.start_last = self.start;
        self.draw();
    }

    /// `viewport_down(n)`: advance the viewport by the byte length of its
    /// first `n` screen lines, or jump straight to `end` when `n` spans
    /// the whole screen. Fails at end-of-file.
    pub fn viewport_down(&mut self, n: usize) -> bool {
        if self.end >= self.text.size() {
            tracing::debug!("viewport_down: already at end of file");
            return false;
        }
        let new_start = if n >= self.grid.height() {
            self.end
        } else {
            let mut s = self.start;
            for r in 0..n.min(self.grid.lines.len()) {
                s += self.grid.lines[r].len;
            }
            s
        };
        self.set_start_and_redraw(new_start);
        true
    }

    /// `viewport_up(n)`: scan backwards from just before `start` counting
    /// newlines, bounded by `width * height` bytes since there is no
    /// precomputed line index. Strips the line terminator immediately
    /// above the viewport first so the landing point is a line's first
    /// byte.
    pub fn viewport_up(&mut self, n: usize) -> bool {
        if self.start == 0 {
            tracing::debug!("viewport_up: already at start of file");
            return false;
        }
        let bound = self.grid.width() * self.grid.height();
        let mut pos = self.start;

        if pos > 0 {
            let mut probe = self.text.reverse_bytes(pos);
            if probe.next() == Some(b'\n') {
                pos -= 1;
                if pos > 0 {
                    let mut probe2 = self.text.reverse_bytes(pos);
                    if probe2.next() == Some(b'\r') {
                        pos -= 1;
                    }
                }
            }
        }

        let mut newlines = 0usize;
        let mut scanned = 0usize;
        let mut landing = 0usize;
        let mut found = false;
        for b in self.text.reverse_bytes(pos) {
            if scanned >= bound {
                break;
            }
            scanned += 1;
            pos -= 1;
            if b == b'\n' {
                newlines += 1;
                if newlines == n {
                    landing = pos + 1;
                    found = true;
                    break;
                }
            }
        }
        if !found {
            landing = 0;
        }
        self.set_start_and_redraw(landing);
        true
    }

    /// `redraw_top`: advance the viewport past rows until the primary
    /// cursor lands on row 0.
    pub fn redraw_top(&mut self, cidx: usize) {
        let row = self.cursors.get(cidx).map(|c| c.row).unwrap_or(0);
        if row == 0 {
            return;
        }
        let mut new_start = self.start;
        for r in 0..row {
            new_start += self.grid.lines[r].len;
        }
        self.set_start_and_redraw(new_start);
    }

    /// `redraw_bottom`: slide the viewport down until the cursor lands on
    /// the last row.
    pub fn redraw_bottom(&mut self, cidx: usize) {
        let row = self.cursors.get(cidx).map(|c| c.row).unwrap_or(0);
        let bottom = self.grid.height().saturating_sub(1);
        if row >= bottom {
            return;
        }
        self.slide_down(bottom - row);
    }

    /// `redraw_center`: slide up or down so the cursor lands mid-screen.
    /// Two passes, since a slide can change wrap and shift the cursor's
    /// row again.
    pub fn redraw_center(&mut self, cidx: usize) {
        for _ in 0..2 {
            let row = self.cursors.get(cidx).map(|c| c.row).unwrap_or(0);
            let target = self.grid.height() / 2;
            if row == target {
                break;
            }
            if row < target {
                self.slide_up(target - row);
            } else {
                self.slide_down(row - target);
            }
        }
    }

    /// `slide_down(n)`/`slide_up(n)`: move the viewport by `n` rows; if the
    /// cursor falls outside the new bounds, pin it to the new top/bottom
    /// row, preserving its column.
    pub fn slide_down(&mut self, n: usize) {
        self.viewport_down(n);
        self.pin_cursor_to_bounds();
    }

    pub fn slide_up(&mut self, n: usize) {
        self.viewport_up(n);
        self.pin_cursor_to_bounds();
    }

    fn pin_cursor_to_bounds(&mut self) {
        let cidx = self.cursors.primary();
        let (row, col, lastcol) = match self.cursors.get(cidx) {
            Some(c) => (c.row, c.col, c.lastcol),
            None => return,
        };
        let bottom = self.lastline.min(self.grid.height().saturating_sub(1));
        if row > bottom {
            self.cursor_set(cidx, bottom, col);
            if let Some(c) = self.cursors.get_mut(cidx) {
                c.lastcol = lastcol;
            }
        }
    }

    /// `scroll_down(n)`/`scroll_up(n)`: move the viewport while keeping
    /// the cursor's screen row fixed; when the viewport can't move
    /// further, move the cursor to the buffer's start/end instead.
    pub fn scroll_down(&mut self, n: usize) -> bool {
        let cidx = self.cursors.primary();
        let row_before = self.cursors.get(cidx).map(|c| c.row).unwrap_or(0);
        let col = self
            .cursors
            .get(cidx)
            .map(|c| if c.lastcol > 0 { c.lastcol } else { c.col })
            .unwrap_or(0);
        if !self.viewport_down(n) {
            tracing::debug!("scroll_down: viewport can't move further, snapping cursor to end");
            let size = self.text.size();
            self.cursors_to(cidx, size);
            return false;
        }
        let target_row = row_before.min(self.grid.height().saturating_sub(1));
        self.cursor_set(cidx, target_row, col);
        true
    }

    pub fn scroll_up(&mut self, n: usize) -> bool {
        let cidx = self.cursors.primary();
        let row_before = self.cursors.get(cidx).map(|c| c.row).unwrap_or(0);
        let col = self
            .cursors
            .get(cidx)
            .map(|c| if c.lastcol > 0 { c.lastcol } else { c.col })
            .unwrap_or(0);
        if !self.viewport_up(n) {
            tracing::debug!("scroll_up: viewport can't move further, snapping cursor to start");
            self.cursors_to(cidx, 0);
            return false;
        }
        let target_row = row_before.min(self.grid.height().saturating_sub(1));
        self.cursor_set(cidx, target_row, col);
        true
    }
}
