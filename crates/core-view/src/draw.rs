use core_syntax::StyleSlot;
use core_text::{range_new, range_valid, Range, TextSource, EPOS};

use crate::cell::CellFlags;
use crate::event::UiBackend;
use crate::view::{Symbol, View};

fn is_continuation_byte(b: u8) -> bool {
    b & 0xC0 == 0x80
}

fn utf8_expected_len(lead: u8) -> usize {
    if lead & 0x80 == 0 {
        1
    } else if lead & 0xE0 == 0xC0 {
        2
    } else if lead & 0xF0 == 0xE0 {
        3
    } else if lead & 0xF8 == 0xF0 {
        4
    } else {
        0
    }
}

/// Decode one character from the front of `bytes`. Returns `(char, len)`
/// where `len` is the number of source bytes this character accounts for.
/// On illegal input, returns `(U+FFFD, skipped)` where `skipped` is the
/// count of bytes consumed resyncing to the next plausible lead byte
/// (spec §4.2 step 5 / §7).
fn decode_one(bytes: &[u8]) -> (char, usize) {
    debug_assert!(!bytes.is_empty());
    let lead = bytes[0];
    if lead == 0 {
        return ('\0', 1);
    }
    let expected = utf8_expected_len(lead);
    if expected == 0 || bytes.len() < expected {
        let mut skipped = 1;
        while skipped < bytes.len() && is_continuation_byte(bytes[skipped]) {
            skipped += 1;
        }
        return ('\u{FFFD}', skipped);
    }
    match std::str::from_utf8(&bytes[..expected]) {
        Ok(s) => (s.chars().next().unwrap(), expected),
        Err(_) => {
            let mut skipped = 1;
            while skipped < bytes.len() && is_continuation_byte(bytes[skipped]) {
                skipped += 1;
            }
            ('\u{FFFD}', skipped)
        }
    }
}

impl<T: TextSource, U: UiBackend> View<T, U> {
    /// `draw`: the only entry point that populates the grid. Runs the full
    /// eleven-step pipeline described in spec §4.2.
    pub fn draw(&mut self) {
        tracing::trace!(start = self.start, "draw: begin");
        // Step 1: anchor synchronization.
        if self.start != self.start_last {
            self.start_mark = self.text.mark_set(self.start);
        } else {
            let resolved = self.text.mark_get(self.start_mark);
            if resolved != EPOS {
                self.start = resolved;
            }
        }
        self.start_last = self.start;

        // Step 2: grid reset.
        self.grid.clear();
        for m in self.match_cache.iter_mut() {
            *m = None;
        }
        let topline_lineno = self.text.lineno_by_pos(self.start);

        let width = self.grid.width();
        let height = self.grid.height();
        if width == 0 || height == 0 {
            self.end = self.start;
            self.lastline = 0;
            self.project_selections();
            self.project_cursors();
            self.ui.draw_text(self.topline());
            return;
        }
        self.grid.lines[0].lineno = topline_lineno;

        // Step 3: byte window, for syntax matching only; character decode
        // reads fresh from the text source so "incomplete at buffer end"
        // can only mean true end-of-file.
        let window_len = width * height;
        let mut window = vec![0u8; window_len];
        let got_window = self.text.bytes_get(self.start, &mut window);
        window.truncate(got_window);

        let mut pos = self.start;
        let mut row = 0usize;
        let mut col = 0usize;
        let mut current_lineno = topline_lineno;
        let mut reached_eof = false;

        'pipeline: loop {
            let mut scratch = [0u8; 4];
            let got = self.text.bytes_get(pos, &mut scratch);
            if got == 0 {
                reached_eof = true;
                break;
            }
            let (ch, clen) = decode_one(&scratch[..got]);
            if ch == '\u{FFFD}' {
                tracing::debug!(pos, "replacing illegal utf-8 sequence with U+FFFD");
            }

            // Step 6: CRLF fusion.
            if ch == '\r' {
                let mut nl = [0u8; 1];
                if self.text.bytes_get(pos + clen, &mut nl) == 1 && nl[0] == b'\n' {
                    if !self.emit_newline(&mut row, &mut col, 2, &mut current_lineno) {
                        break 'pipeline;
                    }
                    pos += clen + 1;
                    continue;
                }
            }

            let window_offset = pos.saturating_sub(self.start);
            match ch {
                '\0' => {
                    let style = self.style_at(&window, window_offset);
                    if !self.emit_visible(&mut row, &mut col, '\0', clen, 0, style) {
                        break 'pipeline;
                    }
                }
                '\n' => {
                    if !self.emit_newline(&mut row, &mut col, clen, &mut current_lineno) {
                        break 'pipeline;
                    }
                }
                '\t' => {
                    let style = self.style_at(&window, window_offset);
                    if !self.emit_tab(&mut row, &mut col, style) {
                        break 'pipeline;
                    }
                }
                ' ' => {
                    let (glyph, sym_style) = self.symbol_render(Symbol::Space);
                    let style = if sym_style.0 != 0 {
                        sym_style
                    } else {
                        self.style_at(&window, window_offset)
                    };
                    if !self.emit_visible(&mut row, &mut col, glyph, clen, 1, style) {
                        break 'pipeline;
                    }
                }
                c if (c as u32) < 0x20 => {
                    let style = self.style_at(&window, window_offset);
                    let repl = ((c as u8).wrapping_add(64)) as char;
                    if !self.emit_control(&mut row, &mut col, repl, style) {
                        break 'pipeline;
                    }
                }
                _ => {
                    let style = self.style_at(&window, window_offset);
                    let w = core_text::wcwidth(ch).max(1) as usize;
                    if !self.emit_visible(&mut row, &mut col, ch, clen, w, style) {
                        break 'pipeline;
                    }
                }
            }
            pos += clen;
            if row >= self.grid.height() {
                break 'pipeline;
            }
        }

        // Step 8: end-of-content.
        self.end = pos;
        self.grid.blank_tail(row, col);
        if reached_eof {
            let mut r = row;
            while let Some(nr) = self.grid.next_row(r) {
                let (glyph, style) = self.symbol_render(Symbol::Eof);
                self.grid.cell_mut(nr, 0).set_char(glyph, 0, 1, style);
                self.grid.blank_tail(nr, 1);
                r = nr;
            }
        }
        self.lastline = row;

        // Step 9 / 10: selection then cursor projection (order matters:
        // cursor flags must never be overwritten by selection flags).
        self.project_selections();
        self.project_cursors();

        tracing::trace!(end = self.end, lastline = self.lastline, "draw: end");
        // Step 11: present.
        self.ui.draw_text(self.topline());
    }

    fn emit_newline(
        &mut self,
        row: &mut usize,
        col: &mut usize,
        byte_len: usize,
        lineno: &mut usize,
    ) -> bool {
        let (glyph, style) = self.symbol_render(Symbol::Eol);
        let r = *row;
        {
            let cell = self.grid.cell_mut(r, *col);
            cell.set_char(glyph, byte_len as u8, 1, style);
        }
        self.grid.lines[r].len += byte_len;
        self.grid.lines[r].width += 1;
        self.grid.blank_tail(r, *col + 1);
        match self.grid.next_row(r) {
            Some(nr) => {
                *lineno += 1;
                self.grid.lines[nr].lineno = *lineno;
                *row = nr;
                *col = 0;
                true
            }
            None => false,
        }
    }

    fn soft_wrap(&mut self, row: &mut usize, col: &mut usize, from_col: usize) -> bool {
        self.grid.blank_tail(*row, from_col);
        match self.grid.next_row(*row) {
            Some(nr) => {
                let lineno = self.grid.lines[*row].lineno;
                self.grid.lines[nr].lineno = lineno;
                *row = nr;
                *col = 0;
                true
            }
            None => false,
        }
    }

    fn emit_tab(&mut self, row: &mut usize, col: &mut usize, style: StyleSlot) -> bool {
        let tabwidth = self.options.tab_width.max(1);
        let n = tabwidth - (*col % tabwidth);
        let mut first = true;
        for _ in 0..n {
            if *col >= self.grid.width() && !self.soft_wrap(row, col, *col) {
                return false;
            }
            let (glyph, sym_style) = if first {
                self.symbol_render(Symbol::TabHead)
            } else {
                self.symbol_render(Symbol::TabFill)
            };
            let cell_style = if sym_style.0 != 0 { sym_style } else { style };
            let len = if first { 1u8 } else { 0u8 };
            let r = *row;
            let c = *col;
            {
                let cell = self.grid.cell_mut(r, c);
                cell.set_char(glyph, len, 1, cell_style);
                cell.flags |= CellFlags::TAB;
            }
            self.grid.lines[r].len += len as usize;
            self.grid.lines[r].width += 1;
            *col += 1;
            first = false;
        }
        true
    }

    fn emit_control(
        &mut self,
        row: &mut usize,
        col: &mut usize,
        repl: char,
        style: StyleSlot,
    ) -> bool {
        if *col + 2 > self.grid.width() && !self.soft_wrap(row, col, *col) {
            return false;
        }
        let r = *row;
        let c = *col;
        {
            let cell = self.grid.cell_mut(r, c);
            let mut data = [0u8; 4];
            data[0] = b'^';
            data[1] = repl as u8;
            cell.data = data;
            cell.len = 1;
            cell.width = 2;
            cell.style = style;
            cell.flags = CellFlags::empty();
        }
        if c + 1 < self.grid.width() {
            self.grid.cell_mut(r, c + 1).set_continuation(CellFlags::empty());
        }
        self.grid.lines[r].len += 1;
        self.grid.lines[r].width += 2;
        *col += 2;
        true
    }

    fn emit_visible(
        &mut self,
        row: &mut usize,
        col: &mut usize,
        ch: char,
        byte_len: usize,
        width: usize,
        style: StyleSlot,
    ) -> bool {
        if *col + width > self.grid.width() && !self.soft_wrap(row, col, *col) {
            return false;
        }
        let r = *row;
        let c = *col;
        {
            let cell = self.grid.cell_mut(r, c);
            cell.set_char(ch, byte_len as u8, width as u8, style);
        }
        for k in 1..width {
            if c + k < self.grid.width() {
                self.grid.cell_mut(r, c + k).set_continuation(CellFlags::empty());
            }
        }
        self.grid.lines[r].len += byte_len;
        self.grid.lines[r].width += width;
        *col += width;
        true
    }

    /// Step 4: resolve the style in force at `offset` (relative to
    /// `self.start`), advancing any rule whose cached match has fallen
    /// behind. First rule (by declaration order) whose match covers
    /// `offset` wins.
    fn style_at(&mut self, window: &[u8], offset: usize) -> StyleSlot {
        let Some(syntax) = self.syntax.as_ref() else {
            return StyleSlot(0);
        };
        for (i, rule) in syntax.rules.iter().enumerate() {
            let stale = match self.match_cache[i] {
                Some((_, end)) => end <= offset,
                None => true,
            };
            if stale {
                self.match_cache[i] = rule.next_match(window, offset);
            }
        }
        for (i, rule) in syntax.rules.iter().enumerate() {
            if let Some((s, e)) = self.match_cache[i] {
                if s <= offset && offset < e {
                    return rule.style;
                }
            }
        }
        StyleSlot(0)
    }

    /// Map an absolute byte offset to `(row, col)` within the current
    /// grid, if it falls within the rendered window.
    pub(crate) fn locate(&self, pos: usize) -> Option<(usize, usize)> {
        if pos < self.start {
            return None;
        }
        let mut acc = self.start;
        let last_row = self.lastline.min(self.grid.height().saturating_sub(1));
        for row in 0..=last_row {
            let len = self.grid.lines[row].len;
            if pos < acc + len || (row == last_row && pos == acc + len) {
                let mut col_acc = acc;
                let width = self.grid.width();
                for c in 0..width {
                    if pos == col_acc {
                        return Some((row, c));
                    }
                    col_acc += self.grid.cell(row, c).len as usize;
                    if pos < col_acc {
                        return Some((row, c));
                    }
                }
                return Some((row, width.saturating_sub(1)));
            }
            acc += len;
        }
        None
    }

    fn project_selections(&mut self) {
        let indices: Vec<usize> = self.selections.iter().map(|(i, _)| i).collect();
        for sidx in indices {
            let range = match self.selections.get(sidx) {
                Some(sel) => {
                    let a = self.text.mark_get(sel.anchor);
                    let c = self.text.mark_get(sel.cursor);
                    range_new(a, c)
                }
                None => continue,
            };
            if !range_valid(range) {
                continue;
            }
            if let Some(hook) = self.on_selection.as_mut() {
                hook(range);
            }
            self.mark_range_selected(range);
        }
    }

    fn mark_range_selected(&mut self, range: Range) {
        if self.end <= self.start {
            return;
        }
        let clamped_start = range.start.max(self.start);
        let clamped_end = range.end.min(self.end);
        if clamped_start >= clamped_end {
            return;
        }
        let mut acc = self.start;
        let last_row = self.lastline.min(self.grid.height().saturating_sub(1));
        for row in 0..=last_row {
            let len = self.grid.lines[row].len;
            let row_start = acc;
            let row_end = acc + len;
            if row_end > clamped_start && row_start < clamped_end {
                let width = self.grid.width();
                let mut col_acc = row_start;
                let mut prev_selected = false;
                for c in 0..width {
                    let cell_len = self.grid.cell(row, c).len as usize;
                    let in_range = col_acc >= clamped_start && col_acc < clamped_end;
                    let is_continuation = cell_len == 0;
                    let selected = in_range || (is_continuation && prev_selected);
                    if selected {
                        self.grid.cell_mut(row, c).flags |= CellFlags::SELECTED;
                    }
                    prev_selected = selected && is_continuation;
                    col_acc += cell_len;
                }
            }
            acc = row_end;
            if acc >= clamped_end {
                break;
            }
        }
    }

    fn project_cursors(&mut self) {
        let bracket_exclude = self.options.bracket_exclude.clone();
        let has_syntax = self.syntax.is_some();
        let indices: Vec<usize> = self.cursors.iter().map(|(i, _)| i).collect();
        let primary = self.cursors.primary();
        for cidx in indices {
            let mark = match self.cursors.get(cidx) {
                Some(c) => c.mark,
                None => continue,
            };
            let pos = self.text.mark_get(mark);
            if pos == EPOS {
                continue;
            }
            if let Some((row, col)) = self.locate(pos) {
                self.grid.cell_mut(row, col).flags |= CellFlags::CURSOR;
                if let Some(c) = self.cursors.get_mut(cidx) {
                    c.pos = pos;
                    c.row = row;
                    c.col = col;
                }
                if has_syntax {
                    let m = self.text.bracket_match_except(pos, &bracket_exclude);
                    if m != EPOS && m != pos {
                        if let Some((mr, mc)) = self.locate(m) {
                            self.grid.cell_mut(mr, mc).flags |= CellFlags::SELECTED;
                        }
                    }
                }
            } else if cidx == primary {
                if let Some(c) = self.cursors.get_mut(cidx) {
                    c.row = 0;
                    c.col = 0;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ViewOptions;
    use core_text::RopeBuffer;

    struct NullUi {
        draws: usize,
    }
    impl UiBackend for NullUi {
        fn draw_text(&mut self, _topline: usize) {
            self.draws += 1;
        }
        fn syntax_style(&mut self, _slot: StyleSlot, _spec: &str) {}
    }

    fn view(text: &str, w: usize, h: usize) -> View<RopeBuffer, NullUi> {
        let mut v = View::new(
            RopeBuffer::from_str("t", text),
            NullUi { draws: 0 },
            ViewOptions::default(),
        );
        v.resize(w, h);
        v
    }

    fn row_chars(v: &View<RopeBuffer, NullUi>, row: usize) -> Vec<(u8, u8, Option<char>)> {
        v.grid()
            .row(row)
            .iter()
            .map(|c| (c.len, c.width, c.as_char()))
            .collect()
    }

    #[test]
    fn tab_expansion_scenario() {
        let mut o = ViewOptions::default();
        o.tab_width = 4;
        let mut v = View::new(
            RopeBuffer::from_str("t", "a\tb"),
            NullUi { draws: 0 },
            o,
        );
        v.resize(10, 3);
        let row = row_chars(&v, 0);
        assert_eq!(row[0], (1, 1, Some('a')));
        assert_eq!(row[1].0, 1); // tab head
        assert_eq!(row[2].0, 0); // tab fill
        assert_eq!(row[3].0, 0); // tab fill
        assert_eq!(row[4], (1, 1, Some('b')));
    }

    #[test]
    fn crlf_fusion_scenario() {
        let v = view("x\r\ny", 4, 3);
        let row0 = row_chars(&v, 0);
        assert_eq!(row0[0], (1, 1, Some('x')));
        assert_eq!(row0[1].0, 2); // len=2 for CRLF
        assert_eq!(v.grid().lines[1].lineno, v.grid().lines[0].lineno + 1);
        let row1 = row_chars(&v, 1);
        assert_eq!(row1[0].2, Some('y'));
    }

    #[test]
    fn soft_wrap_of_wide_char_scenario() {
        let v = view("A中", 2, 3);
        let row0 = row_chars(&v, 0);
        assert_eq!(row0[0], (1, 1, Some('A')));
        // tail of row 0 blanked because 中 doesn't fit in the last column
        assert_eq!(row0[1].2, None);
        assert_eq!(v.grid().lines[1].lineno, v.grid().lines[0].lineno);
        let row1 = row_chars(&v, 1);
        assert_eq!(row1[0].1, 2);
        assert_eq!(row1[1].0, 0);
    }

    #[test]
    fn nul_byte_is_zero_width() {
        let (ch, len) = super::decode_one(&[0u8]);
        assert_eq!(ch, '\0');
        assert_eq!(len, 1);
        assert_eq!(core_text::wcwidth('\0'), 0);
    }

    #[test]
    fn illegal_utf8_scenario() {
        let v = view("\u{0}", 4, 3); // placeholder to get a View; real bytes below
        drop(v);
        let mut buf = RopeBuffer::from_str("t", "");
        // Can't insert raw invalid UTF-8 into a Rope (it requires valid
        // str); exercise the decoder directly instead.
        let _ = &mut buf;
        let (ch, len) = super::decode_one(&[0xC3, 0x28]);
        assert_eq!(ch, '\u{FFFD}');
        assert_eq!(len, 1);
    }

    #[test]
    fn viewport_follows_edits() {
        let lines: String = (0..20).map(|i| format!("line{i}\n")).collect();
        let mut v = view(&lines, 20, 5);
        let line10_start = (0..10).map(|i| format!("line{i}\n").len()).sum();
        v.set_start_and_redraw(line10_start);
        assert_eq!(v.grid().lines[0].lineno, 10);
        v.text_mut().insert_bytes(0, "x\ny\nz\n");
        v.draw();
        assert_eq!(v.grid().lines[0].lineno, 13);
    }
}
