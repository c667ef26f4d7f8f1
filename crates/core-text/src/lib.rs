//! Byte-addressed, mark-aware text buffer backing the view engine.
//!
//! Every persistent position a caller cares about (cursor, selection
//! endpoint, viewport anchor) is stored as a [`Mark`]; raw byte offsets are
//! disposable caches recomputed after each draw. This is what lets a view
//! survive edits it did not itself perform.

use ropey::Rope;

mod error;
pub mod width;

pub use error::Error;
pub use width::wcwidth;

/// Sentinel returned in place of a byte offset when the position cannot be
/// resolved (a dead mark, a failed search). Never a valid offset.
pub const EPOS: usize = usize::MAX;

/// Opaque handle into a buffer's mark table. Resolves to a byte offset via
/// [`TextSource::mark_get`], or [`EPOS`] once the text it tracked has been
/// deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mark(usize);

/// A half-open byte range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: usize,
    pub end: usize,
}

/// Construct a range from two endpoints, in whatever order they were given.
pub fn range_new(start: usize, end: usize) -> Range {
    if start <= end {
        Range { start, end }
    } else {
        Range {
            start: end,
            end: start,
        }
    }
}

/// A range is valid when neither endpoint is [`EPOS`] and it is well-formed.
pub fn range_valid(r: Range) -> bool {
    r.start != EPOS && r.end != EPOS && r.start <= r.end
}

/// A valid, zero-width range.
pub fn range_empty(r: Range) -> bool {
    range_valid(r) && r.start == r.end
}

/// The text-buffer contract consumed by the view engine (spec §6). A view
/// never mutates through this trait; mutation is the caller's concern, and
/// the view survives it only via marks.
pub trait TextSource {
    /// Total size of the buffer in bytes.
    fn size(&self) -> usize;

    /// Copy up to `buf.len()` bytes starting at `pos` into `buf`, returning
    /// the number actually copied (0 at or past end of buffer).
    fn bytes_get(&self, pos: usize, buf: &mut [u8]) -> usize;

    /// 0-based logical line number containing `pos`.
    fn lineno_by_pos(&self, pos: usize) -> usize;

    /// Bind a new mark to `pos`.
    fn mark_set(&mut self, pos: usize) -> Mark;

    /// Resolve a mark to its current byte offset, or [`EPOS`] if the text it
    /// tracked was deleted.
    fn mark_get(&self, mark: Mark) -> usize;

    /// Byte offset of the next character boundary after `pos` (saturates at
    /// `size()`).
    fn char_next(&self, pos: usize) -> usize;

    /// Byte offset of the previous character boundary before `pos`
    /// (saturates at 0).
    fn char_prev(&self, pos: usize) -> usize;

    /// Byte offset of the first byte of the logical line containing `pos`.
    fn line_begin(&self, pos: usize) -> usize;

    /// Byte offset of the first byte of the logical line before the one
    /// containing `pos`, or [`EPOS`] if `pos` is already on the first line.
    fn line_up(&self, pos: usize) -> usize;

    /// Byte offset of the first byte of the logical line after the one
    /// containing `pos`, or [`EPOS`] if `pos` is on the last line.
    fn line_down(&self, pos: usize) -> usize;

    /// Find the bracket matching the one at `pos`, skipping any pair whose
    /// opening character appears in `exclude`. Returns [`EPOS`] when `pos`
    /// is not on a bracket or no match exists.
    fn bracket_match_except(&self, pos: usize, exclude: &[(char, char)]) -> usize;

    /// Iterate the buffer's raw bytes backwards, starting just before `pos`.
    fn reverse_bytes(&self, pos: usize) -> ReverseBytes<'_>;
}

const BRACKET_PAIRS: &[(char, char)] = &[('(', ')'), ('[', ']'), ('{', '}'), ('<', '>')];

/// A rope-backed [`TextSource`]. The only concrete buffer implementation
/// this workspace ships; higher layers may supply their own.
pub struct RopeBuffer {
    rope: Rope,
    pub name: String,
    marks: Vec<Option<usize>>,
}

impl RopeBuffer {
    /// Construct a buffer from an in-memory string.
    pub fn from_str(name: impl Into<String>, content: &str) -> Self {
        Self {
            rope: Rope::from_str(content),
            name: name.into(),
            marks: Vec::new(),
        }
    }

    /// Construct a buffer from a file on disk.
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(Error::Io)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "[unnamed]".to_string());
        Ok(Self::from_str(name, &content))
    }

    /// Total number of logical lines.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    fn line_len_no_newline(&self, line: usize) -> usize {
        if line >= self.rope.len_lines() {
            return 0;
        }
        let s = self.rope.line(line).to_string();
        let s = s.strip_suffix("\r\n").or_else(|| s.strip_suffix('\n')).unwrap_or(&s);
        s.len()
    }

    /// Insert `text` at byte offset `pos`, shifting marks at or after `pos`
    /// forward by `text.len()`.
    pub fn insert_bytes(&mut self, pos: usize, text: &str) {
        let pos = pos.min(self.rope.len_bytes());
        let char_idx = self.rope.byte_to_char(pos);
        self.rope.insert(char_idx, text);
        let len = text.len();
        for m in self.marks.iter_mut().flatten() {
            if *m >= pos {
                *m += len;
            }
        }
        tracing::trace!(target: "core_text", pos, len, "inserted bytes");
    }

    /// Delete the byte range `[start, end)`, returning the removed text.
    /// Marks strictly inside the deleted range become dead ([`EPOS`]);
    /// marks at or after `end` shift back by the deleted length.
    pub fn delete_range(&mut self, start: usize, end: usize) -> String {
        let total = self.rope.len_bytes();
        let start = start.min(total);
        let end = end.min(total);
        if start >= end {
            return String::new();
        }
        let start_char = self.rope.byte_to_char(start);
        let end_char = self.rope.byte_to_char(end);
        let removed = self.rope.slice(start_char..end_char).to_string();
        self.rope.remove(start_char..end_char);
        let len = end - start;
        for m in self.marks.iter_mut().flatten() {
            if *m > start && *m < end {
                *m = EPOS;
            } else if *m >= end {
                *m -= len;
            }
        }
        tracing::trace!(target: "core_text", start, end, "deleted bytes");
        removed
    }
}

impl TextSource for RopeBuffer {
    fn size(&self) -> usize {
        self.rope.len_bytes()
    }

    fn bytes_get(&self, pos: usize, buf: &mut [u8]) -> usize {
        let total = self.rope.len_bytes();
        if pos >= total || buf.is_empty() {
            return 0;
        }
        let end = (pos + buf.len()).min(total);
        let start_char = self.rope.byte_to_char(pos);
        let end_char = self.rope.byte_to_char(end);
        let mut n = 0;
        for chunk in self.rope.slice(start_char..end_char).chunks() {
            let bytes = chunk.as_bytes();
            let copy = bytes.len().min(buf.len() - n);
            buf[n..n + copy].copy_from_slice(&bytes[..copy]);
            n += copy;
            if n == buf.len() {
                break;
            }
        }
        n
    }

    fn lineno_by_pos(&self, pos: usize) -> usize {
        let pos = pos.min(self.rope.len_bytes());
        let char_idx = self.rope.byte_to_char(pos);
        self.rope.char_to_line(char_idx)
    }

    fn mark_set(&mut self, pos: usize) -> Mark {
        let pos = pos.min(self.rope.len_bytes());
        self.marks.push(Some(pos));
        Mark(self.marks.len() - 1)
    }

    fn mark_get(&self, mark: Mark) -> usize {
        self.marks
            .get(mark.0)
            .copied()
            .flatten()
            .unwrap_or(EPOS)
    }

    fn char_next(&self, pos: usize) -> usize {
        let total = self.rope.len_bytes();
        if pos >= total {
            return total;
        }
        let char_idx = self.rope.byte_to_char(pos);
        self.rope.char_to_byte(char_idx + 1)
    }

    fn char_prev(&self, pos: usize) -> usize {
        if pos == 0 {
            return 0;
        }
        let char_idx = self.rope.byte_to_char(pos.min(self.rope.len_bytes()));
        if char_idx == 0 {
            return 0;
        }
        self.rope.char_to_byte(char_idx - 1)
    }

    fn line_begin(&self, pos: usize) -> usize {
        let line = self.lineno_by_pos(pos);
        let line_start_char = self.rope.line_to_char(line);
        self.rope.char_to_byte(line_start_char)
    }

    fn line_up(&self, pos: usize) -> usize {
        let line = self.lineno_by_pos(pos);
        if line == 0 {
            return EPOS;
        }
        let this_line_start = self.line_begin(pos);
        let col = pos - this_line_start;
        let target_start_char = self.rope.line_to_char(line - 1);
        let target_start = self.rope.char_to_byte(target_start_char);
        target_start + col.min(self.line_len_no_newline(line - 1))
    }

    fn line_down(&self, pos: usize) -> usize {
        let line = self.lineno_by_pos(pos);
        if line + 1 >= self.rope.len_lines() {
            return EPOS;
        }
        let this_line_start = self.line_begin(pos);
        let col = pos - this_line_start;
        let target_start_char = self.rope.line_to_char(line + 1);
        let target_start = self.rope.char_to_byte(target_start_char);
        target_start + col.min(self.line_len_no_newline(line + 1))
    }

    fn bracket_match_except(&self, pos: usize, exclude: &[(char, char)]) -> usize {
        let total = self.rope.len_bytes();
        if pos >= total {
            return EPOS;
        }
        let char_idx = self.rope.byte_to_char(pos);
        let ch = match self.rope.get_char(char_idx) {
            Some(c) => c,
            None => return EPOS,
        };
        let pairs: Vec<(char, char)> = BRACKET_PAIRS
            .iter()
            .copied()
            .filter(|p| !exclude.contains(p))
            .collect();

        if let Some(&(open, close)) = pairs.iter().find(|(o, _)| *o == ch) {
            let mut depth = 1i32;
            let mut idx = char_idx + 1;
            let len_chars = self.rope.len_chars();
            while idx < len_chars {
                let c = self.rope.char(idx);
                if c == open {
                    depth += 1;
                } else if c == close {
                    depth -= 1;
                    if depth == 0 {
                        return self.rope.char_to_byte(idx);
                    }
                }
                idx += 1;
            }
            return EPOS;
        }
        if let Some(&(open, close)) = pairs.iter().find(|(_, c)| *c == ch) {
            if char_idx == 0 {
                return EPOS;
            }
            let mut depth = 1i32;
            let mut idx = char_idx;
            loop {
                idx -= 1;
                let c = self.rope.char(idx);
                if c == close {
                    depth += 1;
                } else if c == open {
                    depth -= 1;
                    if depth == 0 {
                        return self.rope.char_to_byte(idx);
                    }
                }
                if idx == 0 {
                    break;
                }
            }
            return EPOS;
        }
        EPOS
    }

    fn reverse_bytes(&self, pos: usize) -> ReverseBytes<'_> {
        let pos = pos.min(self.rope.len_bytes());
        ReverseBytes {
            rope: &self.rope,
            next: pos,
        }
    }
}

/// Backwards byte iterator over a [`RopeBuffer`], starting just before the
/// position it was constructed from.
pub struct ReverseBytes<'a> {
    rope: &'a Rope,
    next: usize,
}

impl Iterator for ReverseBytes<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.next == 0 {
            return None;
        }
        self.next -= 1;
        // Rope chunk lookup per byte is O(log n); callers bound the number
        // of bytes scanned (see core-view's viewport_up).
        let (chunk, chunk_byte_start, _, _) = self.rope.chunk_at_byte(self.next);
        Some(chunk.as_bytes()[self.next - chunk_byte_start])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn src(s: &str) -> RopeBuffer {
        RopeBuffer::from_str("t", s)
    }

    #[test]
    fn bytes_get_reads_window() {
        let b = src("hello world");
        let mut buf = [0u8; 5];
        let n = b.bytes_get(0, &mut buf);
        assert_eq!(n, 5);
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn bytes_get_past_end_returns_zero() {
        let b = src("hi");
        let mut buf = [0u8; 4];
        assert_eq!(b.bytes_get(2, &mut buf), 0);
    }

    #[test]
    fn mark_survives_insert_before_it() {
        let mut b = src("hello world");
        let m = b.mark_set(6); // points at 'w'
        b.insert_bytes(0, "XXX ");
        assert_eq!(b.mark_get(m), 10);
        let mut buf = [0u8; 1];
        b.bytes_get(b.mark_get(m), &mut buf);
        assert_eq!(&buf, b"w");
    }

    #[test]
    fn mark_dies_when_its_text_is_deleted() {
        let mut b = src("hello world");
        let m = b.mark_set(6);
        b.delete_range(5, 11);
        assert_eq!(b.mark_get(m), EPOS);
    }

    #[test]
    fn mark_shifts_back_on_delete_before_it() {
        let mut b = src("hello world");
        let m = b.mark_set(6);
        b.delete_range(0, 3);
        assert_eq!(b.mark_get(m), 3);
    }

    #[test]
    fn line_begin_and_motions() {
        let b = src("ab\ncd\nef");
        assert_eq!(b.line_begin(4), 3);
        // pos 4 is column 1 of line 1 ("cd"); line_up keeps column 1.
        assert_eq!(b.line_up(4), 1);
        assert_eq!(b.line_down(4), 7);
        assert_eq!(b.line_up(0), EPOS);
        assert_eq!(b.line_down(7), EPOS);
    }

    #[test]
    fn line_motion_clamps_to_shorter_line() {
        let b = src("abcdef\nxy\n");
        // column 4 on line 0, but line 1 ("xy") is only 2 bytes long.
        assert_eq!(b.line_down(4), 7 + 2);
    }

    #[test]
    fn char_next_prev_roundtrip() {
        let b = src("a中b");
        let p1 = b.char_next(0);
        assert_eq!(p1, 1);
        let p2 = b.char_next(p1);
        assert_eq!(p2, 1 + '中'.len_utf8());
        assert_eq!(b.char_prev(p2), p1);
    }

    #[test]
    fn bracket_match_finds_pair() {
        let b = src("a(b(c)d)e");
        assert_eq!(b.bracket_match_except(1, &[]), 7);
        assert_eq!(b.bracket_match_except(7, &[]), 1);
    }

    #[test]
    fn bracket_match_excludes_configured_pairs() {
        let b = src("<a>");
        assert_eq!(b.bracket_match_except(0, &[('<', '>')]), EPOS);
        assert_eq!(b.bracket_match_except(0, &[]), 2);
    }

    #[test]
    fn reverse_bytes_walks_backwards() {
        let b = src("abc");
        let collected: Vec<u8> = b.reverse_bytes(3).collect();
        assert_eq!(collected, vec![b'c', b'b', b'a']);
    }

    #[test]
    fn wcwidth_basics() {
        assert_eq!(wcwidth('a'), 1);
        assert_eq!(wcwidth('中'), 2);
        assert_eq!(wcwidth('\0'), 0);
    }
}
