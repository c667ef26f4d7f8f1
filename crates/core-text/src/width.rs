//! Character width, a single-codepoint lookup: the draw pipeline decodes
//! and widths one `char` at a time, never a clustered grapheme.

use unicode_width::UnicodeWidthChar;

/// Width of one decoded character, in terminal columns. NUL is zero-width
/// (it is emitted as a zero-width cell by the draw pipeline); everything
/// else falls back to `unicode-width`'s table, defaulting to 0 for
/// non-printable control points the pipeline handles separately (tab,
/// newline, and `< 0x20` are special-cased before this is ever called).
pub fn wcwidth(c: char) -> u16 {
    if c == '\0' {
        return 0;
    }
    UnicodeWidthChar::width(c).unwrap_or(0) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_is_narrow() {
        assert_eq!(wcwidth('a'), 1);
    }

    #[test]
    fn cjk_is_wide() {
        assert_eq!(wcwidth('中'), 2);
    }

    #[test]
    fn nul_is_zero_width() {
        assert_eq!(wcwidth('\0'), 0);
    }
}
