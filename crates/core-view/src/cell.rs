use bitflags::bitflags;
use core_syntax::StyleSlot;

bitflags! {
    /// Per-cell state flags (spec §3 Cell).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CellFlags: u8 {
        /// A cursor is projected onto this cell.
        const CURSOR = 0b0000_0001;
        /// A selection covers this cell.
        const SELECTED = 0b0000_0010;
        /// This cell is part of a tab expansion (head or fill).
        const TAB = 0b0000_0100;
        /// Untouched since the last `clear`/`blank_tail`: carries no glyph,
        /// distinct from a cell holding a real NUL character.
        const EMPTY = 0b0000_1000;
    }
}

bitflags! {
    /// Selects which of the whitespace/EOL/EOF symbols use their visible
    /// glyph rather than a blank (spec §6).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SymbolFlags: u8 {
        const SPACE = 0b0000_0001;
        const TAB = 0b0000_0010;
        const TAB_FILL = 0b0000_0100;
        const EOL = 0b0000_1000;
        const EOF = 0b0001_0000;
    }
}

/// Glyphs used when the corresponding [`SymbolFlags`] bit is set; styles
/// are looked up separately via the syntax definition's symbol overrides.
#[derive(Debug, Clone, Copy)]
pub struct SymbolGlyphs {
    pub space: char,
    pub tab_head: char,
    pub tab_fill: char,
    pub eol: char,
    pub eof: char,
}

impl Default for SymbolGlyphs {
    fn default() -> Self {
        Self {
            space: '·',
            tab_head: '▸',
            tab_fill: ' ',
            eol: '↵',
            eof: '~',
        }
    }
}

/// An atomic visual unit in the grid (spec §3 Cell). `len == 0` marks a
/// continuation column: either the tail of a wide glyph or a tab-fill
/// column whose head lies in an earlier cell.
#[derive(Debug, Clone, Copy)]
pub struct Cell {
    /// Raw UTF-8 payload, up to 4 bytes; unused tail bytes are zero.
    pub data: [u8; 4],
    /// Source byte length this cell accounts for (0 for continuations).
    pub len: u8,
    /// Visual width in columns: 0, 1, or 2.
    pub width: u8,
    pub style: StyleSlot,
    pub flags: CellFlags,
}

impl Cell {
    pub const fn blank() -> Self {
        Self {
            data: [0; 4],
            len: 0,
            width: 1,
            style: StyleSlot(0),
            flags: CellFlags::EMPTY,
        }
    }

    /// Write a single `char` into this cell with the given source length.
    pub fn set_char(&mut self, c: char, len: u8, width: u8, style: StyleSlot) {
        self.data = [0; 4];
        c.encode_utf8(&mut self.data);
        self.len = len;
        self.width = width;
        self.style = style;
        self.flags = CellFlags::empty();
    }

    /// Mark this cell as a continuation of a wide glyph or tab expansion.
    pub fn set_continuation(&mut self, style: CellFlags) {
        self.data = [0; 4];
        self.len = 0;
        self.width = 0;
        self.flags = style;
    }

    /// True for a cell never written by `set_char`/`set_continuation` since
    /// the last clear — all-zero bytes are otherwise ambiguous with a real
    /// NUL character, which also round-trips as `[0; 4]`.
    pub fn is_empty(&self) -> bool {
        self.flags.contains(CellFlags::EMPTY)
    }

    pub fn as_char(&self) -> Option<char> {
        if self.is_empty() {
            return None;
        }
        std::str::from_utf8(&self.data)
            .ok()
            .and_then(|s| s.chars().next())
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::blank()
    }
}
