use core_syntax::{StyleSlot, SyntaxDef};
use core_text::{Mark, TextSource};

use crate::cell::{SymbolFlags, SymbolGlyphs};
use crate::cursor::CursorSet;
use crate::event::{SelectionHook, UiBackend};
use crate::grid::Grid;
use crate::selection::SelectionSet;
use crate::ViewOptions;

/// A cached per-rule syntax match, `(start, end)` in window-relative byte
/// offsets, discovered during the current draw.
pub(crate) type MatchCache = Vec<Option<(usize, usize)>>;

/// The five symbols whose glyph/style can be overridden by a syntax
/// definition or toggled off by [`SymbolFlags`].
#[derive(Debug, Clone, Copy)]
pub(crate) enum Symbol {
    Space,
    TabHead,
    TabFill,
    Eol,
    Eof,
}

/// Owns a text buffer, a UI backend, the cell grid, and the cursor/
/// selection population that projects onto it. See module docs for the
/// overall data flow.
pub struct View<T: TextSource, U: UiBackend> {
    pub(crate) text: T,
    pub(crate) ui: U,
    pub(crate) grid: Grid,
    pub options: ViewOptions,
    pub(crate) syntax: Option<SyntaxDef>,
    pub(crate) cursors: CursorSet,
    pub(crate) selections: SelectionSet,
    pub(crate) glyphs: SymbolGlyphs,
    pub(crate) symbol_flags: SymbolFlags,
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) start_mark: Mark,
    pub(crate) start_last: usize,
    pub(crate) lastline: usize,
    pub(crate) on_selection: Option<SelectionHook>,
    pub(crate) match_cache: MatchCache,
}

impl<T: TextSource, U: UiBackend> View<T, U> {
    /// Create a view over `text`, presented through `ui`. Sized to `(1, 1)`
    /// with a single cursor at offset 0, per the lifecycle in spec §3 — the
    /// caller must [`View::resize`] before the first real draw.
    pub fn new(mut text: T, ui: U, options: ViewOptions) -> Self {
        let start_mark = text.mark_set(0);
        let cursor_mark = text.mark_set(0);
        let symbol_flags = options.symbol_flags.into();
        let mut view = Self {
            text,
            ui,
            grid: Grid::new(1, 1),
            options,
            syntax: None,
            cursors: CursorSet::new_with_primary(cursor_mark),
            selections: SelectionSet::default(),
            glyphs: SymbolGlyphs::default(),
            symbol_flags,
            start: 0,
            end: 0,
            start_mark,
            start_last: 0,
            lastline: 0,
            on_selection: None,
            match_cache: Vec::new(),
        };
        view.draw();
        view
    }

    /// Attach a syntax definition, registering its style table with the UI
    /// backend and resetting the per-rule match cache.
    pub fn attach_syntax(&mut self, def: SyntaxDef) {
        for slot in 0..def.rules.len() {
            // style_spec is keyed by the slot each rule declares, not by
            // rule index; registering by declared slot lets multiple rules
            // share one style.
            let s = def.rules[slot].style;
            if let Some(spec) = def.style_spec(s) {
                self.ui.syntax_style(s, spec);
            }
        }
        self.match_cache = vec![None; def.rules.len()];
        self.syntax = Some(def);
        self.draw();
    }

    pub fn detach_syntax(&mut self) {
        self.syntax = None;
        self.match_cache.clear();
        self.draw();
    }

    pub fn set_selection_hook(&mut self, hook: SelectionHook) {
        self.on_selection = Some(hook);
    }

    pub fn text(&self) -> &T {
        &self.text
    }

    pub fn text_mut(&mut self) -> &mut T {
        &mut self.text
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn cursors(&self) -> &CursorSet {
        &self.cursors
    }

    pub fn selections(&self) -> &SelectionSet {
        &self.selections
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn topline(&self) -> usize {
        0
    }

    pub fn lastline(&self) -> usize {
        self.lastline
    }

    pub fn bottomline(&self) -> usize {
        self.grid.height().saturating_sub(1)
    }

    pub(crate) fn symbol_render(&self, which: Symbol) -> (char, StyleSlot) {
        let (flag, default_glyph, pick): (SymbolFlags, char, fn(&core_syntax::SymbolStyles) -> Option<core_syntax::SymbolOverride>) =
            match which {
                Symbol::Space => (SymbolFlags::SPACE, self.glyphs.space, |s| s.space),
                Symbol::TabHead => (SymbolFlags::TAB, self.glyphs.tab_head, |s| s.tab_head),
                Symbol::TabFill => (SymbolFlags::TAB_FILL, self.glyphs.tab_fill, |s| s.tab_fill),
                Symbol::Eol => (SymbolFlags::EOL, self.glyphs.eol, |s| s.eol),
                Symbol::Eof => (SymbolFlags::EOF, self.glyphs.eof, |s| s.eof),
            };
        if !self.symbol_flags.contains(flag) {
            return (' ', StyleSlot(0));
        }
        if let Some(over) = self.syntax.as_ref().and_then(|s| pick(&s.symbols)) {
            return (over.glyph, over.style);
        }
        (default_glyph, StyleSlot(0))
    }
}
