//! The view engine: translates a byte-addressed text buffer into a bounded
//! cell grid for a terminal UI, while carrying a population of cursors and
//! selections whose positions survive edits made by other layers.
//!
//! Entry point is [`View::draw`]; everything else (cursor motion, scroll,
//! selection management) mutates the view's state and then redraws.

mod cell;
mod cursor;
mod draw;
mod error;
mod event;
mod grid;
mod register;
mod selection;
mod view;
mod viewport;

pub use cell::{Cell, CellFlags, SymbolFlags, SymbolGlyphs};
pub use core_text::{Mark, Range, EPOS};
pub use cursor::{Cursor, CursorSet};
pub use error::Error;
pub use event::UiBackend;
pub use grid::{Grid, ScreenLineMeta};
pub use register::Register;
pub use selection::{Selection, SelectionSet};
pub use view::View;
pub use viewport::ScrollPolicy;

/// Runtime-configurable knobs for a view, distinct from the editor-wide
/// configuration this core explicitly leaves out of scope. Loadable from a
/// TOML fragment via [`ViewOptions::from_toml`].
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ViewOptions {
    #[serde(default = "default_tab_width")]
    pub tab_width: usize,
    #[serde(default)]
    pub symbol_flags: SymbolFlagsConfig,
    #[serde(default)]
    pub scroll_policy: ScrollPolicy,
    #[serde(default = "default_bracket_exclude")]
    pub bracket_exclude: Vec<(char, char)>,
}

fn default_tab_width() -> usize {
    8
}

fn default_bracket_exclude() -> Vec<(char, char)> {
    vec![('<', '>')]
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            tab_width: default_tab_width(),
            symbol_flags: SymbolFlagsConfig::default(),
            scroll_policy: ScrollPolicy::default(),
            bracket_exclude: default_bracket_exclude(),
        }
    }
}

impl ViewOptions {
    /// Parse view options from a TOML fragment, e.g.:
    /// ```toml
    /// tab_width = 4
    /// [symbol_flags]
    /// space = true
    /// eol = true
    /// ```
    pub fn from_toml(s: &str) -> Result<Self, Error> {
        toml::from_str(s).map_err(Error::Config)
    }
}

/// Serde-friendly mirror of [`SymbolFlags`] for config parsing (bitflags
/// types don't implement `Deserialize` directly).
#[derive(Debug, Clone, Copy, Default, serde::Deserialize)]
pub struct SymbolFlagsConfig {
    #[serde(default)]
    pub space: bool,
    #[serde(default)]
    pub tab: bool,
    #[serde(default)]
    pub eol: bool,
    #[serde(default)]
    pub eof: bool,
}

impl From<SymbolFlagsConfig> for SymbolFlags {
    fn from(c: SymbolFlagsConfig) -> Self {
        let mut f = SymbolFlags::empty();
        if c.space {
            f |= SymbolFlags::SPACE;
        }
        if c.tab {
            f |= SymbolFlags::TAB | SymbolFlags::TAB_FILL;
        }
        if c.eol {
            f |= SymbolFlags::EOL;
        }
        if c.eof {
            f |= SymbolFlags::EOF;
        }
        f
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let o = ViewOptions::default();
        assert_eq!(o.tab_width, 8);
        assert_eq!(o.bracket_exclude, vec![('<', '>')]);
    }

    #[test]
    fn parse_from_toml() {
        let o = ViewOptions::from_toml("tab_width = 4\n[symbol_flags]\nspace = true\n").unwrap();
        assert_eq!(o.tab_width, 4);
        assert!(o.symbol_flags.space);
        assert!(!o.symbol_flags.eol);
    }
}
