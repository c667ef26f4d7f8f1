//! Syntax-definition contract consumed by the draw pipeline (spec §6).
//!
//! A syntax definition is nothing but data: an ordered list of rules (first
//! match wins, by declaration order), optional glyph/style overrides for
//! the five whitespace/EOF symbols, and a style table indexed by slot. The
//! *caching* of in-flight matches across draw calls is stateful and lives
//! with the view, not here — this crate only has to answer "where is this
//! rule's next match from position N".

use regex::bytes::Regex;

mod error;
pub use error::Error;

/// A value-typed handle into the UI backend's style table, per the design
/// note that the slot space should never be passed around as a naked
/// integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StyleSlot(pub u32);

/// One syntax rule: a compiled pattern and the style it paints matched text
/// with.
pub struct SyntaxRule {
    pub regex: Regex,
    pub style: StyleSlot,
}

impl SyntaxRule {
    pub fn new(pattern: &str, style: StyleSlot) -> Result<Self, Error> {
        let regex = Regex::new(pattern).map_err(|e| {
            tracing::warn!(pattern, error = %e, "syntax rule pattern failed to compile");
            Error::Pattern(e)
        })?;
        tracing::trace!(pattern, slot = style.0, "compiled syntax rule");
        Ok(Self { regex, style })
    }

    /// Leftmost match starting at or after `from` in `haystack`, skipping
    /// zero-length matches so they can never pin the scanner in place.
    pub fn next_match(&self, haystack: &[u8], from: usize) -> Option<(usize, usize)> {
        let mut at = from;
        loop {
            if at > haystack.len() {
                return None;
            }
            let m = self.regex.find_at(haystack, at)?;
            if m.end() > m.start() {
                return Some((m.start(), m.end()));
            }
            tracing::trace!(pos = m.start(), "skipping zero-length syntax match");
            at = m.start() + 1;
        }
    }
}

/// A glyph/style override for one of the five rendered symbols.
#[derive(Debug, Clone, Copy)]
pub struct SymbolOverride {
    pub glyph: char,
    pub style: StyleSlot,
}

/// Optional per-symbol overrides; absent entries fall back to the view's
/// default glyph table.
#[derive(Debug, Clone, Default)]
pub struct SymbolStyles {
    pub space: Option<SymbolOverride>,
    pub tab_head: Option<SymbolOverride>,
    pub tab_fill: Option<SymbolOverride>,
    pub eol: Option<SymbolOverride>,
    pub eof: Option<SymbolOverride>,
}

/// A complete syntax definition: ordered rules, symbol overrides, and a
/// style table indexed by [`StyleSlot`].
pub struct SyntaxDef {
    pub rules: Vec<SyntaxRule>,
    pub symbols: SymbolStyles,
    style_specs: Vec<String>,
}

impl SyntaxDef {
    pub fn new(rules: Vec<SyntaxRule>, symbols: SymbolStyles, style_specs: Vec<String>) -> Self {
        Self {
            rules,
            symbols,
            style_specs,
        }
    }

    /// The style string registered for `slot`, if any (mirrors the
    /// null-terminated style-spec array of the consumed contract).
    pub fn style_spec(&self, slot: StyleSlot) -> Option<&str> {
        self.style_specs.get(slot.0 as usize).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_match_skips_zero_length() {
        let rule = SyntaxRule::new(r"x*", StyleSlot(0)).unwrap();
        // "x*" matches empty string at position 0; must skip to the real "x".
        let m = rule.next_match(b"  x", 0);
        assert_eq!(m, Some((2, 3)));
    }

    #[test]
    fn next_match_declaration_order_is_caller_responsibility() {
        let rule = SyntaxRule::new(r"fn\b", StyleSlot(1)).unwrap();
        let m = rule.next_match(b"pub fn main", 0);
        assert_eq!(m, Some((4, 6)));
    }

    #[test]
    fn style_spec_lookup() {
        let def = SyntaxDef::new(
            vec![],
            SymbolStyles::default(),
            vec!["default".into(), "keyword".into()],
        );
        assert_eq!(def.style_spec(StyleSlot(1)), Some("keyword"));
        assert_eq!(def.style_spec(StyleSlot(5)), None);
    }
}
