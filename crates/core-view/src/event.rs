use core_syntax::StyleSlot;
use core_text::Range;

/// The UI backend contract produced by the view (spec §6). A concrete
/// implementation lives in `core-terminal`.
pub trait UiBackend {
    /// Render the grid starting at `topline` (the view's first screen
    /// row); the backend reads cells directly off the view's [`crate::Grid`].
    fn draw_text(&mut self, topline: usize);

    /// Register a style string under a numeric slot. Called once per slot
    /// when a syntax definition is attached.
    fn syntax_style(&mut self, slot: StyleSlot, spec: &str);
}

/// Invoked once per valid selection during draw (spec §4.2 step 9),
/// carrying the selection's absolute byte range.
pub type SelectionHook = Box<dyn FnMut(Range)>;
