use core_syntax::StyleSlot;
use core_text::RopeBuffer;
use core_view::{UiBackend, View, ViewOptions};

struct NullUi;
impl UiBackend for NullUi {
    fn draw_text(&mut self, _topline: usize) {}
    fn syntax_style(&mut self, _slot: StyleSlot, _spec: &str) {}
}

fn lines(n: usize) -> String {
    (0..n).map(|i| format!("line{i}\n")).collect()
}

fn view(text: &str, w: usize, h: usize) -> View<RopeBuffer, NullUi> {
    let mut v = View::new(RopeBuffer::from_str("t", text), NullUi, ViewOptions::default());
    v.resize(w, h);
    v
}

/// Scrolling the viewport down by N rows and back up by N rows returns to
/// the original top line, with no precomputed line index to consult.
#[test]
fn viewport_down_then_up_returns_to_start() {
    // height 6, move by 3 rows (< height) so both calls take the
    // accumulate-N-screen-lines path rather than the jump-to-end/
    // scan-exhausted edge cases.
    let mut v = view(&lines(50), 20, 6);
    let original_start = v.start();
    let original_lineno = v.grid().lines[0].lineno;

    assert!(v.viewport_down(3));
    assert_ne!(v.start(), original_start);

    assert!(v.viewport_up(3));
    assert_eq!(v.start(), original_start);
    assert_eq!(v.grid().lines[0].lineno, original_lineno);
}

/// `viewport_up` at the very top of the buffer fails and leaves the
/// viewport unchanged.
#[test]
fn viewport_up_at_start_fails() {
    let mut v = view(&lines(50), 20, 6);
    let start = v.start();
    assert!(!v.viewport_up(1));
    assert_eq!(v.start(), start);
}

/// `viewport_down` at end-of-file fails and leaves the viewport unchanged.
#[test]
fn viewport_down_at_eof_fails() {
    let mut v = view("short\n", 20, 6);
    let start = v.start();
    assert!(!v.viewport_down(1));
    assert_eq!(v.start(), start);
}
