use core_syntax::StyleSlot;
use core_text::RopeBuffer;
use core_view::{UiBackend, View, ViewOptions};

struct NullUi;
impl UiBackend for NullUi {
    fn draw_text(&mut self, _topline: usize) {}
    fn syntax_style(&mut self, _slot: StyleSlot, _spec: &str) {}
}

fn view(text: &str, w: usize, h: usize) -> View<RopeBuffer, NullUi> {
    let mut v = View::new(RopeBuffer::from_str("t", text), NullUi, ViewOptions::default());
    v.resize(w, h);
    v
}

/// Walking a selection's cursor end back and forth across the anchor and
/// back to where it started leaves the same rendered span: the anchor nudge
/// that happens mid-flip is not visible once the cursor returns home.
#[test]
fn crossing_and_returning_restores_original_span() {
    let mut v = view("0123456789\n", 40, 3);
    let cidx = v.cursors().primary();
    v.cursor_to(cidx, 5);
    let sidx = v.selection_start(cidx).unwrap();
    let original = v.selection_get(sidx).unwrap();

    v.cursor_to(cidx, 1); // cross the anchor leftward
    v.cursor_to(cidx, 5); // and back

    let restored = v.selection_get(sidx).unwrap();
    assert_eq!(original.start, restored.start);
    assert_eq!(original.end, restored.end);
}

/// The primary cursor's row never reports past the viewport's last
/// rendered line after a motion, even across a viewport scroll.
#[test]
fn primary_cursor_row_stays_within_bounds_after_scroll_motion() {
    let text: String = (0..40).map(|i| format!("l{i}\n")).collect();
    let mut v = view(&text, 20, 5);
    let cidx = v.cursors().primary();
    for _ in 0..20 {
        v.line_down(cidx);
    }
    let row = v.cursors().get(cidx).unwrap().row;
    assert!(row <= v.bottomline());
}
