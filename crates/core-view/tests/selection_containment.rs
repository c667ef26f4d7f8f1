use core_syntax::StyleSlot;
use core_text::RopeBuffer;
use core_view::{CellFlags, UiBackend, View, ViewOptions};

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

/// Extending a selection rightward marks every cell between its two
/// endpoints, and none outside them, as `SELECTED`.
#[test]
fn extending_selection_marks_exactly_its_span() {
    let mut v = view("0123456789\n", 40, 3);
    let cidx = v.cursors().primary();
    v.cursor_to(cidx, 2);
    v.selection_start(cidx).unwrap();
    v.cursor_to(cidx, 5);

    // cursor_to(5) extends the selection's cursor-mark one past 5 (so the
    // last selected glyph sits under the cursor), covering columns 2..6.
    let row = v.grid().row(0);
    for (col, cell) in row.iter().enumerate().take(10) {
        let selected = cell.flags.contains(CellFlags::SELECTED);
        if (2..6).contains(&col) {
            assert!(selected, "column {col} should be selected");
        } else {
            assert!(!selected, "column {col} should not be selected");
        }
    }
}

/// `selection_swap` twice is a no-op on the rendered span even though the
/// owning cursor's row/col changes underneath.
#[test]
fn double_swap_preserves_rendered_span() {
    let mut v = view("abcdefgh\n", 40, 3);
    let cidx = v.cursors().primary();
    v.cursor_to(cidx, 1);
    v.selection_start(cidx).unwrap();
    v.cursor_to(cidx, 4);

    let before: Vec<bool> = v
        .grid()
        .row(0)
        .iter()
        .map(|c| c.flags.contains(CellFlags::SELECTED))
        .collect();

    v.selection_swap(cidx);
    v.selection_swap(cidx);

    let after: Vec<bool> = v
        .grid()
        .row(0)
        .iter()
        .map(|c| c.flags.contains(CellFlags::SELECTED))
        .collect();
    assert_eq!(before, after);
}
