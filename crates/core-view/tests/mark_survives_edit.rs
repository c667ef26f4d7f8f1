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

/// A cursor placed mid-line survives an insertion earlier in the buffer,
/// landing on the same character rather than the same byte offset.
#[test]
fn cursor_survives_insert_before_it() {
    let mut v = view("hello world\n", 40, 5);
    let cidx = v.cursors().primary();
    v.cursor_to(cidx, 6); // 'w'

    v.text_mut().insert_bytes(0, "XXX ");
    v.draw();

    let pos = v.cursors().get(cidx).unwrap().pos;
    let mut buf = [0u8; 1];
    v.text().bytes_get(pos, &mut buf);
    assert_eq!(&buf, b"w");
}

/// A selection whose text is deleted out from under it collapses (both
/// endpoints resolve to `EPOS`) instead of pointing at stale bytes.
#[test]
fn selection_dies_when_its_text_is_deleted() {
    use core_text::EPOS;

    let mut v = view("hello world\n", 40, 5);
    let cidx = v.cursors().primary();
    v.cursor_to(cidx, 0);
    let sidx = v.selection_start(cidx).unwrap();

    v.text_mut().delete_range(0, 5);
    v.draw();

    let r = v.selection_get(sidx);
    assert!(r.is_none() || r.map(|r| r.start == EPOS || r.end == EPOS).unwrap_or(false));
}
