//! Property-based tests for mark survival across arbitrary edits.

use core_text::{RopeBuffer, TextSource};
use proptest::prelude::*;

proptest! {
    // A mark set before an insertion at or before its position shifts
    // forward by exactly the inserted length; a mark strictly after the
    // insertion point never moves.
    #[test]
    fn mark_shifts_exactly_by_inserted_length(
        original in "[a-z]{1,20}",
        mark_at in 0usize..20,
        insert_at in 0usize..20,
        inserted in "[A-Z]{1,10}",
    ) {
        let mark_at = mark_at.min(original.len());
        let insert_at = insert_at.min(original.len());
        let mut buf = RopeBuffer::from_str("t", &original);
        let m = buf.mark_set(mark_at);
        buf.insert_bytes(insert_at, &inserted);

        let expected = if mark_at >= insert_at {
            mark_at + inserted.len()
        } else {
            mark_at
        };
        prop_assert_eq!(buf.mark_get(m), expected);
    }

    // Deleting a range that doesn't touch the mark's position preserves it
    // (shifted back when the deletion lies before it).
    #[test]
    fn mark_outside_deleted_range_is_preserved_or_shifted(
        original in "[a-z]{5,30}",
        mark_at in 0usize..30,
        del_start in 0usize..15,
        del_len in 1usize..10,
    ) {
        let mark_at = mark_at.min(original.len());
        let del_start = del_start.min(original.len());
        let del_end = (del_start + del_len).min(original.len());
        prop_assume!(del_start < del_end);
        prop_assume!(mark_at <= del_start || mark_at >= del_end);

        let mut buf = RopeBuffer::from_str("t", &original);
        let m = buf.mark_set(mark_at);
        buf.delete_range(del_start, del_end);

        let expected = if mark_at >= del_end {
            mark_at - (del_end - del_start)
        } else {
            mark_at
        };
        prop_assert_eq!(buf.mark_get(m), expected);
    }
}
