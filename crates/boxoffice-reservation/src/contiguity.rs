//! Search for a block of numerically adjacent seats within one row.

use std::collections::BTreeMap;

use boxoffice_entity::seat::Seat;

/// Find the first run of `count` seats with consecutive numbers in the
/// same row.
///
/// Rows are visited in label order and seats in number order; the running
/// window restarts whenever adjacency breaks. Returns `None` when no row
/// holds a long enough run, or when `count` is zero.
pub fn find_contiguous_block(seats: &[Seat], count: usize) -> Option<Vec<Seat>> {
    if count == 0 {
        return None;
    }

    let mut rows: BTreeMap<&str, Vec<&Seat>> = BTreeMap::new();
    for seat in seats {
        rows.entry(seat.row_label.as_str()).or_default().push(seat);
    }

    for mut row in rows.into_values() {
        row.sort_by_key(|seat| seat.number);
        row.dedup_by_key(|seat| seat.number);

        let mut window: Vec<&Seat> = Vec::with_capacity(count);
        for seat in row {
            let adjacent = window
                .last()
                .is_some_and(|last| last.number + 1 == seat.number);
            if !adjacent {
                window.clear();
            }
            window.push(seat);
            if window.len() == count {
                return Some(window.into_iter().cloned().collect());
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxoffice_core::types::{ScheduleId, SeatId};

    fn seat(id: i64, row: &str, number: i32) -> Seat {
        Seat::new(SeatId(id), ScheduleId(1), "R", row, number)
    }

    fn numbers(block: &[Seat]) -> Vec<i32> {
        block.iter().map(|s| s.number).collect()
    }

    #[test]
    fn test_first_window_in_row() {
        let seats: Vec<Seat> = (1..=8).map(|n| seat(n, "A", n as i32)).collect();
        let block = find_contiguous_block(&seats, 3).unwrap();
        assert_eq!(numbers(&block), vec![1, 2, 3]);
    }

    #[test]
    fn test_window_resets_on_gap() {
        let seats = vec![seat(1, "A", 1), seat(2, "A", 2), seat(4, "A", 4), seat(5, "A", 5), seat(6, "A", 6)];
        let block = find_contiguous_block(&seats, 3).unwrap();
        assert_eq!(numbers(&block), vec![4, 5, 6]);
    }

    #[test]
    fn test_unsorted_input_and_other_rows() {
        let seats = vec![
            seat(12, "B", 3),
            seat(1, "A", 1),
            seat(10, "B", 1),
            seat(3, "A", 3),
            seat(11, "B", 2),
        ];
        let block = find_contiguous_block(&seats, 3).unwrap();
        assert!(block.iter().all(|s| s.row_label == "B"));
        assert_eq!(numbers(&block), vec![1, 2, 3]);
    }

    #[test]
    fn test_never_spans_rows() {
        let seats = vec![seat(1, "A", 7), seat(2, "A", 8), seat(3, "B", 9)];
        assert!(find_contiguous_block(&seats, 3).is_none());
    }

    #[test]
    fn test_zero_and_oversized_requests() {
        let seats = vec![seat(1, "A", 1)];
        assert!(find_contiguous_block(&seats, 0).is_none());
        assert!(find_contiguous_block(&seats, 2).is_none());
        assert_eq!(find_contiguous_block(&seats, 1).unwrap().len(), 1);
    }
}
