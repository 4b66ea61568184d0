//! Property tests for the cell ordering used when sorting rows

use picgrid::services::row_engine::compare_cells;
use proptest::prelude::*;
use serde_json::{Value, json};
use std::cmp::Ordering;

/// Cells as they come out of CSV (strings) plus a few JSON scalars
fn cell() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[0-9]{1,3}".prop_map(Value::String),
        "[0-9]{1,2}[a-zA-Z]{0,2}".prop_map(Value::String),
        prop::sample::select(vec!["NaN", "inf", "-inf", "", " 7 ", "1e3", "abc", "ABC"])
            .prop_map(|s| Value::String(s.to_string())),
        any::<i32>().prop_map(|n| json!(n)),
        any::<bool>().prop_map(Value::Bool),
        Just(Value::Null),
    ]
}

proptest! {
    #[test]
    fn ordering_is_transitive(a in cell(), b in cell(), c in cell()) {
        let ab = compare_cells(Some(&a), Some(&b));
        let bc = compare_cells(Some(&b), Some(&c));
        let ac = compare_cells(Some(&a), Some(&c));
        if ab != Ordering::Greater && bc != Ordering::Greater {
            prop_assert_ne!(ac, Ordering::Greater);
        }
        if ab == Ordering::Equal && bc == Ordering::Equal {
            prop_assert_eq!(ac, Ordering::Equal);
        }
    }

    #[test]
    fn ordering_is_antisymmetric(a in cell(), b in cell()) {
        prop_assert_eq!(
            compare_cells(Some(&a), Some(&b)),
            compare_cells(Some(&b), Some(&a)).reverse()
        );
    }

    #[test]
    fn sorting_mixed_cells_never_panics(mut cells in prop::collection::vec(cell(), 0..200)) {
        cells.sort_by(|a, b| compare_cells(Some(a), Some(b)));
        for pair in cells.windows(2) {
            prop_assert_ne!(compare_cells(Some(&pair[0]), Some(&pair[1])), Ordering::Greater);
        }
    }
}
