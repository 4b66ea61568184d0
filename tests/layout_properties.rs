//! Property tests for column layout editing

use picgrid::core::{ColumnLayout, DescriptorPatch};
use proptest::prelude::*;

fn names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("col{i}")).collect()
}

fn indices(layout: &ColumnLayout) -> Vec<usize> {
    let mut indices: Vec<usize> = layout.descriptors().iter().map(|c| c.index).collect();
    indices.sort_unstable();
    indices
}

/// Names in display order
fn display_order(layout: &ColumnLayout) -> Vec<String> {
    layout.ordered().iter().map(|c| c.name.clone()).collect()
}

fn layout_and_two_slots() -> impl Strategy<Value = (usize, usize, usize)> {
    (1usize..12).prop_flat_map(|n| (Just(n), 0..n, 0..n))
}

proptest! {
    #[test]
    fn drag_keeps_indices_a_permutation((n, from, to) in layout_and_two_slots()) {
        let layout = ColumnLayout::initialize(names(n)).reorder_by_drag(from, to);
        prop_assert_eq!(indices(&layout), (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn drag_lands_on_target_and_keeps_others_in_order((n, from, to) in layout_and_two_slots()) {
        let before = ColumnLayout::initialize(names(n));
        let dragged = before.at_index(from).unwrap().name.clone();
        let after = before.reorder_by_drag(from, to);

        prop_assert_eq!(&after.at_index(to).unwrap().name, &dragged);

        let others_before: Vec<String> = display_order(&before).into_iter().filter(|c| *c != dragged).collect();
        let others_after: Vec<String> = display_order(&after).into_iter().filter(|c| *c != dragged).collect();
        prop_assert_eq!(others_before, others_after);
    }

    #[test]
    fn swap_exchanges_exactly_two((n, a, b) in layout_and_two_slots()) {
        let before = ColumnLayout::initialize(names(n));
        let after = before.swap_on_direct_drop(a, b);

        prop_assert_eq!(indices(&after), (0..n).collect::<Vec<_>>());
        for column in after.descriptors() {
            let old = before.get(&column.name).unwrap().index;
            let expected = if old == a { b } else if old == b { a } else { old };
            prop_assert_eq!(column.index, expected);
        }
    }

    #[test]
    fn search_by_stays_exclusive(n in 1usize..10, picks in proptest::collection::vec(0usize..10, 1..8)) {
        let mut layout = ColumnLayout::initialize(names(n));
        for pick in picks {
            let slot = pick % n;
            let name = layout.at_index(slot).unwrap().name.clone();
            layout = layout.set_attribute(slot, &name, &DescriptorPatch::search_by(true));

            let searchable: Vec<&str> = layout
                .descriptors()
                .iter()
                .filter(|c| c.search_by)
                .map(|c| c.name.as_str())
                .collect();
            prop_assert_eq!(searchable, vec![name.as_str()]);
        }
    }

    #[test]
    fn mismatched_name_changes_nothing(n in 1usize..8, slot in 0usize..8) {
        let layout = ColumnLayout::initialize(names(n));
        let after = layout.set_attribute(slot % n, "missing", &DescriptorPatch::hide(true));
        prop_assert_eq!(after, layout);
    }
}

#[test]
fn drag_first_of_five_to_third_slot() {
    let layout = ColumnLayout::initialize(["a", "b", "c", "d", "e"]).reorder_by_drag(0, 2);
    let index = |name: &str| layout.get(name).unwrap().index;

    assert_eq!(
        (index("a"), index("b"), index("c"), index("d"), index("e")),
        (2, 0, 1, 3, 4)
    );
}
