//! End-to-end flows through the session: import, layout, filters and search

use picgrid::core::projection::{CellContent, render_cell};
use picgrid::core::{DescriptorPatch, LayoutEvent, Row};
use picgrid::services::{Session, SessionEvent, SortDirection};
use pretty_assertions::assert_eq;
use serde_json::json;

fn pets() -> Vec<Row> {
    serde_json::from_value(json!([
        {"img": "http://x/1.png", "tag": "cat", "weight": "4"},
        {"img": "http://x/2.png", "tag": "dog", "weight": "12"},
        {"img": "N/A", "tag": "Cat", "weight": "3"},
    ]))
    .unwrap()
}

fn set(session: &mut Session, index: usize, name: &str, patch: DescriptorPatch) {
    session.edit_layout(LayoutEvent::SetAttribute {
        index,
        name: name.to_string(),
        patch,
    });
}

#[test]
fn toggled_value_admits_only_matching_rows() {
    let mut session = Session::new(10);
    session.load_dataset(pets());
    set(&mut session, 1, "tag", DescriptorPatch::filter(true));
    session.finalize_layout();

    session.toggle_filter("tag", "cat");

    assert_eq!(session.engine().view().rows, vec![0, 2]);
}

#[test]
fn filter_on_the_search_column_still_applies() {
    let mut session = Session::new(10);
    session.load_dataset(pets());
    set(&mut session, 1, "tag", DescriptorPatch::search_by(true));
    set(&mut session, 1, "tag", DescriptorPatch::filter(true));
    session.finalize_layout();

    session.toggle_filter("tag", "dog");

    assert_eq!(session.compiled_filters().active_count(), 1);
    assert_eq!(session.engine().view().rows, vec![1]);
}

#[test]
fn non_http_value_renders_as_text() {
    let rows = pets();
    assert_eq!(render_cell(rows[2].get("img"), false), CellContent::Text("N/A".to_string()));
    assert_eq!(
        render_cell(rows[0].get("img"), false),
        CellContent::Image("http://x/1.png".to_string())
    );
}

#[test]
fn search_follows_the_search_column() {
    let mut session = Session::new(10);
    session.load_dataset(pets());
    set(&mut session, 1, "tag", DescriptorPatch::search_by(true));
    session.finalize_layout();

    assert_eq!(session.search_column(), Some("tag"));
    session.set_search_text("CAT");
    assert_eq!(session.engine().view().rows, vec![0, 2]);
}

#[test]
fn dragged_layout_reorders_visible_columns() {
    let mut session = Session::new(10);
    session.load_dataset(pets());
    session.edit_layout(LayoutEvent::DragStart(0));
    session.edit_layout(LayoutEvent::DropOnGap(2));
    set(&mut session, 0, "tag", DescriptorPatch::hide(true));
    session.finalize_layout();

    let visible: Vec<&str> = session
        .engine()
        .visible_columns()
        .iter()
        .map(|c| c.id.as_str())
        .collect();
    assert_eq!(visible, vec!["weight", "img"]);
}

#[test]
fn numeric_strings_sort_by_value() {
    let mut session = Session::new(10);
    session.load_dataset(pets());
    session.finalize_layout();

    session.engine_mut().toggle_sort("weight");
    assert_eq!(session.engine().view().rows, vec![2, 0, 1]);

    session.engine_mut().toggle_sort("weight");
    assert_eq!(session.engine().sort_state().unwrap().direction, SortDirection::Descending);
    assert_eq!(session.engine().view().rows, vec![1, 0, 2]);
}

#[test]
fn pages_split_the_filtered_rows() {
    let mut session = Session::new(2);
    session.load_dataset(pets());
    session.finalize_layout();

    let view = session.engine().view();
    assert_eq!(view.rows, vec![0, 1]);
    assert_eq!(view.page_label(), "Page 1 of 2");

    session.engine_mut().next_page();
    assert_eq!(session.engine().view().rows, vec![2]);
    assert!(!session.engine().can_next_page());
}

#[test]
fn committed_changes_are_broadcast() {
    let mut session = Session::new(10);
    let mut events = session.subscribe();
    session.load_dataset(pets());
    set(&mut session, 1, "tag", DescriptorPatch::filter(true));
    session.finalize_layout();
    session.toggle_filter("tag", "dog");

    let mut count = 0;
    while let Ok(SessionEvent::DataUpdated) = events.try_recv() {
        count += 1;
    }
    assert_eq!(count, 3);
}
