//! Filtering, sorting, visibility and pagination over the imported rows
//!
//! The engine keeps the filtered-and-sorted row order cached and recomputes it
//! whenever one of its inputs changes. Page views are cheap slices of that order.

use crate::core::predicate::{CompiledFilters, SearchPredicate};
use crate::core::projection::{ColumnDefinition, FilterStrategy};
use crate::core::types::Row;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use strum::Display;
use tracing::{debug, trace};

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SortDirection {
    #[strum(serialize = "asc")]
    Ascending,
    #[strum(serialize = "desc")]
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortState {
    pub column: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page_index: usize,
    pub page_size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of the current row model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    /// Indices into the dataset, in display order
    pub rows: Vec<usize>,
    pub page_index: usize,
    pub page_count: usize,
    /// Rows remaining after filtering
    pub total_rows: usize,
}

impl TableView {
    /// Footer label, e.g. "Page 1 of 3"
    pub fn page_label(&self) -> String {
        format!(
            "Page {} of {}",
            (self.page_index + 1).min(self.page_count),
            self.page_count
        )
    }

    /// Footer label, e.g. "Showing 10 rows out of 24"
    pub fn rows_label(&self) -> String {
        format!("Showing {} rows out of {}", self.rows.len(), self.total_rows)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RowEngine {
    data: Arc<[Row]>,
    columns: Vec<ColumnDefinition>,
    visibility: BTreeMap<String, bool>,
    filters: CompiledFilters,
    search_text: String,
    search: SearchPredicate,
    sort: Option<SortState>,
    pagination: Pagination,
    /// Filtered and sorted dataset indices
    order: Vec<usize>,
}

impl RowEngine {
    pub fn new(page_size: usize) -> Self {
        Self {
            pagination: Pagination {
                page_index: 0,
                page_size: page_size.max(1),
            },
            ..Self::default()
        }
    }

    /// Replace data and column configuration; resets search, sort, visibility and paging
    pub fn set_data(&mut self, data: Arc<[Row]>, columns: Vec<ColumnDefinition>) {
        self.visibility = columns.iter().map(|c| (c.id.clone(), c.visible)).collect();
        self.data = data;
        self.columns = columns;
        self.search_text.clear();
        self.search = SearchPredicate::default();
        self.sort = None;
        self.refresh();
    }

    pub fn set_filters(&mut self, filters: CompiledFilters) {
        self.filters = filters;
        self.refresh();
    }

    pub fn set_search_text(&mut self, text: &str) {
        if text == self.search_text {
            return;
        }
        self.search_text = text.to_string();
        self.search = SearchPredicate::new(text);
        self.refresh();
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn data(&self) -> &[Row] {
        &self.data
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.data.get(index)
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn column(&self, id: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.id == id)
    }

    pub fn visible_columns(&self) -> Vec<&ColumnDefinition> {
        self.columns.iter().filter(|c| self.is_visible(&c.id)).collect()
    }

    pub fn is_visible(&self, column: &str) -> bool {
        self.visibility.get(column).copied().unwrap_or(false)
    }

    pub fn set_visibility(&mut self, column: &str, visible: bool) {
        match self.visibility.get_mut(column) {
            Some(v) => *v = visible,
            None => debug!("Ignoring visibility change for unknown column '{column}'"),
        }
    }

    pub fn toggle_visibility(&mut self, column: &str) {
        let visible = self.is_visible(column);
        self.set_visibility(column, !visible);
    }

    pub fn show_all_columns(&mut self) {
        self.visibility.values_mut().for_each(|v| *v = true);
    }

    pub fn sort_state(&self) -> Option<&SortState> {
        self.sort.as_ref()
    }

    /// Ascending first, then flip on each toggle; a new column starts ascending again
    pub fn toggle_sort(&mut self, column: &str) {
        let Some(definition) = self.column(column) else {
            debug!("Ignoring sort on unknown column '{column}'");
            return;
        };
        if !definition.sortable {
            debug!("Column '{column}' is not sortable");
            return;
        }
        let direction = match &self.sort {
            Some(s) if s.column == column && s.direction == SortDirection::Ascending => {
                SortDirection::Descending
            }
            _ => SortDirection::Ascending,
        };
        self.sort = Some(SortState {
            column: column.to_string(),
            direction,
        });
        self.refresh();
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn page_count(&self) -> usize {
        self.order.len().div_ceil(self.pagination.page_size)
    }

    pub fn can_previous_page(&self) -> bool {
        self.pagination.page_index > 0
    }

    pub fn can_next_page(&self) -> bool {
        self.pagination.page_index + 1 < self.page_count()
    }

    pub fn next_page(&mut self) {
        if self.can_next_page() {
            self.pagination.page_index += 1;
        }
    }

    pub fn previous_page(&mut self) {
        if self.can_previous_page() {
            self.pagination.page_index -= 1;
        }
    }

    pub fn first_page(&mut self) {
        self.pagination.page_index = 0;
    }

    pub fn last_page(&mut self) {
        self.pagination.page_index = self.page_count().saturating_sub(1);
    }

    pub fn view(&self) -> TableView {
        let start = self.pagination.page_index * self.pagination.page_size;
        let rows = self
            .order
            .iter()
            .skip(start)
            .take(self.pagination.page_size)
            .copied()
            .collect();
        TableView {
            rows,
            page_index: self.pagination.page_index,
            page_count: self.page_count(),
            total_rows: self.order.len(),
        }
    }

    fn accepts(&self, row: &Row) -> bool {
        self.columns.iter().all(|column| {
            let cell = row.get(&column.id);
            match column.strategy {
                FilterStrategy::Substring => {
                    self.search.accepts(cell) && self.filters.get(&column.id).accepts(cell)
                }
                FilterStrategy::ValueMembership => self.filters.get(&column.id).accepts(cell),
                FilterStrategy::Unrestricted => true,
            }
        })
    }

    fn refresh(&mut self) {
        let mut order: Vec<usize> = self
            .data
            .iter()
            .enumerate()
            .filter(|(_, row)| self.accepts(row))
            .map(|(i, _)| i)
            .collect();

        if let Some(sort) = &self.sort {
            let data = &self.data;
            order.sort_by(|&a, &b| {
                let ordering = compare_cells(data[a].get(&sort.column), data[b].get(&sort.column));
                match sort.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }

        trace!("Row model: {} of {} rows", order.len(), self.data.len());
        self.order = order;
        self.pagination.page_index = 0;
    }
}

/// Sort class of a cell. Classes order as declared; finite numeric strings
/// share the number class, anything else that is a string is text.
enum SortKey<'a> {
    Missing,
    Bool(bool),
    Number(f64),
    Text(&'a str),
    Nested,
}

impl<'a> SortKey<'a> {
    fn of(value: Option<&'a Value>) -> Self {
        match value {
            None | Some(Value::Null) => SortKey::Missing,
            Some(Value::Bool(b)) => SortKey::Bool(*b),
            Some(Value::Number(n)) => n.as_f64().map_or(SortKey::Missing, SortKey::Number),
            Some(Value::String(s)) => match s.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => SortKey::Number(n),
                _ => SortKey::Text(s),
            },
            Some(Value::Array(_)) | Some(Value::Object(_)) => SortKey::Nested,
        }
    }

    fn class(&self) -> u8 {
        match self {
            SortKey::Missing => 0,
            SortKey::Bool(_) => 1,
            SortKey::Number(_) => 2,
            SortKey::Text(_) => 3,
            SortKey::Nested => 4,
        }
    }
}

/// Total order over cells: by class first, numbers numerically, text
/// case-insensitively with a case-sensitive tiebreak
pub fn compare_cells(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let (a, b) = (SortKey::of(a), SortKey::of(b));
    match (&a, &b) {
        (SortKey::Bool(x), SortKey::Bool(y)) => x.cmp(y),
        (SortKey::Number(x), SortKey::Number(y)) => x.total_cmp(y),
        (SortKey::Text(x), SortKey::Text(y)) => x
            .to_lowercase()
            .cmp(&y.to_lowercase())
            .then_with(|| x.cmp(y)),
        _ => a.class().cmp(&b.class()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filter_state::{FilterAction, populate, reduce};
    use crate::core::layout::{ColumnLayout, DescriptorPatch};
    use crate::core::predicate::compile;
    use crate::core::projection::project;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn rows(values: serde_json::Value) -> Arc<[Row]> {
        serde_json::from_value::<Vec<Row>>(values).unwrap().into()
    }

    fn animals() -> Arc<[Row]> {
        rows(json!([
            {"img": "http://x/1.png", "tag": "cat", "n": 3},
            {"img": "http://x/2.png", "tag": "dog", "n": 1},
            {"img": "http://x/3.jpg", "tag": "Cat", "n": 2},
        ]))
    }

    fn engine_with_tag_filter() -> (RowEngine, crate::core::FinalizedLayout) {
        let layout = ColumnLayout::initialize(["img", "tag", "n"])
            .set_attribute(1, "tag", &DescriptorPatch::filter(true))
            .finalize();
        let mut engine = RowEngine::new(10);
        engine.set_data(animals(), project(&layout));
        (engine, layout)
    }

    #[test]
    fn test_unfiltered_view_shows_everything() {
        let (engine, _) = engine_with_tag_filter();
        let view = engine.view();
        assert_eq!(view.rows, vec![0, 1, 2]);
        assert_eq!(view.total_rows, 3);
        assert_eq!(view.page_label(), "Page 1 of 1");
        assert_eq!(view.rows_label(), "Showing 3 rows out of 3");
    }

    #[test]
    fn test_membership_filter_applies() {
        let (mut engine, layout) = engine_with_tag_filter();
        let state = reduce(
            &populate(&layout, engine.data()),
            FilterAction::ChangeFilter {
                column: "tag".to_string(),
                value: "cat".to_string(),
            },
        );
        engine.set_filters(compile(&state));

        assert_eq!(engine.view().rows, vec![0, 2]);
    }

    #[test]
    fn test_search_text_filters_search_column() {
        let (mut engine, _) = engine_with_tag_filter();
        engine.set_search_text("PNG");
        assert_eq!(engine.view().rows, vec![0, 1]);

        engine.set_search_text("");
        assert_eq!(engine.view().total_rows, 3);
    }

    #[test]
    fn test_search_and_membership_combine() {
        let (mut engine, layout) = engine_with_tag_filter();
        let state = reduce(
            &populate(&layout, engine.data()),
            FilterAction::ChangeFilter {
                column: "tag".to_string(),
                value: "cat".to_string(),
            },
        );
        engine.set_filters(compile(&state));
        engine.set_search_text("png");

        assert_eq!(engine.view().rows, vec![0]);
    }

    #[test]
    fn test_toggle_sort_flips_direction() {
        let (mut engine, _) = engine_with_tag_filter();

        engine.toggle_sort("n");
        assert_eq!(engine.view().rows, vec![1, 2, 0]);
        assert_eq!(engine.sort_state().unwrap().direction, SortDirection::Ascending);

        engine.toggle_sort("n");
        assert_eq!(engine.view().rows, vec![0, 2, 1]);

        engine.toggle_sort("tag");
        assert_eq!(engine.sort_state().unwrap().direction, SortDirection::Ascending);
    }

    #[test]
    fn test_unsortable_column_is_ignored() {
        let layout = ColumnLayout::initialize(["img", "n"])
            .set_attribute(1, "n", &DescriptorPatch::sort(false))
            .finalize();
        let mut engine = RowEngine::new(10);
        engine.set_data(animals(), project(&layout));

        engine.toggle_sort("n");
        assert!(engine.sort_state().is_none());
        engine.toggle_sort("missing");
        assert!(engine.sort_state().is_none());
    }

    #[test]
    fn test_pagination() {
        let data: Vec<serde_json::Value> = (0..25).map(|i| json!({"id": format!("{i}")})).collect();
        let layout = ColumnLayout::initialize(["id"]).finalize();
        let mut engine = RowEngine::new(10);
        engine.set_data(rows(json!(data)), project(&layout));

        assert_eq!(engine.page_count(), 3);
        assert!(!engine.can_previous_page());

        engine.next_page();
        engine.next_page();
        assert!(!engine.can_next_page());
        let view = engine.view();
        assert_eq!(view.rows.len(), 5);
        assert_eq!(view.page_label(), "Page 3 of 3");

        engine.next_page();
        assert_eq!(engine.pagination().page_index, 2);

        engine.first_page();
        assert_eq!(engine.view().rows.len(), 10);
        engine.last_page();
        assert_eq!(engine.pagination().page_index, 2);
    }

    #[test]
    fn test_filter_change_resets_page() {
        let data: Vec<serde_json::Value> = (0..25).map(|i| json!({"id": format!("{i}")})).collect();
        let layout = ColumnLayout::initialize(["id"]).finalize();
        let mut engine = RowEngine::new(10);
        engine.set_data(rows(json!(data)), project(&layout));
        engine.last_page();

        engine.set_search_text("1");
        assert_eq!(engine.pagination().page_index, 0);
    }

    #[test]
    fn test_empty_view_labels() {
        let (mut engine, _) = engine_with_tag_filter();
        engine.set_search_text("nothing matches this");
        let view = engine.view();
        assert!(view.rows.is_empty());
        assert_eq!(view.page_label(), "Page 0 of 0");
    }

    #[test]
    fn test_visibility() {
        let layout = ColumnLayout::initialize(["img", "tag", "n"])
            .set_attribute(2, "n", &DescriptorPatch::hide(true))
            .finalize();
        let mut engine = RowEngine::new(10);
        engine.set_data(animals(), project(&layout));

        let ids = |e: &RowEngine| e.visible_columns().iter().map(|c| c.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&engine), vec!["img", "tag"]);

        engine.toggle_visibility("img");
        assert_eq!(ids(&engine), vec!["tag"]);

        engine.show_all_columns();
        assert_eq!(ids(&engine), vec!["img", "tag", "n"]);
    }

    #[test]
    fn test_compare_cells() {
        assert_eq!(compare_cells(Some(&json!("10")), Some(&json!("9"))), Ordering::Greater);
        assert_eq!(compare_cells(Some(&json!("apple")), Some(&json!("Banana"))), Ordering::Less);
        assert_eq!(compare_cells(None, Some(&json!("a"))), Ordering::Less);
        assert_eq!(compare_cells(Some(&json!(2.5)), Some(&json!(2))), Ordering::Greater);
    }

    #[test]
    fn test_numbers_sort_before_text() {
        let cmp = |a: &str, b: &str| compare_cells(Some(&json!(a)), Some(&json!(b)));
        assert_eq!(cmp("9", "10"), Ordering::Less);
        assert_eq!(cmp("10", "1a"), Ordering::Less);
        assert_eq!(cmp("9", "1a"), Ordering::Less);
        assert_eq!(cmp("NaN", "1"), Ordering::Greater);
        assert_eq!(cmp("NaN", "2"), Ordering::Greater);
        assert_eq!(cmp("inf", "nan"), Ordering::Less);
    }

    #[test]
    fn test_sort_mixed_strings() {
        let layout = ColumnLayout::initialize(["v"]).finalize();
        let mut engine = RowEngine::new(20);
        engine.set_data(
            rows(json!([
                {"v": "9"}, {"v": "10"}, {"v": "1a"}, {"v": "NaN"},
                {"v": "3D"}, {"v": "1"}, {"v": "inf"}, {"v": ""},
            ])),
            project(&layout),
        );

        engine.toggle_sort("v");
        assert_eq!(engine.view().rows, vec![5, 0, 1, 7, 2, 4, 6, 3]);

        engine.toggle_sort("v");
        assert_eq!(engine.view().rows, vec![3, 6, 4, 2, 7, 1, 0, 5]);
    }

    #[test]
    fn test_search_column_also_honours_membership() {
        let layout = ColumnLayout::initialize(["img", "tag", "n"])
            .set_attribute(1, "tag", &DescriptorPatch::search_by(true))
            .set_attribute(1, "tag", &DescriptorPatch::filter(true))
            .finalize();
        let mut engine = RowEngine::new(10);
        engine.set_data(animals(), project(&layout));
        let state = reduce(
            &populate(&layout, engine.data()),
            FilterAction::ChangeFilter {
                column: "tag".to_string(),
                value: "cat".to_string(),
            },
        );
        engine.set_filters(compile(&state));
        assert_eq!(engine.view().rows, vec![0, 2]);

        engine.set_search_text("Ca");
        assert_eq!(engine.view().rows, vec![0, 2]);
        engine.set_search_text("dog");
        assert!(engine.view().rows.is_empty());
    }
}
