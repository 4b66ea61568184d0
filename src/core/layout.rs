//! Column layout model
//!
//! A layout is an arena of [`ColumnDescriptor`]s kept in creation order, so a
//! descriptor's identity is its `name` and never its slot in the vector. The
//! display order lives in the `index` field, which is always a permutation of
//! `0..n`. Every operation takes `&ColumnLayout` and returns a new layout.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Display, sort, search and filter role of one data field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    pub name: String,
    pub index: usize,
    pub hide: bool,
    pub sort: bool,
    pub search_by: bool,
    pub filter: bool,
}

impl ColumnDescriptor {
    fn with_defaults(name: String, index: usize) -> Self {
        Self {
            name,
            index,
            hide: false,
            sort: true,
            search_by: index == 0,
            filter: false,
        }
    }
}

/// Partial update of a descriptor's flags. `name` and `index` are not patchable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptorPatch {
    pub hide: Option<bool>,
    pub sort: Option<bool>,
    pub search_by: Option<bool>,
    pub filter: Option<bool>,
}

impl DescriptorPatch {
    pub fn hide(value: bool) -> Self {
        Self { hide: Some(value), ..Default::default() }
    }

    pub fn sort(value: bool) -> Self {
        Self { sort: Some(value), ..Default::default() }
    }

    pub fn search_by(value: bool) -> Self {
        Self { search_by: Some(value), ..Default::default() }
    }

    pub fn filter(value: bool) -> Self {
        Self { filter: Some(value), ..Default::default() }
    }

    fn apply_to(&self, descriptor: &mut ColumnDescriptor) {
        if let Some(hide) = self.hide {
            descriptor.hide = hide;
        }
        if let Some(sort) = self.sort {
            descriptor.sort = sort;
        }
        if let Some(search_by) = self.search_by {
            descriptor.search_by = search_by;
        }
        if let Some(filter) = self.filter {
            descriptor.filter = filter;
        }
    }
}

/// Editable set of column descriptors for the current dataset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnLayout {
    columns: Vec<ColumnDescriptor>,
}

impl ColumnLayout {
    /// Build default descriptors from field names in their enumeration order.
    ///
    /// The first field becomes the search column; every field starts sortable,
    /// visible and unfiltered. An empty input yields an empty layout.
    pub fn initialize<I, S>(field_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = field_names
            .into_iter()
            .enumerate()
            .map(|(index, name)| ColumnDescriptor::with_defaults(name.into(), index))
            .collect();
        Self { columns }
    }

    /// Wrap existing descriptors (e.g. a restored layout) for further editing
    pub fn from_descriptors(columns: Vec<ColumnDescriptor>) -> Self {
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Descriptors in creation (identity) order
    pub fn descriptors(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Descriptors in display order
    pub fn ordered(&self) -> Vec<&ColumnDescriptor> {
        let mut ordered: Vec<&ColumnDescriptor> = self.columns.iter().collect();
        ordered.sort_by_key(|c| c.index);
        ordered
    }

    /// Descriptor currently displayed at `index`
    pub fn at_index(&self, index: usize) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.index == index)
    }

    /// Descriptor by field name
    pub fn get(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn search_column(&self) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.search_by)
    }

    /// Move the descriptor at `dragged` into slot `drop_target`.
    ///
    /// Descriptors between the vacated slot and the target shift one slot
    /// opposite to the drag direction, so the rest keep their relative order.
    pub fn reorder_by_drag(&self, dragged: usize, drop_target: usize) -> Self {
        if dragged == drop_target {
            return self.clone();
        }
        if self.at_index(dragged).is_none() || self.at_index(drop_target).is_none() {
            warn!(
                "Ignoring drag from {dragged} to {drop_target}: index not in layout of {} columns",
                self.len()
            );
            return self.clone();
        }

        let toward_front = drop_target < dragged;
        let columns = self
            .columns
            .iter()
            .map(|column| {
                let mut column = column.clone();
                if column.index == dragged {
                    column.index = drop_target;
                } else if toward_front && column.index >= drop_target && column.index < dragged {
                    column.index += 1;
                } else if !toward_front && column.index > dragged && column.index <= drop_target {
                    column.index -= 1;
                }
                column
            })
            .collect();

        debug!("Moved column from {dragged} to {drop_target}");
        Self { columns }
    }

    /// Exchange the display slots of `source` and `target`; nothing else moves.
    pub fn swap_on_direct_drop(&self, source: usize, target: usize) -> Self {
        if source == target {
            return self.clone();
        }
        if self.at_index(source).is_none() || self.at_index(target).is_none() {
            warn!(
                "Ignoring drop of {source} onto {target}: index not in layout of {} columns",
                self.len()
            );
            return self.clone();
        }

        let columns = self
            .columns
            .iter()
            .map(|column| {
                let mut column = column.clone();
                if column.index == source {
                    column.index = target;
                } else if column.index == target {
                    column.index = source;
                }
                column
            })
            .collect();

        debug!("Swapped columns at {source} and {target}");
        Self { columns }
    }

    /// Apply `patch` to the descriptor matching both `target_index` and `target_name`.
    ///
    /// Setting `search_by` clears it on every other descriptor in the same step.
    pub fn set_attribute(&self, target_index: usize, target_name: &str, patch: &DescriptorPatch) -> Self {
        let matched = self
            .columns
            .iter()
            .any(|c| c.index == target_index && c.name == target_name);
        if !matched {
            warn!("No column '{target_name}' at index {target_index}; attribute change dropped");
            return self.clone();
        }

        let takes_search = patch.search_by == Some(true);
        let columns = self
            .columns
            .iter()
            .map(|column| {
                let mut column = column.clone();
                if column.index == target_index && column.name == target_name {
                    patch.apply_to(&mut column);
                } else if takes_search {
                    column.search_by = false;
                }
                column
            })
            .collect();

        Self { columns }
    }

    /// Snapshot the layout for the rest of the system
    pub fn finalize(&self) -> FinalizedLayout {
        FinalizedLayout::from_descriptors(self.columns.clone())
    }
}

/// Immutable layout snapshot, sorted by `index`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ColumnDescriptor>", into = "Vec<ColumnDescriptor>")]
pub struct FinalizedLayout(Arc<[ColumnDescriptor]>);

impl FinalizedLayout {
    pub fn from_descriptors(mut columns: Vec<ColumnDescriptor>) -> Self {
        columns.sort_by_key(|c| c.index);
        Self(columns.into())
    }

    /// Descriptors in display order
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn search_column(&self) -> Option<&ColumnDescriptor> {
        self.0.iter().find(|c| c.search_by)
    }

    pub fn filterable(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.0.iter().filter(|c| c.filter)
    }

    /// Dense `0..n` indices, unique names and at most one search column
    pub fn is_consistent(&self) -> bool {
        let dense = self.0.iter().enumerate().all(|(slot, c)| c.index == slot);
        let mut names: Vec<&str> = self.0.iter().map(|c| c.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        let search_count = self.0.iter().filter(|c| c.search_by).count();
        dense && names.len() == self.0.len() && search_count <= 1
    }

    /// Reopen the snapshot for another editing session
    pub fn to_layout(&self) -> ColumnLayout {
        ColumnLayout::from_descriptors(self.0.to_vec())
    }
}

impl From<Vec<ColumnDescriptor>> for FinalizedLayout {
    fn from(columns: Vec<ColumnDescriptor>) -> Self {
        Self::from_descriptors(columns)
    }
}

impl From<FinalizedLayout> for Vec<ColumnDescriptor> {
    fn from(layout: FinalizedLayout) -> Self {
        layout.0.to_vec()
    }
}

/// Progress of a drag gesture
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging { source: usize },
}

/// Semantic events emitted by whatever surface the user drags on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutEvent {
    DragStart(usize),
    /// Drop into the gap before the column at this index
    DropOnGap(usize),
    /// Drop directly onto the column at this index
    DropOnColumn(usize),
    CancelDrag,
    SetAttribute {
        index: usize,
        name: String,
        patch: DescriptorPatch,
    },
}

/// One layout editing session: a layout plus the pending drag
#[derive(Debug, Clone, Default)]
pub struct LayoutEditor {
    layout: ColumnLayout,
    drag: DragState,
}

impl LayoutEditor {
    pub fn new<I, S>(field_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_layout(ColumnLayout::initialize(field_names))
    }

    pub fn from_layout(layout: ColumnLayout) -> Self {
        Self {
            layout,
            drag: DragState::Idle,
        }
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    /// Target index for the gap at position `gap` (`len()` is the trailing gap)
    pub fn gap_target(&self, gap: usize) -> usize {
        gap.min(self.layout.len().saturating_sub(1))
    }

    pub fn apply(&mut self, event: LayoutEvent) {
        match event {
            LayoutEvent::DragStart(index) => {
                if self.layout.at_index(index).is_some() {
                    self.drag = DragState::Dragging { source: index };
                } else {
                    warn!("Drag started on index {index} which is not in the layout");
                    self.drag = DragState::Idle;
                }
            }
            LayoutEvent::DropOnGap(target) => {
                if let Some(source) = self.take_drag_source() {
                    self.layout = self.layout.reorder_by_drag(source, target);
                }
            }
            LayoutEvent::DropOnColumn(target) => {
                if let Some(source) = self.take_drag_source() {
                    self.layout = self.layout.swap_on_direct_drop(source, target);
                }
            }
            LayoutEvent::CancelDrag => self.drag = DragState::Idle,
            LayoutEvent::SetAttribute { index, name, patch } => {
                self.layout = self.layout.set_attribute(index, &name, &patch);
            }
        }
    }

    fn take_drag_source(&mut self) -> Option<usize> {
        match std::mem::take(&mut self.drag) {
            DragState::Dragging { source } => Some(source),
            DragState::Idle => {
                warn!("Drop received with no drag in progress, nothing to drop");
                None
            }
        }
    }

    pub fn finalize(&self) -> FinalizedLayout {
        self.layout.finalize()
    }
}
