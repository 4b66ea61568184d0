//! Projects a finalized layout into row-engine column definitions

use crate::core::layout::FinalizedLayout;
use crate::core::types::{display_value, is_valid_http_url};
use serde_json::Value;
use strum::Display;

/// How a column participates in row filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum FilterStrategy {
    /// Free-text input, case-insensitive substring
    Substring,
    /// Compiled value-membership predicate
    ValueMembership,
    Unrestricted,
}

/// Engine-facing column configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub id: String,
    pub visible: bool,
    pub sortable: bool,
    pub strategy: FilterStrategy,
}

/// What a cell should look like once rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellContent {
    Image(String),
    /// An image link whose resource failed to load
    Link(String),
    Text(String),
}

impl CellContent {
    pub fn is_image(&self) -> bool {
        matches!(self, CellContent::Image(_))
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            CellContent::Image(url) | CellContent::Link(url) => Some(url),
            CellContent::Text(_) => None,
        }
    }
}

pub fn project(layout: &FinalizedLayout) -> Vec<ColumnDefinition> {
    layout
        .columns()
        .iter()
        .map(|column| {
            let strategy = if column.search_by {
                FilterStrategy::Substring
            } else if column.filter {
                FilterStrategy::ValueMembership
            } else {
                FilterStrategy::Unrestricted
            };
            ColumnDefinition {
                id: column.name.clone(),
                visible: !column.hide,
                sortable: column.sort,
                strategy,
            }
        })
        .collect()
}

/// Name of the column wired to free-text search, if any
pub fn search_column(layout: &FinalizedLayout) -> Option<&str> {
    layout.search_column().map(|c| c.name.as_str())
}

/// Decide how to present `value`; `image_failed` is that cell's own fallback flag
pub fn render_cell(value: Option<&Value>, image_failed: bool) -> CellContent {
    match value {
        Some(Value::String(s)) if is_valid_http_url(s) => {
            if image_failed {
                CellContent::Link(s.clone())
            } else {
                CellContent::Image(s.clone())
            }
        }
        Some(other) => CellContent::Text(display_value(other)),
        None => CellContent::Text(String::new()),
    }
}
