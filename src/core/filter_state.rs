//! Per-column multi-value filter state
//!
//! For every filterable column the store tracks each distinct (lower-cased)
//! string value seen in the data and whether the user has toggled it on.

use crate::core::layout::FinalizedLayout;
use crate::core::types::{Row, lowercase_str};
use derive_deref::{Deref, DerefMut};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Observed value to "toggled" flag for a single column
pub type ColumnValues = BTreeMap<String, bool>;

/// Column name to its observed values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Deref, DerefMut)]
pub struct FilterValueMap(pub BTreeMap<String, ColumnValues>);

impl FilterValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `value` in `column` is currently toggled on
    pub fn is_toggled(&self, column: &str, value: &str) -> bool {
        self.0
            .get(column)
            .and_then(|values| values.get(value))
            .copied()
            .unwrap_or(false)
    }
}

/// Transitions accepted by [`reduce`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterAction {
    Reset,
    SetColumn { column: String, values: ColumnValues },
    ChangeFilter { column: String, value: String },
    SetState(FilterValueMap),
}

/// Apply one transition to `state`, returning the next state
pub fn reduce(state: &FilterValueMap, action: FilterAction) -> FilterValueMap {
    match action {
        FilterAction::Reset => FilterValueMap::new(),
        FilterAction::SetColumn { column, values } => {
            let mut next = state.clone();
            next.insert(column, values);
            next
        }
        FilterAction::ChangeFilter { column, value } => {
            let mut next = state.clone();
            match next.get_mut(&column).and_then(|values| values.get_mut(&value)) {
                Some(flag) => {
                    *flag = !*flag;
                    debug!("Filter value '{value}' in '{column}' is now {flag}");
                }
                None => warn!("Toggle on unregistered filter value '{value}' in column '{column}'"),
            }
            next
        }
        FilterAction::SetState(next) => next,
    }
}

/// Distinct lower-cased string values of `column` across `rows`, all untoggled
pub fn observed_values(rows: &[Row], column: &str) -> ColumnValues {
    rows.iter()
        .filter_map(|row| row.get(column))
        .filter_map(lowercase_str)
        .map(|value| (value, false))
        .collect()
}

/// Rebuild the whole map for the filterable columns of `layout`
pub fn populate(layout: &FinalizedLayout, rows: &[Row]) -> FilterValueMap {
    layout
        .filterable()
        .fold(reduce(&FilterValueMap::new(), FilterAction::Reset), |state, column| {
            let values = observed_values(rows, &column.name);
            reduce(
                &state,
                FilterAction::SetColumn {
                    column: column.name.clone(),
                    values,
                },
            )
        })
}
