//! Compiles the filter value map into per-column row predicates

use crate::core::filter_state::FilterValueMap;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Acceptance rule for one column's cells
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ColumnPredicate {
    /// The column imposes no restriction
    #[default]
    Unrestricted,
    /// Accept a cell whose lower-cased string value is one of these
    OneOf(BTreeSet<String>),
}

impl ColumnPredicate {
    /// Non-string cells are always accepted; only strings can be matched
    pub fn accepts(&self, cell: Option<&Value>) -> bool {
        match self {
            ColumnPredicate::Unrestricted => true,
            ColumnPredicate::OneOf(allowed) => match cell {
                Some(Value::String(s)) => allowed.contains(&s.to_lowercase()),
                other => {
                    debug!("Membership filter applied to non-string cell {other:?}; accepting");
                    true
                }
            },
        }
    }

    pub fn is_restricting(&self) -> bool {
        matches!(self, ColumnPredicate::OneOf(_))
    }
}

/// Compiled predicates keyed by column name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledFilters {
    by_column: BTreeMap<String, ColumnPredicate>,
}

impl CompiledFilters {
    /// Predicate for `column`; columns never compiled are unrestricted
    pub fn get(&self, column: &str) -> &ColumnPredicate {
        static UNRESTRICTED: ColumnPredicate = ColumnPredicate::Unrestricted;
        self.by_column.get(column).unwrap_or(&UNRESTRICTED)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ColumnPredicate)> {
        self.by_column.iter()
    }

    /// Number of columns currently restricting rows
    pub fn active_count(&self) -> usize {
        self.by_column.values().filter(|p| p.is_restricting()).count()
    }
}

/// Turn toggled values into predicates; OR within a column, AND across columns
pub fn compile(state: &FilterValueMap) -> CompiledFilters {
    let by_column = state
        .iter()
        .map(|(column, values)| {
            let toggled: BTreeSet<String> = values
                .iter()
                .filter(|(_, on)| **on)
                .map(|(value, _)| value.clone())
                .collect();
            let predicate = if toggled.is_empty() {
                ColumnPredicate::Unrestricted
            } else {
                ColumnPredicate::OneOf(toggled)
            };
            (column.clone(), predicate)
        })
        .collect();

    CompiledFilters { by_column }
}

/// Case-insensitive substring match against live search input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPredicate {
    needle: String,
}

impl SearchPredicate {
    pub fn new(input: &str) -> Self {
        Self {
            needle: input.to_lowercase(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    pub fn accepts(&self, cell: Option<&Value>) -> bool {
        if self.needle.is_empty() {
            return true;
        }
        match cell {
            Some(Value::String(s)) => s.to_lowercase().contains(&self.needle),
            _ => true,
        }
    }
}
