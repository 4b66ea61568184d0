use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{EnumIter, IntoEnumIterator};

/// All possible actions in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "PascalCase")]
pub enum Action {
    // Navigation
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    NextPage,
    PreviousPage,
    FirstPage,
    LastPage,

    // Table
    ToggleSort,
    FocusSearch,
    OpenFilterMenu,
    OpenColumnMenu,
    EditLayout,
    Import,
    CopyCell,

    // Layout editor
    PickUpColumn,
    DropIntoGap,
    DropOntoColumn,
    ToggleHidden,
    ToggleSortable,
    ToggleFilterable,
    ToggleSearchBy,
    SaveLayout,

    // Menus
    ToggleSelection,
    ShowAllColumns,
    ClearFilters,
    NextField,

    // Application
    Quit,
    Confirm,
    Cancel,
}

impl Action {
    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Action::MoveUp => "Move cursor up",
            Action::MoveDown => "Move cursor down",
            Action::MoveLeft => "Move cursor left",
            Action::MoveRight => "Move cursor right",
            Action::NextPage => "Next page",
            Action::PreviousPage => "Previous page",
            Action::FirstPage => "First page",
            Action::LastPage => "Last page",
            Action::ToggleSort => "Sort by column",
            Action::FocusSearch => "Search",
            Action::OpenFilterMenu => "Filter values",
            Action::OpenColumnMenu => "Choose visible columns",
            Action::EditLayout => "Edit column layout",
            Action::Import => "Import data",
            Action::CopyCell => "Copy cell",
            Action::PickUpColumn => "Pick up column",
            Action::DropIntoGap => "Drop between columns",
            Action::DropOntoColumn => "Swap with column",
            Action::ToggleHidden => "Toggle hidden",
            Action::ToggleSortable => "Toggle sortable",
            Action::ToggleFilterable => "Toggle filterable",
            Action::ToggleSearchBy => "Search by this column",
            Action::SaveLayout => "Save layout",
            Action::ToggleSelection => "Toggle selection",
            Action::ShowAllColumns => "Show all columns",
            Action::ClearFilters => "Clear filters",
            Action::NextField => "Next field",
            Action::Quit => "Quit application",
            Action::Confirm => "Confirm",
            Action::Cancel => "Cancel",
        }
    }

    /// Get category for grouping in the hint bar
    pub fn category(&self) -> ActionCategory {
        match self {
            Action::MoveUp
            | Action::MoveDown
            | Action::MoveLeft
            | Action::MoveRight
            | Action::NextPage
            | Action::PreviousPage
            | Action::FirstPage
            | Action::LastPage => ActionCategory::Navigation,

            Action::ToggleSort
            | Action::FocusSearch
            | Action::OpenFilterMenu
            | Action::OpenColumnMenu
            | Action::CopyCell => ActionCategory::Table,

            Action::EditLayout
            | Action::PickUpColumn
            | Action::DropIntoGap
            | Action::DropOntoColumn
            | Action::ToggleHidden
            | Action::ToggleSortable
            | Action::ToggleFilterable
            | Action::ToggleSearchBy
            | Action::SaveLayout => ActionCategory::Layout,

            Action::ToggleSelection
            | Action::ShowAllColumns
            | Action::ClearFilters
            | Action::NextField => ActionCategory::Menus,

            Action::Import => ActionCategory::FileOps,

            Action::Quit | Action::Confirm | Action::Cancel => ActionCategory::Application,
        }
    }

    /// Get all possible actions (for validation)
    pub fn all() -> Vec<Action> {
        Action::iter().collect()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Action categories for organizing help
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionCategory {
    Navigation,
    Table,
    Layout,
    Menus,
    FileOps,
    Application,
}

impl ActionCategory {
    pub fn name(&self) -> &'static str {
        match self {
            ActionCategory::Navigation => "Navigation",
            ActionCategory::Table => "Table",
            ActionCategory::Layout => "Layout",
            ActionCategory::Menus => "Menus",
            ActionCategory::FileOps => "File Operations",
            ActionCategory::Application => "Application",
        }
    }
}
