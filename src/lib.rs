#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_match)]
#![allow(clippy::collapsible_else_if)]

pub mod config;
pub mod core;
pub mod errors;
pub mod logging;
pub mod services;
pub mod tui;

// Re-export commonly used types
pub use core::{ColumnDescriptor, DatasetId, FinalizedLayout, LayoutEditor, LayoutEvent, Row};
pub use services::{ImportService, ImportSource, RowEngine, Session};
pub use tui::{Action, ActionCategory};
