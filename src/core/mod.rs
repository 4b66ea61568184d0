pub mod filter_state;
pub mod layout;
pub mod predicate;
pub mod projection;
pub mod types;

pub use filter_state::{FilterAction, FilterValueMap};
pub use layout::{
    ColumnDescriptor, ColumnLayout, DescriptorPatch, DragState, FinalizedLayout, LayoutEditor,
    LayoutEvent,
};
pub use predicate::{ColumnPredicate, CompiledFilters, SearchPredicate};
pub use projection::{CellContent, ColumnDefinition, FilterStrategy};
pub use types::*;
