pub mod column_menu;
pub mod data_table;
pub mod filter_menu;
pub mod image_view;
pub mod import_prompt;
pub mod layout_editor;
pub mod search_bar;

pub use column_menu::ColumnMenu;
pub use data_table::{CellRef, DataTable};
pub use filter_menu::FilterMenu;
pub use image_view::ImageView;
pub use import_prompt::ImportPrompt;
pub use layout_editor::LayoutEditorDialog;
pub use search_bar::SearchBar;
