pub mod action;
pub mod app;
pub mod component;
pub mod components;
pub mod keybindings;
pub mod terminal;
pub mod theme;

pub use action::{Action, ActionCategory};
pub use app::{App, AppEvent};
pub use component::{Component, Focusable, Outcome, TextField, TextInput};
pub use components::{DataTable, SearchBar};
pub use keybindings::{KeyBinding, KeyBindings, KeyPattern, Mode};
pub use theme::{Theme, ThemeName};
