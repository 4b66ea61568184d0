use crate::services::Session;
use crate::tui::action::Action;
use crate::tui::theme::Theme;
use color_eyre::Result;
use ratatui::{Frame, layout::Rect};

/// What the owner should do after a component handled an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Not for this component; let it propagate
    Ignored,
    Handled,
    /// The component is finished and should be dismissed
    Close,
    /// The component has input ready for its owner to act on
    Submit,
}

impl Outcome {
    pub fn is_handled(&self) -> bool {
        !matches!(self, Outcome::Ignored)
    }
}

/// Base trait for all TUI components
///
/// Components read and mutate the shared [`Session`] in response to actions
/// and render themselves from it.
pub trait Component {
    fn handle_action(&mut self, action: Action, session: &mut Session) -> Result<Outcome>;

    /// Render the component within the given area
    fn render(&mut self, frame: &mut Frame, area: Rect, session: &Session, theme: &Theme);

    /// Get list of actions this component supports
    fn supported_actions(&self) -> &[Action];

    /// Get component name for debugging/logging
    fn name(&self) -> &str;

    /// Typed characters, for components with a text field
    fn handle_text(&mut self, _input: TextInput, _session: &mut Session) -> Result<bool> {
        Ok(false)
    }

    /// Update component state (called on every tick)
    fn update(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Raw edits routed to text fields before keybinding lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextInput {
    Char(char),
    Backspace,
    Delete,
}

/// Components that can receive keyboard focus
pub trait Focusable: Component {
    fn is_focused(&self) -> bool;

    fn set_focused(&mut self, focused: bool);
}

/// Single-line editable text with a cursor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextField {
    value: String,
    cursor: usize,
}

impl TextField {
    pub fn with_value(value: impl Into<String>) -> Self {
        let value = value.into();
        let cursor = value.chars().count();
        Self { value, cursor }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    /// Apply an edit, returning whether the value changed
    pub fn apply(&mut self, input: TextInput) -> bool {
        match input {
            TextInput::Char(c) => {
                let at = self.byte_offset(self.cursor);
                self.value.insert(at, c);
                self.cursor += 1;
                true
            }
            TextInput::Backspace if self.cursor > 0 => {
                self.cursor -= 1;
                let at = self.byte_offset(self.cursor);
                self.value.remove(at);
                true
            }
            TextInput::Delete if self.cursor < self.value.chars().count() => {
                let at = self.byte_offset(self.cursor);
                self.value.remove(at);
                true
            }
            _ => false,
        }
    }
}
