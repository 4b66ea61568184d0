use crate::services::Session;
use crate::tui::{Action, Component, Focusable, Outcome, TextField, TextInput, Theme};
use color_eyre::Result;
use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

/// Free-text search over the search-by column
#[derive(Default)]
pub struct SearchBar {
    field: TextField,
    focused: bool,
}

impl SearchBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        self.field.value()
    }

    pub fn reset(&mut self) {
        self.field.clear();
        self.focused = false;
    }

    pub fn placeholder(session: &Session) -> String {
        match session.search_column() {
            Some(column) => format!("Filter by {}...", column.trim().to_lowercase()),
            None => "No search column".to_string(),
        }
    }
}

impl Component for SearchBar {
    fn handle_action(&mut self, action: Action, session: &mut Session) -> Result<Outcome> {
        match action {
            Action::Confirm => Ok(Outcome::Close),
            Action::Cancel => {
                self.field.clear();
                session.set_search_text("");
                Ok(Outcome::Close)
            }
            _ => Ok(Outcome::Ignored),
        }
    }

    fn handle_text(&mut self, input: TextInput, session: &mut Session) -> Result<bool> {
        if self.field.apply(input) {
            session.set_search_text(self.field.value());
        }
        Ok(true)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, session: &Session, theme: &Theme) {
        let line = if self.field.value().is_empty() {
            Line::from(Span::styled(Self::placeholder(session), theme.muted_style()))
        } else {
            Line::from(self.field.value().to_string())
        };
        let block = Block::default().borders(Borders::ALL).border_style(if self.focused {
            theme.focused_border_style()
        } else {
            theme.border_style()
        });
        frame.render_widget(Paragraph::new(line).block(block), area);

        if self.focused {
            let x = area.x + 1 + self.field.cursor() as u16;
            frame.set_cursor_position((x.min(area.right().saturating_sub(2)), area.y + 1));
        }
    }

    fn supported_actions(&self) -> &[Action] {
        &[Action::Confirm, Action::Cancel]
    }

    fn name(&self) -> &str {
        "SearchBar"
    }
}

impl Focusable for SearchBar {
    fn is_focused(&self) -> bool {
        self.focused
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}
