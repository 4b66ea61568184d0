use crate::services::Session;
use crate::tui::{Action, Component, Outcome, Theme};
use color_eyre::Result;
use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem},
};

/// Per-column visibility toggles for the table view
#[derive(Default)]
pub struct ColumnMenu {
    cursor: usize,
}

impl ColumnMenu {
    pub fn new() -> Self {
        Self::default()
    }

    fn column_ids(session: &Session) -> Vec<String> {
        session.column_definitions().iter().map(|c| c.id.clone()).collect()
    }
}

impl Component for ColumnMenu {
    fn handle_action(&mut self, action: Action, session: &mut Session) -> Result<Outcome> {
        let ids = Self::column_ids(session);
        match action {
            Action::MoveUp => self.cursor = self.cursor.saturating_sub(1),
            Action::MoveDown => self.cursor = (self.cursor + 1).min(ids.len().saturating_sub(1)),
            Action::ToggleSelection => {
                if let Some(id) = ids.get(self.cursor) {
                    session.engine_mut().toggle_visibility(id);
                }
            }
            Action::ShowAllColumns => session.engine_mut().show_all_columns(),
            Action::Confirm | Action::Cancel => return Ok(Outcome::Close),
            _ => return Ok(Outcome::Ignored),
        }
        Ok(Outcome::Handled)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, session: &Session, theme: &Theme) {
        frame.render_widget(Clear, area);
        let items: Vec<ListItem> = Self::column_ids(session)
            .into_iter()
            .enumerate()
            .map(|(i, id)| {
                let mark = if session.engine().is_visible(&id) { "[x] " } else { "[ ] " };
                let style = if i == self.cursor {
                    theme.selected_style()
                } else {
                    theme.normal_style()
                };
                ListItem::new(Line::from(vec![Span::raw(mark), Span::raw(id)])).style(style)
            })
            .collect();
        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Columns ")
                .border_style(theme.focused_border_style()),
        );
        frame.render_widget(list, area);
    }

    fn supported_actions(&self) -> &[Action] {
        &[
            Action::MoveUp,
            Action::MoveDown,
            Action::ToggleSelection,
            Action::ShowAllColumns,
            Action::Confirm,
            Action::Cancel,
        ]
    }

    fn name(&self) -> &str {
        "ColumnMenu"
    }
}
