use crate::services::Session;
use crate::tui::{Action, Component, Outcome, Theme};
use color_eyre::Result;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};

/// Multi-select menu over each filterable column's observed values
#[derive(Default)]
pub struct FilterMenu {
    column: usize,
    value: usize,
}

impl FilterMenu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filterable columns in display order
    fn columns(session: &Session) -> Vec<String> {
        session
            .layout()
            .filterable()
            .filter(|c| session.filter_state().contains_key(&c.name))
            .map(|c| c.name.clone())
            .collect()
    }

    fn values(session: &Session, column: &str) -> Vec<(String, bool)> {
        session
            .filter_state()
            .get(column)
            .map(|values| values.iter().map(|(v, on)| (v.clone(), *on)).collect())
            .unwrap_or_default()
    }

    pub fn selection(&self, session: &Session) -> Option<(String, String)> {
        let column = Self::columns(session).get(self.column)?.clone();
        let (value, _) = Self::values(session, &column).get(self.value)?.clone();
        Some((column, value))
    }

    fn clamp(&mut self, session: &Session) {
        let columns = Self::columns(session);
        self.column = self.column.min(columns.len().saturating_sub(1));
        let values = columns
            .get(self.column)
            .map(|c| Self::values(session, c).len())
            .unwrap_or(0);
        self.value = self.value.min(values.saturating_sub(1));
    }
}

impl Component for FilterMenu {
    fn handle_action(&mut self, action: Action, session: &mut Session) -> Result<Outcome> {
        match action {
            Action::MoveUp => self.value = self.value.saturating_sub(1),
            Action::MoveDown => self.value += 1,
            Action::MoveLeft => {
                self.column = self.column.saturating_sub(1);
                self.value = 0;
            }
            Action::MoveRight => {
                self.column += 1;
                self.value = 0;
            }
            Action::ToggleSelection => {
                if let Some((column, value)) = self.selection(session) {
                    session.toggle_filter(&column, &value);
                }
            }
            Action::ClearFilters => session.clear_filters(),
            Action::Confirm | Action::Cancel => return Ok(Outcome::Close),
            _ => return Ok(Outcome::Ignored),
        }
        self.clamp(session);
        Ok(Outcome::Handled)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, session: &Session, theme: &Theme) {
        self.clamp(session);
        frame.render_widget(Clear, area);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Filters ")
            .border_style(theme.focused_border_style());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let columns = Self::columns(session);
        if columns.is_empty() {
            let hint = Paragraph::new(Span::styled(
                "No filterable columns. Mark some with [F] in the layout editor.",
                theme.muted_style(),
            ));
            frame.render_widget(hint, inner);
            return;
        }

        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(inner);

        let column_items: Vec<ListItem> = columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let active = session.compiled_filters().get(name).is_restricting();
                let label = if active { format!("{name} *") } else { name.clone() };
                let style = if i == self.column {
                    theme.selected_style()
                } else {
                    theme.normal_style()
                };
                ListItem::new(label).style(style)
            })
            .collect();
        frame.render_widget(
            List::new(column_items).block(Block::default().borders(Borders::RIGHT)),
            panes[0],
        );

        let value_items: Vec<ListItem> = Self::values(session, &columns[self.column])
            .into_iter()
            .enumerate()
            .map(|(i, (value, on))| {
                let mark = if on { "[x] " } else { "[ ] " };
                let style = if i == self.value {
                    theme.selected_style()
                } else {
                    theme.normal_style()
                };
                ListItem::new(Line::from(vec![Span::raw(mark), Span::raw(value)])).style(style)
            })
            .collect();
        frame.render_widget(List::new(value_items), panes[1]);
    }

    fn supported_actions(&self) -> &[Action] {
        &[
            Action::MoveUp,
            Action::MoveDown,
            Action::MoveLeft,
            Action::MoveRight,
            Action::ToggleSelection,
            Action::ClearFilters,
            Action::Confirm,
            Action::Cancel,
        ]
    }

    fn name(&self) -> &str {
        "FilterMenu"
    }
}
