use crate::core::projection::{CellContent, render_cell};
use crate::services::Session;
use crate::services::row_engine::SortDirection;
use crate::tui::{Action, Component, Focusable, Outcome, Theme};
use color_eyre::Result;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};
use std::collections::HashSet;
use tracing::debug;

/// Position on the current page (row, visible column)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

/// A cell addressed by dataset row and column id
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub row: usize,
    pub column: String,
}

/// Paged table over the session's row engine
pub struct DataTable {
    cursor: Position,
    /// Cells whose image failed to load; each cell falls back on its own
    image_failures: HashSet<CellRef>,
    focused: bool,
    supported_actions: Vec<Action>,
}

impl Default for DataTable {
    fn default() -> Self {
        Self::new()
    }
}

impl DataTable {
    pub fn new() -> Self {
        Self {
            cursor: Position::default(),
            image_failures: HashSet::new(),
            focused: false,
            supported_actions: vec![
                Action::MoveUp,
                Action::MoveDown,
                Action::MoveLeft,
                Action::MoveRight,
                Action::NextPage,
                Action::PreviousPage,
                Action::FirstPage,
                Action::LastPage,
                Action::ToggleSort,
            ],
        }
    }

    /// Forget cursor and image failures, e.g. after a new import
    pub fn reset(&mut self) {
        self.cursor = Position::default();
        self.image_failures.clear();
    }

    pub fn cursor(&self) -> Position {
        self.cursor
    }

    pub fn mark_image_failed(&mut self, cell: CellRef) {
        debug!("Image in row {} column '{}' failed to load", cell.row, cell.column);
        self.image_failures.insert(cell);
    }

    pub fn image_failed(&self, cell: &CellRef) -> bool {
        self.image_failures.contains(cell)
    }

    pub fn current_cell(&self, session: &Session) -> Option<CellRef> {
        let view = session.engine().view();
        let row = *view.rows.get(self.cursor.row)?;
        let column = session.engine().visible_columns().get(self.cursor.col)?.id.clone();
        Some(CellRef { row, column })
    }

    pub fn current_content(&self, session: &Session) -> Option<(CellRef, CellContent)> {
        let cell = self.current_cell(session)?;
        let value = session.engine().row(cell.row)?.get(&cell.column);
        let content = render_cell(value, self.image_failed(&cell));
        Some((cell, content))
    }

    /// Keep the cursor inside the current page and visible columns
    pub fn clamp(&mut self, session: &Session) {
        let rows = session.engine().view().rows.len();
        let cols = session.engine().visible_columns().len();
        self.cursor.row = self.cursor.row.min(rows.saturating_sub(1));
        self.cursor.col = self.cursor.col.min(cols.saturating_sub(1));
    }

    fn move_down(&mut self, session: &Session) {
        let rows = session.engine().view().rows.len();
        if rows > 0 && self.cursor.row < rows - 1 {
            self.cursor.row += 1;
        }
    }

    fn move_right(&mut self, session: &Session) {
        let cols = session.engine().visible_columns().len();
        if cols > 0 && self.cursor.col < cols - 1 {
            self.cursor.col += 1;
        }
    }

    fn header_cells<'a>(session: &'a Session) -> Vec<Cell<'a>> {
        let sort = session.engine().sort_state();
        session
            .engine()
            .visible_columns()
            .into_iter()
            .map(|column| {
                let marker = match sort {
                    Some(s) if s.column == column.id => match s.direction {
                        SortDirection::Ascending => " ▲",
                        SortDirection::Descending => " ▼",
                    },
                    _ if column.sortable => " ·",
                    _ => "",
                };
                Cell::from(format!("{}{marker}", column.id))
            })
            .collect()
    }

    fn footer(&self, session: &Session, theme: &Theme) -> Paragraph<'static> {
        let engine = session.engine();
        let view = engine.view();
        let nav_style = |enabled: bool| {
            if enabled {
                theme.info_style()
            } else {
                theme.muted_style()
            }
        };
        let line = Line::from(vec![
            Span::styled("◀ Previous", nav_style(engine.can_previous_page())),
            Span::raw("  "),
            Span::raw(view.page_label()),
            Span::raw("  "),
            Span::styled("Next ▶", nav_style(engine.can_next_page())),
            Span::raw("   "),
            Span::raw(view.rows_label()),
        ]);
        Paragraph::new(line).alignment(Alignment::Right)
    }
}

impl Component for DataTable {
    fn handle_action(&mut self, action: Action, session: &mut Session) -> Result<Outcome> {
        match action {
            Action::MoveUp => self.cursor.row = self.cursor.row.saturating_sub(1),
            Action::MoveDown => self.move_down(session),
            Action::MoveLeft => self.cursor.col = self.cursor.col.saturating_sub(1),
            Action::MoveRight => self.move_right(session),
            Action::NextPage | Action::PreviousPage | Action::FirstPage | Action::LastPage => {
                let engine = session.engine_mut();
                match action {
                    Action::NextPage => engine.next_page(),
                    Action::PreviousPage => engine.previous_page(),
                    Action::FirstPage => engine.first_page(),
                    _ => engine.last_page(),
                }
                self.cursor.row = 0;
            }
            Action::ToggleSort => {
                let column = session
                    .engine()
                    .visible_columns()
                    .get(self.cursor.col)
                    .map(|c| c.id.clone());
                if let Some(column) = column {
                    session.engine_mut().toggle_sort(&column);
                }
            }
            _ => return Ok(Outcome::Ignored),
        }
        self.clamp(session);
        Ok(Outcome::Handled)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, session: &Session, theme: &Theme) {
        self.clamp(session);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(area);

        let engine = session.engine();
        let view = engine.view();
        let columns = engine.visible_columns();

        let header = Row::new(Self::header_cells(session)).style(theme.header_style());

        let rows: Vec<Row> = if view.rows.is_empty() {
            vec![Row::new(vec![Cell::from("No results.")]).style(theme.muted_style())]
        } else {
            view.rows
                .iter()
                .enumerate()
                .map(|(page_row, &data_row)| {
                    let record = engine.row(data_row);
                    let cells: Vec<Cell> = columns
                        .iter()
                        .enumerate()
                        .map(|(col_idx, column)| {
                            let cell_ref = CellRef {
                                row: data_row,
                                column: column.id.clone(),
                            };
                            let value = record.and_then(|r| r.get(&column.id));
                            let (text, style) = match render_cell(value, self.image_failed(&cell_ref)) {
                                CellContent::Image(url) => (format!("[img] {url}"), theme.image_style()),
                                CellContent::Link(url) => (url, theme.link_style()),
                                CellContent::Text(text) => (text, theme.normal_style()),
                            };
                            let style = if self.focused
                                && page_row == self.cursor.row
                                && col_idx == self.cursor.col
                            {
                                theme.selected_cell_style()
                            } else {
                                style
                            };
                            Cell::from(text).style(style)
                        })
                        .collect();
                    let row_style = if page_row == self.cursor.row {
                        theme.selected_style()
                    } else if page_row % 2 == 1 {
                        theme.alt_row_style()
                    } else {
                        theme.normal_style()
                    };
                    Row::new(cells).style(row_style)
                })
                .collect()
        };

        let num_cols = columns.len().max(1);
        let constraints = vec![Constraint::Ratio(1, num_cols as u32); num_cols];
        let title = match engine.search_text() {
            "" => format!(" {} rows ", engine.data().len()),
            text => format!(" {} rows, search \"{text}\" ", engine.data().len()),
        };
        let table = Table::new(rows, constraints).header(header).block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(if self.focused {
                    theme.focused_border_style()
                } else {
                    theme.border_style()
                }),
        );

        frame.render_widget(table, chunks[0]);
        frame.render_widget(self.footer(session, theme), chunks[1]);
    }

    fn supported_actions(&self) -> &[Action] {
        &self.supported_actions
    }

    fn name(&self) -> &str {
        "DataTable"
    }
}

impl Focusable for DataTable {
    fn is_focused(&self) -> bool {
        self.focused
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Row as DataRow;
    use pretty_assertions::assert_eq;
    use ratatui::{Terminal, backend::TestBackend};
    use serde_json::json;

    fn session(count: usize) -> Session {
        let rows: Vec<DataRow> = (0..count)
            .map(|i| {
                serde_json::from_value(json!({"img": format!("http://x/{i}.png"), "n": format!("{i}")}))
                    .unwrap()
            })
            .collect();
        let mut session = Session::new(10);
        session.load_dataset(rows);
        session.finalize_layout();
        session
    }

    fn render_to_string(table: &mut DataTable, session: &Session) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 16)).unwrap();
        terminal
            .draw(|f| table.render(f, f.area(), session, &Theme::default()))
            .unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_cursor_stays_on_page() {
        let mut session = session(12);
        let mut table = DataTable::new();

        for _ in 0..20 {
            table.handle_action(Action::MoveDown, &mut session).unwrap();
        }
        assert_eq!(table.cursor().row, 9);

        table.handle_action(Action::NextPage, &mut session).unwrap();
        assert_eq!(table.cursor().row, 0);
        assert_eq!(session.engine().pagination().page_index, 1);

        for _ in 0..5 {
            table.handle_action(Action::MoveDown, &mut session).unwrap();
        }
        assert_eq!(table.cursor().row, 1);
    }

    #[test]
    fn test_toggle_sort_uses_cursor_column() {
        let mut session = session(3);
        let mut table = DataTable::new();
        table.handle_action(Action::MoveRight, &mut session).unwrap();
        table.handle_action(Action::ToggleSort, &mut session).unwrap();

        assert_eq!(session.engine().sort_state().unwrap().column, "n");
    }

    #[test]
    fn test_failed_image_falls_back_per_cell() {
        let session = session(2);
        let mut table = DataTable::new();

        let (cell, content) = table.current_content(&session).unwrap();
        assert!(content.is_image());

        table.mark_image_failed(cell.clone());
        let (_, content) = table.current_content(&session).unwrap();
        assert_eq!(content, CellContent::Link("http://x/0.png".to_string()));

        let other = CellRef {
            row: 1,
            column: "img".to_string(),
        };
        assert!(!table.image_failed(&other));
    }

    #[test]
    fn test_renders_footer_and_empty_state() {
        let mut session = session(12);
        let mut table = DataTable::new();

        let screen = render_to_string(&mut table, &session);
        assert!(screen.contains("Page 1 of 2"));
        assert!(screen.contains("Showing 10 rows out of 12"));

        session.set_search_text("no such image");
        let screen = render_to_string(&mut table, &session);
        assert!(screen.contains("No results."));
        assert!(screen.contains("Page 0 of 0"));
    }
}
