//! Keyboard surface for the column layout editor
//!
//! Picking a column up starts a drag; while dragging the cursor walks the
//! gaps between columns, including the trailing one, and the column under
//! the cursor is the direct-drop target.

use crate::core::layout::{ColumnDescriptor, DescriptorPatch, DragState, LayoutEvent};
use crate::services::Session;
use crate::tui::{Action, Component, Outcome, Theme};
use color_eyre::Result;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};

#[derive(Default)]
pub struct LayoutEditorDialog {
    cursor: usize,
}

impl LayoutEditorDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn dragging(session: &Session) -> Option<usize> {
        match session.editor()?.drag_state() {
            DragState::Dragging { source } => Some(source),
            DragState::Idle => None,
        }
    }

    fn column_count(session: &Session) -> usize {
        session.editor().map(|e| e.layout().len()).unwrap_or(0)
    }

    /// Highest cursor position; the trailing gap is reachable only mid-drag
    fn max_cursor(session: &Session) -> usize {
        let n = Self::column_count(session);
        if Self::dragging(session).is_some() {
            n
        } else {
            n.saturating_sub(1)
        }
    }

    fn column_at_cursor(&self, session: &Session) -> Option<ColumnDescriptor> {
        session.editor()?.layout().at_index(self.cursor).cloned()
    }

    fn toggle(&self, session: &mut Session, patch: impl Fn(&ColumnDescriptor) -> DescriptorPatch) {
        if let Some(column) = self.column_at_cursor(session) {
            session.edit_layout(LayoutEvent::SetAttribute {
                index: column.index,
                name: column.name.clone(),
                patch: patch(&column),
            });
        }
    }

    fn flag(on: bool, label: &'static str) -> &'static str {
        if on { label } else { "   " }
    }

    fn items<'a>(&self, session: &'a Session, theme: &Theme) -> Vec<ListItem<'a>> {
        let Some(editor) = session.editor() else {
            return Vec::new();
        };
        let dragging = Self::dragging(session);
        let ordered = editor.layout().ordered();
        let gap = || ListItem::new(Line::from(Span::styled("  ─── drop here ───", theme.warning_style())));

        let mut items = Vec::with_capacity(ordered.len() * 2 + 1);
        for column in &ordered {
            if dragging.is_some() && column.index == self.cursor {
                items.push(gap());
            }
            let line = Line::from(vec![
                Span::raw(format!("{:>2}. ", column.index + 1)),
                Span::raw(Self::flag(column.hide, "[H]")),
                Span::raw(Self::flag(column.sort, "[S]")),
                Span::raw(Self::flag(column.filter, "[F]")),
                Span::raw(Self::flag(column.search_by, "[*]")),
                Span::raw(" "),
                Span::raw(column.name.clone()),
            ]);
            let style = if dragging == Some(column.index) {
                theme.dragging_style()
            } else if column.index == self.cursor {
                theme.selected_style()
            } else {
                theme.normal_style()
            };
            items.push(ListItem::new(line).style(style));
        }
        if dragging.is_some() && self.cursor == ordered.len() {
            items.push(gap());
        }
        items
    }
}

impl Component for LayoutEditorDialog {
    fn handle_action(&mut self, action: Action, session: &mut Session) -> Result<Outcome> {
        if session.editor().is_none() {
            return Ok(Outcome::Close);
        }
        match action {
            Action::MoveUp => self.cursor = self.cursor.saturating_sub(1),
            Action::MoveDown => self.cursor = (self.cursor + 1).min(Self::max_cursor(session)),
            Action::PickUpColumn => {
                if Self::dragging(session).is_some() {
                    session.edit_layout(LayoutEvent::CancelDrag);
                } else {
                    session.edit_layout(LayoutEvent::DragStart(self.cursor));
                }
            }
            Action::DropIntoGap => {
                if Self::dragging(session).is_some() {
                    let target = session
                        .editor()
                        .map(|e| e.gap_target(self.cursor))
                        .unwrap_or_default();
                    session.edit_layout(LayoutEvent::DropOnGap(target));
                    self.cursor = target;
                }
            }
            Action::DropOntoColumn => {
                if Self::dragging(session).is_some() {
                    if self.cursor < Self::column_count(session) {
                        session.edit_layout(LayoutEvent::DropOnColumn(self.cursor));
                    } else {
                        session.edit_layout(LayoutEvent::CancelDrag);
                    }
                }
            }
            Action::Cancel => {
                if Self::dragging(session).is_some() {
                    session.edit_layout(LayoutEvent::CancelDrag);
                }
            }
            Action::ToggleHidden => self.toggle(session, |c| DescriptorPatch::hide(!c.hide)),
            Action::ToggleSortable => self.toggle(session, |c| DescriptorPatch::sort(!c.sort)),
            Action::ToggleFilterable => self.toggle(session, |c| DescriptorPatch::filter(!c.filter)),
            Action::ToggleSearchBy => self.toggle(session, |c| DescriptorPatch::search_by(!c.search_by)),
            Action::SaveLayout => {
                session.finalize_layout();
                return Ok(Outcome::Close);
            }
            _ => return Ok(Outcome::Ignored),
        }
        self.cursor = self.cursor.min(Self::max_cursor(session));
        Ok(Outcome::Handled)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, session: &Session, theme: &Theme) {
        frame.render_widget(Clear, area);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Choose how to display the data ")
            .border_style(theme.focused_border_style());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(2)])
            .split(inner);

        frame.render_widget(List::new(self.items(session, theme)), chunks[0]);

        let legend = Paragraph::new(vec![
            Line::from(Span::styled(
                "[H] hidden  [S] sortable  [F] filterable  [*] search by",
                theme.muted_style(),
            )),
            Line::from(Span::styled(
                "Space pick up/put back  Enter drop here  x swap  Ctrl+s save",
                theme.muted_style(),
            )),
        ]);
        frame.render_widget(legend, chunks[1]);
    }

    fn supported_actions(&self) -> &[Action] {
        &[
            Action::MoveUp,
            Action::MoveDown,
            Action::PickUpColumn,
            Action::DropIntoGap,
            Action::DropOntoColumn,
            Action::ToggleHidden,
            Action::ToggleSortable,
            Action::ToggleFilterable,
            Action::ToggleSearchBy,
            Action::SaveLayout,
            Action::Cancel,
        ]
    }

    fn name(&self) -> &str {
        "LayoutEditor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Row;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn session() -> Session {
        let rows: Vec<Row> =
            serde_json::from_value(json!([{"a": "1", "b": "2", "c": "3", "d": "4"}])).unwrap();
        let mut session = Session::new(10);
        session.load_dataset(rows);
        session
    }

    fn names(session: &Session) -> Vec<String> {
        session
            .editor()
            .unwrap()
            .layout()
            .ordered()
            .iter()
            .map(|c| c.name.clone())
            .collect()
    }

    fn press(dialog: &mut LayoutEditorDialog, session: &mut Session, actions: &[Action]) {
        for action in actions {
            dialog.handle_action(*action, session).unwrap();
        }
    }

    #[test]
    fn test_drag_to_trailing_gap() {
        let mut session = session();
        let mut dialog = LayoutEditorDialog::new();

        press(&mut dialog, &mut session, &[Action::PickUpColumn]);
        press(&mut dialog, &mut session, &[Action::MoveDown; 6]);
        assert_eq!(dialog.cursor(), 4, "trailing gap is reachable while dragging");
        press(&mut dialog, &mut session, &[Action::DropIntoGap]);

        assert_eq!(names(&session), vec!["b", "c", "d", "a"]);
        assert_eq!(session.editor().unwrap().drag_state(), DragState::Idle);
        assert_eq!(dialog.cursor(), 3);
    }

    #[test]
    fn test_drop_onto_column_swaps() {
        let mut session = session();
        let mut dialog = LayoutEditorDialog::new();

        press(
            &mut dialog,
            &mut session,
            &[Action::PickUpColumn, Action::MoveDown, Action::MoveDown, Action::DropOntoColumn],
        );

        assert_eq!(names(&session), vec!["c", "b", "a", "d"]);
    }

    #[test]
    fn test_cancel_drag_keeps_order() {
        let mut session = session();
        let mut dialog = LayoutEditorDialog::new();

        press(
            &mut dialog,
            &mut session,
            &[Action::PickUpColumn, Action::MoveDown, Action::Cancel, Action::DropIntoGap],
        );

        assert_eq!(names(&session), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_search_by_moves_with_toggle() {
        let mut session = session();
        let mut dialog = LayoutEditorDialog::new();

        press(&mut dialog, &mut session, &[Action::MoveDown, Action::ToggleSearchBy]);
        let layout = session.editor().unwrap().layout();
        assert!(layout.get("b").unwrap().search_by);
        assert!(!layout.get("a").unwrap().search_by);
    }

    #[test]
    fn test_save_finalizes_and_closes() {
        let mut session = session();
        let mut dialog = LayoutEditorDialog::new();

        press(&mut dialog, &mut session, &[Action::MoveDown, Action::ToggleFilterable]);
        let outcome = dialog.handle_action(Action::SaveLayout, &mut session).unwrap();

        assert_eq!(outcome, Outcome::Close);
        assert!(!session.is_editing_layout());
        assert!(session.filter_state().contains_key("b"));
    }

    #[test]
    fn test_cursor_clamps_when_idle() {
        let mut session = session();
        let mut dialog = LayoutEditorDialog::new();
        press(&mut dialog, &mut session, &[Action::MoveDown; 10]);
        assert_eq!(dialog.cursor(), 3);
    }
}
