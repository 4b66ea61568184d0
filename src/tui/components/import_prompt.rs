use crate::services::import_service::{ImportError, ImportSource};
use crate::services::Session;
use crate::tui::{Action, Component, Outcome, TextField, TextInput, Theme};
use color_eyre::Result;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PromptField {
    #[default]
    Link,
    File,
}

/// Asks for a link or a file path to import
#[derive(Default)]
pub struct ImportPrompt {
    link: TextField,
    file: TextField,
    active: PromptField,
    busy: bool,
    spinner: usize,
    error: Option<String>,
}

impl ImportPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_field(&self) -> PromptField {
        self.active
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
        if busy {
            self.error = None;
        }
    }

    pub fn set_error(&mut self, error: &ImportError) {
        self.busy = false;
        self.error = Some(error.to_string());
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Source chosen from the two fields, the file taking priority
    pub fn source(&self) -> Result<ImportSource, ImportError> {
        ImportSource::choose(self.file.value(), self.link.value())
    }

    fn field_mut(&mut self) -> &mut TextField {
        match self.active {
            PromptField::Link => &mut self.link,
            PromptField::File => &mut self.file,
        }
    }

    fn field_widget<'a>(&self, title: &'a str, field: &TextField, which: PromptField, theme: &Theme) -> Paragraph<'a> {
        let border = if self.active == which {
            theme.focused_border_style()
        } else {
            theme.border_style()
        };
        Paragraph::new(field.value().to_string())
            .block(Block::default().borders(Borders::ALL).title(title).border_style(border))
    }
}

impl Component for ImportPrompt {
    fn handle_action(&mut self, action: Action, _session: &mut Session) -> Result<Outcome> {
        match action {
            Action::NextField if !self.busy => {
                self.active = match self.active {
                    PromptField::Link => PromptField::File,
                    PromptField::File => PromptField::Link,
                };
                Ok(Outcome::Handled)
            }
            Action::Confirm if !self.busy => match self.source() {
                Ok(_) => Ok(Outcome::Submit),
                Err(e) => {
                    self.set_error(&e);
                    Ok(Outcome::Handled)
                }
            },
            Action::Cancel => Ok(Outcome::Close),
            _ => Ok(Outcome::Ignored),
        }
    }

    fn handle_text(&mut self, input: TextInput, _session: &mut Session) -> Result<bool> {
        if self.busy {
            return Ok(true);
        }
        self.field_mut().apply(input);
        self.error = None;
        Ok(true)
    }

    fn update(&mut self) -> Result<()> {
        if self.busy {
            self.spinner = (self.spinner + 1) % SPINNER.len();
        }
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, _session: &Session, theme: &Theme) {
        frame.render_widget(Clear, area);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Import data ")
            .border_style(theme.focused_border_style());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(inner);

        frame.render_widget(
            self.field_widget(" Link to a CSV or JSON file ", &self.link, PromptField::Link, theme),
            rows[0],
        );
        frame.render_widget(
            self.field_widget(" Local file (takes priority) ", &self.file, PromptField::File, theme),
            rows[1],
        );

        let status = if self.busy {
            Line::from(Span::styled(
                format!("{} Loading...", SPINNER[self.spinner]),
                theme.info_style(),
            ))
        } else if let Some(error) = &self.error {
            Line::from(Span::styled(error.clone(), theme.error_style()))
        } else {
            Line::from(Span::styled("Tab switch field  Enter import  Esc close", theme.muted_style()))
        };
        frame.render_widget(Paragraph::new(status), rows[2]);

        if !self.busy {
            let (field, row) = match self.active {
                PromptField::Link => (&self.link, rows[0]),
                PromptField::File => (&self.file, rows[1]),
            };
            let x = row.x + 1 + field.cursor() as u16;
            frame.set_cursor_position((x.min(row.right().saturating_sub(2)), row.y + 1));
        }
    }

    fn supported_actions(&self) -> &[Action] {
        &[Action::NextField, Action::Confirm, Action::Cancel]
    }

    fn name(&self) -> &str {
        "ImportPrompt"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn type_text(prompt: &mut ImportPrompt, session: &mut Session, text: &str) {
        for c in text.chars() {
            prompt.handle_text(TextInput::Char(c), session).unwrap();
        }
    }

    #[test]
    fn test_empty_prompt_reports_no_data() {
        let mut session = Session::new(10);
        let mut prompt = ImportPrompt::new();

        let outcome = prompt.handle_action(Action::Confirm, &mut session).unwrap();
        assert_eq!(outcome, Outcome::Handled);
        assert_eq!(prompt.error(), Some("No data found"));
    }

    #[test]
    fn test_file_takes_priority() {
        let mut session = Session::new(10);
        let mut prompt = ImportPrompt::new();
        type_text(&mut prompt, &mut session, "https://x/data.csv");
        prompt.handle_action(Action::NextField, &mut session).unwrap();
        type_text(&mut prompt, &mut session, "local.csv");

        assert_eq!(prompt.handle_action(Action::Confirm, &mut session).unwrap(), Outcome::Submit);
        assert_eq!(prompt.source().unwrap(), ImportSource::File(PathBuf::from("local.csv")));
    }

    #[test]
    fn test_busy_ignores_input() {
        let mut session = Session::new(10);
        let mut prompt = ImportPrompt::new();
        prompt.set_busy(true);
        type_text(&mut prompt, &mut session, "abc");

        assert!(prompt.source().is_err());
        assert_eq!(prompt.handle_action(Action::Confirm, &mut session).unwrap(), Outcome::Ignored);
        assert_eq!(prompt.handle_action(Action::Cancel, &mut session).unwrap(), Outcome::Close);
    }

    #[test]
    fn test_error_clears_on_typing() {
        let mut session = Session::new(10);
        let mut prompt = ImportPrompt::new();
        prompt.set_error(&ImportError::ResponseNotOk { status: 404 });
        assert_eq!(prompt.error(), Some("Could not download csv file"));

        type_text(&mut prompt, &mut session, "h");
        assert_eq!(prompt.error(), None);
    }
}
