use crate::services::image_probe::ProbeStatus;
use crate::services::Session;
use crate::tui::components::data_table::CellRef;
use crate::tui::{Action, Component, Outcome, Theme};
use color_eyre::Result;
use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

/// Details of the active image and whether it could be fetched
pub struct ImageView {
    url: String,
    cell: CellRef,
    status: ProbeStatus,
}

impl ImageView {
    pub fn new(url: impl Into<String>, cell: CellRef) -> Self {
        Self {
            url: url.into(),
            cell,
            status: ProbeStatus::Loading,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn cell(&self) -> &CellRef {
        &self.cell
    }

    pub fn status(&self) -> &ProbeStatus {
        &self.status
    }

    pub fn set_status(&mut self, status: ProbeStatus) {
        self.status = status;
    }
}

impl Component for ImageView {
    fn handle_action(&mut self, action: Action, _session: &mut Session) -> Result<Outcome> {
        match action {
            Action::Confirm | Action::Cancel => Ok(Outcome::Close),
            _ => Ok(Outcome::Ignored),
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, session: &Session, theme: &Theme) {
        frame.render_widget(Clear, area);
        let status = match &self.status {
            ProbeStatus::Loading => Span::styled("Loading...", theme.info_style()),
            ProbeStatus::Loaded { content_type } => {
                Span::styled(format!("Loaded ({content_type})"), theme.success_style())
            }
            ProbeStatus::Failed(reason) => {
                Span::styled(format!("Could not load image: {reason}"), theme.error_style())
            }
        };
        let mut lines = vec![
            Line::from(Span::styled(self.url.clone(), theme.link_style())),
            Line::from(""),
            Line::from(status),
            Line::from(""),
        ];
        if let Some(row) = session.engine().row(self.cell.row) {
            for (field, value) in row {
                lines.push(Line::from(vec![
                    Span::styled(format!("{field}: "), theme.header_style()),
                    Span::raw(crate::core::display_value(value)),
                ]));
            }
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Image from {} ", self.cell.column))
                .border_style(theme.focused_border_style()),
        );
        frame.render_widget(paragraph, area);
    }

    fn supported_actions(&self) -> &[Action] {
        &[Action::Confirm, Action::Cancel]
    }

    fn name(&self) -> &str {
        "ImageView"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        let cell = CellRef {
            row: 0,
            column: "img".to_string(),
        };
        let mut view = ImageView::new("http://x/1.png", cell);
        assert_eq!(view.status(), &ProbeStatus::Loading);

        view.set_status(ProbeStatus::Failed("server answered 404".to_string()));
        assert!(matches!(view.status(), ProbeStatus::Failed(_)));

        let mut session = Session::new(10);
        assert_eq!(view.handle_action(Action::Cancel, &mut session).unwrap(), Outcome::Close);
    }
}
