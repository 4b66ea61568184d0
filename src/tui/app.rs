use crate::config::Config;
use crate::core::projection::CellContent;
use crate::core::{Row, display_value};
use crate::services::image_probe::{ImageProbe, ProbeStatus};
use crate::services::import_service::{ImportError, ImportService, ImportSource};
use crate::services::session_store::SessionStore;
use crate::services::{Session, SessionEvent};
use crate::tui::components::{
    CellRef, ColumnMenu, DataTable, FilterMenu, ImageView, ImportPrompt, LayoutEditorDialog,
    SearchBar,
};
use crate::tui::{Action, Component, Focusable, KeyBindings, Mode, Outcome, TextInput, Theme};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::Span,
    widgets::{Block, Borders, Paragraph},
};
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Results of background work, delivered to the event loop
#[derive(Debug)]
pub enum AppEvent {
    ImportFinished(Result<Vec<Row>, ImportError>),
    ImageProbed {
        cell: CellRef,
        url: String,
        result: Result<String, String>,
    },
}

/// Modal surface on top of the table
enum Overlay {
    Import(ImportPrompt),
    Layout(LayoutEditorDialog),
    Filters(FilterMenu),
    Columns(ColumnMenu),
    Image(ImageView),
}

impl Overlay {
    fn component_mut(&mut self) -> &mut dyn Component {
        match self {
            Overlay::Import(c) => c,
            Overlay::Layout(c) => c,
            Overlay::Filters(c) => c,
            Overlay::Columns(c) => c,
            Overlay::Image(c) => c,
        }
    }

    fn mode(&self) -> Mode {
        match self {
            Overlay::Import(_) => Mode::ImportPrompt,
            Overlay::Layout(_) => Mode::LayoutEditor,
            Overlay::Filters(_) => Mode::FilterMenu,
            Overlay::Columns(_) => Mode::ColumnMenu,
            Overlay::Image(_) => Mode::ImageView,
        }
    }

    /// Width and height as a percentage of the screen
    fn size(&self) -> (u16, u16) {
        match self {
            Overlay::Import(_) => (70, 40),
            Overlay::Layout(_) => (60, 80),
            Overlay::Filters(_) => (70, 70),
            Overlay::Columns(_) => (40, 60),
            Overlay::Image(_) => (70, 70),
        }
    }
}

/// Application state
///
/// Routes key events to the focused surface, runs imports and image checks
/// in the background and persists the session after committed changes.
pub struct App {
    session: Session,
    session_events: UnboundedReceiver<SessionEvent>,
    store: Option<SessionStore>,
    import_service: Arc<ImportService>,
    image_probe: Arc<ImageProbe>,
    events: UnboundedSender<AppEvent>,
    import_cancel: Option<CancellationToken>,
    data_table: DataTable,
    search_bar: SearchBar,
    overlay: Option<Overlay>,
    keybindings: KeyBindings,
    theme: Theme,
    status: Option<String>,
    should_quit: bool,
}

impl App {
    /// Create the app, restoring the last session from `store` when there is one
    pub fn new(
        config: &Config,
        events: UnboundedSender<AppEvent>,
        store: Option<SessionStore>,
    ) -> Result<Self> {
        let mut session = Session::new(config.page_size);
        let session_events = session.subscribe();
        if let Some(snapshot) = store.as_ref().and_then(|s| s.load()) {
            session.restore(snapshot);
        }

        let mut data_table = DataTable::new();
        data_table.set_focused(true);

        let overlay = if session.has_data() {
            None
        } else {
            Some(Overlay::Import(ImportPrompt::new()))
        };

        Ok(Self {
            session,
            session_events,
            store,
            import_service: Arc::new(ImportService::new(config.request_timeout())?),
            image_probe: Arc::new(ImageProbe::new(config.request_timeout())?),
            events,
            import_cancel: None,
            data_table,
            search_bar: SearchBar::new(),
            overlay,
            keybindings: config.keybindings()?,
            theme: config.theme(),
            status: None,
            should_quit: false,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn data_table(&self) -> &DataTable {
        &self.data_table
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Input context for keybinding lookup
    pub fn mode(&self) -> Mode {
        match &self.overlay {
            Some(overlay) => overlay.mode(),
            None if self.search_bar.is_focused() => Mode::Search,
            None => Mode::Table,
        }
    }

    /// Error shown in the import prompt, if it is open
    pub fn import_error(&self) -> Option<&str> {
        match &self.overlay {
            Some(Overlay::Import(prompt)) => prompt.error(),
            _ => None,
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        let mode = self.mode();
        if mode.accepts_text() {
            if let Some(input) = text_input(&key) {
                match &mut self.overlay {
                    Some(overlay) => {
                        overlay.component_mut().handle_text(input, &mut self.session)?;
                    }
                    None => {
                        self.search_bar.handle_text(input, &mut self.session)?;
                        self.data_table.clamp(&self.session);
                    }
                }
                self.persist();
                return Ok(());
            }
        }

        if let Some(action) = self.keybindings.get_action(mode, &key) {
            debug!("{mode:?}: {key:?} -> {action:?}");
            self.handle_action(action)?;
        }
        self.persist();
        Ok(())
    }

    pub fn handle_action(&mut self, action: Action) -> Result<()> {
        if action == Action::Quit {
            self.should_quit = true;
            return Ok(());
        }

        match self.mode() {
            Mode::Search => {
                if self.search_bar.handle_action(action, &mut self.session)? == Outcome::Close {
                    self.search_bar.set_focused(false);
                }
                Ok(())
            }
            Mode::Table | Mode::Global => self.handle_table_action(action),
            _ => self.handle_overlay_action(action),
        }
    }

    fn handle_table_action(&mut self, action: Action) -> Result<()> {
        self.status = None;
        match action {
            Action::Import => self.overlay = Some(Overlay::Import(ImportPrompt::new())),
            _ if !self.session.has_data() => {}
            Action::FocusSearch => self.search_bar.set_focused(true),
            Action::OpenFilterMenu => self.overlay = Some(Overlay::Filters(FilterMenu::new())),
            Action::OpenColumnMenu => self.overlay = Some(Overlay::Columns(ColumnMenu::new())),
            Action::EditLayout => {
                self.session.begin_layout_edit();
                self.overlay = Some(Overlay::Layout(LayoutEditorDialog::new()));
            }
            Action::Confirm => self.open_image(),
            Action::CopyCell => self.copy_cell(),
            Action::Cancel => {}
            other => {
                self.data_table.handle_action(other, &mut self.session)?;
            }
        }
        Ok(())
    }

    fn handle_overlay_action(&mut self, action: Action) -> Result<()> {
        let Some(overlay) = self.overlay.as_mut() else {
            return Ok(());
        };
        let outcome = overlay.component_mut().handle_action(action, &mut self.session)?;
        let mode = overlay.mode();

        match (mode, outcome) {
            (Mode::ImportPrompt, Outcome::Submit) => self.submit_import(),
            (Mode::ImportPrompt, Outcome::Close) => {
                if let Some(token) = self.import_cancel.take() {
                    info!("Cancelling running import");
                    token.cancel();
                }
                self.overlay = None;
            }
            (Mode::LayoutEditor, Outcome::Close) => {
                self.overlay = None;
                self.data_table.reset();
                self.search_bar.reset();
            }
            (_, Outcome::Close) => {
                self.overlay = None;
                self.data_table.clamp(&self.session);
            }
            _ => {}
        }
        Ok(())
    }

    fn submit_import(&mut self) {
        let Some(Overlay::Import(prompt)) = &mut self.overlay else {
            return;
        };
        match prompt.source() {
            Ok(source) => self.start_import(source),
            Err(e) => prompt.set_error(&e),
        }
    }

    /// Open the import prompt and start loading `source` right away
    pub fn load_on_start(&mut self, source: ImportSource) {
        self.overlay = Some(Overlay::Import(ImportPrompt::new()));
        self.start_import(source);
    }

    fn start_import(&mut self, source: ImportSource) {
        if self.import_cancel.is_some() || self.import_service.is_busy() {
            if let Some(Overlay::Import(prompt)) = &mut self.overlay {
                prompt.set_error(&ImportError::Busy);
            }
            return;
        }
        if let Some(Overlay::Import(prompt)) = &mut self.overlay {
            prompt.set_busy(true);
        }

        let token = CancellationToken::new();
        self.import_cancel = Some(token.clone());
        let service = self.import_service.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = service.import(source, token).await;
            let _ = events.send(AppEvent::ImportFinished(result));
        });
    }

    pub fn handle_app_event(&mut self, event: AppEvent) -> Result<()> {
        match event {
            AppEvent::ImportFinished(result) => self.import_finished(result),
            AppEvent::ImageProbed { cell, url, result } => self.image_probed(cell, &url, result),
        }
        self.persist();
        Ok(())
    }

    fn import_finished(&mut self, result: Result<Vec<Row>, ImportError>) {
        self.import_cancel = None;
        match result {
            Ok(rows) => {
                self.status = Some(format!("Imported {} rows", rows.len()));
                self.session.load_dataset(rows);
                self.data_table.reset();
                self.search_bar.reset();
                self.overlay = Some(Overlay::Layout(LayoutEditorDialog::new()));
            }
            Err(e) => match &mut self.overlay {
                Some(Overlay::Import(prompt)) => prompt.set_error(&e),
                _ => self.status = Some(e.to_string()),
            },
        }
    }

    fn image_probed(&mut self, cell: CellRef, url: &str, result: Result<String, String>) {
        let status = match result {
            Ok(content_type) => ProbeStatus::Loaded { content_type },
            Err(reason) => {
                self.data_table.mark_image_failed(cell.clone());
                ProbeStatus::Failed(reason)
            }
        };
        if let Some(Overlay::Image(view)) = &mut self.overlay {
            if view.url() == url && view.cell() == &cell {
                view.set_status(status);
            }
        }
    }

    fn open_image(&mut self) {
        let Some((cell, content)) = self.data_table.current_content(&self.session) else {
            return;
        };
        match content {
            CellContent::Image(url) => {
                self.session.set_active_image(url.clone());
                self.overlay = Some(Overlay::Image(ImageView::new(url.clone(), cell.clone())));

                let probe = self.image_probe.clone();
                let events = self.events.clone();
                tokio::spawn(async move {
                    let result = probe.probe(&url).await.map_err(|e| e.to_string());
                    let _ = events.send(AppEvent::ImageProbed { cell, url, result });
                });
            }
            CellContent::Link(url) => {
                self.session.set_active_image(url.clone());
                let mut view = ImageView::new(url, cell);
                view.set_status(ProbeStatus::Failed("image could not be loaded".to_string()));
                self.overlay = Some(Overlay::Image(view));
            }
            CellContent::Text(_) => self.status = Some("Not an image link".to_string()),
        }
    }

    fn copy_cell(&mut self) {
        let Some(cell) = self.data_table.current_cell(&self.session) else {
            return;
        };
        let text = self
            .session
            .engine()
            .row(cell.row)
            .and_then(|r| r.get(&cell.column))
            .map(display_value)
            .unwrap_or_default();
        let copied = arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text));
        self.status = Some(match copied {
            Ok(()) => "Copied cell".to_string(),
            Err(e) => {
                warn!("Clipboard unavailable: {e}");
                format!("Could not copy: {e}")
            }
        });
    }

    /// Save the session if anything was committed since the last call
    fn persist(&mut self) {
        let mut changed = false;
        while self.session_events.try_recv().is_ok() {
            changed = true;
        }
        if !changed {
            return;
        }
        if let Some(store) = &self.store {
            if let Err(e) = store.save(&self.session.snapshot()) {
                warn!("Could not save session: {e}");
            }
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Update app state (called on every tick)
    pub fn update(&mut self) -> Result<()> {
        if let Some(overlay) = &mut self.overlay {
            overlay.component_mut().update()?;
        }
        Ok(())
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let mode = self.mode();
        self.data_table.set_focused(mode == Mode::Table);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
            .split(area);

        if self.session.has_data() {
            self.search_bar.render(frame, chunks[0], &self.session, &self.theme);
            self.data_table.render(frame, chunks[1], &self.session, &self.theme);
        } else {
            let welcome = Paragraph::new("No data loaded. Press o to import a CSV or JSON file.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).border_style(self.theme.border_style()));
            frame.render_widget(welcome, chunks[1]);
        }

        let hint = match &self.status {
            Some(status) => Span::styled(status.clone(), self.theme.info_style()),
            None => {
                let actions: Vec<Action> = match &mut self.overlay {
                    Some(overlay) => overlay.component_mut().supported_actions().to_vec(),
                    None if mode == Mode::Search => self.search_bar.supported_actions().to_vec(),
                    None => TABLE_HINTS.to_vec(),
                };
                Span::styled(self.keybindings.hint(mode, &actions), self.theme.muted_style())
            }
        };
        frame.render_widget(Paragraph::new(hint), chunks[2]);

        if let Some(overlay) = &mut self.overlay {
            let (w, h) = overlay.size();
            let overlay_area = Self::centered_rect(w, h, area);
            overlay
                .component_mut()
                .render(frame, overlay_area, &self.session, &self.theme);
        }
    }

    /// Helper to create centered rectangle
    fn centered_rect(percent_w: u16, percent_h: u16, area: Rect) -> Rect {
        let width = (area.width * percent_w) / 100;
        let height = (area.height * percent_h) / 100;
        let x = area.x + (area.width.saturating_sub(width)) / 2;
        let y = area.y + (area.height.saturating_sub(height)) / 2;
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn keybindings(&self) -> &KeyBindings {
        &self.keybindings
    }
}

const TABLE_HINTS: [Action; 8] = [
    Action::FocusSearch,
    Action::ToggleSort,
    Action::OpenFilterMenu,
    Action::OpenColumnMenu,
    Action::EditLayout,
    Action::Confirm,
    Action::Import,
    Action::Quit,
];

fn text_input(key: &KeyEvent) -> Option<TextInput> {
    match key.code {
        KeyCode::Char(c)
            if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            Some(TextInput::Char(c))
        }
        KeyCode::Backspace => Some(TextInput::Backspace),
        KeyCode::Delete => Some(TextInput::Delete),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    fn config() -> Config {
        Config {
            page_size: 10,
            ..Config::default()
        }
    }

    fn rows() -> Vec<Row> {
        serde_json::from_value(json!([
            {"img": "http://x/1.png", "tag": "cat"},
            {"img": "http://x/2.png", "tag": "dog"},
            {"img": "N/A", "tag": "cat"},
        ]))
        .unwrap()
    }

    fn app_with_store(store: Option<SessionStore>) -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        App::new(&config(), tx, store).unwrap()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ch(c: char) -> KeyEvent {
        key(KeyCode::Char(c))
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn send(app: &mut App, keys: &[KeyEvent]) {
        for k in keys {
            app.handle_key_event(*k).unwrap();
        }
    }

    /// App with the sample rows imported and the tag column made filterable
    fn loaded_app() -> App {
        let mut app = app_with_store(None);
        app.handle_app_event(AppEvent::ImportFinished(Ok(rows()))).unwrap();
        assert_eq!(app.mode(), Mode::LayoutEditor);
        send(&mut app, &[key(KeyCode::Down), ch('f'), ctrl('s')]);
        app
    }

    #[test]
    fn test_starts_with_import_prompt() {
        let app = app_with_store(None);
        assert_eq!(app.mode(), Mode::ImportPrompt);
        assert!(!app.should_quit());
    }

    #[test]
    fn test_import_error_is_shown_in_prompt() {
        let mut app = app_with_store(None);
        app.handle_app_event(AppEvent::ImportFinished(Err(ImportError::NoFile)))
            .unwrap();
        assert_eq!(app.import_error(), Some("No file found"));
    }

    #[test]
    fn test_empty_submit_reports_no_data() {
        let mut app = app_with_store(None);
        send(&mut app, &[key(KeyCode::Enter)]);
        assert_eq!(app.import_error(), Some("No data found"));
    }

    #[test]
    fn test_layout_then_filter_flow() {
        let mut app = loaded_app();
        assert_eq!(app.mode(), Mode::Table);
        assert!(app.session().layout().columns()[1].filter);

        send(&mut app, &[ch('f'), key(KeyCode::Char(' ')), key(KeyCode::Esc)]);

        assert_eq!(app.mode(), Mode::Table);
        assert!(app.session().filter_state().is_toggled("tag", "cat"));
        assert_eq!(app.session().engine().view().rows, vec![0, 2]);
    }

    #[test]
    fn test_search_typing_routes_text_first() {
        let mut app = loaded_app();
        send(&mut app, &[ch('/'), ch('2'), ch('q')]);

        assert_eq!(app.mode(), Mode::Search);
        assert!(!app.should_quit(), "q is typed, not bound");
        assert_eq!(app.session().engine().search_text(), "2q");

        send(&mut app, &[key(KeyCode::Backspace)]);
        assert_eq!(app.session().engine().view().rows, vec![1]);

        send(&mut app, &[key(KeyCode::Esc)]);
        assert_eq!(app.mode(), Mode::Table);
        assert_eq!(app.session().engine().view().total_rows, 3);
    }

    #[test]
    fn test_quit_from_table() {
        let mut app = loaded_app();
        send(&mut app, &[ch('q')]);
        assert!(app.should_quit());
    }

    #[test]
    fn test_text_cell_does_not_open_image() {
        let mut app = loaded_app();
        send(&mut app, &[key(KeyCode::Down), key(KeyCode::Down), key(KeyCode::Enter)]);

        assert_eq!(app.mode(), Mode::Table);
        assert_eq!(app.status(), Some("Not an image link"));
    }

    #[tokio::test]
    async fn test_failed_probe_marks_cell() {
        let mut app = loaded_app();
        send(&mut app, &[key(KeyCode::Enter)]);
        assert_eq!(app.mode(), Mode::ImageView);
        assert_eq!(app.session().active_image(), Some("http://x/1.png"));

        let cell = CellRef {
            row: 0,
            column: "img".to_string(),
        };
        app.handle_app_event(AppEvent::ImageProbed {
            cell: cell.clone(),
            url: "http://x/1.png".to_string(),
            result: Err("server answered 404".to_string()),
        })
        .unwrap();

        assert!(app.data_table().image_failed(&cell));
        send(&mut app, &[key(KeyCode::Esc)]);
        let (_, content) = app.data_table().current_content(app.session()).unwrap();
        assert_eq!(content, CellContent::Link("http://x/1.png".to_string()));
    }

    #[test]
    fn test_session_is_persisted_and_restored() {
        let dir = TempDir::new().unwrap();
        let mut app = app_with_store(Some(SessionStore::new(dir.path())));
        app.handle_app_event(AppEvent::ImportFinished(Ok(rows()))).unwrap();
        send(&mut app, &[key(KeyCode::Down), ch('f'), ctrl('s')]);

        let restored = app_with_store(Some(SessionStore::new(dir.path())));
        assert_eq!(restored.mode(), Mode::Table);
        assert_eq!(restored.session().layout(), app.session().layout());
        assert_eq!(restored.session().rows().len(), 3);
    }

    #[test]
    fn test_reopened_layout_editor_keeps_flags() {
        let mut app = loaded_app();
        send(&mut app, &[ch('L')]);
        assert_eq!(app.mode(), Mode::LayoutEditor);

        send(&mut app, &[ctrl('s')]);
        assert!(app.session().layout().columns()[1].filter);
    }
}
