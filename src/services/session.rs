//! The application session: one dataset, its layout, filters and row engine
//!
//! Every derived value is recomputed here when its inputs change, so the
//! filter value map, the compiled predicates and the row engine never
//! disagree with the finalized layout.

use crate::core::filter_state::{self, FilterAction, FilterValueMap};
use crate::core::layout::{FinalizedLayout, LayoutEditor, LayoutEvent};
use crate::core::predicate::{self, CompiledFilters};
use crate::core::projection::{self, ColumnDefinition};
use crate::core::types::{DatasetId, Row, field_names};
use crate::services::row_engine::RowEngine;
use crate::services::session_store::SessionSnapshot;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

/// Committed state transitions, broadcast to subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Rows, layout, filters or the active image changed
    DataUpdated,
}

pub struct Session {
    dataset_id: Option<DatasetId>,
    imported_at: Option<DateTime<Utc>>,
    rows: Arc<[Row]>,
    editor: Option<LayoutEditor>,
    layout: FinalizedLayout,
    filter_state: FilterValueMap,
    compiled: CompiledFilters,
    engine: RowEngine,
    active_image: Option<String>,
    subscribers: Vec<UnboundedSender<SessionEvent>>,
}

impl Session {
    pub fn new(page_size: usize) -> Self {
        Self {
            dataset_id: None,
            imported_at: None,
            rows: Arc::from(Vec::new()),
            editor: None,
            layout: FinalizedLayout::default(),
            filter_state: FilterValueMap::new(),
            compiled: CompiledFilters::default(),
            engine: RowEngine::new(page_size),
            active_image: None,
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self) -> UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    fn notify(&mut self, event: SessionEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Replace the dataset wholesale and open a layout editor on its fields.
    /// Until the editor is saved the table uses the default layout.
    pub fn load_dataset(&mut self, rows: Vec<Row>) {
        let fields = field_names(&rows);
        let dataset_id = DatasetId::new();
        info!("Loaded dataset {dataset_id} with {} rows, {} fields", rows.len(), fields.len());

        self.dataset_id = Some(dataset_id);
        self.imported_at = Some(Utc::now());
        self.rows = rows.into();
        self.active_image = None;
        let editor = LayoutEditor::new(fields);
        self.layout = editor.finalize();
        self.editor = Some(editor);
        self.rederive();
        self.notify(SessionEvent::DataUpdated);
    }

    pub fn dataset_id(&self) -> Option<&DatasetId> {
        self.dataset_id.as_ref()
    }

    pub fn imported_at(&self) -> Option<DateTime<Utc>> {
        self.imported_at
    }

    pub fn has_data(&self) -> bool {
        !self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn editor(&self) -> Option<&LayoutEditor> {
        self.editor.as_ref()
    }

    pub fn is_editing_layout(&self) -> bool {
        self.editor.is_some()
    }

    /// Reopen the editor on the current finalized layout
    pub fn begin_layout_edit(&mut self) {
        if self.editor.is_none() {
            self.editor = Some(LayoutEditor::from_layout(self.layout.to_layout()));
        }
    }

    pub fn edit_layout(&mut self, event: LayoutEvent) {
        match self.editor.as_mut() {
            Some(editor) => editor.apply(event),
            None => warn!("Layout event {event:?} with no editor open"),
        }
    }

    /// Close the editor, commit its layout and rebuild everything derived from it
    pub fn finalize_layout(&mut self) -> Option<FinalizedLayout> {
        let editor = self.editor.take()?;
        self.layout = editor.finalize();
        debug!("Finalized layout with {} columns", self.layout.len());
        self.rederive();
        self.notify(SessionEvent::DataUpdated);
        Some(self.layout.clone())
    }

    pub fn layout(&self) -> &FinalizedLayout {
        &self.layout
    }

    pub fn column_definitions(&self) -> &[ColumnDefinition] {
        self.engine.columns()
    }

    pub fn search_column(&self) -> Option<&str> {
        projection::search_column(&self.layout)
    }

    pub fn filter_state(&self) -> &FilterValueMap {
        &self.filter_state
    }

    pub fn compiled_filters(&self) -> &CompiledFilters {
        &self.compiled
    }

    /// Toggle one value and push the recompiled predicates in the same step
    pub fn toggle_filter(&mut self, column: &str, value: &str) {
        let next = filter_state::reduce(
            &self.filter_state,
            FilterAction::ChangeFilter {
                column: column.to_string(),
                value: value.to_string(),
            },
        );
        self.commit_filters(next);
    }

    /// Untoggle every value in every column
    pub fn clear_filters(&mut self) {
        let next = filter_state::populate(&self.layout, &self.rows);
        self.commit_filters(next);
    }

    fn commit_filters(&mut self, next: FilterValueMap) {
        if next == self.filter_state {
            return;
        }
        self.compiled = predicate::compile(&next);
        self.filter_state = next;
        self.engine.set_filters(self.compiled.clone());
        self.notify(SessionEvent::DataUpdated);
    }

    pub fn set_search_text(&mut self, text: &str) {
        self.engine.set_search_text(text);
    }

    pub fn engine(&self) -> &RowEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut RowEngine {
        &mut self.engine
    }

    pub fn active_image(&self) -> Option<&str> {
        self.active_image.as_deref()
    }

    pub fn set_active_image(&mut self, url: impl Into<String>) {
        let url = url.into();
        if self.active_image.as_deref() == Some(url.as_str()) {
            return;
        }
        debug!("Active image is now {url}");
        self.active_image = Some(url);
        self.notify(SessionEvent::DataUpdated);
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            dataset_id: self.dataset_id.clone(),
            saved_at: Utc::now(),
            rows: self.rows.to_vec(),
            layout: self.layout.clone(),
            active_image: self.active_image.clone(),
        }
    }

    /// Rebuild from a saved snapshot. A layout that does not describe the
    /// saved rows is replaced by the default one.
    pub fn restore(&mut self, snapshot: SessionSnapshot) {
        let fields = field_names(&snapshot.rows);
        let layout_matches = snapshot.layout.is_consistent() && {
            let mut saved: Vec<&str> = snapshot.layout.columns().iter().map(|c| c.name.as_str()).collect();
            let mut current: Vec<&str> = fields.iter().map(String::as_str).collect();
            saved.sort_unstable();
            current.sort_unstable();
            saved == current
        };

        self.layout = if layout_matches {
            snapshot.layout
        } else {
            warn!("Saved layout does not match saved rows, using the default layout");
            LayoutEditor::new(fields).finalize()
        };
        self.dataset_id = snapshot.dataset_id;
        self.imported_at = Some(snapshot.saved_at);
        self.rows = snapshot.rows.into();
        self.active_image = snapshot.active_image;
        self.editor = None;
        self.rederive();
    }

    fn rederive(&mut self) {
        self.filter_state = filter_state::populate(&self.layout, &self.rows);
        self.compiled = predicate::compile(&self.filter_state);
        self.engine.set_data(self.rows.clone(), projection::project(&self.layout));
        self.engine.set_filters(self.compiled.clone());
    }
}
