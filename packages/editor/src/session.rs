//! # Editing Session
//!
//! Registry of the three independently edited documents.
//!
//! ```text
//!  SessionMode     ManagedData                         schema used for it
//!  ────────────    ──────────────────────────────      ──────────────────────────
//!  DataEditor   →  DocumentStore + HistoryManager  ←   schema editor's document
//!  SchemaEditor →  DocumentStore + HistoryManager  ←   built-in meta-schema
//!  Settings     →  DocumentStore + HistoryManager  ←   built-in settings schema
//! ```
//!
//! Stores share no mutable state. Each history is created on first use and
//! only ever records its own store. Whenever the settings document changes,
//! the typed [`Settings`] view is refreshed and a new `dataFormat` is applied
//! to all three stores.

use crate::debounce::{Clock, SystemClock};
use crate::document::DocumentStore;
use crate::errors::EditorError;
use crate::format::DataFormat;
use crate::history::{HistoryConfig, HistoryManager};
use crate::metaschema::{meta_schema, settings_schema};
use crate::mutations::{Mutation, SchemaOrderedMutator};
use crate::settings::{default_settings_document, Settings};
use metaconf_common::Path;
use metaconf_schema::{EffectiveSchema, SchemaDocument, SchemaResolver};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Which document an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// The user's data, edited against the user's schema
    #[serde(rename = "file_editor")]
    DataEditor,
    /// The user's schema, edited against the meta-schema
    SchemaEditor,
    Settings,
}

impl SessionMode {
    pub const ALL: [SessionMode; 3] = [
        SessionMode::DataEditor,
        SessionMode::SchemaEditor,
        SessionMode::Settings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::DataEditor => "file_editor",
            SessionMode::SchemaEditor => "schema_editor",
            SessionMode::Settings => "settings",
        }
    }

    fn index(self) -> usize {
        match self {
            SessionMode::DataEditor => 0,
            SessionMode::SchemaEditor => 1,
            SessionMode::Settings => 2,
        }
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One edited document with its (lazily created) history
#[derive(Debug)]
pub struct ManagedData {
    mode: SessionMode,
    store: DocumentStore,
    history: Option<HistoryManager>,
    history_config: HistoryConfig,
    clock: Rc<dyn Clock>,
}

impl ManagedData {
    pub fn new(mode: SessionMode, store: DocumentStore, history_config: HistoryConfig, clock: Rc<dyn Clock>) -> Self {
        Self {
            mode,
            store,
            history: None,
            history_config,
            clock,
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Direct store access; changes made here are still recorded by the history
    pub fn store_mut(&mut self) -> &mut DocumentStore {
        &mut self.store
    }

    /// The history, attaching it on first access
    pub fn history(&mut self) -> Result<&mut HistoryManager, EditorError> {
        Ok(self.history_and_store()?.0)
    }

    pub fn has_history(&self) -> bool {
        self.history.is_some()
    }

    pub fn can_undo(&self) -> bool {
        self.history.as_ref().is_some_and(HistoryManager::can_undo)
    }

    pub fn can_redo(&self) -> bool {
        self.history.as_ref().is_some_and(HistoryManager::can_redo)
    }

    pub fn undo(&mut self) -> Result<bool, EditorError> {
        let (history, store) = self.history_and_store()?;
        history.undo(store)
    }

    pub fn redo(&mut self) -> Result<bool, EditorError> {
        let (history, store) = self.history_and_store()?;
        history.redo(store)
    }

    /// Run a due capture; does nothing before the history exists
    pub fn poll(&mut self) -> Result<bool, EditorError> {
        match &mut self.history {
            Some(history) => history.poll(&self.store),
            None => Ok(false),
        }
    }

    /// Switch the store's text format, rewriting history entries along with it
    pub fn set_format(&mut self, format: Box<dyn DataFormat>) {
        if let Some(history) = &mut self.history {
            history.reencode(self.store.format(), format.as_ref());
        }
        self.store.set_format(format);
    }

    /// Applies to a history created after this call
    pub fn set_history_config(&mut self, config: HistoryConfig) {
        self.history_config = config;
    }

    fn history_and_store(&mut self) -> Result<(&mut HistoryManager, &mut DocumentStore), EditorError> {
        let history = match self.history.take() {
            Some(history) => self.history.insert(history),
            None => {
                let attached = HistoryManager::attach(&mut self.store, &self.history_config, Rc::clone(&self.clock))?;
                tracing::debug!("Created history for {}", self.mode);
                self.history.insert(attached)
            }
        };
        Ok((history, &mut self.store))
    }
}

/// The three managed documents plus everything derived from them
#[derive(Debug)]
pub struct Session {
    documents: [ManagedData; 3],

    /// One resolver per mode, so switching modes does not thrash a shared cache
    resolvers: [SchemaResolver; 3],

    /// User schema, rebuilt when the schema editor's revision moves
    data_schema: Option<(u64, SchemaDocument)>,

    meta_schema: SchemaDocument,
    settings_schema: SchemaDocument,

    /// Typed view of the settings document
    settings: Settings,

    /// `(format name, indentation)` the stores currently use
    applied_format: Option<(&'static str, usize)>,
}

impl Session {
    /// Session on the wall clock
    pub fn new() -> Self {
        Self::with_clock(Rc::new(SystemClock))
    }

    /// Session whose histories read time from `clock`
    pub fn with_clock(clock: Rc<dyn Clock>) -> Self {
        let settings = Settings::default();
        let history_config = settings.history_config();
        let store = |mode: SessionMode, value: Value| {
            ManagedData::new(
                mode,
                DocumentStore::new(value),
                history_config,
                Rc::clone(&clock),
            )
        };

        let mut session = Self {
            documents: [
                store(SessionMode::DataEditor, Value::Object(Map::new())),
                store(SessionMode::SchemaEditor, Value::Object(Map::new())),
                store(SessionMode::Settings, default_settings_document()),
            ],
            resolvers: Default::default(),
            data_schema: None,
            meta_schema: SchemaDocument::new(meta_schema()),
            settings_schema: SchemaDocument::new(settings_schema()),
            settings,
            applied_format: None,
        };
        session.refresh_settings();
        session
    }

    pub fn data(&self, mode: SessionMode) -> &ManagedData {
        &self.documents[mode.index()]
    }

    pub fn data_mut(&mut self, mode: SessionMode) -> &mut ManagedData {
        &mut self.documents[mode.index()]
    }

    pub fn store(&self, mode: SessionMode) -> &DocumentStore {
        &self.documents[mode.index()].store
    }

    /// Typed view of the current settings document
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn read(&self, mode: SessionMode) -> Result<String, EditorError> {
        self.store(mode).read()
    }

    /// Replace a document from text (see [`DocumentStore::write`])
    pub fn write(&mut self, mode: SessionMode, text: &str) -> bool {
        let changed = self.documents[mode.index()].store.write(text);
        self.after_change(mode, changed)
    }

    /// Replace a whole document
    pub fn set_data(&mut self, mode: SessionMode, value: Value) -> bool {
        let changed = self.documents[mode.index()].store.set_data(value);
        self.after_change(mode, changed)
    }

    pub fn at(&self, mode: SessionMode, path: &Path) -> Option<&Value> {
        self.store(mode).at(path)
    }

    /// Set `value` at `path`, placing new keys per `guiEditor.propertySorting`
    pub fn set_at(&mut self, mode: SessionMode, path: &Path, value: Value) -> Result<bool, EditorError> {
        self.apply(
            mode,
            Mutation::Set {
                path: path.clone(),
                value,
            },
        )
    }

    pub fn remove_at(&mut self, mode: SessionMode, path: &Path) -> bool {
        // Removal never fails
        self.apply(mode, Mutation::Remove { path: path.clone() })
            .unwrap_or(false)
    }

    pub fn apply(&mut self, mode: SessionMode, mutation: Mutation) -> Result<bool, EditorError> {
        let schema = self.schema_for(mode);
        let index = mode.index();
        let changed = SchemaOrderedMutator::new(&mut self.resolvers[index])
            .with_sorting(self.settings.property_sorting())
            .apply(&mut self.documents[index].store, &schema, mutation)?;
        Ok(self.after_change(mode, changed))
    }

    /// Reset a document to an empty object
    pub fn clear(&mut self, mode: SessionMode) -> bool {
        self.remove_at(mode, &Path::root())
    }

    /// Replace the settings document with a fresh copy of the defaults
    pub fn restore_default_settings(&mut self) -> bool {
        self.set_data(SessionMode::Settings, default_settings_document())
    }

    /// Schema document the given mode is edited against
    pub fn schema_for(&mut self, mode: SessionMode) -> SchemaDocument {
        match mode {
            SessionMode::SchemaEditor => self.meta_schema.clone(),
            SessionMode::Settings => self.settings_schema.clone(),
            SessionMode::DataEditor => {
                let schema_store = &self.documents[SessionMode::SchemaEditor.index()].store;
                let revision = schema_store.revision();
                if let Some((built_at, schema)) = &self.data_schema {
                    if *built_at == revision {
                        return schema.clone();
                    }
                }
                let schema = SchemaDocument::new(schema_store.snapshot());
                tracing::debug!("Rebuilt data schema {} at revision {}", schema.id(), revision);
                self.data_schema = Some((revision, schema.clone()));
                schema
            }
        }
    }

    pub fn effective_schema_at(&mut self, mode: SessionMode, path: &Path) -> Arc<EffectiveSchema> {
        let schema = self.schema_for(mode);
        self.resolvers[mode.index()].effective_schema_at(&schema, path)
    }

    pub fn schema_path_at(&mut self, mode: SessionMode, path: &Path) -> Path {
        self.effective_schema_at(mode, path).schema_path.clone()
    }

    pub fn undo(&mut self, mode: SessionMode) -> Result<bool, EditorError> {
        let changed = self.data_mut(mode).undo()?;
        Ok(self.after_change(mode, changed))
    }

    pub fn redo(&mut self, mode: SessionMode) -> Result<bool, EditorError> {
        let changed = self.data_mut(mode).redo()?;
        Ok(self.after_change(mode, changed))
    }

    pub fn can_undo(&self, mode: SessionMode) -> bool {
        self.data(mode).can_undo()
    }

    pub fn can_redo(&self, mode: SessionMode) -> bool {
        self.data(mode).can_redo()
    }

    /// Run due history captures; returns how many entries were added
    pub fn poll(&mut self) -> Result<usize, EditorError> {
        let mut captured = 0;
        for data in self.documents.iter_mut() {
            if data.poll()? {
                captured += 1;
            }
        }
        Ok(captured)
    }

    fn after_change(&mut self, mode: SessionMode, changed: bool) -> bool {
        if changed && mode == SessionMode::Settings {
            self.refresh_settings();
        }
        changed
    }

    fn refresh_settings(&mut self) {
        let settings = Settings::from_document(self.store(SessionMode::Settings).data());
        let history_config = settings.history_config();
        for data in self.documents.iter_mut() {
            data.set_history_config(history_config);
        }

        match settings.format() {
            Ok(format) => {
                let wanted = (format.name(), settings.code_editor.indentation);
                if self.applied_format != Some(wanted) {
                    tracing::debug!("Switching all documents to {} (indent {})", wanted.0, wanted.1);
                    for data in self.documents.iter_mut() {
                        if let Ok(format) = settings.format() {
                            data.set_format(format);
                        }
                    }
                    self.applied_format = Some(wanted);
                }
            }
            Err(e) => tracing::warn!("Keeping current format: {}", e),
        }
        self.settings = settings;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
