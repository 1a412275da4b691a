#![recursion_limit = "256"]
//! # Metaconf Editor
//!
//! Core document editing engine for Metaconf.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ common: Path algebra + value lookup         │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ schema: effective schema at a data path     │
//! │  - $ref / allOf resolution, cached          │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: document lifecycle + mutations      │
//! │  - Tree and text kept in sync (overrides)   │
//! │  - Schema-ordered set / remove              │
//! │  - Debounced, bounded undo/redo             │
//! │  - Per-mode registry (data/schema/settings) │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Tree is source of truth**: text is derived, except while an
//!    unparseable edit is held as an override
//! 2. **Mid-edit is normal**: malformed text, missing paths and failed
//!    merges are states, not errors
//! 3. **One commit, one notification**: subscribers never observe an
//!    intermediate tree
//! 4. **No I/O**: files, network and timers belong to the caller
//!
//! ## Usage
//!
//! ```rust
//! use metaconf_common::path;
//! use metaconf_editor::{Session, SessionMode};
//! use serde_json::json;
//!
//! let mut session = Session::new();
//! session.set_data(SessionMode::SchemaEditor, json!({
//!     "properties": {"name": {}, "age": {}, "city": {}}
//! }));
//! session.set_data(SessionMode::DataEditor, json!({"city": "X"}));
//!
//! session.set_at(SessionMode::DataEditor, &path!["name"], json!("Y")).unwrap();
//! assert_eq!(
//!     session.read(SessionMode::DataEditor).unwrap(),
//!     "{\n  \"name\": \"Y\",\n  \"city\": \"X\"\n}"
//! );
//! ```

mod debounce;
mod document;
mod errors;
mod format;
mod history;
mod metaschema;
mod mutations;
mod session;
mod settings;

pub use debounce::{Clock, Debouncer, ManualClock, SystemClock};
pub use document::{Change, ChangeKind, DocumentStore, Listener, StoreId, SubscriptionId};
pub use errors::EditorError;
pub use format::{format_for_name, DataFormat, FormatError, JsonFormat, YamlFormat};
pub use history::{HistoryConfig, HistoryManager, DEFAULT_CAPACITY, DEFAULT_DEBOUNCE};
pub use metaschema::{meta_schema, settings_schema};
pub use mutations::{Mutation, PropertySorting, SchemaOrderedMutator};
pub use session::{ManagedData, Session, SessionMode};
pub use settings::{
    default_settings_document, CodeEditorSettings, GuiEditorSettings, HistorySettings, MetaSchemaSettings,
    PanelSettings, Settings,
};

// Re-export common types for convenience
pub use metaconf_common::{Path, PathKey};
pub use metaconf_schema::{EffectiveSchema, Resolution, SchemaDocument, SchemaResolver};
