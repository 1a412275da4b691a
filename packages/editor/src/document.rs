//! # Document Store
//!
//! Holds one document tree together with its text form and keeps them in
//! sync.
//!
//! ## States
//!
//! ```text
//!            write(valid text) / set_data / update_at
//!          ┌──────────────────────────────────────────┐
//!          ↓                                          │
//!   ┌─────────────┐   write(invalid text)   ┌─────────────────┐
//!   │   In sync   │ ──────────────────────→ │    Override     │
//!   │ read() =    │                         │ read() = text   │
//!   │ stringify   │ ←────────────────────── │ tree frozen at  │
//!   └─────────────┘  write(valid) / set_data│ last good value │
//!                                           └─────────────────┘
//! ```
//!
//! Malformed text is the normal state of a document that is being typed, so
//! it is never reported as an error: the text is kept verbatim as an
//! override until it parses again.
//!
//! Every committed change is announced to subscribers exactly once, after it
//! has been fully applied.

use crate::errors::EditorError;
use crate::format::{DataFormat, JsonFormat};
use metaconf_common::{value_at, Path};
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one store instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreId(u64);

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store#{}", self.0)
    }
}

/// Handle returned by [`DocumentStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// What a commit changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// The tree changed (the text form follows it)
    Data,
    /// Only the text changed: it could not be parsed and is held as an override
    Text,
}

/// Notification payload, delivered once per committed mutation
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    /// Location the commit was scoped to
    pub path: Path,

    /// Value at `path` before the commit (`None` = absent)
    pub previous: Option<Value>,

    /// Value at `path` after the commit (`None` = absent)
    pub current: Option<Value>,

    pub kind: ChangeKind,
}

/// Change listener
pub type Listener = Box<dyn FnMut(&Change)>;

/// Canonical tree value plus its text form
pub struct DocumentStore {
    id: StoreId,

    /// Last valid tree
    value: Value,

    /// Verbatim text that failed to parse
    override_text: Option<String>,

    format: Box<dyn DataFormat>,

    /// Incremented on every commit
    revision: u64,

    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl DocumentStore {
    /// Create a JSON-backed store
    pub fn new(value: Value) -> Self {
        Self::with_format(value, Box::new(JsonFormat::default()))
    }

    pub fn with_format(value: Value, format: Box<dyn DataFormat>) -> Self {
        Self {
            id: StoreId(NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed)),
            value,
            override_text: None,
            format,
            revision: 0,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn id(&self) -> StoreId {
        self.id
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn format(&self) -> &dyn DataFormat {
        self.format.as_ref()
    }

    /// Swap the text format; the tree is untouched and an override is kept verbatim
    pub fn set_format(&mut self, format: Box<dyn DataFormat>) {
        tracing::debug!("{}: switching format {} -> {}", self.id, self.format.name(), format.name());
        self.format = format;
    }

    /// Text form: the override if one is held, otherwise the stringified tree
    pub fn read(&self) -> Result<String, EditorError> {
        if let Some(text) = &self.override_text {
            return Ok(text.clone());
        }
        Ok(self.format.stringify(&self.value)?)
    }

    /// Replace the document from text.
    ///
    /// Text that fails to parse is kept as an override and the tree stays at
    /// its last valid value. Returns `true` when something changed.
    pub fn write(&mut self, text: &str) -> bool {
        match self.format.parse(text) {
            Ok(parsed) => self.replace_root(parsed),
            Err(e) => {
                if self.override_text.as_deref() == Some(text) {
                    return false;
                }
                tracing::debug!("{}: holding unparseable text as override: {}", self.id, e);
                self.override_text = Some(text.to_string());
                let change = Change {
                    path: Path::root(),
                    previous: Some(self.value.clone()),
                    current: Some(self.value.clone()),
                    kind: ChangeKind::Text,
                };
                self.commit(change);
                true
            }
        }
    }

    /// Replace the whole tree, dropping any override
    pub fn set_data(&mut self, value: Value) -> bool {
        self.replace_root(value)
    }

    /// Current tree (the last valid one while an override is held)
    pub fn data(&self) -> &Value {
        &self.value
    }

    /// Value at `path`, `None` if any segment does not resolve
    pub fn at(&self, path: &Path) -> Option<&Value> {
        value_at(&self.value, path)
    }

    /// Deep copy of the current tree
    pub fn snapshot(&self) -> Value {
        self.value.clone()
    }

    pub fn has_override(&self) -> bool {
        self.override_text.is_some()
    }

    pub fn override_text(&self) -> Option<&str> {
        self.override_text.as_deref()
    }

    /// Apply `mutate` to the tree and notify once.
    ///
    /// `mutate` returns whether it changed anything; nothing is announced
    /// otherwise. The change is reported at `path`, which must cover
    /// everything `mutate` touches. A structural edit makes the tree
    /// authoritative again, so any override is dropped.
    pub fn update_at<F>(&mut self, path: &Path, mutate: F) -> bool
    where
        F: FnOnce(&mut Value) -> bool,
    {
        let previous = self.at(path).cloned();
        if !mutate(&mut self.value) {
            return false;
        }
        if self.override_text.take().is_some() {
            tracing::debug!("{}: structural edit at '{}' discards override", self.id, path);
        }
        let change = Change {
            path: path.clone(),
            previous,
            current: self.at(path).cloned(),
            kind: ChangeKind::Data,
        };
        self.commit(change);
        true
    }

    /// Register a listener for committed changes
    pub fn subscribe(&mut self, listener: impl FnMut(&Change) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener; returns `false` if it was not registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    fn replace_root(&mut self, value: Value) -> bool {
        let had_override = self.override_text.take().is_some();
        if !had_override && value == self.value {
            return false;
        }
        let previous = std::mem::replace(&mut self.value, value);
        let change = Change {
            path: Path::root(),
            previous: Some(previous),
            current: Some(self.value.clone()),
            kind: ChangeKind::Data,
        };
        self.commit(change);
        true
    }

    /// Bump the revision, then notify in subscription order
    fn commit(&mut self, change: Change) {
        self.revision += 1;
        tracing::trace!("{}: commit r{} at '{}' ({:?})", self.id, self.revision, change.path, change.kind);
        for (_, listener) in self.listeners.iter_mut() {
            listener(&change);
        }
    }
}

impl fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentStore")
            .field("id", &self.id)
            .field("value", &self.value)
            .field("override_text", &self.override_text)
            .field("format", &self.format.name())
            .field("revision", &self.revision)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::YamlFormat;
    use metaconf_common::path;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorded(store: &mut DocumentStore) -> Rc<RefCell<Vec<Change>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        store.subscribe(move |change| sink.borrow_mut().push(change.clone()));
        log
    }

    #[test]
    fn test_read_stringifies_current_value() {
        let store = DocumentStore::new(json!({"b": 1, "a": 2}));
        assert_eq!(store.read().unwrap(), "{\n  \"b\": 1,\n  \"a\": 2\n}");
        assert!(!store.has_override());
    }

    #[test]
    fn test_write_valid_text_replaces_value() {
        let mut store = DocumentStore::new(json!({}));
        assert!(store.write(r#"{"x": [1, 2]}"#));
        assert_eq!(store.data(), &json!({"x": [1, 2]}));
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn test_override_preserves_last_valid_tree() {
        let mut store = DocumentStore::new(json!({"a": 1}));
        assert!(store.write("{invalid"));
        assert_eq!(store.at(&Path::root()), Some(&json!({"a": 1})));
        assert_eq!(store.read().unwrap(), "{invalid");
        assert!(store.has_override());

        assert!(store.write(r#"{"a": 2}"#));
        assert!(!store.has_override());
        assert_eq!(store.data(), &json!({"a": 2}));
    }

    #[test]
    fn test_set_data_clears_override() {
        let mut store = DocumentStore::new(json!({"a": 1}));
        store.write("not json");
        assert!(store.set_data(json!({"a": 1})));
        assert!(!store.has_override());
        assert_eq!(store.read().unwrap(), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn test_unchanged_writes_do_not_notify() {
        let mut store = DocumentStore::new(json!({"a": 1}));
        let log = recorded(&mut store);
        assert!(!store.set_data(json!({"a": 1})));
        assert!(!store.write(r#"{ "a" : 1 }"#));
        store.write("{broken");
        assert!(!store.write("{broken"));
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(log.borrow()[0].kind, ChangeKind::Text);
    }

    #[test]
    fn test_notifications_carry_before_and_after() {
        let mut store = DocumentStore::new(json!({"a": {"b": 1}}));
        let log = recorded(&mut store);
        store.update_at(&path!["a", "b"], |root| {
            root["a"]["b"] = json!(2);
            true
        });
        let log = log.borrow();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].path, path!["a", "b"]);
        assert_eq!(log[0].previous, Some(json!(1)));
        assert_eq!(log[0].current, Some(json!(2)));
        assert_eq!(log[0].kind, ChangeKind::Data);
    }

    #[test]
    fn test_update_reporting_no_change_is_silent() {
        let mut store = DocumentStore::new(json!([1]));
        let log = recorded(&mut store);
        assert!(!store.update_at(&Path::root(), |_| false));
        assert!(log.borrow().is_empty());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn test_unsubscribe() {
        let mut store = DocumentStore::new(json!(1));
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        let id = store.subscribe(move |_| *sink.borrow_mut() += 1);
        store.set_data(json!(2));
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.set_data(json!(3));
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_at_missing_paths() {
        let store = DocumentStore::new(json!({"list": [1], "n": 5}));
        assert_eq!(store.at(&path!["list", 3]), None);
        assert_eq!(store.at(&path!["n", "x"]), None);
        assert_eq!(store.at(&path!["missing"]), None);
    }

    #[test]
    fn test_format_swap_keeps_tree() {
        let mut store = DocumentStore::new(json!({"name": "x", "n": 1}));
        store.set_format(Box::new(YamlFormat));
        assert_eq!(store.read().unwrap(), "name: x\nn: 1\n");
        assert!(store.write("name: y\nn: 2\n"));
        assert_eq!(store.data(), &json!({"name": "y", "n": 2}));
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut store = DocumentStore::new(json!({"a": [1]}));
        let snapshot = store.snapshot();
        store.set_data(json!({"a": [2]}));
        assert_eq!(snapshot, json!({"a": [1]}));
    }
}
