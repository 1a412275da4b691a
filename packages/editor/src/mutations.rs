//! # Path Mutations
//!
//! Fine-grained edits on a [`DocumentStore`], addressed by [`Path`].
//!
//! ## Mutation Semantics
//!
//! ### Set
//! - Root path replaces the whole document
//! - Setting a structurally equal value is a no-op (no notification)
//! - Introducing a new key into a non-empty object whose schema declares a
//!   property order rebuilds the object in schema order; this is reported
//!   as one change scoped to the parent
//! - Anything else is set in place, preserving existing order. Missing
//!   containers on the way are created; scalars on the way are replaced
//!
//! ### Remove
//! - Root path resets the document to an empty object
//! - Sequence elements shift down; out-of-range indices are a no-op
//! - Absent keys are a no-op
//!
//! Every call commits through [`DocumentStore::update_at`], so subscribers see
//! exactly one before/after pair per call.

use crate::document::DocumentStore;
use crate::errors::EditorError;
use metaconf_common::{is_empty_value, value_at_mut, Path, PathKey};
use metaconf_schema::{SchemaDocument, SchemaResolver};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How far past the end of a sequence a set may reach; the gap is filled with `null`
pub const MAX_SEQUENCE_PADDING: usize = 1024;

/// Path-scoped operations, as they travel between the CLI and the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Mutation {
    /// Set `value` at `path`
    Set { path: Path, value: Value },

    /// Remove whatever is at `path`
    Remove { path: Path },
}

impl Mutation {
    pub fn path(&self) -> &Path {
        match self {
            Mutation::Set { path, .. } | Mutation::Remove { path } => path,
        }
    }
}

/// Where a newly introduced object key is placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertySorting {
    /// Follow the property order declared by the schema
    #[default]
    SchemaOrder,
    /// Append new keys after the existing ones
    #[serde(other)]
    DataOrder,
}

/// Applies [`Mutation`]s, consulting the schema for key placement
pub struct SchemaOrderedMutator<'a> {
    resolver: &'a mut SchemaResolver,
    sorting: PropertySorting,
}

impl<'a> SchemaOrderedMutator<'a> {
    pub fn new(resolver: &'a mut SchemaResolver) -> Self {
        Self {
            resolver,
            sorting: PropertySorting::default(),
        }
    }

    pub fn with_sorting(mut self, sorting: PropertySorting) -> Self {
        self.sorting = sorting;
        self
    }

    /// Apply one mutation; returns whether the document changed
    pub fn apply(
        &mut self,
        store: &mut DocumentStore,
        schema: &SchemaDocument,
        mutation: Mutation,
    ) -> Result<bool, EditorError> {
        match mutation {
            Mutation::Set { path, value } => self.set_at(store, schema, &path, value),
            Mutation::Remove { path } => Ok(self.remove_at(store, &path)),
        }
    }

    /// Set `value` at `path`.
    ///
    /// Fails when `path` names a property inside an existing sequence, or an
    /// index more than [`MAX_SEQUENCE_PADDING`] past the end of one.
    pub fn set_at(
        &mut self,
        store: &mut DocumentStore,
        schema: &SchemaDocument,
        path: &Path,
        value: Value,
    ) -> Result<bool, EditorError> {
        let Some((parent_path, key)) = path.split_last() else {
            return Ok(store.set_data(value));
        };

        let existing = store.at(path);
        if existing == Some(&value) {
            tracing::trace!("set_at '{}': value unchanged", path);
            return Ok(false);
        }

        // `null` counts as absent, so a placeholder key is re-sorted too
        let absent = matches!(existing, None | Some(Value::Null));
        if absent && self.sorting == PropertySorting::SchemaOrder {
            if let Some(reordered) = self.schema_ordered_parent(store, schema, &parent_path, key, &value) {
                tracing::debug!("set_at '{}': inserting in schema order", path);
                let changed = store.update_at(&parent_path, |root| match value_at_mut(root, &parent_path) {
                    Some(slot) => {
                        *slot = Value::Object(reordered);
                        true
                    }
                    None => false,
                });
                return Ok(changed);
            }
        }

        let scope = change_scope(store.data(), path)?;
        Ok(store.update_at(&scope, |root| match place(root, path.keys()) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }))
    }

    /// Remove the value at `path`; returns whether anything was removed
    pub fn remove_at(&mut self, store: &mut DocumentStore, path: &Path) -> bool {
        let Some((parent_path, key)) = path.split_last() else {
            return store.set_data(Value::Object(Map::new()));
        };

        match store.at(&parent_path) {
            Some(Value::Array(items)) => {
                let Some(index) = key.to_index().filter(|index| *index < items.len()) else {
                    tracing::trace!("remove_at '{}': index out of range", path);
                    return false;
                };
                store.update_at(&parent_path, |root| match value_at_mut(root, &parent_path) {
                    Some(Value::Array(items)) => {
                        items.remove(index);
                        true
                    }
                    _ => false,
                })
            }
            Some(Value::Object(map)) => {
                let name = key.to_prop_name();
                if !map.contains_key(&name) {
                    return false;
                }
                store.update_at(path, |root| match value_at_mut(root, &parent_path) {
                    Some(Value::Object(map)) => map.shift_remove(&name).is_some(),
                    _ => false,
                })
            }
            _ => false,
        }
    }

    /// Rebuilt parent object for a schema-ordered insertion, `None` when the
    /// insertion should happen in place instead
    fn schema_ordered_parent(
        &mut self,
        store: &DocumentStore,
        schema: &SchemaDocument,
        parent_path: &Path,
        key: &PathKey,
        value: &Value,
    ) -> Option<Map<String, Value>> {
        let parent = store.at(parent_path).filter(|data| !is_empty_value(data))?.as_object()?;
        let effective = self.resolver.effective_schema_at(schema, parent_path);
        let order = effective.property_order();
        if order.is_empty() {
            return None;
        }
        Some(reorder_with(parent, &order, key.to_prop_name(), value.clone()))
    }
}

/// Schema-declared keys that are present or new, in schema order, then the
/// remaining data keys in their original order. An undeclared new key goes last.
fn reorder_with(
    parent: &Map<String, Value>,
    order: &[&str],
    key: String,
    value: Value,
) -> Map<String, Value> {
    let mut out = Map::with_capacity(parent.len() + 1);
    let mut pending = Some(value);

    for &name in order {
        if name == key {
            if let Some(value) = pending.take() {
                out.insert(key.clone(), value);
            }
        } else if let Some(existing) = parent.get(name) {
            out.insert(name.to_string(), existing.clone());
        }
    }
    for (name, existing) in parent {
        if !out.contains_key(name) {
            out.insert(name.clone(), existing.clone());
        }
    }
    if let Some(value) = pending {
        out.insert(key, value);
    }
    out
}

/// Smallest prefix of `path` that covers everything an in-place set touches.
///
/// The scope ends at the first missing child (it will be created), the first
/// scalar (it will be replaced by a container) or the first sequence that
/// has to be padded. The rest of the path is still checked, since the
/// containers created for it are padded too.
fn change_scope(root: &Value, path: &Path) -> Result<Path, EditorError> {
    let prefix = |len: usize| Path::new(path.keys()[..len].to_vec());
    let mut current = Some(root);
    let mut scope = None;

    for (depth, key) in path.iter().enumerate() {
        current = match current {
            Some(Value::Array(items)) => {
                let index = key.to_index().ok_or_else(|| EditorError::PathMismatch {
                    path: prefix(depth),
                    key: key.to_prop_name(),
                })?;
                check_padding(&prefix(depth), index, items.len())?;
                let next = items.get(index);
                if next.is_none() {
                    scope.get_or_insert(depth);
                }
                next
            }
            Some(Value::Object(map)) => {
                let next = map.get(&key.to_prop_name());
                if next.is_none() {
                    scope.get_or_insert(depth + 1);
                }
                next
            }
            other => {
                if other.is_some() {
                    scope.get_or_insert(depth);
                }
                // A fresh sequence is created for an index key
                if let PathKey::Index(index) = key {
                    check_padding(&prefix(depth), *index, 0)?;
                }
                None
            }
        };
    }
    Ok(scope.map_or_else(|| path.clone(), prefix))
}

fn check_padding(path: &Path, index: usize, len: usize) -> Result<(), EditorError> {
    if index > len.saturating_add(MAX_SEQUENCE_PADDING) {
        return Err(EditorError::IndexOutOfReach {
            path: path.clone(),
            index,
            len,
        });
    }
    Ok(())
}

/// Slot at `keys`, creating containers on the way
fn place<'v>(root: &'v mut Value, keys: &[PathKey]) -> Option<&'v mut Value> {
    keys.iter().try_fold(root, |current, key| slot_for(current, key))
}

fn slot_for<'v>(container: &'v mut Value, key: &PathKey) -> Option<&'v mut Value> {
    match container {
        Value::Array(items) => {
            let index = key.to_index()?;
            if index >= items.len() {
                items.resize(index.checked_add(1)?, Value::Null);
            }
            items.get_mut(index)
        }
        Value::Object(map) => Some(map.entry(key.to_prop_name()).or_insert(Value::Null)),
        other => {
            *other = match key {
                PathKey::Index(_) => Value::Array(Vec::new()),
                PathKey::Prop(_) => Value::Object(Map::new()),
            };
            slot_for(other, key)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Change;
    use metaconf_common::path;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn person_schema() -> SchemaDocument {
        SchemaDocument::new(json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "age": {"type": "integer"},
                "city": {"type": "string"}
            }
        }))
    }

    fn keys(value: &Value) -> Vec<&str> {
        value.as_object().unwrap().keys().map(String::as_str).collect()
    }

    fn recorded(store: &mut DocumentStore) -> Rc<RefCell<Vec<Change>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        store.subscribe(move |change| sink.borrow_mut().push(change.clone()));
        log
    }

    #[test]
    fn test_set_root_replaces_document() {
        let mut resolver = SchemaResolver::new();
        let mut store = DocumentStore::new(json!({"a": 1}));
        let mut mutator = SchemaOrderedMutator::new(&mut resolver);
        assert!(mutator.set_at(&mut store, &person_schema(), &Path::root(), json!([1])).unwrap());
        assert_eq!(store.data(), &json!([1]));
    }

    #[test]
    fn test_schema_ordered_insertion() {
        let mut resolver = SchemaResolver::new();
        let mut store = DocumentStore::new(json!({"city": "X"}));
        let log = recorded(&mut store);

        SchemaOrderedMutator::new(&mut resolver)
            .set_at(&mut store, &person_schema(), &path!["name"], json!("Y"))
            .unwrap();

        assert_eq!(keys(store.data()), vec!["name", "city"]);
        let log = log.borrow();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].path, Path::root());
    }

    #[test]
    fn test_undeclared_keys_follow_declared_ones() {
        let mut resolver = SchemaResolver::new();
        let mut store = DocumentStore::new(json!({"zeta": 0, "city": "X"}));
        let mut mutator = SchemaOrderedMutator::new(&mut resolver);
        let schema = person_schema();

        mutator.set_at(&mut store, &schema, &path!["age"], json!(3)).unwrap();
        assert_eq!(keys(store.data()), vec!["age", "city", "zeta"]);

        mutator.set_at(&mut store, &schema, &path!["extra"], json!(true)).unwrap();
        assert_eq!(keys(store.data()), vec!["age", "city", "zeta", "extra"]);
    }

    #[test]
    fn test_data_order_appends() {
        let mut resolver = SchemaResolver::new();
        let mut store = DocumentStore::new(json!({"city": "X"}));
        SchemaOrderedMutator::new(&mut resolver)
            .with_sorting(PropertySorting::DataOrder)
            .set_at(&mut store, &person_schema(), &path!["name"], json!("Y"))
            .unwrap();
        assert_eq!(keys(store.data()), vec!["city", "name"]);
    }

    #[test]
    fn test_existing_key_keeps_position() {
        let mut resolver = SchemaResolver::new();
        let mut store = DocumentStore::new(json!({"city": "X", "name": "A"}));
        let log = recorded(&mut store);
        SchemaOrderedMutator::new(&mut resolver)
            .set_at(&mut store, &person_schema(), &path!["name"], json!("B"))
            .unwrap();
        assert_eq!(keys(store.data()), vec!["city", "name"]);
        assert_eq!(log.borrow()[0].path, path!["name"]);
    }

    #[test]
    fn test_empty_parent_is_set_in_place() {
        let mut resolver = SchemaResolver::new();
        let mut store = DocumentStore::new(json!({}));
        SchemaOrderedMutator::new(&mut resolver)
            .set_at(&mut store, &person_schema(), &path!["city"], json!("X"))
            .unwrap();
        assert_eq!(store.data(), &json!({"city": "X"}));
    }

    #[test]
    fn test_idempotent_set() {
        let mut resolver = SchemaResolver::new();
        let mut store = DocumentStore::new(json!({"name": "A", "tags": [1, 2]}));
        let before = store.read().unwrap();
        let log = recorded(&mut store);

        let current = store.at(&path!["tags"]).cloned().unwrap();
        let changed = SchemaOrderedMutator::new(&mut resolver)
            .set_at(&mut store, &person_schema(), &path!["tags"], current)
            .unwrap();

        assert!(!changed);
        assert!(log.borrow().is_empty());
        assert_eq!(store.read().unwrap(), before);
    }

    #[test]
    fn test_deep_set_creates_containers() {
        let mut resolver = SchemaResolver::new();
        let mut store = DocumentStore::new(json!({"n": 5}));
        let log = recorded(&mut store);
        let mut mutator = SchemaOrderedMutator::new(&mut resolver);
        let schema = SchemaDocument::empty();

        mutator.set_at(&mut store, &schema, &path!["a", "list", 2], json!("x")).unwrap();
        assert_eq!(store.data(), &json!({"n": 5, "a": {"list": [null, null, "x"]}}));
        assert_eq!(log.borrow()[0].path, path!["a"]);
        assert_eq!(log.borrow()[0].previous, None);

        mutator.set_at(&mut store, &schema, &path!["n", "inner"], json!(1)).unwrap();
        assert_eq!(store.at(&path!["n"]), Some(&json!({"inner": 1})));
    }

    #[test]
    fn test_far_index_is_rejected() {
        let mut resolver = SchemaResolver::new();
        let mut store = DocumentStore::new(json!({"list": [1], "n": 0}));
        let mut mutator = SchemaOrderedMutator::new(&mut resolver);
        let schema = SchemaDocument::empty();

        for path in [
            path!["list", usize::MAX],
            path!["list", MAX_SEQUENCE_PADDING + 2],
            path!["fresh", usize::MAX],
            path!["n", 0, "deep", MAX_SEQUENCE_PADDING + 1],
        ] {
            let result = mutator.set_at(&mut store, &schema, &path, json!(1));
            assert!(matches!(result, Err(EditorError::IndexOutOfReach { .. })), "{}", path);
        }
        assert_eq!(store.data(), &json!({"list": [1], "n": 0}));
        assert_eq!(store.revision(), 0);

        mutator
            .set_at(&mut store, &schema, &path!["list", MAX_SEQUENCE_PADDING + 1], json!(2))
            .unwrap();
        let list = store.at(&path!["list"]).unwrap().as_array().unwrap();
        assert_eq!(list.len(), MAX_SEQUENCE_PADDING + 2);
        assert_eq!(list.last(), Some(&json!(2)));
    }

    #[test]
    fn test_null_placeholder_is_sorted_like_a_new_key() {
        let mut resolver = SchemaResolver::new();
        let mut store = DocumentStore::new(json!({"city": "X", "name": null}));
        let log = recorded(&mut store);

        SchemaOrderedMutator::new(&mut resolver)
            .set_at(&mut store, &person_schema(), &path!["name"], json!("Y"))
            .unwrap();

        assert_eq!(store.read().unwrap(), "{\n  \"name\": \"Y\",\n  \"city\": \"X\"\n}");
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(log.borrow()[0].path, Path::root());
    }

    #[test]
    fn test_property_inside_sequence_is_rejected() {
        let mut resolver = SchemaResolver::new();
        let mut store = DocumentStore::new(json!({"list": [1]}));
        let result = SchemaOrderedMutator::new(&mut resolver).set_at(
            &mut store,
            &SchemaDocument::empty(),
            &path!["list", "name"],
            json!(1),
        );
        assert!(matches!(result, Err(EditorError::PathMismatch { .. })));
        assert_eq!(store.data(), &json!({"list": [1]}));
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn test_digit_property_addresses_sequence() {
        let mut resolver = SchemaResolver::new();
        let mut store = DocumentStore::new(json!({"list": [1, 2]}));
        SchemaOrderedMutator::new(&mut resolver)
            .set_at(&mut store, &SchemaDocument::empty(), &path!["list", "1"], json!(9))
            .unwrap();
        assert_eq!(store.data(), &json!({"list": [1, 9]}));
    }

    #[test]
    fn test_bounded_removal() {
        let mut resolver = SchemaResolver::new();
        let mut store = DocumentStore::new(json!({"list": ["a", "b", "c"]}));
        let log = recorded(&mut store);
        let mut mutator = SchemaOrderedMutator::new(&mut resolver);

        assert!(!mutator.remove_at(&mut store, &path!["list", 3]));
        assert!(log.borrow().is_empty());

        assert!(mutator.remove_at(&mut store, &path!["list", 0]));
        assert_eq!(store.at(&path!["list"]), Some(&json!(["b", "c"])));
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(log.borrow()[0].path, path!["list"]);
    }

    #[test]
    fn test_remove_key_keeps_sibling_order() {
        let mut resolver = SchemaResolver::new();
        let mut store = DocumentStore::new(json!({"a": 1, "b": 2, "c": 3}));
        let mut mutator = SchemaOrderedMutator::new(&mut resolver);

        assert!(mutator.remove_at(&mut store, &path!["a"]));
        assert_eq!(keys(store.data()), vec!["b", "c"]);
        assert!(!mutator.remove_at(&mut store, &path!["missing"]));
        assert!(!mutator.remove_at(&mut store, &path!["b", "deeper"]));
    }

    #[test]
    fn test_remove_root_resets_document() {
        let mut resolver = SchemaResolver::new();
        let mut store = DocumentStore::new(json!({"a": 1}));
        assert!(SchemaOrderedMutator::new(&mut resolver).remove_at(&mut store, &Path::root()));
        assert_eq!(store.data(), &json!({}));
    }

    #[test]
    fn test_apply_mutation() {
        let mut resolver = SchemaResolver::new();
        let mut store = DocumentStore::new(json!({"city": "X"}));
        let mut mutator = SchemaOrderedMutator::new(&mut resolver);
        let schema = person_schema();

        let set: Mutation = serde_json::from_value(json!({"op": "set", "path": ["name"], "value": "Y"})).unwrap();
        assert_eq!(set.path(), &path!["name"]);
        assert!(mutator.apply(&mut store, &schema, set).unwrap());
        assert!(mutator
            .apply(&mut store, &schema, Mutation::Remove { path: path!["city"] })
            .unwrap());
        assert_eq!(store.data(), &json!({"name": "Y"}));
    }

    #[test]
    fn test_property_sorting_names() {
        let sorting: PropertySorting = serde_json::from_value(json!("schemaOrder")).unwrap();
        assert_eq!(sorting, PropertySorting::SchemaOrder);
        let sorting: PropertySorting = serde_json::from_value(json!("alphabetical")).unwrap();
        assert_eq!(sorting, PropertySorting::DataOrder);
    }
}
