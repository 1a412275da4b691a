//! # Value Lookup
//!
//! Resolve a [`Path`] against a `serde_json::Value` tree. Lookups never fail
//! loudly: a missing key, an out-of-range index or a scalar in the middle of
//! the path all yield `None`, because documents are routinely mid-edit.
//!
//! Keys are matched loosely: an index applied to an object looks up its
//! decimal form, and an all-digit property applied to a sequence is an index.

use crate::path::{Path, PathKey};
use serde_json::Value;

/// Child of `value` reached through `key`
pub fn child<'a>(value: &'a Value, key: &PathKey) -> Option<&'a Value> {
    match value {
        Value::Object(map) => match key {
            PathKey::Prop(name) => map.get(name),
            PathKey::Index(index) => map.get(&index.to_string()),
        },
        Value::Array(items) => items.get(key.to_index()?),
        _ => None,
    }
}

/// Mutable child of `value` reached through `key`
pub fn child_mut<'a>(value: &'a mut Value, key: &PathKey) -> Option<&'a mut Value> {
    match value {
        Value::Object(map) => map.get_mut(&key.to_prop_name()),
        Value::Array(items) => items.get_mut(key.to_index()?),
        _ => None,
    }
}

/// Value at `path`, `None` if any step does not resolve
pub fn value_at<'a>(root: &'a Value, path: &Path) -> Option<&'a Value> {
    path.iter().try_fold(root, |value, key| child(value, key))
}

/// Mutable value at `path`, `None` if any step does not resolve
pub fn value_at_mut<'a>(root: &'a mut Value, path: &Path) -> Option<&'a mut Value> {
    path.iter().try_fold(root, |value, key| child_mut(value, key))
}

/// True for `null`, `{}`, `[]` and `""`
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
