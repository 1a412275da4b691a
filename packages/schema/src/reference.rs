//! # Reference Keywords
//!
//! Local `$ref` resolution (`#`, `#/$defs/name`, any JSON Pointer fragment).
//! External references are left in place: the core performs no I/O.

use metaconf_common::{value_at, Path};
use serde_json::{Map, Value};

/// Bound on distinct references followed in one chain
pub const MAX_REF_DEPTH: usize = 32;

/// Target of a local reference inside `root`, `None` for external or dangling ones
pub fn resolve_local_ref<'a>(root: &'a Value, reference: &str) -> Option<&'a Value> {
    let fragment = reference.strip_prefix('#')?;
    let path = Path::from_json_pointer(fragment).ok()?;
    value_at(root, &path)
}

/// Replace a `$ref` node by its target.
///
/// A reference with sibling keywords becomes the siblings plus an `allOf`
/// holding the target, so both are combined by the regular merge. `allOf`
/// branches are dereferenced too. Unresolvable references stay untouched,
/// and so does a reference already being followed further up the chain.
pub fn dereference(root: &Value, node: &Value) -> Value {
    dereference_in_chain(root, node, &mut Vec::new())
}

/// `chain` holds the references followed to reach `node`
fn dereference_in_chain(root: &Value, node: &Value, chain: &mut Vec<String>) -> Value {
    let Some(map) = node.as_object() else {
        return node.clone();
    };

    if let Some(reference) = map.get("$ref").and_then(Value::as_str) {
        if chain.iter().any(|followed| followed == reference) || chain.len() >= MAX_REF_DEPTH {
            tracing::debug!("Not following {} again in the same chain", reference);
            return node.clone();
        }
        match resolve_local_ref(root, reference) {
            Some(target) => {
                chain.push(reference.to_string());
                let resolved = if map.len() == 1 {
                    dereference_in_chain(root, target, chain)
                } else {
                    let mut combined: Map<String, Value> = map
                        .iter()
                        .filter(|(k, _)| k.as_str() != "$ref")
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect();
                    let mut branches = vec![target.clone()];
                    if let Some(Value::Array(existing)) = combined.shift_remove("allOf") {
                        branches.extend(existing);
                    }
                    combined.insert("allOf".to_string(), Value::Array(branches));
                    dereference_branches(root, &combined, chain)
                };
                chain.pop();
                return resolved;
            }
            None => {
                tracing::debug!("Leaving unresolved reference {}", reference);
            }
        }
    }

    match map.get("allOf") {
        Some(Value::Array(_)) => dereference_branches(root, map, chain),
        _ => node.clone(),
    }
}

/// Copy of `map` with each `allOf` branch dereferenced
fn dereference_branches(root: &Value, map: &Map<String, Value>, chain: &mut Vec<String>) -> Value {
    let mut out = map.clone();
    if let Some(Value::Array(branches)) = map.get("allOf") {
        let resolved = branches
            .iter()
            .map(|branch| dereference_in_chain(root, branch, chain))
            .collect();
        out.insert("allOf".to_string(), Value::Array(resolved));
    }
    Value::Object(out)
}
