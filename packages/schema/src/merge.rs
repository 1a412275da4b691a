//! # allOf Merge
//!
//! Combines a node's own keywords with all of its `allOf` branches into one
//! equivalent node.
//!
//! ## Rules
//!
//! The merge is **shallow**: sub-schemas below the top-level keywords are
//! never merged recursively. Each keyword is combined according to its
//! [`KeywordPolicy`]:
//!
//! | policy        | keywords                                        | rule                 |
//! |---------------|-------------------------------------------------|----------------------|
//! | `Descriptive` | `title`, `description`, `default`, ...          | last branch wins     |
//! | `LowerBound`  | `minimum`, `minLength`, `minItems`, ...         | largest bound wins   |
//! | `UpperBound`  | `maximum`, `maxLength`, `maxItems`, ...         | smallest bound wins  |
//! | `Union`       | `required`                                      | ordered union        |
//! | `AnyTrue`     | `uniqueItems`                                   | logical or           |
//! | `Types`       | `type`                                          | intersection         |
//! | `Keyed`       | `properties`, `patternProperties`, `$defs`, ... | key-wise union       |
//! | `Exact`       | everything else                                 | must be equal        |
//!
//! Anything that cannot be combined yields a [`MergeFailure`] instead of a
//! guess. Callers keep the original node in that case.

use serde_json::{Map, Value};
use thiserror::Error;

/// Why an `allOf` could not be merged
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MergeFailure {
    #[error("Conflicting values for keyword `{keyword}`: {left} vs {right}")]
    Conflict {
        keyword: String,
        left: Value,
        right: Value,
    },

    #[error("Conflicting sub-schemas for `{keyword}` entry `{key}`")]
    ConflictingSubschema { keyword: String, key: String },

    #[error("`allOf` must be an array of schemas")]
    MalformedAllOf,

    #[error("`allOf` branch {0} is not a schema")]
    MalformedBranch(usize),

    #[error("`allOf` contains an unsatisfiable `false` branch")]
    Unsatisfiable,
}

/// How a keyword is combined when several branches declare it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordPolicy {
    Descriptive,
    LowerBound,
    UpperBound,
    Union,
    AnyTrue,
    Types,
    Keyed,
    Exact,
}

pub fn keyword_policy(keyword: &str) -> KeywordPolicy {
    match keyword {
        "title" | "description" | "$comment" | "default" | "examples" | "deprecated"
        | "readOnly" | "writeOnly" | "$id" | "$schema" => KeywordPolicy::Descriptive,
        "minimum" | "exclusiveMinimum" | "minLength" | "minItems" | "minProperties"
        | "minContains" => KeywordPolicy::LowerBound,
        "maximum" | "exclusiveMaximum" | "maxLength" | "maxItems" | "maxProperties"
        | "maxContains" => KeywordPolicy::UpperBound,
        "required" => KeywordPolicy::Union,
        "uniqueItems" => KeywordPolicy::AnyTrue,
        "type" => KeywordPolicy::Types,
        "properties" | "patternProperties" | "$defs" | "definitions" | "dependentSchemas" => {
            KeywordPolicy::Keyed
        }
        _ => KeywordPolicy::Exact,
    }
}

/// Merge `node` with its `allOf` branches.
///
/// Nodes without `allOf` (and non-object nodes) are returned unchanged.
/// Nested `allOf` inside branches is flattened first. The node's own keywords
/// come first, so its declared property order leads.
pub fn merge_all_of(node: &Value) -> Result<Value, MergeFailure> {
    let Some(map) = node.as_object() else {
        return Ok(node.clone());
    };
    if !map.contains_key("allOf") {
        return Ok(node.clone());
    }

    let mut branches = Vec::new();
    flatten(map, &mut branches)?;

    let mut merged = Map::new();
    for branch in branches {
        for (keyword, value) in branch {
            merge_keyword(&mut merged, keyword, value)?;
        }
    }
    Ok(Value::Object(merged))
}

/// Collect `map` without its `allOf` followed by every branch, depth first
fn flatten<'a>(
    map: &'a Map<String, Value>,
    out: &mut Vec<Vec<(&'a String, &'a Value)>>,
) -> Result<(), MergeFailure> {
    out.push(map.iter().filter(|(k, _)| k.as_str() != "allOf").collect());

    let Some(all_of) = map.get("allOf") else {
        return Ok(());
    };
    let branches = all_of.as_array().ok_or(MergeFailure::MalformedAllOf)?;
    for (index, branch) in branches.iter().enumerate() {
        match branch {
            Value::Bool(true) => {}
            Value::Bool(false) => return Err(MergeFailure::Unsatisfiable),
            Value::Object(branch_map) => flatten(branch_map, out)?,
            _ => return Err(MergeFailure::MalformedBranch(index)),
        }
    }
    Ok(())
}

fn merge_keyword(
    merged: &mut Map<String, Value>,
    keyword: &String,
    incoming: &Value,
) -> Result<(), MergeFailure> {
    let Some(existing) = merged.get_mut(keyword) else {
        merged.insert(keyword.clone(), incoming.clone());
        return Ok(());
    };
    if *existing == *incoming {
        return Ok(());
    }

    let conflict = |left: &Value| MergeFailure::Conflict {
        keyword: keyword.clone(),
        left: left.clone(),
        right: incoming.clone(),
    };

    match keyword_policy(keyword) {
        KeywordPolicy::Descriptive => *existing = incoming.clone(),
        KeywordPolicy::LowerBound | KeywordPolicy::UpperBound => {
            let (Some(left), Some(right)) = (existing.as_f64(), incoming.as_f64()) else {
                return Err(conflict(&*existing));
            };
            let take_incoming = match keyword_policy(keyword) {
                KeywordPolicy::LowerBound => right > left,
                _ => right < left,
            };
            if take_incoming {
                *existing = incoming.clone();
            }
        }
        KeywordPolicy::Union => {
            let (Some(left), Some(right)) = (existing.as_array_mut(), incoming.as_array()) else {
                return Err(conflict(&*existing));
            };
            for item in right {
                if !left.contains(item) {
                    left.push(item.clone());
                }
            }
        }
        KeywordPolicy::AnyTrue => {
            let (Some(left), Some(right)) = (existing.as_bool(), incoming.as_bool()) else {
                return Err(conflict(&*existing));
            };
            *existing = Value::Bool(left || right);
        }
        KeywordPolicy::Types => {
            match intersect_types(existing, incoming) {
                Some(intersection) => *existing = intersection,
                None => return Err(conflict(&*existing)),
            }
        }
        KeywordPolicy::Keyed => {
            let (Some(left), Some(right)) = (existing.as_object_mut(), incoming.as_object()) else {
                return Err(conflict(&*existing));
            };
            for (key, schema) in right {
                match left.get(key) {
                    Some(current) if current != schema => {
                        return Err(MergeFailure::ConflictingSubschema {
                            keyword: keyword.clone(),
                            key: key.clone(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        left.insert(key.clone(), schema.clone());
                    }
                }
            }
        }
        KeywordPolicy::Exact => return Err(conflict(&*existing)),
    }
    Ok(())
}

fn type_names(value: &Value) -> Option<Vec<&str>> {
    match value {
        Value::String(name) => Some(vec![name.as_str()]),
        Value::Array(items) => items.iter().map(Value::as_str).collect(),
        _ => None,
    }
}

/// Common members of two `type` keywords; `integer` is a subtype of `number`.
/// `None` when the intersection is empty or a side is malformed.
fn intersect_types(left: &Value, right: &Value) -> Option<Value> {
    let left = type_names(left)?;
    let right = type_names(right)?;

    let mut common: Vec<&str> = Vec::new();
    for l in &left {
        for r in &right {
            let member = match (*l, *r) {
                (a, b) if a == b => Some(a),
                ("integer", "number") | ("number", "integer") => Some("integer"),
                _ => None,
            };
            if let Some(member) = member {
                if !common.contains(&member) {
                    common.push(member);
                }
            }
        }
    }

    match common.as_slice() {
        [] => None,
        [single] => Some(Value::String(single.to_string())),
        many => Some(Value::Array(
            many.iter().map(|name| Value::String(name.to_string())).collect(),
        )),
    }
}
