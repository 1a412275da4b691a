//! # Schema Resolver
//!
//! Walks a data path through a schema document, one step at a time:
//!
//! 1. dereference `$ref` on the current node
//! 2. merge the node's `allOf`
//! 3. pick the child schema for the next data key
//!
//! Step 3 depends on the *resolved* node, not on the raw schema, so mapping a
//! data path to a schema path is interleaved with resolution. Every prefix
//! of a walked path is cached, keyed by its canonical string. The cache
//! belongs to one schema document identity and is cleared as soon as a
//! different document is queried.

use crate::document::{SchemaDocument, SchemaId};
use crate::effective::{EffectiveSchema, Resolution};
use crate::merge::merge_all_of;
use crate::reference::dereference;
use metaconf_common::{path, Path, PathKey};
use regex::Regex;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Memoizing effective-schema calculator
#[derive(Debug, Default)]
pub struct SchemaResolver {
    /// Identity of the document the cache was built for
    owner: Option<SchemaId>,

    /// Canonical data path -> effective schema
    cache: HashMap<String, Arc<EffectiveSchema>>,

    /// Compiled `patternProperties` patterns (`None` = invalid pattern)
    patterns: HashMap<String, Option<Regex>>,
}

impl SchemaResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective schema for the data at `data_path`
    pub fn effective_schema_at(
        &mut self,
        schema: &SchemaDocument,
        data_path: &Path,
    ) -> Arc<EffectiveSchema> {
        self.adopt(schema);

        let key = data_path.to_canonical_string();
        if let Some(hit) = self.cache.get(&key) {
            return Arc::clone(hit);
        }

        let effective = match data_path.split_last() {
            None => resolve_node(schema.root(), schema.root(), Path::root()),
            Some((parent_path, step)) => {
                let parent = self.effective_schema_at(schema, &parent_path);
                let (schema_step, child) = self.child_schema(&parent, step);
                resolve_node(schema.root(), &child, parent.schema_path.join(&schema_step))
            }
        };

        let effective = Arc::new(effective);
        self.cache.insert(key, Arc::clone(&effective));
        effective
    }

    /// Schema path corresponding to `data_path`
    pub fn schema_path_at(&mut self, schema: &SchemaDocument, data_path: &Path) -> Path {
        self.effective_schema_at(schema, data_path).schema_path.clone()
    }

    /// Number of cached paths
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
        self.owner = None;
    }

    /// Drop the cache if it was built for another document
    fn adopt(&mut self, schema: &SchemaDocument) {
        if self.owner == Some(schema.id()) {
            return;
        }
        if let Some(previous) = self.owner {
            tracing::debug!(
                "Schema document changed ({} -> {}), dropping {} cached entries",
                previous,
                schema.id(),
                self.cache.len()
            );
        }
        self.cache.clear();
        self.owner = Some(schema.id());
    }

    /// Pick the schema step and child node for one data key
    fn child_schema(&mut self, parent: &EffectiveSchema, key: &PathKey) -> (Path, Value) {
        let empty = || Value::Object(Map::new());
        let Some(node) = parent.as_object() else {
            return (path!["properties", key.to_prop_name()], empty());
        };

        match key {
            PathKey::Prop(name) => {
                if let Some(child) = node
                    .get("properties")
                    .and_then(Value::as_object)
                    .and_then(|props| props.get(name))
                {
                    return (path!["properties", name.as_str()], child.clone());
                }
                if let Some(patterns) = node.get("patternProperties").and_then(Value::as_object) {
                    for (pattern, child) in patterns {
                        if self.pattern_matches(pattern, name) {
                            return (path!["patternProperties", pattern.as_str()], child.clone());
                        }
                    }
                }
                if let Some(additional @ Value::Object(_)) = node.get("additionalProperties") {
                    return (path!["additionalProperties"], additional.clone());
                }
                (path!["properties", name.as_str()], empty())
            }
            PathKey::Index(index) => {
                let index = *index;
                let mut tuple_keyword = None;
                for keyword in ["prefixItems", "items"] {
                    if let Some(Value::Array(positional)) = node.get(keyword) {
                        if let Some(child) = positional.get(index) {
                            return (path![keyword, index], child.clone());
                        }
                        if tuple_keyword.is_none() {
                            tuple_keyword = Some(keyword);
                        }
                    }
                }
                match tuple_keyword {
                    // draft 2020-12: `items` holds the schema for the rest
                    Some("prefixItems") => match node.get("items") {
                        Some(rest) if !rest.is_array() => (path!["items"], rest.clone()),
                        _ => (path!["items"], empty()),
                    },
                    // draft 4-2019: tuple `items` followed by `additionalItems`
                    Some(_) => match node.get("additionalItems") {
                        Some(rest) => (path!["additionalItems"], rest.clone()),
                        None => (path!["additionalItems"], empty()),
                    },
                    None => match node.get("items") {
                        Some(items) => (path!["items"], items.clone()),
                        None => (path!["items"], empty()),
                    },
                }
            }
        }
    }

    fn pattern_matches(&mut self, pattern: &str, name: &str) -> bool {
        let compiled = self
            .patterns
            .entry(pattern.to_string())
            .or_insert_with(|| match Regex::new(pattern) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    tracing::debug!("Ignoring invalid patternProperties pattern {:?}: {}", pattern, e);
                    None
                }
            });
        compiled.as_ref().map(|regex| regex.is_match(name)).unwrap_or(false)
    }
}

/// Schema path for `data_path`, computed with a throwaway resolver
pub fn to_schema_path(schema: &SchemaDocument, data_path: &Path) -> Path {
    SchemaResolver::new().schema_path_at(schema, data_path)
}

/// Dereference and merge a single node
fn resolve_node(root: &Value, node: &Value, schema_path: Path) -> EffectiveSchema {
    let node = match dereference(root, node) {
        Value::Bool(true) => json!({}),
        Value::Bool(false) => json!({"not": {}}),
        other => other,
    };

    if node.get("allOf").is_none() {
        return EffectiveSchema {
            schema: node,
            schema_path,
            resolution: Resolution::Plain,
        };
    }

    match merge_all_of(&node) {
        Ok(merged) => EffectiveSchema {
            schema: merged,
            schema_path,
            resolution: Resolution::Merged,
        },
        Err(failure) => {
            tracing::warn!("Unresolved composition at schema path '{}': {}", schema_path, failure);
            EffectiveSchema {
                schema: node,
                schema_path,
                resolution: Resolution::Unresolved(failure),
            }
        }
    }
}
