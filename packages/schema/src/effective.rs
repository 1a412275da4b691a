use crate::merge::MergeFailure;
use metaconf_common::Path;
use serde_json::{Map, Value};

/// How the composition keywords of a node were handled
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Nothing to resolve
    Plain,
    /// `allOf` was merged into the node
    Merged,
    /// `allOf` could not be merged; the node is the original, unmerged one
    Unresolved(MergeFailure),
}

/// Schema node after composition resolution, valid for direct inspection
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveSchema {
    /// The resolved node (always an object; boolean schemas are normalized)
    pub schema: Value,

    /// Location of the node in the schema tree, relative to merged parents
    pub schema_path: Path,

    pub resolution: Resolution,
}

impl EffectiveSchema {
    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        self.schema.as_object()
    }

    pub fn get(&self, keyword: &str) -> Option<&Value> {
        self.schema.get(keyword)
    }

    /// Declared `properties`, if any
    pub fn properties(&self) -> Option<&Map<String, Value>> {
        self.schema.get("properties").and_then(Value::as_object)
    }

    /// Property names in declaration order
    pub fn property_order(&self) -> Vec<&str> {
        self.properties()
            .map(|props| props.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// True when the node places no constraints at all
    pub fn is_empty(&self) -> bool {
        self.as_object().map(Map::is_empty).unwrap_or(true)
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self.resolution, Resolution::Unresolved(_))
    }

    /// Declared `type` names (a single string or an array)
    pub fn types(&self) -> Vec<&str> {
        match self.schema.get("type") {
            Some(Value::String(name)) => vec![name.as_str()],
            Some(Value::Array(names)) => names.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }
}
