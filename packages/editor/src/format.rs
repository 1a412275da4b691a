//! # Data Formats
//!
//! Pluggable text encodings for a document tree. A [`DocumentStore`] holds
//! one strategy and can swap it at runtime without touching the tree.
//!
//! Both built-in formats keep the tree's own key insertion order.
//!
//! [`DocumentStore`]: crate::DocumentStore

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("JSON syntax error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML syntax error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Serializer produced invalid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("Unknown data format: {0}")]
    UnknownFormat(String),
}

/// Parse/stringify strategy for one text format
pub trait DataFormat: fmt::Debug {
    /// Short identifier, as used in settings (`json`, `yaml`)
    fn name(&self) -> &'static str;

    /// Parse text into a tree; fails on syntax errors
    fn parse(&self, text: &str) -> Result<Value, FormatError>;

    /// Encode a tree as text
    fn stringify(&self, value: &Value) -> Result<String, FormatError>;
}

/// JSON with configurable indentation (`0` = compact)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonFormat {
    pub indent: usize,
}

impl JsonFormat {
    pub fn with_indent(indent: usize) -> Self {
        Self { indent }
    }
}

impl Default for JsonFormat {
    fn default() -> Self {
        Self { indent: 2 }
    }
}

impl DataFormat for JsonFormat {
    fn name(&self) -> &'static str {
        "json"
    }

    fn parse(&self, text: &str) -> Result<Value, FormatError> {
        Ok(serde_json::from_str(text)?)
    }

    fn stringify(&self, value: &Value) -> Result<String, FormatError> {
        if self.indent == 0 {
            return Ok(serde_json::to_string(value)?);
        }
        let indent = " ".repeat(self.indent);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
        let mut out = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        value.serialize(&mut serializer)?;
        Ok(String::from_utf8(out)?)
    }
}

/// Block-style YAML (indentation is fixed at two spaces by the emitter)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct YamlFormat;

impl DataFormat for YamlFormat {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn parse(&self, text: &str) -> Result<Value, FormatError> {
        Ok(serde_yaml::from_str(text)?)
    }

    fn stringify(&self, value: &Value) -> Result<String, FormatError> {
        Ok(serde_yaml::to_string(value)?)
    }
}

/// Look up a format by settings name; `indent` applies to JSON only
pub fn format_for_name(name: &str, indent: usize) -> Result<Box<dyn DataFormat>, FormatError> {
    match name.to_ascii_lowercase().as_str() {
        "json" => Ok(Box::new(JsonFormat::with_indent(indent))),
        "yaml" | "yml" => Ok(Box::new(YamlFormat)),
        other => Err(FormatError::UnknownFormat(other.to_string())),
    }
}
