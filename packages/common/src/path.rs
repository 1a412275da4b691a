//! # Tree Paths
//!
//! A [`Path`] is an ordered sequence of [`PathKey`]s addressing one location in
//! a document tree (or in a schema tree). The empty path is the root.
//!
//! Two text forms are supported:
//!
//! - **Canonical**: `a.b[0]["odd key"]` - stable and unambiguous, used as a
//!   cache key and for display. Root is the empty string.
//! - **JSON Pointer** (RFC 6901): `/a/b/0/odd key` - used at the command line.
//!
//! ```rust
//! use metaconf_common::{path, Path};
//!
//! let p = path!["address", "lines", 0];
//! assert_eq!(p.to_string(), "address.lines[0]");
//! assert_eq!(Path::parse("address.lines[0]").unwrap(), p);
//! assert_eq!(p.to_json_pointer(), "/address/lines/0");
//! ```

use crate::error::PathError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of a path: an object property or a sequence index
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathKey {
    Index(usize),
    Prop(String),
}

impl PathKey {
    pub fn as_prop(&self) -> Option<&str> {
        match self {
            PathKey::Prop(name) => Some(name),
            PathKey::Index(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathKey::Index(index) => Some(*index),
            PathKey::Prop(_) => None,
        }
    }

    /// Key as it would appear in an object (indices are written in decimal)
    pub fn to_prop_name(&self) -> String {
        match self {
            PathKey::Prop(name) => name.clone(),
            PathKey::Index(index) => index.to_string(),
        }
    }

    /// Key as a sequence index, accepting all-digit property names
    pub fn to_index(&self) -> Option<usize> {
        match self {
            PathKey::Index(index) => Some(*index),
            PathKey::Prop(name) => parse_index(name),
        }
    }
}

impl From<usize> for PathKey {
    fn from(index: usize) -> Self {
        PathKey::Index(index)
    }
}

impl From<&str> for PathKey {
    fn from(name: &str) -> Self {
        PathKey::Prop(name.to_string())
    }
}

impl From<String> for PathKey {
    fn from(name: String) -> Self {
        PathKey::Prop(name)
    }
}

impl From<&String> for PathKey {
    fn from(name: &String) -> Self {
        PathKey::Prop(name.clone())
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKey::Index(index) => write!(f, "{}", index),
            PathKey::Prop(name) => write!(f, "{}", name),
        }
    }
}

/// Location in a tree; empty = root
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<PathKey>);

/// Build a [`Path`] from a list of keys: `path!["a", 0, "b"]`
#[macro_export]
macro_rules! path {
    () => {
        $crate::Path::root()
    };
    ($($key:expr),+ $(,)?) => {
        $crate::Path::new(vec![$($crate::PathKey::from($key)),+])
    };
}

impl Path {
    pub fn new(keys: Vec<PathKey>) -> Self {
        Self(keys)
    }

    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> &[PathKey] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathKey> {
        self.0.iter()
    }

    pub fn last(&self) -> Option<&PathKey> {
        self.0.last()
    }

    /// Parent location, `None` for the root
    pub fn parent(&self) -> Option<Path> {
        if self.0.is_empty() {
            None
        } else {
            Some(Path(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Split into parent path and final key, `None` for the root
    pub fn split_last(&self) -> Option<(Path, &PathKey)> {
        let (last, rest) = self.0.split_last()?;
        Some((Path(rest.to_vec()), last))
    }

    /// New path with one more key at the end
    pub fn append(&self, key: impl Into<PathKey>) -> Path {
        let mut keys = self.0.clone();
        keys.push(key.into());
        Path(keys)
    }

    pub fn push(&mut self, key: impl Into<PathKey>) {
        self.0.push(key.into());
    }

    /// Concatenate two paths
    pub fn join(&self, other: &Path) -> Path {
        let mut keys = self.0.clone();
        keys.extend(other.0.iter().cloned());
        Path(keys)
    }

    /// True when `prefix` is this path or one of its ancestors
    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Stable, unambiguous text form (see module docs)
    pub fn to_canonical_string(&self) -> String {
        let mut out = String::new();
        for key in &self.0 {
            match key {
                PathKey::Index(index) => {
                    out.push('[');
                    out.push_str(&index.to_string());
                    out.push(']');
                }
                PathKey::Prop(name) if is_identifier(name) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(name);
                }
                PathKey::Prop(name) => {
                    out.push('[');
                    out.push_str(&serde_json::Value::String(name.clone()).to_string());
                    out.push(']');
                }
            }
        }
        out
    }

    /// Parse the canonical text form produced by [`Path::to_canonical_string`]
    pub fn parse(input: &str) -> Result<Path, PathError> {
        CanonicalParser::new(input).parse()
    }

    /// Format as an RFC 6901 JSON Pointer
    pub fn to_json_pointer(&self) -> String {
        let mut out = String::new();
        for key in &self.0 {
            out.push('/');
            match key {
                PathKey::Index(index) => out.push_str(&index.to_string()),
                PathKey::Prop(name) => out.push_str(&escape_pointer_component(name)),
            }
        }
        out
    }

    /// Parse an RFC 6901 JSON Pointer; all-digit segments become indices
    pub fn from_json_pointer(pointer: &str) -> Result<Path, PathError> {
        if pointer.is_empty() {
            return Ok(Path::root());
        }
        let Some(rest) = pointer.strip_prefix('/') else {
            return Err(PathError::InvalidPointer(pointer.to_string()));
        };
        let keys = rest
            .split('/')
            .map(|segment| {
                let segment = unescape_pointer_component(segment);
                match parse_index(&segment) {
                    Some(index) => PathKey::Index(index),
                    None => PathKey::Prop(segment),
                }
            })
            .collect();
        Ok(Path(keys))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_string())
    }
}

impl std::str::FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl From<Vec<PathKey>> for Path {
    fn from(keys: Vec<PathKey>) -> Self {
        Path(keys)
    }
}

impl FromIterator<PathKey> for Path {
    fn from_iter<T: IntoIterator<Item = PathKey>>(iter: T) -> Self {
        Path(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a PathKey;
    type IntoIter = std::slice::Iter<'a, PathKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Decimal index without sign or leading zeros
fn parse_index(text: &str) -> Option<usize> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if text.len() > 1 && text.starts_with('0') {
        return None;
    }
    text.parse().ok()
}

fn escape_pointer_component(component: &str) -> String {
    if !component.contains('/') && !component.contains('~') {
        return component.to_string();
    }
    // ~ must be escaped before /
    component.replace('~', "~0").replace('/', "~1")
}

fn unescape_pointer_component(component: &str) -> String {
    if !component.contains('~') {
        return component.to_string();
    }
    // ~1 must be replaced before ~0
    component.replace("~1", "/").replace("~0", "~")
}

struct CanonicalParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> CanonicalParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn error(&self, reason: &'static str) -> PathError {
        PathError::Malformed {
            input: self.input.to_string(),
            offset: self.pos,
            reason,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn parse(mut self) -> Result<Path, PathError> {
        let mut keys = Vec::new();
        while let Some(c) = self.peek() {
            match c {
                '[' => {
                    self.pos += 1;
                    keys.push(self.bracketed()?);
                }
                '.' if !keys.is_empty() => {
                    self.pos += 1;
                    keys.push(PathKey::Prop(self.identifier()?));
                }
                _ if keys.is_empty() => keys.push(PathKey::Prop(self.identifier()?)),
                _ => return Err(self.error("expected '.' or '['")),
            }
        }
        Ok(Path(keys))
    }

    fn identifier(&mut self) -> Result<String, PathError> {
        let rest = &self.input[self.pos..];
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$'))
            .unwrap_or(rest.len());
        let name = &rest[..len];
        if !is_identifier(name) {
            return Err(self.error("expected property name"));
        }
        self.pos += len;
        Ok(name.to_string())
    }

    fn bracketed(&mut self) -> Result<PathKey, PathError> {
        let key = match self.peek() {
            Some('"') => PathKey::Prop(self.quoted()?),
            Some(c) if c.is_ascii_digit() => {
                let rest = &self.input[self.pos..];
                let len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
                let index = parse_index(&rest[..len]).ok_or_else(|| self.error("invalid index"))?;
                self.pos += len;
                PathKey::Index(index)
            }
            _ => return Err(self.error("expected index or quoted key")),
        };
        if self.peek() != Some(']') {
            return Err(self.error("expected ']'"));
        }
        self.pos += 1;
        Ok(key)
    }

    fn quoted(&mut self) -> Result<String, PathError> {
        let start = self.pos;
        let bytes = self.input.as_bytes();
        let mut i = start + 1;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 2,
                b'"' => {
                    let literal = &self.input[start..=i];
                    let name: String = serde_json::from_str(literal)
                        .map_err(|_| self.error("invalid string escape"))?;
                    self.pos = i + 1;
                    return Ok(name);
                }
                _ => i += 1,
            }
        }
        Err(self.error("unterminated string"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_path() {
        let root = Path::root();
        assert!(root.is_root());
        assert_eq!(root.to_string(), "");
        assert_eq!(root.parent(), None);
        assert_eq!(Path::parse("").unwrap(), root);
        assert_eq!(Path::from_json_pointer("").unwrap(), root);
    }

    #[test]
    fn test_parent_and_append() {
        let p = path!["a", 1, "b"];
        assert_eq!(p.parent(), Some(path!["a", 1]));
        assert_eq!(path!["a"].append(1).append("b"), p);
        assert_eq!(p.last(), Some(&PathKey::Prop("b".to_string())));

        let (parent, last) = p.split_last().unwrap();
        assert_eq!(parent, path!["a", 1]);
        assert_eq!(last, &PathKey::from("b"));
    }

    #[test]
    fn test_equality_is_elementwise() {
        assert_eq!(path!["a", 0], path!["a", 0]);
        assert_ne!(path!["a", 0], path!["a", "0"]);
        assert_ne!(path!["a"], path!["a", 0]);
    }

    #[test]
    fn test_canonical_string_is_unambiguous() {
        assert_eq!(path!["a", 0].to_string(), "a[0]");
        assert_eq!(path!["a", "0"].to_string(), "a[\"0\"]");
        assert_eq!(path!["with.dot", "x"].to_string(), "[\"with.dot\"].x");
        assert_eq!(path![0, 1].to_string(), "[0][1]");
        assert_eq!(path![""].to_string(), "[\"\"]");
    }

    #[test]
    fn test_canonical_parse_inverts_format() {
        let paths = vec![
            path!["a", 0, "b"],
            path!["quote\"d", "back\\slash", 12],
            path!["$ref", "_x9"],
            path![3],
        ];
        for p in paths {
            assert_eq!(Path::parse(&p.to_string()).unwrap(), p);
        }
    }

    #[test]
    fn test_canonical_parse_rejects_malformed() {
        assert!(Path::parse("a..b").is_err());
        assert!(Path::parse("a[").is_err());
        assert!(Path::parse("a[01]").is_err());
        assert!(Path::parse("a[\"open").is_err());
        assert!(Path::parse("9a").is_err());
        assert!(Path::parse(".a").is_err());
    }

    #[test]
    fn test_json_pointer_round_trip() {
        let p = path!["a/b", "c~d", 2];
        assert_eq!(p.to_json_pointer(), "/a~1b/c~0d/2");
        assert_eq!(Path::from_json_pointer("/a~1b/c~0d/2").unwrap(), p);
        assert_eq!(
            Path::from_json_pointer("/007").unwrap(),
            path!["007"]
        );
        assert!(Path::from_json_pointer("no-slash").is_err());
    }

    #[test]
    fn test_starts_with() {
        let p = path!["a", "b", 0];
        assert!(p.starts_with(&Path::root()));
        assert!(p.starts_with(&path!["a", "b"]));
        assert!(!p.starts_with(&path!["b"]));
    }

    #[test]
    fn test_serde_representation() {
        let p = path!["a", 0];
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, r#"["a",0]"#);
        let back: Path = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
