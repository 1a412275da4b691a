//! # Schema Documents
//!
//! A schema is an ordinary JSON tree. Wrapping it in a [`SchemaDocument`]
//! gives it an identity: clones share the identity, while every call to
//! [`SchemaDocument::new`] mints a fresh one. Resolver caches are keyed by
//! that identity and dropped wholesale when it changes.

use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_SCHEMA_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one schema document instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(u64);

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "schema#{}", self.0)
    }
}

/// Immutable, shareable schema tree
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    id: SchemaId,
    root: Arc<Value>,
}

impl SchemaDocument {
    pub fn new(root: Value) -> Self {
        Self {
            id: SchemaId(NEXT_SCHEMA_ID.fetch_add(1, Ordering::Relaxed)),
            root: Arc::new(root),
        }
    }

    /// Schema that allows anything
    pub fn empty() -> Self {
        Self::new(Value::Object(Default::default()))
    }

    pub fn id(&self) -> SchemaId {
        self.id
    }

    pub fn root(&self) -> &Value {
        &self.root
    }
}

impl From<Value> for SchemaDocument {
    fn from(root: Value) -> Self {
        Self::new(root)
    }
}
