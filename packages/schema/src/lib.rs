//! # Metaconf Schema
//!
//! Computes the *effective* schema that applies at any location of a data
//! document.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ SchemaDocument: schema tree + identity      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ SchemaResolver: walk the data path          │
//! │  - dereference local `$ref`                 │
//! │  - shallow `allOf` merge                    │
//! │  - descend properties / items / prefixItems │
//! │  - cache per (document, path)               │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ EffectiveSchema: plain node + schema path   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use metaconf_common::path;
//! use metaconf_schema::{SchemaDocument, SchemaResolver};
//! use serde_json::json;
//!
//! let schema = SchemaDocument::new(json!({
//!     "type": "object",
//!     "properties": {
//!         "address": {
//!             "allOf": [
//!                 {"properties": {"street": {"type": "string"}}},
//!                 {"properties": {"city": {"type": "string"}}}
//!             ]
//!         }
//!     }
//! }));
//!
//! let mut resolver = SchemaResolver::new();
//! let effective = resolver.effective_schema_at(&schema, &path!["address"]);
//! assert_eq!(effective.property_order(), vec!["street", "city"]);
//! ```

mod document;
mod effective;
mod merge;
mod reference;
mod resolver;

pub use document::{SchemaDocument, SchemaId};
pub use effective::{EffectiveSchema, Resolution};
pub use merge::{keyword_policy, merge_all_of, KeywordPolicy, MergeFailure};
pub use reference::{dereference, resolve_local_ref, MAX_REF_DEPTH};
pub use resolver::{to_schema_path, SchemaResolver};
