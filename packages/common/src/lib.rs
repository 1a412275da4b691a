//! # Metaconf Common
//!
//! Shared building blocks for the document engine: tree paths, path errors
//! and loosely-typed lookup into `serde_json::Value` trees.

pub mod error;
pub mod path;
pub mod resolve;

pub use error::*;
pub use path::*;
pub use resolve::*;
